// demos/province_summary.rs
use province_weather::{AtlasError, DataSource, MonthKey, WeatherAtlas};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), AtlasError> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let dataset = args.next().unwrap_or_else(|| "data/weather_data.json.gz".to_string());
    let boundaries = args.next().unwrap_or_else(|| "data/china_provinces.geojson".to_string());

    let mut atlas = WeatherAtlas::load()
        .dataset(DataSource::file(dataset))
        .boundaries(DataSource::file(boundaries))
        .call()
        .await?;
    let dataset = Arc::clone(atlas.dataset());

    if let Some(stats) = dataset.stats() {
        println!(
            "{} records over {} months ({} to {})",
            stats.total_records, stats.total_months, stats.month_range.start, stats.month_range.end
        );
        if let Some(range) = stats.temperature_range {
            println!("Temperature: {:.1} to {:.1} °C", range.min, range.max);
        }
        if let Some(range) = stats.precipitation_range {
            println!("Precipitation: {:.1} to {:.1} mm", range.min, range.max);
        }
    }

    let Some(month) = env::var("MONTH")
        .ok()
        .and_then(|m| m.parse::<MonthKey>().ok())
        .or_else(|| dataset.months().last().copied())
    else {
        println!("The dataset is empty");
        return Ok(());
    };

    // Jump straight to the month instead of animating towards it.
    let controller = atlas.controller_mut();
    if let Some(id) = dataset.index_of(month).and_then(|i| controller.seek_month(i)) {
        controller.complete_transition(id);
    }

    let live = controller.live_aggregate();
    println!("\n{} ({})", controller.current_month().unwrap_or(month), controller.metric());
    println!("{:<8} {:>8} {:>8} {:>8} {:>9}", "province", "avg °C", "min °C", "max °C", "stations");
    for (name, stats) in live {
        let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{v:.1}"));
        println!(
            "{:<8} {:>8} {:>8} {:>8} {:>9}",
            name,
            fmt(stats.avg_temperature),
            fmt(stats.min_temperature),
            fmt(stats.max_temperature),
            stats.station_count
        );
    }

    if let Some(station) = dataset.records(month).first() {
        let series = dataset.station_year_series(&station.name, month.year());
        println!("\n{} in {}:", series.name, series.year);
        for (i, (t, p)) in series.temperature.iter().zip(&series.precipitation).enumerate() {
            println!("  {:02}: {:?} °C, {:?} mm", i + 1, t, p);
        }
    }
    Ok(())
}
