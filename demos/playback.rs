// demos/playback.rs
use province_weather::{AtlasError, DataSource, PlaybackConfig, WeatherAtlas};
use std::env;
use std::time::Duration;

fn source(arg: String) -> DataSource {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        DataSource::url(arg)
    } else {
        DataSource::file(arg)
    }
}

#[tokio::main]
async fn main() -> Result<(), AtlasError> {
    // Set RUST_LOG=info (or debug) to see loading and playback messages
    env_logger::init();

    let mut args = env::args().skip(1);
    let dataset = args
        .next()
        .map(source)
        .unwrap_or_else(|| DataSource::file("data/weather_data.json.gz"));
    let boundaries = args.next().map(source);

    let config = PlaybackConfig::builder()
        .tick_period(Duration::from_millis(800))
        .transition_duration(Duration::from_millis(400))
        .build();
    let atlas = WeatherAtlas::load()
        .dataset(dataset)
        .maybe_boundaries(boundaries)
        .config(config)
        .call()
        .await?;

    let months = atlas.dataset().months().len();
    let (handle, mut frames, task) = atlas.into_playback();
    if handle.play().await.is_err() {
        return Ok(());
    }

    let mut shown = 0;
    while let Some(frame) = frames.recv().await {
        if frame.progress.is_some() {
            continue;
        }
        let warmest = frame
            .provinces
            .iter()
            .filter_map(|(name, p)| p.stats.avg_temperature.map(|t| (name, t)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        println!(
            "{} | {:>3} provinces | {:>4} stations | warmest: {:?}",
            frame.month,
            frame.provinces.len(),
            frame.points.len(),
            warmest
        );
        shown += 1;
        if shown > months.min(12) {
            break;
        }
    }

    let _ = handle.shutdown().await;
    if let Ok(controller) = task.await {
        println!(
            "Stopped at {:?}; {} coordinates resolved",
            controller.current_month(),
            controller.resolver().cache_len()
        );
    }
    Ok(())
}
