use crate::dataset::weather_dataset::WeatherDataset;
use crate::error::AtlasError;
use crate::playback::config::PlaybackConfig;
use crate::playback::controller::{PlaybackController, PlaybackFrame};
use crate::playback::runner::{spawn_playback, PlaybackHandle};
use crate::provinces::boundary::{BoundarySet, DEFAULT_NAME_PROPERTY};
use crate::provinces::resolver::ProvinceResolver;
use crate::source::fetcher::{DataSource, SourceFetcher};
use crate::source::progress::ProgressSender;
use bon::bon;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;

/// The main entry point: a loaded dataset with its playback session.
///
/// # Examples
///
/// ```rust,no_run
/// # use province_weather::{AtlasError, DataSource, WeatherAtlas};
/// # async fn run() -> Result<(), AtlasError> {
/// let atlas = WeatherAtlas::load()
///     .dataset(DataSource::file("data/weather_data.json.gz"))
///     .boundaries(DataSource::url("https://example.com/china_provinces.geojson"))
///     .call()
///     .await?;
///
/// let frame = atlas.controller().frame();
/// println!("{:?}", frame.map(|f| f.provinces.len()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WeatherAtlas {
    fetcher: SourceFetcher,
    controller: PlaybackController,
    config: PlaybackConfig,
}

#[bon]
impl WeatherAtlas {
    /// Loads the dataset and, if given, the province boundaries concurrently.
    ///
    /// # Arguments
    ///
    /// * `.dataset(DataSource)`: **Required.** The monthly station dataset (`.gz` is decompressed).
    /// * `.boundaries(DataSource)`: Optional. A GeoJSON FeatureCollection of provinces.
    /// * `.name_property(impl Into<String>)`: Optional. Feature property holding the
    ///   province name. Defaults to `"name"`.
    /// * `.config(PlaybackConfig)`: Optional. Defaults to [`PlaybackConfig::default`].
    /// * `.progress(ProgressSender)`: Optional. Receives [`crate::LoadProgress`] events for both sources.
    ///
    /// # Errors
    ///
    /// Returns [`AtlasError::Dataset`] if the dataset cannot be fetched or parsed.
    /// A failing boundary source is not an error: it is logged and reported on
    /// `progress`, and every station then resolves to the unknown province.
    #[builder]
    pub async fn load(
        dataset: DataSource,
        boundaries: Option<DataSource>,
        #[builder(into)] name_property: Option<String>,
        config: Option<PlaybackConfig>,
        progress: Option<ProgressSender>,
    ) -> Result<Self, AtlasError> {
        let fetcher = SourceFetcher::new();
        let config = config.unwrap_or_default();
        let name_property = name_property.unwrap_or_else(|| DEFAULT_NAME_PROPERTY.to_string());

        let load_boundaries = async {
            match &boundaries {
                Some(source) => {
                    BoundarySet::load(&fetcher, source, &name_property, progress.as_ref())
                        .await
                        .map(Some)
                }
                None => Ok(None),
            }
        };
        let (dataset, boundaries) = tokio::join!(
            WeatherDataset::load(&fetcher, &dataset, progress.as_ref()),
            load_boundaries
        );
        let dataset = dataset?;

        let resolver = match boundaries {
            Ok(Some(set)) => ProvinceResolver::with_locator(set),
            Ok(None) => ProvinceResolver::new(),
            Err(e) => {
                warn!("Province boundaries unavailable, stations will not be attributed: {}", e);
                ProvinceResolver::new()
            }
        };

        let controller = PlaybackController::new(Arc::new(dataset), resolver, config.metric);
        info!(
            "Weather atlas ready: {} months, boundaries {}",
            controller.dataset().months().len(),
            if controller.resolver().has_boundaries() {
                "loaded"
            } else {
                "missing"
            }
        );
        Ok(Self {
            fetcher,
            controller,
            config,
        })
    }

    /// Loads province boundaries after the fact, e.g. to retry a failed source.
    ///
    /// Already resolved coordinates keep their cached province.
    #[builder]
    pub async fn attach_boundaries(
        &mut self,
        source: DataSource,
        #[builder(into)] name_property: Option<String>,
        progress: Option<ProgressSender>,
    ) -> Result<(), AtlasError> {
        let name_property = name_property.unwrap_or_else(|| DEFAULT_NAME_PROPERTY.to_string());
        let set =
            BoundarySet::load(&self.fetcher, &source, &name_property, progress.as_ref()).await?;
        self.controller.attach_boundaries(set);
        Ok(())
    }
}

impl WeatherAtlas {
    pub fn dataset(&self) -> &Arc<WeatherDataset> {
        self.controller.dataset()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Direct access for driving playback manually, without the async runner.
    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }

    /// Hands the session to a playback task. See [`spawn_playback`].
    pub fn into_playback(
        self,
    ) -> (
        PlaybackHandle,
        Receiver<PlaybackFrame>,
        JoinHandle<PlaybackController>,
    ) {
        spawn_playback(self.controller, self.config)
    }
}
