use crate::dataset::error::DatasetError;
use crate::dataset::weather_dataset::WeatherDataset;
use crate::source::fetcher::{DataSource, SourceFetcher};
use crate::source::progress::{report, LoadProgress, ProgressSender};
use log::info;
use tokio::task;

impl WeatherDataset {
    /// Fetches and parses a dataset source, reporting progress on `progress`.
    ///
    /// Parsing runs on the blocking pool; a national dataset is tens of megabytes.
    pub async fn load(
        fetcher: &SourceFetcher,
        source: &DataSource,
        progress: Option<&ProgressSender>,
    ) -> Result<Self, DatasetError> {
        let label = source.to_string();
        report(progress, LoadProgress::Started { source: label.clone() });

        let result = Self::fetch_and_parse(fetcher, source, progress).await;
        match &result {
            Ok(dataset) => {
                info!(
                    "Loaded weather dataset with {} months from {}",
                    dataset.months().len(),
                    label
                );
                report(
                    progress,
                    LoadProgress::Completed {
                        source: label,
                        items: dataset.months().len(),
                    },
                );
            }
            Err(e) => report(
                progress,
                LoadProgress::Failed {
                    source: label,
                    message: e.to_string(),
                },
            ),
        }
        result
    }

    async fn fetch_and_parse(
        fetcher: &SourceFetcher,
        source: &DataSource,
        progress: Option<&ProgressSender>,
    ) -> Result<Self, DatasetError> {
        let bytes = fetcher.fetch(source).await?;
        report(
            progress,
            LoadProgress::Parsing {
                source: source.to_string(),
                bytes: bytes.len(),
            },
        );
        task::spawn_blocking(move || Self::from_json(&bytes)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn test_load_from_file_reports_progress() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"data": {"2021-03": [{"name": "A", "lat": 1.0, "lng": 2.0, "temperature": 9.0}]}}"#,
        )
        .unwrap();
        let source = DataSource::file(file.path());
        let (tx, mut rx) = unbounded_channel();

        let dataset = WeatherDataset::load(&SourceFetcher::new(), &source, Some(&tx))
            .await
            .unwrap();
        assert_eq!(dataset.months().len(), 1);

        assert!(matches!(rx.recv().await, Some(LoadProgress::Started { .. })));
        assert!(matches!(rx.recv().await, Some(LoadProgress::Parsing { bytes, .. }) if bytes > 0));
        assert!(matches!(
            rx.recv().await,
            Some(LoadProgress::Completed { items: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_parse_failure_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ this is not json").unwrap();
        let source = DataSource::file(file.path());
        let (tx, mut rx) = unbounded_channel();

        let result = WeatherDataset::load(&SourceFetcher::new(), &source, Some(&tx)).await;
        assert!(matches!(result, Err(DatasetError::JsonParse(_))));

        assert!(matches!(rx.recv().await, Some(LoadProgress::Started { .. })));
        assert!(matches!(rx.recv().await, Some(LoadProgress::Parsing { .. })));
        assert!(matches!(rx.recv().await, Some(LoadProgress::Failed { .. })));
    }
}
