use crate::source::error::SourceError;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio_util::io::StreamReader;

/// Where a read-only input (the dataset or the province boundaries) comes from.
///
/// Sources whose path or URL ends in `.gz` are gunzipped after reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DataSource::File(path.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        DataSource::Url(url.into())
    }

    fn is_gzip(&self) -> bool {
        match self {
            DataSource::File(path) => path.extension().is_some_and(|ext| ext == "gz"),
            DataSource::Url(url) => url
                .split(['?', '#'])
                .next()
                .is_some_and(|path| path.ends_with(".gz")),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Reads sources into memory. One fetch per source; nothing is retried or cached.
#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    download_client: Client,
}

impl SourceFetcher {
    pub fn new() -> SourceFetcher {
        SourceFetcher {
            download_client: Client::new(),
        }
    }

    /// Returns the complete (decompressed) body of `source`.
    pub async fn fetch(&self, source: &DataSource) -> Result<Vec<u8>, SourceError> {
        match source {
            DataSource::File(path) => Self::read_file(path, source.is_gzip()).await,
            DataSource::Url(url) => self.download(url, source.is_gzip()).await,
        }
    }

    async fn read_file(path: &Path, gzip: bool) -> Result<Vec<u8>, SourceError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| SourceError::FileRead(path.to_path_buf(), e))?;
        let bytes = Self::read_all(BufReader::new(file), gzip)
            .await
            .map_err(|e| SourceError::FileRead(path.to_path_buf(), e))?;
        info!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(bytes)
    }

    async fn download(&self, url: &str, gzip: bool) -> Result<Vec<u8>, SourceError> {
        info!("Downloading data from {}", url);

        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    SourceError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    SourceError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let stream_reader = StreamReader::new(stream);
        let bytes = Self::read_all(stream_reader, gzip)
            .await
            .map_err(|e| SourceError::DownloadIo(url.to_string(), e))?;
        info!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }

    async fn read_all<R>(reader: R, gzip: bool) -> io::Result<Vec<u8>>
    where
        R: tokio::io::AsyncBufRead + AsyncRead + Unpin,
    {
        let mut bytes = Vec::new();
        if gzip {
            GzipDecoder::new(reader).read_to_end(&mut bytes).await?;
        } else {
            let mut reader = reader;
            reader.read_to_end(&mut bytes).await?;
        }
        Ok(bytes)
    }
}
