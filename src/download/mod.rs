use std::path::Path;
use url::Url;

pub mod chunk_item;
pub mod chunk_manager;
pub mod chunk_range;
pub mod config;
pub mod downloader;
pub mod error;
pub mod logger;
pub mod output_file;
pub mod single;
pub mod util;

use config::DownloaderConfig;
use downloader::{DownloadSummary, Downloader};
use error::{DownloadError, FetchCause, FetchError};
use single::SingleDownloader;

/// Concurrent range download with the default configuration.
pub async fn download(url: &Url, destination: impl AsRef<Path>, worker_count: usize) -> Result<DownloadSummary, DownloadError> {
    let downloader = Downloader::from_config(DownloaderConfig::default())
        .map_err(|err| DownloadError::InvalidConfig(err.to_string()))?;

    downloader.download(url, destination, worker_count).await
}

/// Single-stream download with the default configuration.
pub async fn download_single(url: &Url, destination: impl AsRef<Path>) -> Result<u64, FetchError> {
    let downloader = SingleDownloader::from_config(DownloaderConfig::default())
        .map_err(|err| FetchError::new(None, FetchCause::Transport(err)))?;

    downloader.download(url, destination).await
}
