use std::path::Path;
use std::sync::Arc;
use futures_util::StreamExt;
use log::{debug, info};
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;
use crate::download::config::DownloaderConfig;
use crate::download::error::{FetchCause, FetchError};
use crate::download::util::send_with_retry;

/// 单连接下载, 不发送 Range 头, 作为并发下载的对照
pub struct SingleDownloader {
    client: Client,
    config: Arc<DownloaderConfig>,
}

impl SingleDownloader {
    pub fn new(client: Client, config: Arc<DownloaderConfig>) -> Self {
        Self { client, config }
    }

    pub fn from_config(config: DownloaderConfig) -> reqwest::Result<Self> {
        let client = config.build_client()?;
        Ok(Self::new(client, Arc::new(config)))
    }

    /// Streams the whole body of `url` into a freshly created `destination`.
    pub async fn download(&self, url: &Url, destination: impl AsRef<Path>) -> Result<u64, FetchError> {
        let fail = |cause: FetchCause| FetchError::new(None, cause);
        let destination = destination.as_ref();

        let request = self.config.create_http_request(url)
            .map_err(|err| fail(FetchCause::InvalidRequest(format!("{err:#}"))))?;

        debug!("Fetching {} as a single stream", url);
        let response = send_with_retry(&self.client, request, self.config.connect_retries)
            .await
            .map_err(|err| fail(err.into()))?;
        if !response.status().is_success() {
            return Err(fail(FetchCause::UnexpectedStatus(response.status())));
        }
        let expected = response.content_length();

        let file = File::create(destination).await.map_err(|err| fail(err.into()))?;
        let mut writer = BufWriter::new(file);
        let mut written = 0u64;

        let mut stream = response.bytes_stream();
        while let Some(bytes) = stream.next().await {
            let bytes = bytes.map_err(|err| fail(err.into()))?;
            writer.write_all(&bytes).await.map_err(|err| fail(err.into()))?;
            written += bytes.len() as u64;
        }

        writer.flush().await.map_err(|err| fail(err.into()))?;
        writer.get_ref().sync_all().await.map_err(|err| fail(err.into()))?;

        if let Some(expected) = expected {
            if written < expected {
                return Err(fail(FetchCause::Truncated { expected, received: written }));
            }
        }

        info!("Download completed: {} ({} bytes)", destination.display(), written);
        Ok(written)
    }
}
