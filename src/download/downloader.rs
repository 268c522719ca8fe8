use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{info, error};
use reqwest::Client;
use tokio::sync::watch;
use url::Url;
use crate::download::chunk_manager::ChunkManager;
use crate::download::chunk_range::{plan_chunks, ChunkRange};
use crate::download::config::DownloaderConfig;
use crate::download::error::{DownloadError, FetchError};
use crate::download::output_file::OutputFile;
use crate::download::util::probe_content_length;

/// 下载器的状态, 所有 worker 结束之前不会离开 `Downloading`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Idle,
    Probing,
    Planning,
    Downloading,
    Completed,
    PartiallyFailed,
    /// Probe, plan or file preparation failed before any worker started.
    Failed,
}

/// 一次下载的计划, 下载结束后即丢弃
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: Url,
    pub destination: PathBuf,
    pub total_size: u64,
    pub ranges: Vec<ChunkRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub path: PathBuf,
    pub total_size: u64,
    pub ranges: Vec<ChunkRange>,
}

/// 多连接下载器: HEAD 获取大小, 切分 range, 预分配文件, 每个 range 一个任务
pub struct Downloader {
    client: Client,
    config: Arc<DownloaderConfig>,
    status_sender: watch::Sender<DownloadStatus>,
}

impl Downloader {
    pub fn new(client: Client, config: Arc<DownloaderConfig>) -> Self {
        let (status_sender, _) = watch::channel(DownloadStatus::Idle);

        Self {
            client,
            config,
            status_sender,
        }
    }

    pub fn from_config(config: DownloaderConfig) -> reqwest::Result<Self> {
        let client = config.build_client()?;
        Ok(Self::new(client, Arc::new(config)))
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    pub fn status(&self) -> DownloadStatus {
        *self.status_sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DownloadStatus> {
        self.status_sender.subscribe()
    }

    fn set_status(&self, status: DownloadStatus) {
        self.status_sender.send_replace(status);
    }

    /// Downloads `url` into `destination` with `worker_count` concurrent ranges.
    ///
    /// On [`DownloadError::PartialFailure`] the destination exists at full size but
    /// the failed ranges hold zeroes (or stale bytes); it must not be treated as complete.
    pub async fn download(&self, url: &Url, destination: impl AsRef<Path>, worker_count: usize) -> Result<DownloadSummary, DownloadError> {
        let result = self.run_download(url, destination.as_ref(), worker_count).await;
        match &result {
            Ok(summary) => {
                self.set_status(DownloadStatus::Completed);
                info!("Download completed: {} ({} bytes)", summary.path.display(), summary.total_size);
            }
            Err(DownloadError::PartialFailure { path, partial_failures }) => {
                self.set_status(DownloadStatus::PartiallyFailed);
                error!("Download incomplete: {} ({} ranges failed)", path.display(), partial_failures.len());
            }
            Err(err) => {
                self.set_status(DownloadStatus::Failed);
                error!("Download failed: {}", err);
            }
        }

        result
    }

    async fn run_download(&self, url: &Url, destination: &Path, worker_count: usize) -> Result<DownloadSummary, DownloadError> {
        let request = self.config.create_http_request(url)
            .map_err(|err| DownloadError::InvalidConfig(format!("{err:#}")))?;

        self.set_status(DownloadStatus::Probing);
        let total_size = probe_content_length(&self.client, &request, self.config.connect_retries).await?;

        self.set_status(DownloadStatus::Planning);
        let job = DownloadJob {
            url: url.clone(),
            destination: destination.to_path_buf(),
            total_size,
            ranges: plan_chunks(total_size, worker_count)?,
        };
        info!("Downloading {} ({} bytes) in {} ranges", job.url, job.total_size, job.ranges.len());

        let file = OutputFile::create(&job.destination, job.total_size).await?;

        self.set_status(DownloadStatus::Downloading);
        let chunk_manager = ChunkManager::new(
            self.client.clone(),
            request,
            self.config.connect_retries,
            self.config.strict_range_support,
        );
        let results = chunk_manager.download(&job.ranges, &file).await;

        let partial_failures: Vec<FetchError> = results.into_iter().filter_map(Result::err).collect();
        if !partial_failures.is_empty() {
            return Err(DownloadError::PartialFailure {
                path: job.destination,
                partial_failures,
            });
        }

        file.sync_all().await?;

        Ok(DownloadSummary {
            path: job.destination,
            total_size: job.total_size,
            ranges: job.ranges,
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use super::*;
    use crate::download::error::{PlanError, ProbeError};

    fn create_downloader() -> Downloader {
        Downloader::from_config(DownloaderConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn should_fail_when_probe_fails() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = create_downloader();
        let url = Url::parse(&server.uri()).unwrap();

        let err = downloader.download(&url, dir.path().join("out.bin"), 2).await.unwrap_err();

        assert!(matches!(err, DownloadError::Probe(ProbeError::UnexpectedStatus(_))));
        assert_eq!(downloader.status(), DownloadStatus::Failed);
        assert!(!dir.path().join("out.bin").exists());
    }

    #[tokio::test]
    async fn should_reject_empty_resource() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-length", "0"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = create_downloader();
        let url = Url::parse(&server.uri()).unwrap();

        let err = downloader.download(&url, dir.path().join("out.bin"), 2).await.unwrap_err();
        assert!(matches!(err, DownloadError::Plan(PlanError::InvalidSize)));
    }

    #[tokio::test]
    async fn should_reject_zero_workers() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-length", "10"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = create_downloader();
        let url = Url::parse(&server.uri()).unwrap();

        let err = downloader.download(&url, dir.path().join("out.bin"), 0).await.unwrap_err();
        assert!(matches!(err, DownloadError::Plan(PlanError::InvalidArgument(0))));
        assert!(err.failed_ranges().is_empty());
    }

    #[test]
    fn should_start_idle() {
        let downloader = create_downloader();
        assert_eq!(downloader.status(), DownloadStatus::Idle);
        assert_eq!(*downloader.subscribe().borrow(), DownloadStatus::Idle);
    }
}
