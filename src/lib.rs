pub mod download;
pub mod timer;

pub use download::chunk_range::{plan_chunks, ChunkRange};
pub use download::config::DownloaderConfig;
pub use download::downloader::{DownloadStatus, DownloadSummary, Downloader};
pub use download::error::{DownloadError, FetchCause, FetchError, PlanError, ProbeError};
pub use download::single::SingleDownloader;
pub use download::{download, download_single};
pub use timer::{timed, Timer, TimerReport};
