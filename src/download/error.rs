use std::path::PathBuf;
use reqwest::StatusCode;
use thiserror::Error;
use tokio::io;
use crate::download::chunk_range::ChunkRange;

/// 切分范围时的参数错误, 属于调用方的 bug
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Resource size must be greater than zero")]
    InvalidSize,

    #[error("Worker count must be at least 1, got {0}")]
    InvalidArgument(usize),
}

/// 获取资源大小失败
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("HEAD request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HEAD request returned HTTP {0}")]
    UnexpectedStatus(StatusCode),

    #[error("Content-Length is missing or not a number")]
    SizeUnavailable,
}

#[derive(Error, Debug)]
pub enum FetchCause {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(StatusCode),

    #[error("server sent bytes {received:?} instead of {expected}")]
    RangeMismatch { expected: ChunkRange, received: Option<(u64, u64)> },

    #[error("truncated body: expected {expected} bytes, received {received}")]
    Truncated { expected: u64, received: u64 },

    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("worker did not finish: {0}")]
    Aborted(String),
}

/// 单个 range (或整个资源) 的下载失败
#[derive(Error, Debug)]
#[error("{}: {cause}", .range.map_or_else(|| "whole resource".to_string(), |range| range.to_string()))]
pub struct FetchError {
    /// `None` for a single-stream download.
    pub range: Option<ChunkRange>,
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(range: Option<ChunkRange>, cause: impl Into<FetchCause>) -> Self {
        Self { range, cause: cause.into() }
    }
}

/// 下载中发生的错误
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid request configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to determine resource size: {0}")]
    Probe(#[from] ProbeError),

    #[error("Invalid download plan: {0}")]
    Plan(#[from] PlanError),

    #[error("Failed to prepare output file: {0}")]
    IOError(#[from] io::Error),

    /// At least one range failed. The file at `path` exists but is incomplete.
    #[error("{} of the ranges failed, {path:?} is incomplete", .partial_failures.len())]
    PartialFailure {
        path: PathBuf,
        partial_failures: Vec<FetchError>,
    },
}

impl DownloadError {
    /// Ranges that failed, empty unless this is a partial failure.
    pub fn failed_ranges(&self) -> Vec<ChunkRange> {
        match self {
            DownloadError::PartialFailure { partial_failures, .. } => {
                partial_failures.iter().filter_map(|failure| failure.range).collect()
            }
            _ => Vec::new(),
        }
    }
}
