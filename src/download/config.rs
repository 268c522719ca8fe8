//!
//! 配置模块
//!

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};
use headers::HeaderMapExt;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Request};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Number of ranges (and concurrent workers) per download.
    pub worker_count: usize,
    /// Extra attempts when a connection cannot be established.
    pub connect_retries: u8,
    /// Treat `200 OK` to a ranged request as an error instead of slicing the full body.
    pub strict_range_support: bool,
    pub request_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub headers: HashMap<String, String>,
    pub download_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl DownloaderConfig {
    pub fn load_from_file(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref();
        let config_data = fs::read_to_string(file_path)
            .with_context(|| format!("Read config failed: {}", file_path.display()))?;
        let config: DownloaderConfig = serde_json::from_str(&config_data)
            .with_context(|| format!("Parse config failed: {}", file_path.display()))?;

        Ok(config)
    }

    pub fn build_client(&self) -> reqwest::Result<Client> {
        let mut builder = Client::builder();
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }

    /// 构造 GET 请求模板, 每个 range 再在其上插入 Range 头
    pub fn create_http_request(&self, url: &Url) -> Result<Request> {
        let mut request = Request::new(reqwest::Method::GET, url.clone());
        let header_map = request.headers_mut();

        header_map.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));
        header_map.typed_insert(headers::Connection::keep_alive());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name: {name}"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {name}"))?;
            header_map.insert(name, value);
        }

        *request.timeout_mut() = self.request_timeout_secs.map(Duration::from_secs);

        Ok(request)
    }

    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.download_dir.join(file_name)
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            connect_retries: 3,
            strict_range_support: false,
            request_timeout_secs: None,
            user_agent: None,
            headers: HashMap::new(),
            download_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            log_file: None,
        }
    }
}
