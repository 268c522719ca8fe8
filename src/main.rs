use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use url::Url;
use range_downloader::download::logger::setup_logger;
use range_downloader::{timed, Downloader, DownloaderConfig, SingleDownloader};

use crate::cli::CliArgs;

mod cli;

fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("download.bin")
        .to_string()
}

/// 基准测试使用的临时文件, 与输出文件同目录且当前不存在
fn bench_path(output: &Path) -> (PathBuf, PathBuf) {
    let dir = output.parent()
        .map(PathBuf::from)
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));
    let name = output.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download.bin".to_string());

    let mut n = 0u32;
    loop {
        let path = dir.join(format!("{}.bench{}", name, n));
        if !path.exists() {
            return (dir, path);
        }
        n += 1;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => DownloaderConfig::load_from_file(path)?,
        None => DownloaderConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file.clone();
    }

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    setup_logger(level, config.log_file.as_deref())?;

    let url = Url::parse(&args.url).with_context(|| format!("Invalid url: {}", args.url))?;
    let output = args.output.clone()
        .unwrap_or_else(|| config.file_path(&file_name_from_url(&url)));
    let worker_count = config.worker_count;

    let client = config.build_client().context("Failed to build http client")?;
    let config = std::sync::Arc::new(config);
    let downloader = Downloader::new(client.clone(), config.clone());
    let single_downloader = SingleDownloader::new(client, config);

    if args.bench {
        // the timers only remove files they did not see at start, so never bench into `output`
        let (dir, scratch) = bench_path(&output);

        let (result, single_report) = timed("single stream", &dir, single_downloader.download(&url, &scratch)).await?;
        result.context("Single stream download failed")?;

        let (result, range_report) = timed(format!("{} ranges", worker_count), &dir, downloader.download(&url, &scratch, worker_count)).await?;
        result.context("Concurrent download failed")?;

        println!("{}: {:.3?}", single_report.label, single_report.elapsed);
        println!("{}: {:.3?}", range_report.label, range_report.elapsed);
        return Ok(());
    }

    if args.single {
        let written = single_downloader.download(&url, &output).await?;
        println!("Downloaded {} bytes to {:?}", written, output);
    } else {
        let summary = downloader.download(&url, &output, worker_count).await?;
        println!("Downloaded {} bytes in {} ranges to {:?}", summary.total_size, summary.ranges.len(), summary.path);
    }

    Ok(())
}
