//!
//! # 计时模块
//! 记录一段任务的耗时, 结束时删除期间在目录中新建的文件
//!

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use log::{info, warn};

#[derive(Debug, Clone)]
pub struct TimerReport {
    pub label: String,
    pub elapsed: Duration,
    /// Files created while the timer ran, now deleted.
    pub removed: Vec<PathBuf>,
}

/// Scoped timer over a directory.
///
/// [`Timer::stop`] reports the elapsed time and removes every regular file that
/// appeared in `dir` since [`Timer::start`]. If the timer is dropped without
/// `stop` (panic, early return, cancelled future) the same cleanup runs in `Drop`.
pub struct Timer {
    label: String,
    dir: PathBuf,
    started: Instant,
    preexisting: HashSet<OsString>,
    finished: bool,
}

impl Timer {
    pub fn start(label: impl Into<String>, dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let preexisting = list_dir(&dir)?.into_iter().collect();

        Ok(Self {
            label: label.into(),
            dir,
            started: Instant::now(),
            preexisting,
            finished: false,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn stop(mut self) -> TimerReport {
        self.finish()
    }

    fn finish(&mut self) -> TimerReport {
        self.finished = true;
        let elapsed = self.elapsed();
        info!("{}: {:.3?}", self.label, elapsed);

        TimerReport {
            label: self.label.clone(),
            elapsed,
            removed: self.remove_new_files(),
        }
    }

    fn remove_new_files(&self) -> Vec<PathBuf> {
        let entries = match list_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Failed to list {}: {}", self.dir.display(), err);
                return Vec::new();
            }
        };

        let mut removed = Vec::new();
        for name in entries {
            if self.preexisting.contains(&name) {
                continue;
            }

            let path = self.dir.join(&name);
            if !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(err) => warn!("Failed to remove {}: {}", path.display(), err),
            }
        }

        removed
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.finished {
            self.finish();
        }
    }
}

fn list_dir(dir: &Path) -> io::Result<Vec<OsString>> {
    fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.file_name()))
        .collect()
}

/// Runs `future` inside a [`Timer`], returning its output untouched along with the report.
///
/// Cleanup happens whether the output is an error or not, and also if the
/// returned future is dropped before completion.
pub async fn timed<F, T>(label: impl Into<String>, dir: impl AsRef<Path>, future: F) -> io::Result<(T, TimerReport)>
where
    F: Future<Output = T>,
{
    let timer = Timer::start(label, dir)?;
    let output = future.await;

    Ok((output, timer.stop()))
}
