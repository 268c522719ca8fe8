//!
//! # 输出文件模块
//! 所有 worker 共享同一个文件句柄, 每个 worker 只能写自己负责的范围
//!

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use bytes::Bytes;
use tokio::io;
use crate::download::chunk_range::ChunkRange;

/// 预先设置好长度的输出文件, 使用定位写入而非共享游标, 可在多个任务间 clone 共享
#[derive(Debug, Clone)]
pub struct OutputFile {
    file: Arc<File>,
    path: PathBuf,
    len: u64,
}

impl OutputFile {
    /// Creates (or truncates) the file at `path` and sizes it to `len` bytes.
    pub async fn create(path: impl AsRef<Path>, len: u64) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::File::create(&path).await?;
        file.set_len(len).await?;

        Ok(Self {
            file: Arc::new(file.into_std().await),
            path,
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    /// Hands out a write capability limited to `range`.
    pub fn range_writer(&self, range: ChunkRange) -> RangeWriter {
        RangeWriter {
            file: self.clone(),
            range,
            written: 0,
        }
    }

    pub async fn write_at(&self, offset: u64, data: Bytes) -> io::Result<()> {
        if offset + data.len() as u64 > self.len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("write of {} bytes at {} is past the end of the file ({})", data.len(), offset, self.len),
            ));
        }

        let file = self.file.clone();
        tokio::task::spawn_blocking(move || write_all_at(&file, &data, offset)).await?
    }

    pub async fn sync_all(&self) -> io::Result<()> {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || file.sync_all()).await?
    }
}

/// 只允许在 `range` 内顺序写入
#[derive(Debug)]
pub struct RangeWriter {
    file: OutputFile,
    range: ChunkRange,
    written: u64,
}

impl RangeWriter {
    pub fn range(&self) -> ChunkRange {
        self.range
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn remaining(&self) -> u64 {
        self.range.len() - self.written
    }

    /// Writes `data` right after the bytes already written in this range.
    pub async fn write(&mut self, data: Bytes) -> io::Result<()> {
        if data.len() as u64 > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} bytes do not fit in the {} bytes left of {}", data.len(), self.remaining(), self.range),
            ));
        }

        let len = data.len() as u64;
        self.file.write_at(self.range.start + self.written, data).await?;
        self.written += len;

        Ok(())
    }
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => return Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole buffer")),
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }

    Ok(())
}
