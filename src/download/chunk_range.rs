use std::collections::Bound;
use std::fmt;
use std::ops::RangeBounds;
use serde::{Deserialize, Serialize};
use crate::download::error::PlanError;

/// 资源中的一段字节范围, `start` 与 `end` 均为闭区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "chunk range start {start} is past end {end}");
        Self { start, end }
    }

    pub fn from_len(start: u64, len: u64) -> Self {
        debug_assert!(len > 0, "chunk range cannot be empty");
        Self::new(start, start + len - 1)
    }

    pub fn len(&self) -> u64 {
        (self.end - self.start) + 1
    }

    pub fn contains(&self, offset: u64) -> bool {
        self.start <= offset && offset <= self.end
    }

    pub fn to_range_header(&self) -> headers::Range {
        headers::Range::bytes(self).expect("chunk range start never exceeds its end")
    }
}

impl fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes {}-{}", self.start, self.end)
    }
}

/// 为 ChunkRange 实现范围 trait: start..=end
impl<'a> RangeBounds<u64> for &'a ChunkRange {
    fn start_bound(&self) -> Bound<&u64> {
        Bound::Included(&self.start)
    }

    fn end_bound(&self) -> Bound<&u64> {
        Bound::Included(&self.end)
    }
}

/// Splits `total_size` bytes into at most `worker_count` contiguous ranges.
///
/// Every range but the last is `ceil(total_size / worker_count)` bytes long.
/// When there are more workers than chunks needed (e.g. `total_size < worker_count`)
/// fewer ranges are produced, never an empty one.
pub fn plan_chunks(total_size: u64, worker_count: usize) -> Result<Vec<ChunkRange>, PlanError> {
    if total_size == 0 {
        return Err(PlanError::InvalidSize);
    }
    if worker_count == 0 {
        return Err(PlanError::InvalidArgument(worker_count));
    }

    let chunk_size = total_size.div_ceil(worker_count as u64);
    let mut ranges = Vec::with_capacity(total_size.div_ceil(chunk_size) as usize);

    for i in 0..worker_count as u64 {
        let start = match i.checked_mul(chunk_size) {
            Some(start) if start < total_size => start,
            _ => break,
        };

        // chunk_size * worker_count may exceed total_size, keep the sum below it
        let end = start + (chunk_size - 1).min(total_size - 1 - start);
        ranges.push(ChunkRange::new(start, end));
    }

    Ok(ranges)
}
