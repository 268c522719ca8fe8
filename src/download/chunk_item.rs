use bytes::{Buf, Bytes, BytesMut};
use futures_util::StreamExt;
use headers::HeaderMapExt;
use log::{debug, warn};
use reqwest::{Client, Request, StatusCode};
use crate::download::chunk_range::ChunkRange;
use crate::download::error::{FetchCause, FetchError};
use crate::download::output_file::RangeWriter;
use crate::download::util::{clone_request, send_with_retry};

/// 缓冲达到该大小时写入文件
const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// 下载一个 range 并写入文件中对应的位置
pub struct ChunkItem {
    client: Client,
    request: Request,
    connect_retries: u8,
    strict_range_support: bool,
}

impl ChunkItem {
    pub fn new(client: Client, request: Request, connect_retries: u8, strict_range_support: bool) -> Self {
        Self {
            client,
            request,
            connect_retries,
            strict_range_support,
        }
    }

    /// Fetches `writer.range()` and writes it through `writer`, returning the bytes written.
    ///
    /// A `206` body is written as is once its `Content-Range` matches the request.
    /// A `200` body (server ignored `Range`) is sliced down to the range unless
    /// strict range support is configured.
    /// Nothing is retried here besides connection establishment.
    pub async fn download(&self, mut writer: RangeWriter) -> Result<u64, FetchError> {
        let range = writer.range();
        let fail = |cause: FetchCause| FetchError::new(Some(range), cause);

        // 写入 range 头
        let mut range_request = clone_request(&self.request);
        range_request.headers_mut().typed_insert(range.to_range_header());

        debug!("Fetching {} of {}", range, self.request.url());
        let response = send_with_retry(&self.client, range_request, self.connect_retries)
            .await
            .map_err(|err| fail(err.into()))?;

        let mut skip = match response.status() {
            StatusCode::PARTIAL_CONTENT => {
                let served = response.headers()
                    .typed_get::<headers::ContentRange>()
                    .and_then(|content_range| content_range.bytes_range());
                if served != Some((range.start, range.end)) {
                    return Err(fail(FetchCause::RangeMismatch { expected: range, received: served }));
                }
                0
            }
            StatusCode::OK if !self.strict_range_support => {
                warn!("Server ignored Range header for {}, slicing the full body", range);
                range.start
            }
            status => return Err(fail(FetchCause::UnexpectedStatus(status))),
        };

        let mut buffer = BytesMut::with_capacity(WRITE_BUFFER_SIZE.min(range.len() as usize));
        let mut stream = response.bytes_stream();
        while let Some(bytes) = stream.next().await {
            let mut bytes = bytes.map_err(|err| fail(err.into()))?;

            if skip > 0 {
                let n = skip.min(bytes.len() as u64) as usize;
                bytes.advance(n);
                skip -= n as u64;
            }

            let wanted = writer.remaining() - buffer.len() as u64;
            if bytes.len() as u64 > wanted {
                warn!("Body for {} is longer than the range, dropping the excess", range);
                bytes.truncate(wanted as usize);
            }
            buffer.extend_from_slice(&bytes);

            if buffer.len() >= WRITE_BUFFER_SIZE {
                flush(&mut writer, &mut buffer).await.map_err(|err| fail(err.into()))?;
            }
            if writer.remaining() == buffer.len() as u64 {
                break;
            }
        }

        flush(&mut writer, &mut buffer).await.map_err(|err| fail(err.into()))?;

        if writer.remaining() > 0 {
            return Err(fail(FetchCause::Truncated {
                expected: range.len(),
                received: writer.written(),
            }));
        }

        debug!("Finished {}", range);
        Ok(writer.written())
    }
}

async fn flush(writer: &mut RangeWriter, buffer: &mut BytesMut) -> std::io::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }

    let data: Bytes = buffer.split().freeze();
    writer.write(data).await
}
