use futures_util::future::join_all;
use log::error;
use reqwest::{Client, Request};
use crate::download::chunk_item::ChunkItem;
use crate::download::chunk_range::ChunkRange;
use crate::download::error::{FetchCause, FetchError};
use crate::download::output_file::OutputFile;
use crate::download::util::clone_request;

type ChunkResult = Result<u64, FetchError>;

/// 为每个 range 启动一个 worker, 并等待全部结束
pub struct ChunkManager {
    client: Client,
    request: Request,
    connect_retries: u8,
    strict_range_support: bool,
}

impl ChunkManager {
    pub fn new(client: Client, request: Request, connect_retries: u8, strict_range_support: bool) -> Self {
        Self {
            client,
            request,
            connect_retries,
            strict_range_support,
        }
    }

    /// Spawns one task per range against the shared `file` and joins all of them.
    ///
    /// Always waits for every task, failed or not; results come back in `ranges` order.
    pub async fn download(&self, ranges: &[ChunkRange], file: &OutputFile) -> Vec<ChunkResult> {
        let handles: Vec<_> = ranges
            .iter()
            .map(|range| {
                let chunk_item = ChunkItem::new(
                    self.client.clone(),
                    clone_request(&self.request),
                    self.connect_retries,
                    self.strict_range_support,
                );
                let writer = file.range_writer(*range);

                (*range, tokio::spawn(async move { chunk_item.download(writer).await }))
            })
            .collect();

        join_all(handles.into_iter().map(|(range, handle)| async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => Err(FetchError::new(Some(range), FetchCause::Aborted(err.to_string()))),
            };
            if let Err(err) = &result {
                error!("Download chunk failed: {}", err);
            }

            result
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use super::*;
    use crate::download::chunk_range::plan_chunks;

    #[tokio::test]
    async fn should_join_every_chunk() {
        let server = MockServer::start().await;
        let body = b"0123456789";
        let ranges = plan_chunks(body.len() as u64, 3).unwrap();
        for range in &ranges {
            let part = &body[range.start as usize..=range.end as usize];
            Mock::given(method("GET"))
                .and(header("Range", format!("bytes={}-{}", range.start, range.end).as_str()))
                .respond_with(
                    ResponseTemplate::new(206)
                        .insert_header("content-range", format!("bytes {}-{}/{}", range.start, range.end, body.len()))
                        .set_body_bytes(part),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let dir = tempfile::tempdir().unwrap();
        let file = OutputFile::create(dir.path().join("joined.bin"), body.len() as u64).await.unwrap();
        let request = Request::new(reqwest::Method::GET, server.uri().parse().unwrap());
        let manager = ChunkManager::new(Client::new(), request, 0, false);

        let results = manager.download(&ranges, &file).await;

        let written: Vec<u64> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(written, vec![4, 4, 2]);
        assert_eq!(tokio::fs::read(file.path()).await.unwrap(), body);
    }

    #[tokio::test]
    async fn should_keep_failures_in_range_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Range", "bytes=0-4"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("Range", "bytes=5-9"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("content-range", "bytes 5-9/10")
                    .set_body_bytes(b"World".as_slice()),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = OutputFile::create(dir.path().join("failed.bin"), 10).await.unwrap();
        let request = Request::new(reqwest::Method::GET, server.uri().parse().unwrap());
        let manager = ChunkManager::new(Client::new(), request, 0, false);

        let results = manager.download(&[ChunkRange::new(0, 4), ChunkRange::new(5, 9)], &file).await;

        assert_eq!(results[0].as_ref().unwrap_err().range, Some(ChunkRange::new(0, 4)));
        assert_eq!(*results[1].as_ref().unwrap(), 5);
    }
}
