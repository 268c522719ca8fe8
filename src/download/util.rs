use headers::HeaderMapExt;
use log::warn;
use reqwest::header::HeaderMap;
use reqwest::{Client, Request, Response};
use crate::download::error::ProbeError;

pub fn clone_request(request: &Request) -> Request {
    let mut req = Request::new(request.method().clone(), request.url().clone());
    *req.headers_mut() = request.headers().clone();
    *req.version_mut() = request.version();
    *req.timeout_mut() = request.timeout().map(Clone::clone);

    req
}

/// 发送请求, 仅在连接建立失败时重试 `retry_count` 次
pub async fn send_with_retry(client: &Client, request: Request, retry_count: u8) -> reqwest::Result<Response> {
    let mut attempts = 0;
    loop {
        match client.execute(clone_request(&request)).await {
            Ok(response) => return Ok(response),
            Err(err) if err.is_connect() && attempts < retry_count => {
                attempts += 1;
                warn!("Connection to {} failed, try again {}/{}: {}", request.url(), attempts, retry_count, err);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Issues `HEAD` built from `request` and reads the resource size from `Content-Length`.
pub async fn probe_content_length(client: &Client, request: &Request, retry_count: u8) -> Result<u64, ProbeError> {
    let mut head = clone_request(request);
    *head.method_mut() = reqwest::Method::HEAD;

    let response = send_with_retry(client, head, retry_count).await?;
    if !response.status().is_success() {
        return Err(ProbeError::UnexpectedStatus(response.status()));
    }

    // Response::content_length() reports the (empty) HEAD body, so read the header itself
    content_length(response.headers())
}

pub fn content_length(headers: &HeaderMap) -> Result<u64, ProbeError> {
    headers
        .typed_get::<headers::ContentLength>()
        .map(|len| len.0)
        .ok_or(ProbeError::SizeUnavailable)
}
