#![allow(dead_code)]

use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Deterministic, non-repeating-looking payload.
pub fn sample_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + 7) % 251) as u8).collect()
}

pub fn parse_range(value: &str) -> Option<(usize, usize)> {
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

pub fn requested_range(request: &Request) -> Option<(usize, usize)> {
    request.headers
        .get("range")
        .and_then(|value| value.to_str().ok())
        .and_then(parse_range)
}

pub async fn mount_head(server: &MockServer, len: usize) {
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-length", len.to_string()))
        .mount(server)
        .await;
}

pub fn partial_content(body: &[u8], start: usize, end: usize) -> ResponseTemplate {
    ResponseTemplate::new(206)
        .insert_header("content-range", format!("bytes {}-{}/{}", start, end, body.len()))
        .set_body_bytes(&body[start..=end])
}

/// Serves `body`, honouring `Range` requests with `206`.
///
/// `delay` picks a delay per requested range start.
pub async fn mount_ranged<F>(server: &MockServer, body: Vec<u8>, delay: F)
where
    F: Fn(usize) -> Option<Duration> + Send + Sync + 'static,
{
    mount_head(server, body.len()).await;
    Mock::given(method("GET"))
        .respond_with(move |request: &Request| match requested_range(request) {
            Some((start, end)) => {
                let template = partial_content(&body, start, end);
                match delay(start) {
                    Some(delay) => template.set_delay(delay),
                    None => template,
                }
            }
            None => ResponseTemplate::new(200).set_body_bytes(body.clone()),
        })
        .mount(server)
        .await;
}

/// Serves `body` in full with `200` regardless of `Range`.
pub async fn mount_ignoring_ranges(server: &MockServer, body: Vec<u8>) {
    mount_head(server, body.len()).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}
