mod common;

use range_downloader::{download, timed, DownloadError};
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};
use common::{mount_ranged, sample_body};

#[tokio::test]
async fn test_timed_download_leaves_no_files_behind() {
    let server = MockServer::start().await;
    mount_ranged(&server, sample_body(2048), |_| None).await;

    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("notes.txt");
    tokio::fs::write(&existing, "keep me").await.unwrap();
    let path = dir.path().join("timed.bin");
    let url = Url::parse(&server.uri()).unwrap();

    let (result, report) = timed("4 ranges", dir.path(), download(&url, &path, 4)).await.unwrap();

    assert_eq!(result.unwrap().total_size, 2048);
    assert_eq!(report.label, "4 ranges");
    assert_eq!(report.removed, vec![path.clone()]);
    assert!(!path.exists());
    assert!(existing.exists());
}

#[tokio::test]
async fn test_timed_failed_download_still_cleans_up() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-length", "100"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.bin");
    let url = Url::parse(&server.uri()).unwrap();

    let (result, report) = timed("broken", dir.path(), download(&url, &path, 2)).await.unwrap();

    assert!(matches!(result, Err(DownloadError::PartialFailure { .. })));
    assert_eq!(report.removed, vec![path.clone()]);
    assert!(!path.exists());
}
