//! End-to-end tests against the real router on an ephemeral port.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ferry_transfer::{AppState, ServerConfig, router};
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{
    ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_ENCODING, CONTENT_RANGE, CONTENT_TYPE, IF_RANGE,
    LAST_MODIFIED, RANGE,
};
use reqwest::multipart::{Form, Part};
use tempfile::TempDir;

struct Server {
    base:   String,
    client: reqwest::Client,
    dir:    TempDir,
}

impl Server {
    async fn start(configure: impl FnOnce(ServerConfig) -> ServerConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = configure(ServerConfig::default().upload_root(dir.path().join("files")));
        let state = Arc::new(AppState::new(config).unwrap());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            dir,
        }
    }

    fn root(&self) -> std::path::PathBuf { self.dir.path().join("files") }

    fn put_file(&self, name: &str, data: &[u8]) { std::fs::write(self.root().join(name), data).unwrap(); }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base, path) }

    fn entries(&self) -> Vec<String> { list(&self.root()) }
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn sample(len: usize) -> Vec<u8> { (0..len).map(|i| (i * 13 % 251) as u8).collect() }

fn sha256_hex(data: &[u8]) -> String { hex::encode(ferry_verify::Sha256Hasher::digest(data)) }

const BOUNDARY: &str = "ferry-test-boundary";

fn part_head(name: &str, file_name: Option<&str>) -> Vec<u8> {
    let disposition = match file_name {
        Some(file_name) => format!("form-data; name=\"{name}\"; filename=\"{file_name}\""),
        None => format!("form-data; name=\"{name}\""),
    };
    format!("--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\n\r\n").into_bytes()
}

fn closing() -> Vec<u8> { format!("\r\n--{BOUNDARY}--\r\n").into_bytes() }

/// A raw multipart body sent piece by piece, each piece after its delay.
fn paced_body(pieces: Vec<(Duration, Vec<u8>)>) -> reqwest::Body {
    let stream = futures_util::stream::iter(pieces).then(|(delay, piece)| async move {
        tokio::time::sleep(delay).await;
        Ok::<_, std::io::Error>(piece)
    });
    reqwest::Body::wrap_stream(stream)
}

#[tokio::test]
async fn full_download_has_headers_and_content() {
    let server = Server::start(|c| c).await;
    let data = sample(100_000);
    server.put_file("data.bin", &data);

    let response = server.client.get(server.url("/download?file=data.bin")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[ACCEPT_RANGES], "bytes");
    assert_eq!(response.headers()[CONTENT_DISPOSITION], "attachment; filename=\"data.bin\"");
    assert!(response.headers().contains_key("last-modified"));
    assert_eq!(response.content_length(), Some(100_000));
    assert_eq!(response.bytes().await.unwrap(), data);
}

#[tokio::test]
async fn open_range_on_1000_bytes_is_partial_content() {
    let server = Server::start(|c| c).await;
    let data = sample(1000);
    server.put_file("k.bin", &data);

    let response = server
        .client
        .get(server.url("/range-download?file=k.bin"))
        .header(RANGE, "bytes=0-")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[CONTENT_RANGE], "bytes 0-999/1000");
    assert_eq!(response.bytes().await.unwrap(), data);
}

#[tokio::test]
async fn bounded_and_suffix_ranges_stream_the_right_bytes() {
    let server = Server::start(|c| c).await;
    let data = sample(1000);
    server.put_file("k.bin", &data);

    for (range, start, end) in [("bytes=100-199", 100, 199), ("bytes=-10", 990, 999), ("bytes=995-5000", 995, 999)] {
        let response = server
            .client
            .get(server.url("/range-download?file=k.bin"))
            .header(RANGE, range)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT, "{range}");
        assert_eq!(response.headers()[CONTENT_RANGE], format!("bytes {start}-{end}/1000").as_str());
        assert_eq!(response.bytes().await.unwrap(), &data[start..=end], "{range}");
    }
}

#[tokio::test]
async fn range_past_the_end_is_416_with_empty_body() {
    let server = Server::start(|c| c).await;
    server.put_file("k.bin", &sample(1000));

    let response = server
        .client
        .get(server.url("/download?file=k.bin"))
        .header(RANGE, "bytes=1000-")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.headers()[CONTENT_RANGE], "bytes */1000");
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn multi_range_and_garbage_ranges_get_the_whole_file() {
    let server = Server::start(|c| c).await;
    let data = sample(500);
    server.put_file("k.bin", &data);

    for range in ["bytes=0-1,5-6", "bytes=nonsense", "lines=1-2", "bytes=9-3"] {
        let response = server
            .client
            .get(server.url("/download?file=k.bin"))
            .header(RANGE, range)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{range}");
        assert!(!response.headers().contains_key(CONTENT_RANGE));
        assert_eq!(response.bytes().await.unwrap(), data);
    }
}

#[tokio::test]
async fn head_has_headers_but_no_body() {
    let server = Server::start(|c| c).await;
    server.put_file("k.bin", &sample(1000));

    let response = server
        .client
        .head(server.url("/download?file=k.bin"))
        .header(RANGE, "bytes=10-19")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[CONTENT_RANGE], "bytes 10-19/1000");
    assert_eq!(response.headers()[ACCEPT_RANGES], "bytes");
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_and_parameter_errors() {
    let server = Server::start(|c| c).await;

    let response = server.client.get(server.url("/download?file=ghost.bin")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(body["error"], "not_found");

    let response = server.client.get(server.url("/download")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server.client.get(server.url("/download?file=")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn traversal_names_are_confined_to_the_root() {
    let server = Server::start(|c| c).await;
    std::fs::write(server.dir.path().join("secret.txt"), b"secret").unwrap();
    server.put_file("secret.txt", b"public");

    let response = server
        .client
        .get(server.url("/download?file=../secret.txt"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.bytes().await.unwrap(), &b"public"[..]);
}

#[tokio::test]
async fn gzip_download_decodes_to_the_file() {
    let server = Server::start(|c| c).await;
    let data: Vec<u8> = b"compressible ".iter().copied().cycle().take(200_000).collect();
    server.put_file("text.txt", &data);

    let response = server
        .client
        .get(server.url("/download?file=text.txt&gzip=true"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");
    let compressed = response.bytes().await.unwrap();
    assert!(compressed.len() < data.len());

    let mut decoded = Vec::new();
    flate2::read::GzDecoder::new(&compressed[..]).read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, data);
}

#[tokio::test]
async fn throttled_download_still_delivers_everything() {
    let server = Server::start(|c| c.rate_limit(Some(20_000))).await;
    let data = sample(30_000);
    server.put_file("slow.bin", &data);

    let started = std::time::Instant::now();
    let response = server.client.get(server.url("/download?file=slow.bin")).send().await.unwrap();
    assert_eq!(response.bytes().await.unwrap(), data);
    // 20 KB burst, then 10 KB at 20 KB/s.
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn upload_stores_file_and_reports_digest() {
    let server = Server::start(|c| c).await;
    let data = sample(50_000);

    let form = Form::new()
        .text("note", "ignored")
        .part("file", Part::bytes(data.clone()).file_name("../upload.bin"));
    let response = server.client.post(server.url("/upload")).multipart(form).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(body["filename"], "upload.bin");
    assert_eq!(body["bytes"], 50_000);
    assert_eq!(body["sha256"], sha256_hex(&data));
    assert!(body["elapsed_ms"].is_u64());

    assert_eq!(std::fs::read(server.root().join("upload.bin")).unwrap(), data);
    assert_eq!(server.entries(), vec!["upload.bin"]);
}

#[tokio::test]
async fn upload_with_matching_checksum_is_accepted() {
    let server = Server::start(|c| c).await;
    let data = sample(2048);

    let form = Form::new().part("file", Part::bytes(data.clone()).file_name("ok.bin"));
    let response = server
        .client
        .post(server.url(&format!("/upload?sha256={}", sha256_hex(&data))))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(server.entries(), vec!["ok.bin"]);
}

#[tokio::test]
async fn upload_with_wrong_checksum_is_rolled_back() {
    let server = Server::start(|c| c).await;

    let form = Form::new().part("file", Part::bytes(sample(2048)).file_name("bad.bin"));
    let response = server
        .client
        .post(server.url(&format!("/upload?sha256={}", "00".repeat(32))))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(body["error"], "checksum_mismatch");
    assert!(server.entries().is_empty());
}

#[tokio::test]
async fn oversized_upload_with_length_is_rejected_early() {
    let server = Server::start(|c| c.max_upload_bytes(1024)).await;

    let form = Form::new().part("file", Part::bytes(sample(4096)).file_name("big.bin"));
    let response = server.client.post(server.url("/upload")).multipart(form).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.entries().is_empty());
}

#[tokio::test]
async fn oversized_streamed_upload_is_cut_off_and_cleaned_up() {
    let server = Server::start(|c| c.max_upload_bytes(1024)).await;

    let chunks: Vec<Result<Vec<u8>, std::io::Error>> = (0..4).map(|_| Ok(sample(1024))).collect();
    let part = Part::stream(reqwest::Body::wrap_stream(futures_util::stream::iter(chunks)))
        .file_name("big.bin");
    let form = Form::new().part("file", part);
    let response = server.client.post(server.url("/upload")).multipart(form).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.entries().is_empty());
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let server = Server::start(|c| c).await;

    let form = Form::new().text("comment", "no file here");
    let response = server.client.post(server.url("/upload")).multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(body["error"], "missing_file_part");

    let response = server
        .client
        .post(server.url("/upload"))
        .header("content-type", "text/plain")
        .body("not multipart")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_with_unusable_file_name_is_rejected() {
    let server = Server::start(|c| c).await;

    let form = Form::new().part("file", Part::bytes(b"x".to_vec()).file_name(".."));
    let response = server.client.post(server.url("/upload")).multipart(form).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.entries().is_empty());
}

#[tokio::test]
async fn uploaded_file_can_be_downloaded_by_range() {
    let server = Server::start(|c| c).await;
    let data = sample(10_000);

    let form = Form::new().part("file", Part::bytes(data.clone()).file_name("round.bin"));
    let response = server.client.post(server.url("/upload")).multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = server
        .client
        .get(server.url("/range-download?file=round.bin"))
        .header(RANGE, "bytes=5000-5099")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.bytes().await.unwrap(), &data[5000..5100]);
}

#[tokio::test]
async fn file_shrinking_mid_download_is_not_a_clean_end() {
    let server = Server::start(|c| c.rate_limit(Some(20_000))).await;
    server.put_file("shrinking.bin", &sample(100_000));

    let response = server
        .client
        .get(server.url("/download?file=shrinking.bin&gzip=true"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // About 26 KB have left the throttle by now.
    tokio::time::sleep(Duration::from_millis(300)).await;
    std::fs::OpenOptions::new()
        .write(true)
        .open(server.root().join("shrinking.bin"))
        .unwrap()
        .set_len(30_000)
        .unwrap();

    assert!(response.bytes().await.is_err(), "truncated body must not end cleanly");
}

#[tokio::test]
async fn download_timeout_cuts_off_the_body() {
    let server = Server::start(|c| {
        c.rate_limit(Some(20_000))
            .transfer_timeout(Duration::from_millis(500))
    })
    .await;
    server.put_file("slow.bin", &sample(100_000));

    let response = server.client.get(server.url("/download?file=slow.bin")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.content_length(), Some(100_000));
    assert!(response.bytes().await.is_err());
}

#[tokio::test]
async fn slow_preamble_counts_against_the_upload_timeout() {
    let server = Server::start(|c| c.transfer_timeout(Duration::from_millis(200))).await;

    let mut note = part_head("note", None);
    note.extend_from_slice(b"hello");
    let mut rest = b"\r\n".to_vec();
    rest.extend(part_head("file", Some("late.bin")));
    rest.extend(sample(100));
    rest.extend(closing());

    let body = paced_body(vec![(Duration::ZERO, note), (Duration::from_millis(1500), rest)]);
    let response = server
        .client
        .post(server.url("/upload"))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(server.entries().is_empty());
}

#[tokio::test]
async fn upload_stalling_mid_file_times_out_and_rolls_back() {
    let server = Server::start(|c| c.transfer_timeout(Duration::from_millis(200))).await;

    let mut first = part_head("file", Some("stalled.bin"));
    first.extend(sample(1000));
    let mut rest = sample(1000);
    rest.extend(closing());

    let body = paced_body(vec![(Duration::ZERO, first), (Duration::from_millis(1500), rest)]);
    let response = server
        .client
        .post(server.url("/upload"))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    let body: serde_json::Value = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(body["error"], "timeout");
    assert!(server.entries().is_empty(), "staging file left: {:?}", server.entries());
}

#[tokio::test]
async fn if_range_serves_the_range_only_for_an_unchanged_file() {
    let server = Server::start(|c| c).await;
    let data = sample(1000);
    server.put_file("resume.bin", &data);

    let head = server.client.head(server.url("/download?file=resume.bin")).send().await.unwrap();
    let last_modified = head.headers()[LAST_MODIFIED].to_str().unwrap().to_string();

    let ranged = |validator: String| {
        server
            .client
            .get(server.url("/range-download?file=resume.bin"))
            .header(RANGE, "bytes=500-")
            .header(IF_RANGE, validator)
            .send()
    };

    let response = ranged(last_modified).await.unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.bytes().await.unwrap(), &data[500..]);

    for stale in ["Sun, 06 Nov 1994 08:49:37 GMT".to_string(), "\"v1\"".to_string()] {
        let response = ranged(stale).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(CONTENT_RANGE));
        assert_eq!(response.bytes().await.unwrap(), data);
    }
}
