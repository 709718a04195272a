//! End-to-end tests for `POST /convert`.

#![cfg(unix)]

mod common;

use common::{TestHarness, ENGINE_FAIL, ENGINE_OK};

fn artifact_name(json: &serde_json::Value) -> String {
    let url = json["downloadUrl"].as_str().expect("downloadUrl missing");
    url.strip_prefix("/download/")
        .expect("downloadUrl should start with /download/")
        .to_string()
}

#[tokio::test]
async fn mp3_conversion_returns_download_url_and_consumes_upload() {
    let h = TestHarness::with_engine(ENGINE_OK).await;

    let resp = h.convert("?format=mp3", "holiday.mkv", b"fake video".to_vec()).await;
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    let name = artifact_name(&json);

    let (id, ext) = name.rsplit_once('.').unwrap();
    assert_eq!(ext, "mp3");
    assert!(id.parse::<mc_core::UploadId>().is_ok(), "not an upload id: {id}");

    assert!(h.upload_files().is_empty(), "input should be deleted");
    assert_eq!(h.output_files(), vec![h.ctx.storage.output_dir().join(&name)]);

    let args = std::fs::read_to_string(h.ctx.storage.output_dir().join(&name)).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert!(args.contains(&"-vn"));
    assert!(args.windows(2).any(|w| w == ["-c:a", "libmp3lame"]));
    assert!(args.windows(2).any(|w| w == ["-b:a", "192k"]));
    assert!(args.iter().any(|a| a.ends_with(&format!("{id}.mkv"))));
}

#[tokio::test]
async fn mp4_conversion_reencodes_both_streams() {
    let h = TestHarness::with_engine(ENGINE_OK).await;

    let resp = h.convert("?format=MP4", "clip.mov", b"fake video".to_vec()).await;
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    let name = artifact_name(&json);
    assert!(name.ends_with(".mp4"));

    let args = std::fs::read_to_string(h.ctx.storage.output_dir().join(&name)).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert!(!args.contains(&"-vn"));
    assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
    assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
    assert!(args.windows(2).any(|w| w == ["-preset", "fast"]));
}

#[tokio::test]
async fn missing_format_defaults_to_mp3() {
    let h = TestHarness::with_engine(ENGINE_OK).await;

    let resp = h.convert("", "voice.wav", b"riff".to_vec()).await;
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(artifact_name(&json).ends_with(".mp3"));
}

#[tokio::test]
async fn unknown_format_is_rejected_without_writing() {
    let h = TestHarness::with_engine(ENGINE_OK).await;

    let resp = h.convert("?format=avi", "clip.mov", b"data".to_vec()).await;
    assert_eq!(resp.status(), 400);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "invalid_format");

    assert!(h.upload_files().is_empty());
    assert!(h.output_files().is_empty());
}

#[tokio::test]
async fn request_without_file_is_400() {
    let h = TestHarness::with_engine(ENGINE_OK).await;

    let form = reqwest::multipart::Form::new().text("video", "just text");
    let resp = reqwest::Client::new()
        .post(h.url("/convert?format=mp3"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "No file provided");
    assert!(h.upload_files().is_empty());
    assert!(h.output_files().is_empty());
}

#[tokio::test]
async fn oversized_upload_is_413_and_leaves_nothing() {
    let h = TestHarness::with_engine_and(ENGINE_OK, |c| c.storage.max_upload_bytes = 1024).await;

    let resp = h.convert("?format=mp3", "big.mp4", vec![0u8; 8 * 1024]).await;
    assert_eq!(resp.status(), 413);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "payload_too_large");

    assert!(h.upload_files().is_empty());
    assert!(h.output_files().is_empty());
}

#[tokio::test]
async fn engine_failure_is_500_with_diagnostic() {
    let h = TestHarness::with_engine(ENGINE_FAIL).await;

    let resp = h.convert("?format=mp4", "broken.mkv", b"garbage".to_vec()).await;
    assert_eq!(resp.status(), 500);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Conversion failed");
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .contains("Invalid data found when processing input"));

    assert!(h.output_files().is_empty(), "partial output must not remain");
}

#[tokio::test]
async fn concurrent_conversions_do_not_collide() {
    let h = TestHarness::with_engine(ENGINE_OK).await;

    let (a, b, c, d) = tokio::join!(
        h.convert("?format=mp3", "a.mkv", b"a".to_vec()),
        h.convert("?format=mp3", "b.mkv", b"b".to_vec()),
        h.convert("?format=mp4", "c.mkv", b"c".to_vec()),
        h.convert("?format=mp4", "d.mkv", b"d".to_vec()),
    );

    let mut names = Vec::new();
    for resp in [a, b, c, d] {
        assert_eq!(resp.status(), 200);
        let json: serde_json::Value = resp.json().await.unwrap();
        names.push(artifact_name(&json));
    }
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 4);
    assert_eq!(h.output_files().len(), 4);
}
