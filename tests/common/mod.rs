//! Shared test harness for integration tests.
//!
//! [`TestHarness`] builds an [`AppContext`] over scratch directories, swaps
//! the real engine for a shell script, and serves the router on a random
//! port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use mc_av::ToolRegistry;
use mc_core::config::Config;
use mc_server::context::AppContext;
use mc_server::router::build_router;

/// Writes its arguments, one per line, into the last argument (the output).
pub const ENGINE_OK: &str = "#!/bin/sh\nfor last; do :; done\nprintf '%s\\n' \"$@\" > \"$last\"\n";

/// Leaves a partial output behind and exits non-zero with a diagnostic.
pub const ENGINE_FAIL: &str = "#!/bin/sh\nfor last; do :; done\nprintf 'partial' > \"$last\"\necho 'Invalid data found when processing input' >&2\nexit 1\n";

pub struct TestHarness {
    pub root: tempfile::TempDir,
    pub ctx: AppContext,
    pub addr: SocketAddr,
}

impl TestHarness {
    /// Start a server whose engine is the given shell script.
    pub async fn with_engine(script: &str) -> Self {
        Self::with_engine_and(script, |_| {}).await
    }

    /// Like [`with_engine`](Self::with_engine), with a hook to adjust the
    /// config before the server starts.
    pub async fn with_engine_and(script: &str, tweak: impl FnOnce(&mut Config)) -> Self {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        let engine = write_engine(root.path(), script);

        let mut config = Config::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        config.server.static_dir = None;
        config.storage.upload_dir = root.path().join("temp_uploads");
        config.storage.output_dir = root.path().join("converted");
        config.tools.ffmpeg_path = Some(engine);
        tweak(&mut config);

        let tools = ToolRegistry::discover(&config.tools);
        let ctx = AppContext::new(config, tools);
        ctx.storage.ensure().expect("failed to create storage dirs");

        let app = build_router(ctx.clone(), None);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { root, ctx, addr }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn upload_files(&self) -> Vec<PathBuf> {
        list(self.ctx.storage.upload_dir())
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        list(self.ctx.storage.output_dir())
    }

    /// POST a single `video` file part to `/convert` with the given query.
    pub async fn convert(&self, query: &str, filename: &str, data: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("video", part);
        reqwest::Client::new()
            .post(self.url(&format!("/convert{query}")))
            .multipart(form)
            .send()
            .await
            .expect("convert request failed")
    }
}

fn write_engine(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    std::fs::write(&path, script).expect("failed to write fake engine");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod fake engine");
    path
}

fn list(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("failed to read dir")
        .map(|e| e.expect("bad dir entry").path())
        .collect();
    files.sort();
    files
}
