//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server, storage, tool, and conversion settings. Every section defaults
//! sensibly so an empty `{}` file (or no file at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Default upload ceiling: 500 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub tools: ToolsConfig,
    pub conversion: ConversionConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Apply `PORT` and `MEDIACONV_HOST` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring unparseable PORT value '{raw}'"),
            }
        }

        if let Some(host) = lookup("MEDIACONV_HOST") {
            let host = host.trim();
            if !host.is_empty() {
                self.server.host = host.to_string();
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.storage.max_upload_bytes == 0 {
            warnings.push("storage.max_upload_bytes is 0; every upload will be rejected".into());
        }

        if self.storage.upload_dir == self.storage.output_dir {
            warnings.push(format!(
                "storage.upload_dir and storage.output_dir are both {}",
                self.storage.upload_dir.display()
            ));
        }

        if self.conversion.timeout_secs == 0 {
            warnings.push("conversion.timeout_secs is 0; every conversion will time out".into());
        }

        let codecs = [
            ("audio_codec", &self.conversion.audio_codec),
            ("video_codec", &self.conversion.video_codec),
            ("video_audio_codec", &self.conversion.video_audio_codec),
        ];
        for (name, value) in codecs {
            if value.trim().is_empty() {
                warnings.push(format!("conversion.{name} is empty"));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Front-end bundle served for unmatched routes, when present on disk.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            static_dir: Some(PathBuf::from("public")),
        }
    }
}

/// Working directories and upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Incoming uploads land here until converted.
    pub upload_dir: PathBuf,
    /// Converted artifacts are published from here.
    pub output_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("temp_uploads"),
            output_dir: PathBuf::from("converted"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
}

/// Encoder settings for the two supported outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Codec for audio-only output.
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub video_codec: String,
    /// Audio codec used inside re-encoded video.
    pub video_audio_codec: String,
    pub video_preset: String,
    /// Engine runs longer than this are killed.
    pub timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            audio_codec: "libmp3lame".into(),
            audio_bitrate: "192k".into(),
            video_codec: "libx264".into(),
            video_audio_codec: "aac".into(),
            video_preset: "fast".into(),
            timeout_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.storage.upload_dir, PathBuf::from("temp_uploads"));
        assert_eq!(cfg.storage.output_dir, PathBuf::from("converted"));
        assert_eq!(cfg.storage.max_upload_bytes, 500 * 1024 * 1024);
        assert_eq!(cfg.conversion.audio_codec, "libmp3lame");
        assert_eq!(cfg.conversion.audio_bitrate, "192k");
        assert_eq!(cfg.conversion.video_codec, "libx264");
        assert_eq!(cfg.conversion.video_audio_codec, "aac");
        assert_eq!(cfg.conversion.video_preset, "fast");
    }

    #[test]
    fn default_config_no_warnings() {
        let warnings = Config::default().validate();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn shared_directories_warn() {
        let mut cfg = Config::default();
        cfg.storage.output_dir = cfg.storage.upload_dir.clone();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("upload_dir")));
    }

    #[test]
    fn empty_codec_warns() {
        let mut cfg = Config::default();
        cfg.conversion.video_codec = " ".into();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("video_codec")));
    }

    #[test]
    fn parse_json_config() {
        let json = r#"{"server": {"port": 9090}, "storage": {"max_upload_bytes": 10}}"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.storage.max_upload_bytes, 10);
        assert_eq!(cfg.storage.output_dir, PathBuf::from("converted"));
    }

    #[test]
    fn parse_invalid_json_is_validation_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/config.json")));
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn load_or_default_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"tools": {"ffmpeg_path": "/opt/ffmpeg"}}"#).unwrap();

        let cfg = Config::load_or_default(Some(&path));
        assert_eq!(cfg.tools.ffmpeg_path, Some(PathBuf::from("/opt/ffmpeg")));
    }

    #[test]
    fn port_env_override() {
        let env: HashMap<&str, &str> = [("PORT", "8081"), ("MEDIACONV_HOST", "127.0.0.1")].into();
        let mut cfg = Config::default();
        cfg.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.server.host, "127.0.0.1");
    }

    #[test]
    fn bad_port_env_is_ignored() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(|k| (k == "PORT").then(|| "eighty".to_string()));
        assert_eq!(cfg.server.port, 3000);
    }
}
