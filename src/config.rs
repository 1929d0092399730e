use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_IMAGES_MANIFEST: &str = "data-images.csv";
pub const DEFAULT_METADATA_MANIFEST: &str = "data-metadata.csv";
pub const DEFAULT_CACHE_DIR: &str = ".apegal_cache";
pub const DEFAULT_COLLECTION_TITLE: &str = "Midnight Apes";
pub const DEFAULT_SERVER_PORT: u16 = 3001;
pub const DEFAULT_THUMB_WORKERS: usize = 8;

/// Where a manifest CSV comes from: a local file or an http(s) URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManifestSource {
    Local(PathBuf),
    Remote(String),
}

impl ManifestSource {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Remote(s.to_string())
        } else {
            Self::Local(PathBuf::from(s))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::Remote(url) => url.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub images_manifest: ManifestSource,
    pub metadata_manifest: ManifestSource,
    pub proxy_endpoint: Option<String>,
    pub cache_dir: Option<String>,
    pub collection_title: String,
    pub thumb_workers: usize,
    pub server_port: u16,
    pub static_root: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            images_manifest: ManifestSource::parse(DEFAULT_IMAGES_MANIFEST),
            metadata_manifest: ManifestSource::parse(DEFAULT_METADATA_MANIFEST),
            proxy_endpoint: None,
            cache_dir: None,
            collection_title: DEFAULT_COLLECTION_TITLE.to_string(),
            thumb_workers: DEFAULT_THUMB_WORKERS,
            server_port: DEFAULT_SERVER_PORT,
            static_root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    images_manifest: Option<String>,
    metadata_manifest: Option<String>,
    proxy_endpoint: Option<String>,
    cache_dir: Option<String>,
    collection_title: Option<String>,
    thumb_workers: Option<usize>,
    server_port: Option<u16>,
    static_root: Option<String>,
}

/// `APEGAL_CONFIG` wins over `./config.json`.
pub fn config_path() -> PathBuf {
    env::var_os("APEGAL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

pub fn load_config_from(cfg_path: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();

    match fs::read_to_string(cfg_path) {
        Ok(raw) => match serde_json::from_str::<RawConfig>(&raw) {
            Ok(parsed) => {
                if let Some(src) = parsed.images_manifest.filter(|s| !s.trim().is_empty()) {
                    cfg.images_manifest = ManifestSource::parse(&src);
                }
                if let Some(src) = parsed.metadata_manifest.filter(|s| !s.trim().is_empty()) {
                    cfg.metadata_manifest = ManifestSource::parse(&src);
                }
                if let Some(proxy) = parsed.proxy_endpoint {
                    let proxy = proxy.trim();
                    if proxy.starts_with("http://") || proxy.starts_with("https://") {
                        cfg.proxy_endpoint = Some(proxy.to_string());
                    } else if !proxy.is_empty() {
                        warn!("Ignoring proxy_endpoint `{proxy}` in config (not an http(s) URL).");
                    }
                }
                if parsed.cache_dir.is_some() {
                    cfg.cache_dir = parsed.cache_dir;
                }
                if let Some(title) = parsed.collection_title.filter(|t| !t.trim().is_empty()) {
                    cfg.collection_title = title;
                }
                if let Some(n) = parsed.thumb_workers {
                    cfg.thumb_workers = n.clamp(1, 32);
                }
                if let Some(port) = parsed.server_port {
                    cfg.server_port = port;
                }
                if let Some(root) = parsed.static_root {
                    cfg.static_root = PathBuf::from(root);
                }
                info!("Loaded config from {}", cfg_path.display());
            }
            Err(err) => {
                warn!(
                    "Failed to parse {} ({}). Using defaults.",
                    cfg_path.display(),
                    err
                );
            }
        },
        Err(_) => {
            info!("No {} found; using defaults", cfg_path.display());
        }
    }

    cfg
}

pub fn resolve_relative_path(rel: &str) -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join(rel))
        .unwrap_or_else(|_| PathBuf::from(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_cfg(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("temp config");
        f.write_all(body.as_bytes()).expect("write config");
        f
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("nope.json"));
        assert_eq!(
            cfg.images_manifest,
            ManifestSource::Local(PathBuf::from(DEFAULT_IMAGES_MANIFEST))
        );
        assert_eq!(cfg.server_port, DEFAULT_SERVER_PORT);
        assert!(cfg.proxy_endpoint.is_none());
    }

    #[test]
    fn overrides_are_merged_field_by_field() {
        let f = write_cfg(
            r#"{
                "images_manifest": "https://cdn.example/images.csv",
                "proxy_endpoint": "http://localhost:3001/api/proxy",
                "thumb_workers": 99,
                "server_port": 8088
            }"#,
        );
        let cfg = load_config_from(f.path());
        assert_eq!(
            cfg.images_manifest,
            ManifestSource::Remote("https://cdn.example/images.csv".into())
        );
        assert_eq!(
            cfg.metadata_manifest,
            ManifestSource::Local(PathBuf::from(DEFAULT_METADATA_MANIFEST))
        );
        assert_eq!(
            cfg.proxy_endpoint.as_deref(),
            Some("http://localhost:3001/api/proxy")
        );
        assert_eq!(cfg.thumb_workers, 32);
        assert_eq!(cfg.server_port, 8088);
        assert_eq!(cfg.collection_title, DEFAULT_COLLECTION_TITLE);
    }

    #[test]
    fn bad_json_and_bad_proxy_are_ignored() {
        let f = write_cfg("{ not json");
        let cfg = load_config_from(f.path());
        assert_eq!(cfg.thumb_workers, DEFAULT_THUMB_WORKERS);

        let f = write_cfg(r#"{ "proxy_endpoint": "localhost:3001" }"#);
        let cfg = load_config_from(f.path());
        assert!(cfg.proxy_endpoint.is_none());
    }
}
