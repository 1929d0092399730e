use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::{load_config, resolve_relative_path, DEFAULT_CACHE_DIR};

// Chosen once on first call
use std::sync::{Once, OnceLock};
static CACHE_DIR_ONCE: OnceLock<PathBuf> = OnceLock::new();
static THUMB_DIR_ONCE: OnceLock<PathBuf> = OnceLock::new();
static THUMB_PRUNE_ONCE: Once = Once::new();

const THUMB_RETENTION_DAYS: u64 = 14;
const THUMB_RETENTION_SECS: u64 = THUMB_RETENTION_DAYS * 24 * 60 * 60;

pub fn cache_dir() -> PathBuf {
    CACHE_DIR_ONCE
        .get_or_init(|| {
            let cfg = load_config();
            let mut path = cfg
                .cache_dir
                .as_deref()
                .map(resolve_relative_path)
                .unwrap_or_else(|| resolve_relative_path(DEFAULT_CACHE_DIR));

            if let Err(e) = fs::create_dir_all(&path) {
                warn!("failed to create cache dir {}: {e}", path.display());
                path = resolve_relative_path(DEFAULT_CACHE_DIR);
                let _ = fs::create_dir_all(&path);
            }
            path
        })
        .clone()
}

/// Directory holding resized renditions; pruned of stale files once per run.
pub fn thumb_cache_dir() -> PathBuf {
    let dir = THUMB_DIR_ONCE.get_or_init(|| {
        let mut path = cache_dir().join("thumbs");
        if let Err(e) = fs::create_dir_all(&path) {
            warn!("failed to create thumb cache dir {}: {e}", path.display());
            path = cache_dir();
        }
        path
    });

    THUMB_PRUNE_ONCE.call_once({
        let path = dir.clone();
        move || match prune_thumb_cache_in_dir(&path, SystemTime::now()) {
            Ok(0) => {}
            Ok(n) => debug!("pruned {n} stale thumbnails from {}", path.display()),
            Err(err) => warn!("thumb cache prune failed: {err}"),
        }
    });

    dir.clone()
}

/// Remove cached images older than the retention window, plus leftover
/// `.part` files from interrupted writes.
fn prune_thumb_cache_in_dir(dir: &Path, now: SystemTime) -> std::io::Result<usize> {
    let cutoff = now
        .checked_sub(Duration::from_secs(THUMB_RETENTION_SECS))
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0usize;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase());
        let stale = match ext.as_deref() {
            Some("part") => true,
            Some("jpg" | "jpeg" | "png") => {
                let modified = entry
                    .metadata()?
                    .modified()
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                modified < cutoff
            }
            _ => false,
        };
        if stale {
            let _ = fs::remove_file(&path);
            removed += 1;
        }
    }
    Ok(removed)
}

pub fn url_to_cache_key(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

pub fn find_cached(key: &str) -> Option<PathBuf> {
    find_cached_in(&thumb_cache_dir(), key)
}

fn find_cached_in(dir: &Path, key: &str) -> Option<PathBuf> {
    let p = dir.join(format!("{key}.jpg"));
    p.exists().then_some(p)
}

/// Decode a cached file to (width, height, RGBA8 bytes).
pub fn load_rgba(path: &Path) -> Result<(u32, u32, Vec<u8>), String> {
    let img = image::ImageReader::open(path)
        .map_err(|e| format!("open image {}: {e}", path.display()))?
        .with_guessed_format()
        .map_err(|e| format!("guess format {}: {e}", path.display()))?
        .decode()
        .map_err(|e| format!("decode {}: {e}", path.display()))?;
    let (w, h) = img.dimensions();
    Ok((w, h, img.to_rgba8().into_raw()))
}

/// Download an image with a shared client, resize it to `max_width` (keeping
/// aspect) and store it as `<thumb_cache_dir>/<key>.jpg`.
pub fn download_and_store_resized_with_client(
    client: &Client,
    url: &str,
    key: &str,
    max_width: u32,
    quality: u8,
) -> Result<PathBuf, String> {
    let dir = thumb_cache_dir();
    if let Some(hit) = find_cached_in(&dir, key) {
        return Ok(hit);
    }

    let bytes = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(|e| format!("download {url}: {e}"))?;

    store_resized(&dir, key, &bytes, max_width, quality)
}

fn store_resized(
    dir: &Path,
    key: &str,
    bytes: &[u8],
    max_width: u32,
    quality: u8,
) -> Result<PathBuf, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("decode: {e}"))?;

    let (w, h) = img.dimensions();
    let out: DynamicImage = if w > max_width {
        let new_h = ((h as f32) * (max_width as f32 / w as f32))
            .round()
            .max(1.0) as u32;
        img.resize_exact(max_width, new_h, FilterType::CatmullRom)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = out.to_rgb8();
    let mut jpeg_bytes: Vec<u8> = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, quality)
        .encode_image(&rgb)
        .map_err(|e| format!("jpeg encode: {e}"))?;

    fs::create_dir_all(dir).map_err(|e| format!("create {}: {e}", dir.display()))?;
    let dest = dir.join(format!("{key}.jpg"));
    let tmp = dest.with_extension("jpg.part");
    {
        let mut f = fs::File::create(&tmp).map_err(|e| format!("create tmp: {e}"))?;
        f.write_all(&jpeg_bytes)
            .map_err(|e| format!("write: {e}"))?;
    }
    fs::rename(&tmp, &dest).map_err(|e| format!("rename: {e}"))?;
    Ok(dest)
}
