// src/app/manifest.rs
use std::fs;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::app::types::{Item, ManifestMsg};
use crate::config::ManifestSource;
use crate::error::GalleryError;

/// Image file names look like `image_123.jpeg`; the grid shows `#123`.
pub const IMAGE_NAME_SUFFIX: &str = ".jpeg";
pub const IMAGE_NAME_PREFIX: &str = "image_";
pub const SHORT_NAME_MARKER: &str = "#";

pub fn display_name(raw: &str) -> String {
    raw.trim()
        .replacen(IMAGE_NAME_SUFFIX, "", 1)
        .replacen(IMAGE_NAME_PREFIX, SHORT_NAME_MARKER, 1)
}

/// Data rows of a manifest: header dropped, blank lines dropped.
fn data_rows(text: &str) -> Vec<&str> {
    text.split('\n')
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// `name,url` -> (name, url). The url is `None` when the second field is
/// missing or blank.
fn split_row(line: &str) -> (&str, Option<&str>) {
    let mut fields = line.split(',');
    let name = fields.next().unwrap_or_default().trim();
    let url = fields.next().map(str::trim).filter(|u| !u.is_empty());
    (name, url)
}

/// Join the two manifests by row position. Row `i` becomes item `i`; pairs
/// where either side lacks a URL are skipped, so ids can have gaps.
pub fn join_manifests(images_text: &str, metadata_text: &str) -> Vec<Item> {
    let image_rows = data_rows(images_text);
    let metadata_rows = data_rows(metadata_text);
    if image_rows.len() != metadata_rows.len() {
        warn!(
            "Manifest row counts differ ({} images, {} metadata); extra rows ignored",
            image_rows.len(),
            metadata_rows.len()
        );
    }

    let mut out = Vec::with_capacity(image_rows.len().min(metadata_rows.len()));
    for (i, (image_line, metadata_line)) in image_rows.iter().zip(&metadata_rows).enumerate() {
        let (image_name, image_url) = split_row(image_line);
        let (_, metadata_url) = split_row(metadata_line);
        let (Some(image_url), Some(metadata_url)) = (image_url, metadata_url) else {
            continue;
        };
        out.push(Item {
            id: i,
            name: display_name(image_name),
            image_url: image_url.to_string(),
            metadata_url: metadata_url.to_string(),
        });
    }
    out
}

pub fn manifest_client() -> Result<Client, GalleryError> {
    Client::builder()
        .user_agent("apegal/manifest")
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| GalleryError::Client(e.to_string()))
}

pub fn read_manifest(source: &ManifestSource, client: &Client) -> Result<String, GalleryError> {
    let fail = |reason: String| GalleryError::Manifest {
        manifest: source.describe(),
        reason,
    };
    match source {
        ManifestSource::Local(path) => fs::read_to_string(path).map_err(|e| fail(e.to_string())),
        ManifestSource::Remote(url) => client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| fail(e.to_string())),
    }
}

/// Fetch both manifests (in parallel) and join them. Either failure aborts
/// the whole load; there is no partial collection.
pub fn load_items(
    images: &ManifestSource,
    metadata: &ManifestSource,
) -> Result<Vec<Item>, GalleryError> {
    let client = manifest_client()?;
    let (images_text, metadata_text) = thread::scope(|s| {
        let images_job = s.spawn(|| read_manifest(images, &client));
        let metadata_text = read_manifest(metadata, &client);
        let images_text = images_job.join().unwrap_or_else(|_| {
            Err(GalleryError::Manifest {
                manifest: images.describe(),
                reason: "reader thread panicked".into(),
            })
        });
        (images_text, metadata_text)
    });
    let images_text = images_text?;
    let metadata_text = metadata_text?;
    info!(
        "Manifests loaded - images: {} chars, metadata: {} chars",
        images_text.len(),
        metadata_text.len()
    );
    let items = join_manifests(&images_text, &metadata_text);
    info!("Parsed {} items", items.len());
    Ok(items)
}

/// One-shot background load; reports over `tx` like the other workers.
pub(crate) fn spawn_manifest_load(
    images: ManifestSource,
    metadata: ManifestSource,
    tx: Sender<ManifestMsg>,
) {
    thread::spawn(move || {
        let _ = tx.send(ManifestMsg::Info(format!(
            "Loading manifests ({}, {})…",
            images.describe(),
            metadata.describe()
        )));
        match load_items(&images, &metadata) {
            Ok(items) => {
                let _ = tx.send(ManifestMsg::Done(items));
            }
            Err(err) => {
                warn!("Error loading collection data: {err}");
                let _ = tx.send(ManifestMsg::Error(err.to_string()));
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn seventh_row_becomes_item_six() {
        let mut images = String::from("name,url\n");
        let mut metadata = String::from("name,url\n");
        for n in 1..=7 {
            images.push_str(&format!("image_{n}.jpeg,https://x/{n}.png\n"));
            metadata.push_str(&format!("meta{n}.json,https://x/{n}.json\n"));
        }
        let items = join_manifests(&images, &metadata);
        assert_eq!(items.len(), 7);
        assert_eq!(
            items[6],
            Item {
                id: 6,
                name: "#7".into(),
                image_url: "https://x/7.png".into(),
                metadata_url: "https://x/7.json".into(),
            }
        );
    }

    #[test]
    fn row_without_url_is_dropped() {
        let images = "name,url\nimage_1.jpeg,https://x/1.png\nfoo.jpeg\nimage_3.jpeg,https://x/3.png\n";
        let metadata = "name,url\nm1,https://x/1.json\nm2,https://x/2.json\nm3,https://x/3.json\n";
        let items = join_manifests(images, metadata);
        assert_eq!(items.len(), 2);
        assert_eq!(items.iter().map(|it| it.id).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(items[1].name, "#3");
    }

    #[test]
    fn blank_lines_crlf_and_uneven_lengths() {
        let images = "name,url\r\n\r\nimage_1.jpeg, https://x/1.png \r\n   \nimage_2.jpeg,https://x/2.png\r\n";
        let metadata = "name,url\nm1,https://x/1.json\n";
        let items = join_manifests(images, metadata);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].image_url, "https://x/1.png");
        assert_eq!(items[0].metadata_url, "https://x/1.json");
        assert!(join_manifests("header only", "header only").is_empty());
        assert!(join_manifests("", "").is_empty());
    }

    #[test]
    fn display_name_only_rewrites_first_occurrence() {
        assert_eq!(display_name("image_42.jpeg"), "#42");
        assert_eq!(display_name(" image_image_1.jpeg.jpeg "), "#image_1.jpeg");
        assert_eq!(display_name("cover.png"), "cover.png");
    }

    #[test]
    fn loads_from_local_files_and_fails_as_a_whole() {
        let dir = tempfile::tempdir().unwrap();
        let images_path = dir.path().join("images.csv");
        let metadata_path = dir.path().join("metadata.csv");
        let mut f = fs::File::create(&images_path).unwrap();
        writeln!(f, "name,url\nimage_1.jpeg,https://x/1.png").unwrap();
        let mut f = fs::File::create(&metadata_path).unwrap();
        writeln!(f, "name,url\nm1,https://x/1.json").unwrap();

        let images = ManifestSource::Local(images_path);
        let metadata = ManifestSource::Local(metadata_path);
        let items = load_items(&images, &metadata).unwrap();
        assert_eq!(items.len(), 1);

        let missing = ManifestSource::Local(dir.path().join("missing.csv"));
        let err = load_items(&images, &missing).unwrap_err();
        assert!(matches!(err, GalleryError::Manifest { .. }));
    }
}
