use thiserror::Error;

/// Failures surfaced by the gallery core. Each one is caught at the boundary
/// that owns it (manifest load, indexer loop, overlay fetch, indexing) and
/// turned into a log line or status text; none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("failed to load manifest {manifest}: {reason}")]
    Manifest { manifest: String, reason: String },

    #[error("GET {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("decode metadata from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("malformed metadata: {0}")]
    Malformed(String),

    #[error("http client: {0}")]
    Client(String),
}
