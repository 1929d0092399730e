// src/app/thumbs.rs
//! On-demand image pipeline: the grid (and the overlay) ask for a rendition
//! of an image URL; a worker pool downloads, resizes and caches it on disk;
//! the UI thread uploads finished files as textures under a per-frame budget.
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use eframe::egui as eg;
use tracing::{debug, warn};

use crate::app::cache::{download_and_store_resized_with_client, load_rgba, url_to_cache_key};
use crate::app::gfx::upload_rgba;
use crate::app::types::{ThumbDone, ThumbState};

pub const THUMB_MAX_W: u32 = 360;
pub const FULL_MAX_W: u32 = 1400;
pub const RESIZE_QUALITY: u8 = 82;
pub const MAX_DONE_PER_FRAME: usize = 24;
pub const MAX_UPLOADS_PER_FRAME: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rendition {
    /// Grid cell.
    Thumb,
    /// Overlay image stage.
    Full,
}

impl Rendition {
    pub fn key(self, url: &str) -> String {
        let base = url_to_cache_key(url);
        match self {
            Self::Thumb => base,
            Self::Full => format!("{base}__full"),
        }
    }

    pub fn max_width(self) -> u32 {
        match self {
            Self::Thumb => THUMB_MAX_W,
            Self::Full => FULL_MAX_W,
        }
    }
}

struct Job {
    key: String,
    url: String,
    max_width: u32,
}

struct Entry {
    state: ThumbState,
    path: Option<PathBuf>,
    tex: Option<eg::TextureHandle>,
}

pub struct Thumbnails {
    workers: usize,
    entries: HashMap<String, Entry>,
    work_tx: Option<Sender<Job>>,
    done_rx: Option<Receiver<ThumbDone>>,
    // set when the http client could not be built; every request fails fast
    disabled: bool,
}

impl Thumbnails {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            entries: HashMap::new(),
            work_tx: None,
            done_rx: None,
            disabled: false,
        }
    }

    pub fn state(&self, url: &str, rendition: Rendition) -> Option<ThumbState> {
        self.entries.get(&rendition.key(url)).map(|e| e.state)
    }

    /// Texture for `url` if it is uploaded; otherwise queue whatever step is
    /// next (download or upload) and return `None`. Uploads decrement
    /// `uploads_left` and stop at zero.
    pub fn texture(
        &mut self,
        ctx: &eg::Context,
        url: &str,
        rendition: Rendition,
        uploads_left: &mut usize,
    ) -> Option<eg::TextureHandle> {
        let key = rendition.key(url);
        let Some(entry) = self.entries.get_mut(&key) else {
            self.request(key, url, rendition);
            return None;
        };

        if let Some(tex) = &entry.tex {
            return Some(tex.clone());
        }
        if entry.state != ThumbState::Cached || *uploads_left == 0 {
            return None;
        }
        let path = entry.path.clone()?;

        *uploads_left -= 1;
        match load_rgba(&path) {
            Ok((w, h, rgba)) => {
                let tex = upload_rgba(ctx, w, h, &rgba, &key);
                entry.tex = Some(tex.clone());
                entry.state = ThumbState::Ready;
                Some(tex)
            }
            Err(e) => {
                warn!("thumbnail upload failed for {url}: {e}");
                entry.state = ThumbState::Failed;
                None
            }
        }
    }

    fn request(&mut self, key: String, url: &str, rendition: Rendition) {
        let tx = if self.disabled {
            None
        } else {
            self.ensure_workers()
        };
        let state = match tx {
            Some(tx) => {
                let job = Job {
                    key: key.clone(),
                    url: url.to_string(),
                    max_width: rendition.max_width(),
                };
                if tx.send(job).is_ok() {
                    ThumbState::Pending
                } else {
                    ThumbState::Failed
                }
            }
            None => ThumbState::Failed,
        };
        self.entries.insert(
            key,
            Entry {
                state,
                path: None,
                tex: None,
            },
        );
    }

    /// Spawn the worker pool on first use.
    fn ensure_workers(&mut self) -> Option<Sender<Job>> {
        if let Some(tx) = &self.work_tx {
            return Some(tx.clone());
        }

        // One shared HTTP client.
        let client = match reqwest::blocking::Client::builder()
            .user_agent("apegal/thumbs")
            .timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(16)
            .default_headers({
                use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
                let mut h = HeaderMap::new();
                h.insert(
                    ACCEPT,
                    HeaderValue::from_static("image/avif,image/webp,image/*;q=0.8,*/*;q=0.5"),
                );
                h
            })
            .build()
        {
            Ok(c) => Arc::new(c),
            Err(e) => {
                warn!("thumbnail http client build failed: {e}");
                self.disabled = true;
                return None;
            }
        };

        let (work_tx, work_rx) = mpsc::channel::<Job>();
        let (done_tx, done_rx) = mpsc::channel::<ThumbDone>();
        let work_rx = Arc::new(Mutex::new(work_rx));

        for _ in 0..self.workers {
            let work_rx = Arc::clone(&work_rx);
            let done_tx = done_tx.clone();
            let client = Arc::clone(&client);

            thread::spawn(move || loop {
                let job = match work_rx.lock() {
                    Ok(rx) => rx.recv(),
                    Err(_) => break,
                };
                let Ok(job) = job else {
                    break;
                };
                let result = download_and_store_resized_with_client(
                    &client,
                    &job.url,
                    &job.key,
                    job.max_width,
                    RESIZE_QUALITY,
                );
                if done_tx.send(ThumbDone { key: job.key, result }).is_err() {
                    break;
                }
            });
        }
        debug!("started {} thumbnail workers", self.workers);

        self.work_tx = Some(work_tx.clone());
        self.done_rx = Some(done_rx);
        Some(work_tx)
    }

    /// Drain finished downloads. Returns how many arrived.
    pub fn poll_done(&mut self) -> usize {
        let mut drained = 0usize;
        while drained < MAX_DONE_PER_FRAME {
            let Some(rx) = &self.done_rx else {
                break;
            };
            match rx.try_recv() {
                Ok(done) => {
                    drained += 1;
                    self.apply_done(done);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }

    fn apply_done(&mut self, done: ThumbDone) {
        let Some(entry) = self.entries.get_mut(&done.key) else {
            return;
        };
        match done.result {
            Ok(path) => {
                entry.path = Some(path);
                entry.state = ThumbState::Cached; // uploaded lazily during paint
            }
            Err(e) => {
                debug!("thumbnail {} failed: {e}", done.key);
                entry.state = ThumbState::Failed;
            }
        }
    }
}
