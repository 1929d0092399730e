// src/app/mod.rs: async manifest load + paced search indexing + paged grid with poem/image overlay

// ---- Standard lib imports ----
use std::env;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ---- Crates ----
use eframe::egui as eg;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

// ---- Local modules ----
pub mod cache;
pub mod fetch;
pub mod gallery;
pub mod gfx;
pub mod indexer;
pub mod manifest;
pub mod metadata;
pub mod render;
pub mod schedule;
pub mod search;
pub mod thumbs;
pub mod types;
pub mod ui;
pub mod view;

use crate::app::fetch::{HttpFetcher, MetadataFetcher};
use crate::app::gallery::{Gallery, ItemClick};
use crate::app::indexer::{index_candidates, BackgroundIndexer, INDEX_START_DELAY};
use crate::app::schedule::{Debouncer, Delay};
use crate::app::thumbs::Thumbnails;
use crate::app::types::{BootPhase, ManifestMsg, OverlayFetched, Toast};
use crate::config::{load_config, AppConfig};

// ---- Tunables ----
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
const TOAST_TTL: Duration = Duration::from_secs(3);
const MAX_INDEX_MSGS_PER_FRAME: usize = 32;
const BUSY_REPAINT: Duration = Duration::from_millis(100);

pub const LOAD_ERROR_TEXT: &str = "Failed to load collection data. CSV files may be missing.";
pub const OVERLAY_ERROR_TEXT: &str = "Failed to load data.";

pub struct GalleryApp {
    cfg: AppConfig,
    gallery: Gallery,

    // boot
    did_init: bool,
    boot_phase: BootPhase,
    loading_message: String,
    load_error: Option<String>,
    manifest_rx: Option<Receiver<ManifestMsg>>,

    // search
    search_input: String,
    search_debounce: Debouncer<String>,

    // metadata: background indexer + on-demand overlay fetches
    fetcher: Option<Arc<HttpFetcher>>,
    indexer: BackgroundIndexer,
    index_start: Option<Delay>,
    overlay_tx: Sender<OverlayFetched>,
    overlay_rx: Receiver<OverlayFetched>,
    overlay_pending: Option<usize>,

    toast: Option<Toast>,
    show_info: bool,
    thumbs: Thumbnails,
    rng: StdRng,
}

impl Default for GalleryApp {
    fn default() -> Self {
        Self::new(load_config())
    }
}

impl GalleryApp {
    pub fn new(cfg: AppConfig) -> Self {
        let fetcher = match HttpFetcher::new(cfg.proxy_endpoint.clone()) {
            Ok(f) => Some(Arc::new(f)),
            Err(e) => {
                warn!("metadata client unavailable: {e}");
                None
            }
        };
        let (overlay_tx, overlay_rx) = mpsc::channel();
        let thumbs = Thumbnails::new(cfg.thumb_workers);

        Self {
            cfg,
            gallery: Gallery::default(),
            did_init: false,
            boot_phase: BootPhase::Loading,
            loading_message: String::new(),
            load_error: None,
            manifest_rx: None,
            search_input: String::new(),
            search_debounce: Debouncer::new(SEARCH_DEBOUNCE),
            fetcher,
            indexer: BackgroundIndexer::default(),
            index_start: None,
            overlay_tx,
            overlay_rx,
            overlay_pending: None,
            toast: None,
            show_info: false,
            thumbs,
            rng: StdRng::from_entropy(),
        }
    }

    fn start_manifest_load(&mut self) {
        let (tx, rx) = mpsc::channel();
        self.manifest_rx = Some(rx);
        self.loading_message = "Loading collection…".into();
        manifest::spawn_manifest_load(
            self.cfg.images_manifest.clone(),
            self.cfg.metadata_manifest.clone(),
            tx,
        );
    }

    fn poll_manifest(&mut self) {
        let Some(rx) = &self.manifest_rx else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(ManifestMsg::Info(text)) => self.loading_message = text,
                Ok(ManifestMsg::Done(items)) => {
                    info!("Collection ready: {} items", items.len());
                    self.gallery = Gallery::new(items);
                    self.gallery.render_next_page(&mut self.rng);
                    self.boot_phase = BootPhase::Ready;
                    self.manifest_rx = None;
                    self.schedule_indexing();
                    return;
                }
                Ok(ManifestMsg::Error(err)) => {
                    self.load_error = Some(err);
                    self.boot_phase = BootPhase::Failed;
                    self.manifest_rx = None;
                    return;
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    warn!("manifest loader ended without a result");
                    self.load_error = Some("manifest loader stopped".into());
                    self.boot_phase = BootPhase::Failed;
                    self.manifest_rx = None;
                    return;
                }
            }
        }
    }

    fn schedule_indexing(&mut self) {
        if env::var_os("APEGAL_DISABLE_INDEXING").is_some() {
            info!("Background indexing disabled via APEGAL_DISABLE_INDEXING");
            return;
        }
        if self.gallery.items().is_empty() {
            return;
        }
        self.index_start = Some(Delay::new(INDEX_START_DELAY, Instant::now()));
    }

    fn poll_indexing(&mut self, now: Instant) {
        if self.index_start.as_mut().is_some_and(|d| d.poll(now)) {
            self.index_start = None;
            match &self.fetcher {
                Some(fetcher) => {
                    let candidates = index_candidates(self.gallery.items(), &self.gallery.index);
                    let fetcher: Arc<dyn MetadataFetcher> = fetcher.clone();
                    self.indexer.start(candidates, fetcher);
                }
                None => warn!("Skipping background indexing: no metadata client"),
            }
        }
        for msg in self.indexer.drain(MAX_INDEX_MSGS_PER_FRAME) {
            self.gallery.apply_index_msg(msg);
        }
    }

    fn poll_search(&mut self, now: Instant) {
        if let Some(term) = self.search_debounce.poll(now) {
            self.gallery.apply_search(&term, &mut self.rng);
        }
    }

    pub(crate) fn on_search_edited(&mut self) {
        self.search_debounce
            .schedule(self.search_input.clone(), Instant::now());
    }

    pub(crate) fn on_item_click(&mut self, id: usize) {
        match self.gallery.click_item(id) {
            ItemClick::Applied(_) => {
                // a later click supersedes any pending open
                self.overlay_pending = None;
                self.gallery.view.set_loading(false);
            }
            ItemClick::NeedsMetadata(id) => self.start_overlay_fetch(id),
        }
    }

    fn start_overlay_fetch(&mut self, id: usize) {
        let (Some(fetcher), Some(item)) = (self.fetcher.clone(), self.gallery.item(id).cloned())
        else {
            self.show_toast(OVERLAY_ERROR_TEXT);
            return;
        };
        self.overlay_pending = Some(id);
        self.gallery.view.set_loading(true);

        let tx = self.overlay_tx.clone();
        thread::spawn(move || {
            let result = fetcher.fetch(&item).map_err(|e| e.to_string());
            let _ = tx.send(OverlayFetched { id: item.id, result });
        });
    }

    fn poll_overlay_fetch(&mut self) {
        while let Ok(OverlayFetched { id, result }) = self.overlay_rx.try_recv() {
            let wanted = self.overlay_pending == Some(id);
            match result {
                Ok(doc) if wanted => {
                    self.overlay_pending = None;
                    self.gallery.view.set_loading(false);
                    self.gallery.open_poem(id, doc);
                }
                // superseded: still worth caching
                Ok(doc) => self.gallery.ingest_metadata(id, doc),
                Err(e) => {
                    warn!("Error loading metadata for item {id}: {e}");
                    if wanted {
                        self.overlay_pending = None;
                        self.gallery.view.set_loading(false);
                        self.show_toast(OVERLAY_ERROR_TEXT);
                    }
                }
            }
        }
    }

    fn show_toast(&mut self, text: &str) {
        self.toast = Some(Toast {
            text: text.to_string(),
            until: Instant::now() + TOAST_TTL,
        });
    }

    fn busy(&self) -> bool {
        self.boot_phase == BootPhase::Loading
            || self.indexer.is_indexing()
            || self.index_start.is_some()
            || self.overlay_pending.is_some()
            || self.search_debounce.is_pending()
            || self.toast.is_some()
    }

    /// Next wake-up: the earliest pending timer, capped by the busy cadence.
    fn repaint_delay(&self, now: Instant) -> Option<Duration> {
        let timer = [
            self.search_debounce.remaining(now),
            self.index_start.as_ref().and_then(|d| d.remaining(now)),
        ]
        .into_iter()
        .flatten()
        .min();
        match timer {
            Some(t) => Some(t.min(BUSY_REPAINT)),
            None => self.busy().then_some(BUSY_REPAINT),
        }
    }
}

// ========== App impl ==========
impl eframe::App for GalleryApp {
    fn update(&mut self, ctx: &eg::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // First frame
        if !self.did_init {
            self.did_init = true;
            self.start_manifest_load();
        }

        self.poll_manifest();

        if self.boot_phase == BootPhase::Loading {
            eg::CentralPanel::default().show(ctx, |ui| self.ui_render_splash(ui));
            ctx.request_repaint_after(BUSY_REPAINT);
            return;
        }

        self.poll_search(now);
        self.poll_indexing(now);
        self.poll_overlay_fetch();
        if self.thumbs.poll_done() > 0 {
            ctx.request_repaint();
        }
        if self.toast.as_ref().is_some_and(|t| !t.is_live(now)) {
            self.toast = None;
        }

        if ctx.input(|i| i.key_pressed(eg::Key::Escape)) {
            self.gallery.close_overlay();
            self.show_info = false;
        }

        // ---- Main UI ----
        eg::TopBottomPanel::top("topbar").show(ctx, |ui| self.ui_render_topbar(ui));
        eg::CentralPanel::default().show(ctx, |ui| {
            if self.boot_phase == BootPhase::Failed {
                self.ui_render_load_error(ui);
            } else {
                self.ui_render_grid(ui, ctx);
            }
        });

        self.ui_render_overlay(ctx);
        self.ui_render_info_popup(ctx);
        self.ui_render_toast(ctx);

        if let Some(delay) = self.repaint_delay(now) {
            ctx.request_repaint_after(delay);
        }
    }
}
