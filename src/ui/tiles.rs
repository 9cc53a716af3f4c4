use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use reqwest::blocking::Client;

use super::mercator::TileId;

const USER_AGENT: &str = concat!("bloomwatch/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Tile slots
// ---------------------------------------------------------------------------

enum Slot {
    Pending,
    Ready(TextureHandle),
    Failed,
}

type TileResult = (TileId, Result<ColorImage>);

/// Queued tiles still worth downloading. Shared with the workers.
type Wanted = Arc<Mutex<HashSet<TileId>>>;

/// Base-map tile layer: downloads tiles on a small worker pool and keeps
/// decoded tiles as textures.
pub struct TileLayer {
    template: String,
    attribution: String,
    slots: HashMap<TileId, Slot>,
    /// Settled tiles, oldest first, for eviction.
    settled: VecDeque<TileId>,
    capacity: usize,
    wanted: Wanted,
    jobs: Option<Sender<TileId>>,
    results: Receiver<TileResult>,
}

impl TileLayer {
    pub fn new(
        template: &str,
        attribution: &str,
        workers: usize,
        capacity: usize,
        ctx: &egui::Context,
    ) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<TileId>();
        let (result_tx, result_rx) = mpsc::channel();
        let job_rx = Arc::new(Mutex::new(job_rx));
        let wanted = Wanted::default();

        let mut spawned = 0;
        for n in 0..workers.max(1) {
            let jobs = Arc::clone(&job_rx);
            let wanted = Arc::clone(&wanted);
            let results = result_tx.clone();
            let template = template.to_string();
            let ctx = ctx.clone();
            let handle = thread::Builder::new()
                .name(format!("tile-fetch-{n}"))
                .spawn(move || run_worker(&template, &jobs, &wanted, &results, &ctx));
            match handle {
                Ok(_) => spawned += 1,
                Err(e) => log::error!("Failed to spawn tile worker: {e}"),
            }
        }

        Self {
            template: template.to_string(),
            attribution: attribution.to_string(),
            slots: HashMap::new(),
            settled: VecDeque::new(),
            capacity: capacity.max(1),
            wanted,
            jobs: (spawned > 0).then_some(job_tx),
            results: result_rx,
        }
    }

    pub fn attribution(&self) -> &str {
        &self.attribution
    }

    /// Texture for `id`, queueing a download on first request.
    pub fn get(&mut self, id: TileId) -> Option<&TextureHandle> {
        if !self.slots.contains_key(&id) {
            lock(&self.wanted).insert(id);
            let slot = match &self.jobs {
                Some(jobs) if jobs.send(id).is_ok() => Slot::Pending,
                _ => Slot::Failed,
            };
            self.slots.insert(id, slot);
        }
        match self.slots.get(&id) {
            Some(Slot::Ready(texture)) => Some(texture),
            _ => None,
        }
    }

    /// Drop queued downloads for tiles that scrolled out of view. Workers
    /// skip them when they reach the front of the queue.
    pub fn retain_visible(&mut self, visible: &HashSet<TileId>) {
        let stale: Vec<TileId> = self
            .slots
            .iter()
            .filter(|(id, slot)| matches!(slot, Slot::Pending) && !visible.contains(id))
            .map(|(id, _)| *id)
            .collect();
        if stale.is_empty() {
            return;
        }
        log::debug!("Cancelling {} off-screen tile downloads", stale.len());
        let mut wanted = lock(&self.wanted);
        for id in stale {
            wanted.remove(&id);
            self.slots.remove(&id);
        }
    }

    /// Upload tiles that finished downloading since the last frame.
    pub fn pump(&mut self, ctx: &egui::Context) {
        while let Ok((id, result)) = self.results.try_recv() {
            let slot = match result {
                Ok(image) => {
                    let name = format!("tile-{}-{}-{}", id.z, id.x, id.y);
                    Slot::Ready(ctx.load_texture(name, image, TextureOptions::LINEAR))
                }
                Err(e) => {
                    log::warn!("Tile {}: {e:#}", id.url(&self.template));
                    Slot::Failed
                }
            };
            self.slots.insert(id, slot);
            self.settled.push_back(id);
        }

        while self.settled.len() > self.capacity {
            if let Some(old) = self.settled.pop_front() {
                self.slots.remove(&old);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

fn lock(wanted: &Mutex<HashSet<TileId>>) -> MutexGuard<'_, HashSet<TileId>> {
    wanted.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Take `id` off the wanted set. `false` means it was cancelled.
fn claim(wanted: &Mutex<HashSet<TileId>>, id: TileId) -> bool {
    lock(wanted).remove(&id)
}

fn run_worker(
    template: &str,
    jobs: &Mutex<Receiver<TileId>>,
    wanted: &Mutex<HashSet<TileId>>,
    results: &Sender<TileResult>,
    ctx: &egui::Context,
) {
    let client = match Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(15))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("Tile worker could not build HTTP client: {e}");
            return;
        }
    };

    loop {
        // Hold the lock only while waiting for the next job.
        let next = match jobs.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => return,
        };
        let Ok(id) = next else {
            return;
        };
        if !claim(wanted, id) {
            continue;
        }

        let result = fetch_tile(&client, &id.url(template));
        if results.send((id, result)).is_err() {
            return;
        }
        ctx.request_repaint();
    }
}

fn fetch_tile(client: &Client, url: &str) -> Result<ColorImage> {
    log::debug!("Downloading {url}");
    let response = client.get(url).send().context("requesting tile")?;
    if !response.status().is_success() {
        bail!("tile server responded with {}", response.status());
    }
    let bytes = response.bytes().context("reading tile body")?;
    decode_tile(&bytes)
}

/// Decode PNG bytes into an egui image.
pub fn decode_tile(bytes: &[u8]) -> Result<ColorImage> {
    let rgba = image::load_from_memory(bytes)
        .context("decoding tile image")?
        .into_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Instant;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    #[test]
    fn decodes_png_tiles() {
        let mut png = Vec::new();
        RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let image = decode_tile(&png).unwrap();
        assert_eq!(image.size, [4, 2]);
        assert_eq!(image.pixels[0], egui::Color32::from_rgb(10, 20, 30));
    }

    #[test]
    fn garbage_is_not_a_tile() {
        assert!(decode_tile(b"<html>rate limited</html>").is_err());
    }

    // Nothing listens on the discard port, so every download fails fast.
    const DEAD_TEMPLATE: &str = "http://127.0.0.1:9/{z}/{x}/{y}.png";

    fn tile(x: u32) -> TileId {
        TileId { z: 3, x, y: 0 }
    }

    fn has_pending(layer: &TileLayer) -> bool {
        layer.slots.values().any(|s| matches!(s, Slot::Pending))
    }

    #[test]
    fn cache_evicts_oldest_settled_tiles() {
        let ctx = egui::Context::default();
        let mut layer = TileLayer::new(DEAD_TEMPLATE, "", 1, 2, &ctx);
        for x in 0..6 {
            assert!(layer.get(tile(x)).is_none());
        }

        let deadline = Instant::now() + Duration::from_secs(30);
        while has_pending(&layer) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
            layer.pump(&ctx);
        }

        assert!(!has_pending(&layer));
        assert_eq!(layer.slots.len(), 2);
        assert_eq!(layer.settled, VecDeque::from([tile(4), tile(5)]));
        assert!(layer.slots.contains_key(&tile(4)) && layer.slots.contains_key(&tile(5)));
    }

    #[test]
    fn off_screen_downloads_are_cancelled() {
        let ctx = egui::Context::default();
        let mut layer = TileLayer::new(DEAD_TEMPLATE, "", 1, 16, &ctx);
        layer.get(tile(0));
        layer.get(tile(1));

        layer.retain_visible(&HashSet::from([tile(1)]));

        assert!(!layer.slots.contains_key(&tile(0)));
        assert!(layer.slots.contains_key(&tile(1)));
        assert!(!lock(&layer.wanted).contains(&tile(0)));
    }

    #[test]
    fn cancelled_tiles_are_not_claimed() {
        let wanted = Mutex::new(HashSet::from([tile(2)]));
        assert!(!claim(&wanted, tile(1)));
        assert!(claim(&wanted, tile(2)));
        assert!(!claim(&wanted, tile(2)));
    }
}
