// Image decoding for the showcase: raw RGBA on worker threads, textures on
// the main thread. Decoders are plain functions so they can run anywhere;
// texture upload touches GDK and stays on the GTK side.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use gdk4::{MemoryFormat, MemoryTexture, Texture};
use gtk4::prelude::*;
use image::{DynamicImage, GenericImageView};

/// Number of background decode threads for neighbor prefetch.
const PREFETCH_WORKERS: usize = 2;

/// Decoded RGBA pixels, ready for texture upload.
pub struct LoadedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    image::load_from_memory(&bytes).with_context(|| format!("Failed to decode image: {:?}", path))
}

/// Decode at full resolution.
pub fn decode_full(path: &Path) -> Result<LoadedImage> {
    let img = open_image(path)?;
    let (width, height) = img.dimensions();
    Ok(LoadedImage {
        data: img.to_rgba8().into_raw(),
        width: width.max(1),
        height: height.max(1),
    })
}

/// Decode downscaled so the longest side fits `max_size` (thumbnails, grid
/// cells). Images already small enough pass through untouched.
pub fn decode_downscaled(path: &Path, max_size: u32) -> Result<LoadedImage> {
    let img = open_image(path)?;
    let (orig_w, orig_h) = img.dimensions();

    let longest = orig_w.max(orig_h).max(1);
    let prepared = if longest > max_size {
        let scale = max_size as f32 / longest as f32;
        let new_w = ((orig_w as f32 * scale) as u32).max(1);
        let new_h = ((orig_h as f32 * scale) as u32).max(1);
        img.resize_exact(new_w, new_h, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    let (out_w, out_h) = prepared.dimensions();
    Ok(LoadedImage {
        data: prepared.to_rgba8().into_raw(),
        width: out_w.max(1),
        height: out_h.max(1),
    })
}

/// Create a GDK texture from decoded RGBA data. Main-thread only.
pub fn texture_from_rgba(image: &LoadedImage) -> Option<Texture> {
    if image.width == 0 || image.height == 0 {
        return None;
    }
    let expected = (image.width as u64)
        .saturating_mul(image.height as u64)
        .saturating_mul(4);
    if (image.data.len() as u64) < expected {
        tracing::warn!(
            "Skipping texture: data too small ({} bytes for {}x{})",
            image.data.len(),
            image.width,
            image.height
        );
        return None;
    }
    let bytes = glib::Bytes::from(&image.data);
    let texture = MemoryTexture::new(
        image.width as i32,
        image.height as i32,
        MemoryFormat::R8g8b8a8,
        &bytes,
        (image.width * 4) as usize,
    );
    Some(texture.upcast())
}

pub struct PrefetchResult {
    pub path: PathBuf,
    pub image: LoadedImage,
}

struct PrefetchJob {
    path: PathBuf,
    generation: u64,
}

/// Bounded worker pool that decodes neighbor images off the main thread.
///
/// Each `request` bumps the generation; jobs from earlier generations are
/// dropped by the workers so rapid navigation never queues stale work.
pub struct PrefetchPool {
    request_tx: flume::Sender<PrefetchJob>,
    generation: Arc<AtomicU64>,
}

impl PrefetchPool {
    pub fn spawn(results: async_channel::Sender<PrefetchResult>) -> Self {
        let (request_tx, request_rx) = flume::bounded::<PrefetchJob>(64);
        let generation = Arc::new(AtomicU64::new(0));

        for _ in 0..PREFETCH_WORKERS {
            let rx = request_rx.clone();
            let tx = results.clone();
            let generation = generation.clone();
            std::thread::spawn(move || {
                while let Ok(job) = rx.recv() {
                    if job.generation != generation.load(Ordering::Acquire) {
                        continue;
                    }
                    let decoded = match decode_full(&job.path) {
                        Ok(image) => image,
                        Err(err) => {
                            tracing::debug!(error = ?err, "Prefetch decode failed");
                            continue;
                        }
                    };
                    if job.generation != generation.load(Ordering::Acquire) {
                        continue;
                    }
                    let _ = tx.send_blocking(PrefetchResult {
                        path: job.path,
                        image: decoded,
                    });
                }
            });
        }

        Self {
            request_tx,
            generation,
        }
    }

    /// Queue decodes for `paths`, superseding any earlier request.
    pub fn request(&self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        let generation = self
            .generation
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1);
        for path in paths {
            if self.request_tx.try_send(PrefetchJob { path, generation }).is_err() {
                break;
            }
        }
    }
}
