use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::RgbImage;

/// Counts decoded pixel buffers that are still alive.
///
/// Every [`DecodedImage`] handed out by [`BufferTracker::track`] holds a lease
/// that is returned on drop, so the count falls back to zero once all
/// requests that produced images have finished, whichever path they exit by.
#[derive(Debug, Clone, Default)]
pub struct BufferTracker {
    live: Arc<AtomicUsize>,
}

impl BufferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn track(&self, pixels: RgbImage) -> DecodedImage {
        self.live.fetch_add(1, Ordering::AcqRel);
        DecodedImage {
            pixels,
            _lease: BufferLease(Arc::clone(&self.live)),
        }
    }
}

#[derive(Debug)]
struct BufferLease(Arc<AtomicUsize>);

impl Drop for BufferLease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// An owned, decoded RGB image. Released exactly once when dropped.
#[derive(Debug)]
pub struct DecodedImage {
    pixels: RgbImage,
    _lease: BufferLease,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}
