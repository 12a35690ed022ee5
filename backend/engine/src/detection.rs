//! Turning a detector probability map into padded text boxes.

use std::collections::VecDeque;

use ocrgate_core::{BoundingBox, EngineError};

use crate::profile::EngineProfile;

/// Regions smaller than this many cells are treated as noise.
pub const MIN_REGION_AREA: usize = 16;

/// Minimum padding, in pixels, added on each side of a box.
const MIN_PADDING: u32 = 2;

/// Detector input size for an image: downscaled to `max_side`, then rounded
/// up to multiples of 32 on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalePlan {
    pub target_width: u32,
    pub target_height: u32,
}

impl ScalePlan {
    pub fn new(width: u32, height: u32, max_side: u32) -> Self {
        let longest = width.max(height);
        let scale = if longest > max_side {
            max_side as f32 / longest as f32
        } else {
            1.0
        };
        Self {
            target_width: align32((width as f32 * scale) as u32),
            target_height: align32((height as f32 * scale) as u32),
        }
    }
}

fn align32(value: u32) -> u32 {
    value.max(1).div_ceil(32) * 32
}

/// Per-cell text probability produced by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMap {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl ProbabilityMap {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self, EngineError> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(EngineError::Failed(format!(
                "probability map is {} cells, expected {width}x{height}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }
}

/// A connected text region in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub area: usize,
}

/// Threshold the map, dilate with a 3x3 kernel, and return the 8-connected
/// regions of at least [`MIN_REGION_AREA`] cells.
pub fn find_regions(map: &ProbabilityMap, threshold: f32) -> Vec<Region> {
    let (w, h) = (map.width as usize, map.height as usize);
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let binary: Vec<bool> = map.data.iter().map(|&p| p > threshold).collect();
    let mask = dilate(&binary, w, h);

    let mut seen = vec![false; w * h];
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..w * h {
        if !mask[start] || seen[start] {
            continue;
        }
        seen[start] = true;
        queue.push_back(start);

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (w, h, 0, 0);
        let mut area = 0usize;

        while let Some(idx) = queue.pop_front() {
            let (x, y) = (idx % w, idx / w);
            area += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            for (nx, ny) in neighbours(x, y, w, h) {
                let n = ny * w + nx;
                if mask[n] && !seen[n] {
                    seen[n] = true;
                    queue.push_back(n);
                }
            }
        }

        if area >= MIN_REGION_AREA {
            regions.push(Region {
                x: min_x as u32,
                y: min_y as u32,
                width: (max_x - min_x + 1) as u32,
                height: (max_y - min_y + 1) as u32,
                area,
            });
        }
    }

    regions
}

fn dilate(binary: &[bool], w: usize, h: usize) -> Vec<bool> {
    let mut out = vec![false; w * h];
    for y in 0..h {
        for x in 0..w {
            if binary[y * w + x] {
                out[y * w + x] = true;
                for (nx, ny) in neighbours(x, y, w, h) {
                    out[ny * w + nx] = true;
                }
            }
        }
    }
    out
}

fn neighbours(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    let xs = x.saturating_sub(1)..=(x + 1).min(w - 1);
    xs.flat_map(move |nx| {
        let ys = y.saturating_sub(1)..=(y + 1).min(h - 1);
        ys.map(move |ny| (nx, ny))
    })
    .filter(move |&(nx, ny)| (nx, ny) != (x, y))
}

/// Map a region back to image pixels and grow it by the profile's unclip
/// ratio, clamped to the image.
///
/// `scale_x`/`scale_y` are map size divided by image size.
pub fn expand_region(
    region: &Region,
    scale_x: f32,
    scale_y: f32,
    profile: &EngineProfile,
    image_width: u32,
    image_height: u32,
) -> BoundingBox {
    let x = (region.x as f32 / scale_x) as u32;
    let y = (region.y as f32 / scale_y) as u32;
    let w = (region.width as f32 / scale_x) as u32;
    let h = (region.height as f32 / scale_y) as u32;

    let grow = (profile.unclip_ratio - 1.0) * 0.5;
    let pad_w = ((w as f32 * grow) as u32).max(MIN_PADDING);
    let pad_h = ((h as f32 * grow) as u32).max(MIN_PADDING);

    let x = x.saturating_sub(pad_w).min(image_width);
    let y = y.saturating_sub(pad_h).min(image_height);
    BoundingBox {
        x,
        y,
        width: (w + pad_w * 2).min(image_width - x),
        height: (h + pad_h * 2).min(image_height - y),
    }
}
