//! Binary face mask from the outline polygon, and its application to a frame.

use crate::detection::domain::landmarks::LandmarkSet;
use crate::shared::frame::{Frame, CHANNELS};

pub const INSIDE: u8 = 255;
pub const OUTSIDE: u8 = 0;

/// Single-channel mask, one byte per pixel, each either 0 or 255.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Mask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            data: vec![OUTSIDE; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn filled(width: u32, height: u32) -> Self {
        Self {
            data: vec![INSIDE; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mask value at `(x, y)`; outside the mask reads as 0.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return OUTSIDE;
        }
        self.data[(y * self.width + x) as usize]
    }

    /// Number of inside pixels.
    pub fn area(&self) -> usize {
        self.data.iter().filter(|&&v| v == INSIDE).count()
    }

    fn fill_span(&mut self, y: u32, x_start: u32, x_end: u32) {
        let row = (y * self.width) as usize;
        self.data[row + x_start as usize..row + x_end as usize].fill(INSIDE);
    }
}

/// Fills the polygon traced by `contour` (landmark indices, in order) into a
/// `width` x `height` mask.
///
/// Indices missing from `landmarks` are skipped. With fewer than three
/// remaining vertices the mask is empty; one or two points enclose no pixel
/// center, so nothing is marked (an outline rasterizer would still mark the
/// pixels under them). A pixel is inside when its center has a non-zero
/// winding number.
pub fn build_mask(width: u32, height: u32, landmarks: &LandmarkSet, contour: &[usize]) -> Mask {
    let mut mask = Mask::empty(width, height);
    let polygon: Vec<(f64, f64)> = contour
        .iter()
        .filter_map(|&i| landmarks.get(i))
        .map(|p| {
            let (x, y) = p.to_pixel(width, height);
            (x as f64, y as f64)
        })
        .collect();

    if polygon.len() < 3 {
        if !contour.is_empty() {
            log::debug!(
                "Face contour has {} usable points, mask left empty",
                polygon.len()
            );
        }
        return mask;
    }

    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for y in 0..height {
        let sy = y as f64 + 0.5;
        crossings.clear();
        for (i, &(x0, y0)) in polygon.iter().enumerate() {
            let (x1, y1) = polygon[(i + 1) % polygon.len()];
            let (winding, crosses) = if y0 <= sy && sy < y1 {
                (1, true)
            } else if y1 <= sy && sy < y0 {
                (-1, true)
            } else {
                (0, false)
            };
            if crosses {
                let x = x0 + (sy - y0) * (x1 - x0) / (y1 - y0);
                crossings.push((x, winding));
            }
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0;
        for pair in crossings.windows(2) {
            winding += pair[0].1;
            if winding == 0 {
                continue;
            }
            // Pixel centers x + 0.5 within [left, right).
            let start = (pair[0].0 - 0.5).ceil().clamp(0.0, width as f64) as u32;
            let end = (pair[1].0 - 0.5).ceil().clamp(0.0, width as f64) as u32;
            if start < end {
                mask.fill_span(y, start, end);
            }
        }
    }
    mask
}

/// Per-channel bitwise AND of `frame` with `mask`: inside pixels are kept,
/// outside pixels become black.
pub fn apply_mask(frame: &Frame, mask: &Mask) -> Frame {
    let width = frame.width();
    let data = frame
        .data()
        .chunks_exact(CHANNELS)
        .enumerate()
        .flat_map(|(i, px)| {
            let m = mask.get(i as u32 % width, i as u32 / width);
            [px[0] & m, px[1] & m, px[2] & m]
        })
        .collect();
    frame.with_data(data)
}

/// Face cut out of `frame` along the contour polygon.
pub fn segment_face(frame: &Frame, landmarks: &LandmarkSet, contour: &[usize]) -> Frame {
    let mask = build_mask(frame.width(), frame.height(), landmarks, contour);
    apply_mask(frame, &mask)
}
