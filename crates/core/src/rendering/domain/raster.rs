//! Pixel-level drawing primitives over a [`Frame`].

use crate::shared::frame::Frame;

/// Draws a straight line from `from` to `to` (inclusive) with a square pen of
/// `thickness` pixels. Pixels outside the frame are clipped.
///
/// The segment is clipped to the region the pen can touch before it is
/// walked, so far-away endpoints cost no more than an on-screen line.
pub fn draw_line(
    canvas: &mut Frame,
    from: (i32, i32),
    to: (i32, i32),
    color: [u8; 3],
    thickness: u32,
) {
    let t = thickness.max(1) as i64;
    let lo = -(t - 1) / 2;
    let hi = t / 2;

    if canvas.width() == 0 || canvas.height() == 0 {
        return;
    }
    // Pen centers whose footprint overlaps the frame.
    let min = (-hi, -hi);
    let max = (
        canvas.width() as i64 - 1 - lo,
        canvas.height() as i64 - 1 - lo,
    );
    let from = (from.0 as i64, from.1 as i64);
    let to = (to.0 as i64, to.1 as i64);
    let Some((from, to)) = clip_segment(from, to, min, max) else {
        return;
    };

    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        for oy in lo..=hi {
            for ox in lo..=hi {
                put_pixel(canvas, x + ox, y + oy, color);
            }
        }
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

type Point = (i64, i64);

/// Liang-Barsky clip of `from`-`to` against the inclusive box `min`..=`max`.
///
/// Segments already inside are returned unchanged. Clipped endpoints are
/// rounded to the nearest pixel and kept inside the box.
fn clip_segment(from: Point, to: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    let inside = |p: Point| p.0 >= min.0 && p.0 <= max.0 && p.1 >= min.1 && p.1 <= max.1;
    if inside(from) && inside(to) {
        return Some((from, to));
    }

    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let dx = to.0 as f64 - x0;
    let dy = to.1 as f64 - y0;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    let boundaries = [
        (-dx, x0 - min.0 as f64),
        (dx, max.0 as f64 - x0),
        (-dy, y0 - min.1 as f64),
        (dy, max.1 as f64 - y0),
    ];
    for (p, q) in boundaries {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| {
        (
            ((x0 + t * dx).round() as i64).clamp(min.0, max.0),
            ((y0 + t * dy).round() as i64).clamp(min.1, max.1),
        )
    };
    Some((at(t0), at(t1)))
}

/// Sets one pixel if it lies inside the frame.
fn put_pixel(canvas: &mut Frame, x: i64, y: i64, color: [u8; 3]) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    canvas.set_pixel(x as u32, y as u32, color);
}

/// Per-channel `round(alpha * base + (1 - alpha) * overlay)`, saturating.
///
/// Both buffers must have the same length.
pub fn blend(base: &[u8], overlay: &[u8], alpha: f64) -> Vec<u8> {
    debug_assert_eq!(base.len(), overlay.len());
    let beta = 1.0 - alpha;
    base.iter()
        .zip(overlay)
        .map(|(&b, &o)| (alpha * b as f64 + beta * o as f64).round().clamp(0.0, 255.0) as u8)
        .collect()
}
