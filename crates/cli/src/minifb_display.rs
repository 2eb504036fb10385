use std::collections::HashMap;

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use facemesh_core::shared::frame::{Frame, PixelLayout};
use facemesh_core::video::domain::display_sink::{DisplaySink, DisplayStatus, View};

/// One native window per view. Status text goes into the window title.
///
/// Windows are created on first use with the size of the first frame shown.
#[derive(Default)]
pub struct MinifbDisplay {
    windows: HashMap<View, ViewWindow>,
}

struct ViewWindow {
    window: Window,
    buffer: Vec<u32>,
    refreshed: bool,
}

impl MinifbDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn window_for(
        &mut self,
        view: View,
        width: usize,
        height: usize,
    ) -> Result<&mut ViewWindow, Box<dyn std::error::Error>> {
        let stale = self
            .windows
            .get(&view)
            .is_some_and(|w| w.window.get_size() != (width, height));
        if stale {
            self.windows.remove(&view);
        }
        if !self.windows.contains_key(&view) {
            let window = Window::new(view.title(), width, height, WindowOptions::default())?;
            log::debug!("Opened window '{}' ({width}x{height})", view.title());
            self.windows.insert(
                view,
                ViewWindow {
                    window,
                    buffer: Vec::new(),
                    refreshed: false,
                },
            );
        }
        self.windows
            .get_mut(&view)
            .ok_or_else(|| "display window missing".into())
    }
}

impl DisplaySink for MinifbDisplay {
    fn show(
        &mut self,
        view: View,
        frame: &Frame,
        status: &DisplayStatus,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        let target = self.window_for(view, width, height)?;

        fill_argb(&mut target.buffer, frame);
        target.window.update_with_buffer(&target.buffer, width, height)?;
        if view == View::FaceMesh {
            target
                .window
                .set_title(&format!("{} | {}", view.title(), status.label()));
        }
        target.refreshed = true;
        Ok(())
    }

    fn poll_key(&mut self) -> Option<char> {
        let mut pressed = None;
        for target in self.windows.values_mut() {
            // Windows not redrawn this iteration still need their events pumped.
            if !target.refreshed {
                target.window.update();
            }
            target.refreshed = false;
            for key in target.window.get_keys_pressed(KeyRepeat::No) {
                if pressed.is_none() {
                    pressed = key_to_char(key);
                }
            }
        }
        pressed
    }

    fn is_open(&self) -> bool {
        self.windows.values().all(|w| w.window.is_open())
    }
}

fn key_to_char(key: Key) -> Option<char> {
    match key {
        Key::Q => Some('q'),
        _ => None,
    }
}

/// Packs a frame into minifb's `0RGB` u32 pixels.
fn fill_argb(buffer: &mut Vec<u32>, frame: &Frame) {
    let rgb = frame.to_layout(PixelLayout::Rgb);
    buffer.clear();
    buffer.extend(
        rgb.data()
            .chunks_exact(3)
            .map(|px| (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32),
    );
}
