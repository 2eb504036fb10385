use std::borrow::Cow;

use ndarray::ArrayView3;

/// Byte order of the three color channels of a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Bgr,
}

impl PixelLayout {
    /// Reorders an RGB triple into this layout.
    pub fn from_rgb(self, rgb: [u8; 3]) -> [u8; 3] {
        match self {
            PixelLayout::Rgb => rgb,
            PixelLayout::Bgr => [rgb[2], rgb[1], rgb[0]],
        }
    }
}

/// A single captured frame: tightly packed 3-channel bytes in row-major order.
///
/// Frames are created by a frame source, consumed within one loop iteration,
/// and never shared across threads by reference (the detector receives a copy).
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    layout: PixelLayout,
    index: usize,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, layout: PixelLayout, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            layout,
            index,
        }
    }

    /// All-black frame of the given size.
    pub fn black(width: u32, height: u32, layout: PixelLayout, index: usize) -> Self {
        let len = (width as usize) * (height as usize) * CHANNELS;
        Self::new(vec![0; len], width, height, layout, index)
    }

    /// A frame with the same geometry, layout and index but different pixels.
    pub fn with_data(&self, data: Vec<u8>) -> Self {
        Self::new(data, self.width, self.height, self.layout, self.index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = self.offset(x, y);
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: [u8; 3]) {
        let offset = self.offset(x, y);
        self.data[offset..offset + CHANNELS].copy_from_slice(&value);
    }

    /// Returns the frame in the requested channel order, borrowing when no
    /// conversion is needed.
    pub fn to_layout(&self, layout: PixelLayout) -> Cow<'_, Frame> {
        if self.layout == layout {
            return Cow::Borrowed(self);
        }
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(CHANNELS) {
            px.swap(0, 2);
        }
        Cow::Owned(Self::new(data, self.width, self.height, layout, self.index))
    }

    /// Mirrors the frame left-to-right in place.
    pub fn flip_horizontal(&mut self) {
        let w = self.width as usize;
        let row_len = w * CHANNELS;
        if row_len == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(row_len) {
            for x in 0..w / 2 {
                let a = x * CHANNELS;
                let b = (w - 1 - x) * CHANNELS;
                for c in 0..CHANNELS {
                    row.swap(a + c, b + c);
                }
            }
        }
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}
