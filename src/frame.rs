//! Decoded frames.
//!
//! A [`Frame`] is one decoded image: a tightly packed 3-channel, 8-bit buffer
//! tagged with its dimensions, its frame index and the [`ChannelOrder`] the
//! bytes are laid out in. Backends may decode in either order; everything
//! a [`VideoCapture`](crate::VideoCapture) hands out has been normalized to
//! [`ChannelOrder::CANONICAL`].

use std::path::Path;

use ffmpeg_next::format::Pixel;
use image::RgbImage;

use crate::error::CaptureError;

/// Byte order of the three colour channels in a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Red, green, blue. This is the canonical order.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

impl ChannelOrder {
    /// The order every frame is normalized to before reaching a caller.
    pub const CANONICAL: ChannelOrder = ChannelOrder::Rgb;

    /// Map to the packed FFmpeg pixel format with the same byte order.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            ChannelOrder::Rgb => Pixel::RGB24,
            ChannelOrder::Bgr => Pixel::BGR24,
        }
    }
}

/// Number of bytes per pixel in every frame.
pub const CHANNELS: usize = 3;

/// A single decoded video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: u64,
    order: ChannelOrder,
}

impl Frame {
    /// Wrap a packed pixel buffer.
    ///
    /// `data` must hold exactly `width * height * 3` bytes.
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: u64, order: ChannelOrder) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
            order,
        }
    }

    /// Packed pixel bytes, row by row, in [`channel_order`](Frame::channel_order).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Zero-based index of this frame within the stream.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Byte order of the channels in [`data`](Frame::data).
    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    /// The three channel values of the pixel at `(x, y)`, in this frame's
    /// own channel order.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * CHANNELS;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    /// Reorder the channels into [`ChannelOrder::CANONICAL`].
    pub fn into_canonical(self) -> Frame {
        self.into_order(ChannelOrder::CANONICAL)
    }

    /// Reorder the channels into `order`. RGB and BGR differ only by the
    /// position of the first and last channel, so this is an in-place swap.
    pub fn into_order(mut self, order: ChannelOrder) -> Frame {
        if self.order != order {
            for pixel in self.data.chunks_exact_mut(CHANNELS) {
                pixel.swap(0, 2);
            }
            self.order = order;
        }
        self
    }

    /// Convert to an [`image::RgbImage`], reordering channels if needed.
    pub fn to_rgb_image(&self) -> Result<RgbImage, CaptureError> {
        let canonical = self.clone().into_canonical();
        RgbImage::from_raw(canonical.width, canonical.height, canonical.data).ok_or_else(|| {
            CaptureError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }

    /// Save the frame to disk. The format is inferred from the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CaptureError> {
        self.to_rgb_image()?.save(path)?;
        Ok(())
    }
}
