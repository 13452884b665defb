//! Nibble-packed 16x16 pixel buffers.
//!
//! Pixels are enumerated row-major (`i = y * 16 + x`). Two pixels share a
//! byte: the even pixel lives in the low nibble, the odd pixel in the high
//! nibble. Every nibble is a palette index, so any 128-byte buffer is valid.

use crate::{Error, Result};

pub const SPRITE_SIZE: usize = 16;
pub const PIXEL_COUNT: usize = SPRITE_SIZE * SPRITE_SIZE;
pub const BUFFER_LEN: usize = PIXEL_COUNT / 2;

/// Result of a single nibble write
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use]
pub struct PixelWrite {
    pub previous: u8,
    pub stored: u8,
    /// The requested value did not fit in 4 bits and was masked
    pub truncated: bool,
}

impl PixelWrite {
    #[inline]
    pub fn changed(&self) -> bool {
        self.previous != self.stored
    }
}

/// Reads the palette index of pixel `i`.
///
/// Panics if `i >= PIXEL_COUNT`, like slice indexing.
#[inline]
pub fn decode_pixel(buffer: &[u8; BUFFER_LEN], i: usize) -> u8 {
    let byte = buffer[i / 2];
    if i & 1 == 0 {
        byte & 0x0f
    } else {
        byte >> 4
    }
}

/// Writes the palette index of pixel `i`, leaving its neighbour in the same
/// byte untouched. Values above 15 keep only their low 4 bits; the returned
/// [`PixelWrite`] reports when that happened.
///
/// Panics if `i >= PIXEL_COUNT`.
pub fn encode_pixel(buffer: &mut [u8; BUFFER_LEN], i: usize, value: u8) -> PixelWrite {
    let stored = value & 0x0f;
    let byte = &mut buffer[i / 2];
    let previous = if i & 1 == 0 {
        let previous = *byte & 0x0f;
        *byte = (*byte & 0xf0) | stored;
        previous
    } else {
        let previous = *byte >> 4;
        *byte = (*byte & 0x0f) | (stored << 4);
        previous
    };
    PixelWrite {
        previous,
        stored,
        truncated: value > 0x0f,
    }
}

#[inline]
pub fn new_blank_buffer() -> [u8; BUFFER_LEN] {
    [0; BUFFER_LEN]
}

#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct PixelBuffer([u8; BUFFER_LEN]);

impl Default for PixelBuffer {
    #[inline]
    fn default() -> Self {
        Self(new_blank_buffer())
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

impl PixelBuffer {
    #[inline]
    pub fn blank() -> Self {
        Self::default()
    }
    #[inline]
    pub fn from_bytes(bytes: [u8; BUFFER_LEN]) -> Self {
        Self(bytes)
    }
    #[inline]
    pub fn as_bytes(&self) -> &[u8; BUFFER_LEN] {
        &self.0
    }
    /// Packs one palette index per input byte.
    pub fn from_indices(indices: &[u8]) -> Result<Self> {
        if indices.len() != PIXEL_COUNT {
            return Err(Error::Format(format!(
                "expected {PIXEL_COUNT} pixels, got {}",
                indices.len()
            )));
        }
        let mut buffer = Self::blank();
        for (i, &index) in indices.iter().enumerate() {
            if buffer.set(i, index)?.truncated {
                return Err(Error::Format(format!(
                    "pixel {i} uses palette index {index}, only 16 colors are available"
                )));
            }
        }
        Ok(buffer)
    }
    pub fn to_indices(&self) -> [u8; PIXEL_COUNT] {
        let mut out = [0; PIXEL_COUNT];
        for (i, p) in out.iter_mut().enumerate() {
            *p = decode_pixel(&self.0, i);
        }
        out
    }
    #[inline]
    pub fn get(&self, i: usize) -> Option<u8> {
        (i < PIXEL_COUNT).then(|| decode_pixel(&self.0, i))
    }
    pub fn set(&mut self, i: usize, value: u8) -> Result<PixelWrite> {
        if i >= PIXEL_COUNT {
            return Err(Error::Index {
                what: "pixel",
                index: i,
                len: PIXEL_COUNT,
            });
        }
        Ok(encode_pixel(&mut self.0, i, value))
    }
    #[inline]
    pub fn get_xy(&self, x: usize, y: usize) -> Option<u8> {
        if x >= SPRITE_SIZE || y >= SPRITE_SIZE {
            return None;
        }
        self.get(y * SPRITE_SIZE + x)
    }
    #[inline]
    pub fn set_xy(&mut self, x: usize, y: usize, value: u8) -> Result<PixelWrite> {
        if x >= SPRITE_SIZE || y >= SPRITE_SIZE {
            return Err(Error::Index {
                what: "pixel",
                index: y.saturating_mul(SPRITE_SIZE).saturating_add(x),
                len: PIXEL_COUNT,
            });
        }
        self.set(y * SPRITE_SIZE + x, value)
    }
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..PIXEL_COUNT).map(|i| decode_pixel(&self.0, i))
    }
    /// One row per line, one hex digit per pixel
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        (0..SPRITE_SIZE).map(|y| {
            (0..SPRITE_SIZE)
                .map(|x| {
                    let p = decode_pixel(&self.0, y * SPRITE_SIZE + x);
                    char::from_digit(p as u32, 16).unwrap_or('?')
                })
                .collect()
        })
    }
}
