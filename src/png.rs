//! Indexed PNG import and export of single sprites.
//!
//! PNG packs 4-bit pixels with the left pixel in the high nibble, the
//! opposite of the document layout, so bytes are nibble-swapped both ways.

use crate::{Error, Palette, PixelBuffer, Result, BUFFER_LEN, SPRITE_SIZE};

#[inline]
fn swap_nibbles(bytes: &[u8; BUFFER_LEN]) -> [u8; BUFFER_LEN] {
    bytes.map(|b| b.rotate_left(4))
}

pub fn write_png(pixels: &PixelBuffer, palette: &Palette) -> lodepng::Result<Vec<u8>> {
    let mut encoder = lodepng::Encoder::new();
    encoder.set_auto_convert(false);
    encoder.set_palette(palette.as_slice())?;
    encoder.info_png_mut().color.set_bitdepth(4);
    encoder.info_raw_mut().set_bitdepth(4);
    let data = swap_nibbles(pixels.as_bytes());
    encoder.encode(data.as_slice(), SPRITE_SIZE, SPRITE_SIZE)
}

/// Reads a 16x16 indexed PNG. Only the indices are used, the PNG's own
/// palette is ignored.
pub fn read_png(data: &[u8]) -> Result<PixelBuffer> {
    let mut decoder = lodepng::Decoder::new();
    decoder.color_convert(false);
    let png = decoder
        .decode(data)
        .map_err(|e| Error::Format(format!("Invalid PNG: {e}")))?;
    let info = decoder.info_png();
    let depth = info.color.bitdepth();
    if info.color.colortype() != lodepng::ColorType::PALETTE || (depth != 4 && depth != 8) {
        return Err(Error::Format(
            "Sprite PNG must be 4-bit or 8-bit indexed color".into(),
        ));
    }
    let bitmap = match png {
        lodepng::Image::RawData(b) => b,
        _ => {
            return Err(Error::Format(
                "Sprite PNG must be 4-bit or 8-bit indexed color".into(),
            ))
        }
    };
    if bitmap.width != SPRITE_SIZE || bitmap.height != SPRITE_SIZE {
        return Err(Error::Format(format!(
            "Sprite PNG must be {SPRITE_SIZE}x{SPRITE_SIZE}, got {}x{}",
            bitmap.width, bitmap.height
        )));
    }
    if depth == 4 {
        let bytes = <[u8; BUFFER_LEN]>::try_from(bitmap.buffer.as_slice())
            .map_err(|_| Error::Format("4-bit PNG has the wrong data size".into()))?;
        Ok(PixelBuffer::from_bytes(swap_nibbles(&bytes)))
    } else {
        PixelBuffer::from_indices(&bitmap.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, PIXEL_COUNT};

    fn gradient() -> PixelBuffer {
        let indices: Vec<u8> = (0..PIXEL_COUNT).map(|i| ((i / 16 + i) % 16) as u8).collect();
        PixelBuffer::from_indices(&indices).unwrap()
    }

    #[test]
    fn export_then_import() {
        let mut palette = Palette::default();
        palette.set(3, Color::new(10, 20, 30, 255)).unwrap();
        let pixels = gradient();
        let png = write_png(&pixels, &palette).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(read_png(&png).unwrap(), pixels);
    }

    #[test]
    fn exported_pixels_are_left_to_right() {
        let mut pixels = PixelBuffer::blank();
        let _ = pixels.set(0, 1).unwrap();
        let png = write_png(&pixels, &Palette::default()).unwrap();

        let mut decoder = lodepng::Decoder::new();
        decoder.color_convert(false);
        let bitmap = match decoder.decode(&png).unwrap() {
            lodepng::Image::RawData(b) => b,
            _ => panic!("expected raw indexed data"),
        };
        assert_eq!(bitmap.buffer[0], 0x10);
    }

    #[test]
    fn rejects_garbage_and_wrong_size() {
        assert!(matches!(read_png(b"not a png"), Err(Error::Format(_))));

        let mut encoder = lodepng::Encoder::new();
        encoder.set_auto_convert(false);
        encoder.set_palette(Palette::default().as_slice()).unwrap();
        let png = encoder.encode([0u8; 8 * 8].as_slice(), 8, 8).unwrap();
        let err = read_png(&png).unwrap_err();
        assert!(err.to_string().contains("16x16"), "{err}");
    }
}
