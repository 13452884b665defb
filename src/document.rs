//! On-disk sprite document.
//!
//! ```text
//! "sprt"                      magic
//! u32 LE                      sprite count N
//! 16 x [r, g, b, a]           palette
//! N x { [u8; 64], [u8; 128] } name field, pixel buffer
//! ```

use crate::{
    convert_error, sprite::NAME_LEN, Error, Palette, PixelBuffer, Result, SpriteCollection,
    SpriteName, BUFFER_LEN, NUM_COLORS,
};
use binrw::BinWrite;
use nom::{
    bytes::complete::{tag, take},
    error::{context, ContextError, ParseError, VerboseError},
    multi::fill,
    number::complete::le_u32,
};
use std::{io, path::Path};

pub const MAGIC: &[u8; 4] = b"sprt";
pub const HEADER_LEN: usize = 4 + 4 + NUM_COLORS * 4;
pub const RECORD_LEN: usize = NAME_LEN + BUFFER_LEN;

#[derive(Clone, Debug)]
#[binrw::binrw]
#[brw(little, magic = b"sprt")]
struct Header {
    count: u32,
    palette: [[u8; 4]; NUM_COLORS],
}

#[derive(Clone, Debug)]
#[binrw::binrw]
#[brw(little)]
struct SpriteRecord {
    name: [u8; NAME_LEN],
    pixels: [u8; BUFFER_LEN],
}

/// Palette plus sprites, the unit that is loaded and saved
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Document {
    pub(crate) palette: Palette,
    pub(crate) sprites: SpriteCollection,
}

/// Lossy details of a successful write
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EncodeSummary {
    /// Sprites whose names were longer than the name field
    pub truncated_names: Vec<usize>,
}

fn array<'a, const N: usize, E: ParseError<&'a [u8]>>(
    data: &'a [u8],
) -> nom::IResult<&'a [u8], [u8; N], E> {
    let (data, bytes) = take(N)(data)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok((data, out))
}

fn parse_header<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
    data: &'a [u8],
) -> nom::IResult<&'a [u8], Header, E> {
    let (data, _) = context("magic", tag(&MAGIC[..]))(data)?;
    let (data, count) = context("sprite count", le_u32)(data)?;
    let mut palette = [[0u8; 4]; NUM_COLORS];
    let (data, ()) = context("palette", fill(array::<4, E>, &mut palette))(data)?;
    Ok((data, Header { count, palette }))
}

fn parse_record<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
    data: &'a [u8],
) -> nom::IResult<&'a [u8], SpriteRecord, E> {
    let (data, name) = context("sprite name", array::<NAME_LEN, E>)(data)?;
    let (data, pixels) = context("sprite pixels", array::<BUFFER_LEN, E>)(data)?;
    Ok((data, SpriteRecord { name, pixels }))
}

trait NoSeekWrite {
    fn write_no_seek<W: io::Write>(&self, writer: &mut W) -> io::Result<()>;
}

impl<T: BinWrite> NoSeekWrite for T
where
    Self: binrw::meta::WriteEndian,
    for<'a> T::Args<'a>: Default,
{
    fn write_no_seek<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write(&mut binrw::io::NoSeek::new(writer))
            .map_err(|e| match e {
                binrw::Error::Io(e) => e,
                e => io::Error::new(io::ErrorKind::Other, e),
            })
    }
}

impl Document {
    pub fn new(palette: Palette, sprites: SpriteCollection) -> Self {
        Self { palette, sprites }
    }
    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }
    #[inline]
    pub fn sprites(&self) -> &SpriteCollection {
        &self.sprites
    }
    /// Appends a blank sprite. Allocation failure is reported, not fatal.
    pub fn new_sprite(&mut self, name: SpriteName) -> Result<usize> {
        self.sprites.try_append(name, PixelBuffer::blank())
    }
    /// Appends a sprite with existing pixels.
    pub fn add_sprite(&mut self, name: SpriteName, pixels: PixelBuffer) -> Result<usize> {
        self.sprites.try_append(name, pixels)
    }

    /// Decodes a whole document image. Nothing is returned unless every
    /// record is present.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (mut rest, header) = parse_header::<VerboseError<_>>(data)
            .map_err(|e| Error::Format(convert_error(data, e)))?;
        let count = header.count as usize;
        log::debug!("sprite document: {count} sprites");

        let needed = count.checked_mul(RECORD_LEN);
        if needed.map_or(true, |n| n > rest.len()) {
            return Err(Error::Format(format!(
                "Sprite table truncated: {count} sprites need {} bytes, {} remain",
                needed.map_or_else(|| "too many".to_string(), |n| n.to_string()),
                rest.len()
            )));
        }

        let mut sprites = SpriteCollection::try_with_capacity(count)?;
        for index in 0..count {
            let (r, record) = context("sprite record", parse_record::<VerboseError<_>>)(rest)
                .map_err(|e| Error::Format(convert_error(data, e)))?;
            rest = r;
            let name = SpriteName::try_from_field(&record.name)?;
            log::debug!("  {index: <5} {}", name.display());
            sprites.append(name, PixelBuffer::from_bytes(record.pixels));
        }
        if !rest.is_empty() {
            log::warn!(
                "Ignoring {} trailing bytes after the last sprite",
                rest.len()
            );
        }
        Ok(Self {
            palette: Palette::from_records(&header.palette),
            sprites,
        })
    }
    pub fn read(mut reader: impl io::Read) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::parse(&data)
    }
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading `{}`", path.display());
        Self::parse(&std::fs::read(path)?)
    }

    /// Writes the committed palette and sprites. Names longer than the
    /// name field are cut and listed in the returned summary.
    pub fn write(&self, w: &mut impl io::Write) -> Result<EncodeSummary> {
        let count = u32::try_from(self.sprites.len()).map_err(|_| {
            Error::Format(format!(
                "{} sprites do not fit in the sprite count field",
                self.sprites.len()
            ))
        })?;
        let mut summary = EncodeSummary::default();
        Header {
            count,
            palette: self.palette.to_records(),
        }
        .write_no_seek(w)?;
        for (index, sprite) in self.sprites.iter().enumerate() {
            let (name, truncated) = sprite.name().to_field();
            if truncated {
                log::warn!(
                    "Sprite {index} name `{}` is longer than {NAME_LEN} bytes and was truncated",
                    sprite.name().display()
                );
                summary.truncated_names.push(index);
            }
            SpriteRecord {
                name,
                pixels: *sprite.pixels().as_bytes(),
            }
            .write_no_seek(w)?;
        }
        w.flush()?;
        Ok(summary)
    }
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.sprites.len() * RECORD_LEN);
        self.write(&mut buf)?;
        Ok(buf)
    }
    pub fn save(&self, path: impl AsRef<Path>) -> Result<EncodeSummary> {
        let path = path.as_ref();
        log::debug!("writing `{}`", path.display());
        let mut w = std::fs::File::create(path).map(io::BufWriter::new)?;
        self.write(&mut w)
    }
}
