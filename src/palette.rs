use crate::{Error, Result};

pub type Color = rgb::RGBA8;

pub const NUM_COLORS: usize = 16;

pub const WHITE: Color = Color {
    r: 0xff,
    g: 0xff,
    b: 0xff,
    a: 0xff,
};

#[inline]
pub fn color_hex(c: Color) -> String {
    format!("{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Self::Red, Self::Green, Self::Blue, Self::Alpha];

    #[inline]
    pub fn get(self, c: Color) -> u8 {
        match self {
            Self::Red => c.r,
            Self::Green => c.g,
            Self::Blue => c.b,
            Self::Alpha => c.a,
        }
    }
    #[inline]
    pub fn set(self, c: &mut Color, value: u8) {
        match self {
            Self::Red => c.r = value,
            Self::Green => c.g = value,
            Self::Blue => c.b = value,
            Self::Alpha => c.a = value,
        }
    }
    #[inline]
    pub fn with(self, mut c: Color, value: u8) -> Color {
        self.set(&mut c, value);
        c
    }
    /// Endpoints of a slider sweeping this channel from 0 to 255 while the
    /// other channels keep their current values.
    #[inline]
    pub fn gradient(self, c: Color) -> (Color, Color) {
        (self.with(c, 0), self.with(c, 0xff))
    }
}

/// Sixteen colors addressed by a 4-bit pixel nibble
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Palette(pub [Color; NUM_COLORS]);

impl Default for Palette {
    #[inline]
    fn default() -> Self {
        Self([WHITE; NUM_COLORS])
    }
}

impl std::ops::Index<u8> for Palette {
    type Output = Color;
    /// Only the low nibble is used, so any decoded pixel is a valid index.
    #[inline]
    fn index(&self, index: u8) -> &Color {
        &self.0[(index & 0x0f) as usize]
    }
}

impl Palette {
    #[inline]
    pub fn get(&self, index: usize) -> Option<Color> {
        self.0.get(index).copied()
    }
    pub fn set(&mut self, index: usize, color: Color) -> Result<()> {
        let slot = self.0.get_mut(index).ok_or(Error::Index {
            what: "palette",
            index,
            len: NUM_COLORS,
        })?;
        *slot = color;
        Ok(())
    }
    pub fn set_channel(&mut self, index: usize, channel: Channel, value: u8) -> Result<()> {
        let slot = self.0.get_mut(index).ok_or(Error::Index {
            what: "palette",
            index,
            len: NUM_COLORS,
        })?;
        channel.set(slot, value);
        Ok(())
    }
    #[inline]
    pub fn as_slice(&self) -> &[Color] {
        &self.0
    }
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        self.0.iter().copied()
    }
    pub fn to_records(&self) -> [[u8; 4]; NUM_COLORS] {
        self.0.map(|c| [c.r, c.g, c.b, c.a])
    }
    pub fn from_records(records: &[[u8; 4]; NUM_COLORS]) -> Self {
        Self(records.map(|[r, g, b, a]| Color::new(r, g, b, a)))
    }
}

/// Working copy of the palette used while the palette editor is open.
///
/// Edits only ever touch the working copy. The committed palette, which
/// sprites are drawn with, is replaced in a single assignment by
/// [`PaletteStaging::commit_palette`].
#[derive(Clone, Debug, Default)]
pub struct PaletteStaging {
    working: Palette,
    editing: bool,
}

impl PaletteStaging {
    pub fn new(committed: &Palette) -> Self {
        Self {
            working: *committed,
            editing: false,
        }
    }
    pub fn begin(&mut self, committed: &Palette) {
        self.working = *committed;
        self.editing = true;
    }
    #[inline]
    pub fn is_editing(&self) -> bool {
        self.editing
    }
    #[inline]
    pub fn working(&self) -> &Palette {
        &self.working
    }
    #[inline]
    pub fn is_dirty(&self, committed: &Palette) -> bool {
        self.editing && self.working != *committed
    }
    pub fn set_color(&mut self, index: usize, color: Color) -> Result<()> {
        self.ensure_editing()?;
        self.working.set(index, color)
    }
    pub fn set_channel(&mut self, index: usize, channel: Channel, value: u8) -> Result<()> {
        self.ensure_editing()?;
        self.working.set_channel(index, channel, value)
    }
    pub fn commit_palette(&mut self, committed: &mut Palette) -> Result<()> {
        self.ensure_editing()?;
        *committed = self.working;
        self.editing = false;
        Ok(())
    }
    /// Abandons the working copy; the next [`begin`](Self::begin) starts
    /// over from the committed palette.
    pub fn discard_palette(&mut self) {
        self.editing = false;
    }
    /// Drops any edit in progress and mirrors `committed` again.
    pub fn resync(&mut self, committed: &Palette) {
        self.working = *committed;
        self.editing = false;
    }
    #[inline]
    fn ensure_editing(&self) -> Result<()> {
        match self.editing {
            true => Ok(()),
            false => Err(Error::NotOpen("palette edit")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color {
        r: 0xff,
        g: 0,
        b: 0,
        a: 0xff,
    };

    #[test]
    fn default_palette_is_white() {
        let p = Palette::default();
        assert!(p.iter().all(|c| c == WHITE));
        assert_eq!(p.as_slice().len(), NUM_COLORS);
    }

    #[test]
    fn index_masks_to_nibble() {
        let mut p = Palette::default();
        p.set(3, RED).unwrap();
        assert_eq!(p[3], RED);
        assert_eq!(p[0x13], RED);
        assert_eq!(p.get(16), None);
        assert!(matches!(p.set(16, RED), Err(Error::Index { index: 16, .. })));
    }

    #[test]
    fn channels_are_isolated() {
        let c = Color::new(0x12, 0x34, 0x56, 0x78);
        assert_eq!(Channel::Blue.get(c), 0x56);
        assert_eq!(Channel::Green.with(c, 0), Color::new(0x12, 0, 0x56, 0x78));
        let (lo, hi) = Channel::Alpha.gradient(c);
        assert_eq!(lo, Color::new(0x12, 0x34, 0x56, 0));
        assert_eq!(hi, Color::new(0x12, 0x34, 0x56, 0xff));
        assert_eq!(color_hex(c), "12345678");
    }

    #[test]
    fn records_keep_channel_order() {
        let mut p = Palette::default();
        p.set(1, Color::new(1, 2, 3, 4)).unwrap();
        let records = p.to_records();
        assert_eq!(records[1], [1, 2, 3, 4]);
        assert_eq!(Palette::from_records(&records), p);
    }

    #[test]
    fn staging_does_not_touch_committed_until_commit() {
        let mut committed = Palette::default();
        let mut staging = PaletteStaging::new(&committed);
        assert!(staging.set_channel(0, Channel::Red, 0).is_err());

        staging.begin(&committed);
        staging.set_channel(0, Channel::Green, 0).unwrap();
        staging.set_channel(0, Channel::Blue, 0).unwrap();
        assert_eq!(committed[0], WHITE);
        assert_eq!(staging.working()[0], RED);
        assert!(staging.is_dirty(&committed));

        staging.commit_palette(&mut committed).unwrap();
        assert_eq!(committed[0], RED);
        assert!(!staging.is_editing());
        assert!(staging.commit_palette(&mut committed).is_err());
    }

    #[test]
    fn discard_then_begin_recopies() {
        let committed = Palette::default();
        let mut staging = PaletteStaging::new(&committed);
        staging.begin(&committed);
        staging.set_color(5, RED).unwrap();
        staging.discard_palette();
        assert!(!staging.is_dirty(&committed));
        staging.begin(&committed);
        assert_eq!(staging.working()[5], WHITE);
        assert!(staging.set_color(16, RED).is_err());
    }
}
