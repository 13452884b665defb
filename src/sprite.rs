use crate::{Error, PixelBuffer, Result};
use std::borrow::Cow;

/// Width of the name field in a sprite record
pub const NAME_LEN: usize = 64;

/// Sprite name as raw bytes. Unbounded in memory, cut to [`NAME_LEN`] bytes
/// on disk. Never contains a NUL byte since NUL terminates the disk field.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SpriteName(Vec<u8>);

impl SpriteName {
    #[inline]
    pub fn new(name: &str) -> Option<Self> {
        Self::from_bytes(name.as_bytes())
    }
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        (!bytes.contains(&0)).then(|| Self(bytes.to_vec()))
    }
    /// Reads a name field up to its first NUL, or the full field if there is
    /// none.
    pub(crate) fn try_from_field(field: &[u8; NAME_LEN]) -> Result<Self> {
        let len = field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let mut name = Vec::new();
        name.try_reserve_exact(len)
            .map_err(|_| Error::Allocation("sprite name"))?;
        name.extend_from_slice(&field[..len]);
        Ok(Self(name))
    }
    /// Zero-padded disk field, and whether the name had to be cut to fit.
    pub fn to_field(&self) -> ([u8; NAME_LEN], bool) {
        let mut field = [0u8; NAME_LEN];
        let len = self.0.len().min(NAME_LEN);
        field[..len].copy_from_slice(&self.0[..len]);
        (field, self.0.len() > NAME_LEN)
    }
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    #[inline]
    pub fn display(&self) -> Cow<str> {
        String::from_utf8_lossy(&self.0)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Sprite {
    name: SpriteName,
    pixels: PixelBuffer,
}

impl Sprite {
    #[inline]
    pub fn new(name: SpriteName, pixels: PixelBuffer) -> Self {
        Self { name, pixels }
    }
    #[inline]
    pub fn name(&self) -> &SpriteName {
        &self.name
    }
    #[inline]
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }
    #[inline]
    pub(crate) fn set_pixels(&mut self, pixels: PixelBuffer) {
        self.pixels = pixels;
    }
}

/// Sprites in display and save order
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SpriteCollection {
    sprites: Vec<Sprite>,
}

impl SpriteCollection {
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        let mut sprites = Vec::new();
        sprites.try_reserve_exact(capacity)?;
        Ok(Self { sprites })
    }
    /// Appends a sprite and returns its index.
    pub fn append(&mut self, name: SpriteName, pixels: PixelBuffer) -> usize {
        self.sprites.push(Sprite::new(name, pixels));
        self.sprites.len() - 1
    }
    /// Like [`append`](Self::append), but reports allocation failure instead
    /// of aborting.
    pub fn try_append(&mut self, name: SpriteName, pixels: PixelBuffer) -> Result<usize> {
        self.sprites.try_reserve(1)?;
        Ok(self.append(name, pixels))
    }
    pub fn get(&self, index: usize) -> Result<&Sprite> {
        let len = self.sprites.len();
        self.sprites.get(index).ok_or(Error::Index {
            what: "sprite",
            index,
            len,
        })
    }
    pub(crate) fn get_mut(&mut self, index: usize) -> Result<&mut Sprite> {
        let len = self.sprites.len();
        self.sprites.get_mut(index).ok_or(Error::Index {
            what: "sprite",
            index,
            len,
        })
    }
    #[inline]
    pub fn remove_all(&mut self) {
        self.sprites = Vec::new();
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Sprite> {
        self.sprites.iter()
    }
    /// Number of pages of `per_page` sprites; an empty collection still has
    /// one (empty) page.
    pub fn page_count(&self, per_page: usize) -> usize {
        match per_page {
            0 => 1,
            n => ((self.sprites.len() + n - 1) / n).max(1),
        }
    }
    pub fn page(&self, page: usize, per_page: usize) -> &[Sprite] {
        let start = page.saturating_mul(per_page).min(self.sprites.len());
        let end = start.saturating_add(per_page).min(self.sprites.len());
        &self.sprites[start..end]
    }
}

impl<'a> IntoIterator for &'a SpriteCollection {
    type Item = &'a Sprite;
    type IntoIter = std::slice::Iter<'a, Sprite>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.sprites.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> SpriteName {
        SpriteName::new(s).unwrap()
    }

    #[test]
    fn names_reject_nul() {
        assert!(SpriteName::new("a\0b").is_none());
        assert_eq!(name("hero").display(), "hero");
    }

    #[test]
    fn name_field_padding_and_truncation() {
        let (field, truncated) = name("ab").to_field();
        assert!(!truncated);
        assert_eq!(&field[..3], b"ab\0");
        assert!(field[2..].iter().all(|&b| b == 0));

        let long = "x".repeat(70);
        let (field, truncated) = name(&long).to_field();
        assert!(truncated);
        assert!(field.iter().all(|&b| b == b'x'));

        let exact = "y".repeat(NAME_LEN);
        let (field, truncated) = name(&exact).to_field();
        assert!(!truncated);
        assert_eq!(SpriteName::try_from_field(&field).unwrap(), name(&exact));
    }

    #[test]
    fn field_stops_at_first_nul() {
        let mut field = [0u8; NAME_LEN];
        field[..3].copy_from_slice(b"cat");
        field[4] = b'z';
        assert_eq!(SpriteName::try_from_field(&field).unwrap(), name("cat"));
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut c = SpriteCollection::default();
        assert_eq!(c.append(name("b"), PixelBuffer::blank()), 0);
        assert_eq!(c.try_append(name("a"), PixelBuffer::blank()).unwrap(), 1);
        let names: Vec<_> = c.iter().map(|s| s.name().display().into_owned()).collect();
        assert_eq!(names, ["b", "a"]);
        assert!(matches!(c.get(2), Err(Error::Index { index: 2, len: 2, .. })));
        c.remove_all();
        assert!(c.is_empty());
    }

    #[test]
    fn pages() {
        let mut c = SpriteCollection::default();
        assert_eq!(c.page_count(12), 1);
        assert!(c.page(0, 12).is_empty());
        for i in 0..25 {
            c.append(name(&i.to_string()), PixelBuffer::blank());
        }
        assert_eq!(c.page_count(12), 3);
        assert_eq!(c.page(1, 12).len(), 12);
        assert_eq!(c.page(2, 12).len(), 1);
        assert_eq!(c.page(2, 12)[0].name().display(), "24");
        assert!(c.page(9, 12).is_empty());
    }
}
