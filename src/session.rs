use crate::{Error, PixelBuffer, Result, SpriteCollection, NUM_COLORS};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SessionState {
    /// Scratch matches the committed pixels
    Clean,
    /// At least one paint changed a pixel
    Modified,
    /// Closed after copying scratch into the sprite
    Committed,
    /// Closed, scratch thrown away
    Discarded,
    /// Closed while clean, nothing to do
    Closed,
}

impl SessionState {
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Clean | Self::Modified)
    }
}

/// Answer to the "unsaved changes" prompt
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CloseDecision {
    Discard,
    Keep,
    Cancel,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CloseRequest {
    Closed,
    /// The session has unsaved pixels; resolve with
    /// [`EditSession::resolve_close`].
    NeedsDecision,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CloseOutcome {
    Committed,
    Discarded,
    /// Close was abandoned, the session is still open
    Cancelled,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Paint {
    /// No color selected, the click does nothing
    NoColor,
    Unchanged,
    Changed,
}

/// One in-progress edit of a sprite's pixels.
///
/// Painting goes to a scratch copy. The sprite in the collection only
/// changes on [`commit`](Self::commit) or a `Keep` close decision.
#[derive(Clone, Debug)]
pub struct EditSession {
    target: usize,
    scratch: PixelBuffer,
    dirty: bool,
    selected: Option<u8>,
    state: SessionState,
}

impl EditSession {
    pub fn open(sprites: &SpriteCollection, target: usize) -> Result<Self> {
        let sprite = sprites.get(target)?;
        log::debug!("editing sprite {target} `{}`", sprite.name().display());
        Ok(Self {
            target,
            scratch: *sprite.pixels(),
            dirty: false,
            selected: None,
            state: SessionState::Clean,
        })
    }
    #[inline]
    pub fn target(&self) -> usize {
        self.target
    }
    #[inline]
    pub fn scratch(&self) -> &PixelBuffer {
        &self.scratch
    }
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }
    #[inline]
    pub fn selected(&self) -> Option<u8> {
        self.selected
    }
    pub fn select_color(&mut self, index: u8) -> Result<()> {
        if index as usize >= NUM_COLORS {
            return Err(Error::Index {
                what: "palette",
                index: index as usize,
                len: NUM_COLORS,
            });
        }
        self.selected = Some(index);
        Ok(())
    }
    #[inline]
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Paints pixel `pixel` of the scratch buffer with the selected color.
    pub fn paint(&mut self, pixel: usize) -> Result<Paint> {
        self.ensure_open()?;
        let Some(color) = self.selected else {
            return Ok(Paint::NoColor);
        };
        if !self.scratch.set(pixel, color)?.changed() {
            return Ok(Paint::Unchanged);
        }
        self.dirty = true;
        self.state = SessionState::Modified;
        Ok(Paint::Changed)
    }
    /// Throws away every paint since the last commit.
    pub fn revert(&mut self, sprites: &SpriteCollection) -> Result<()> {
        self.ensure_open()?;
        self.scratch = *sprites.get(self.target)?.pixels();
        self.dirty = false;
        self.state = SessionState::Clean;
        Ok(())
    }
    /// Copies scratch into the target sprite and closes the session. An
    /// `Index` error means the sprite disappeared underneath the session,
    /// which also closes it.
    pub fn commit(&mut self, sprites: &mut SpriteCollection) -> Result<()> {
        self.ensure_open()?;
        match sprites.get_mut(self.target) {
            Ok(sprite) => {
                sprite.set_pixels(self.scratch);
                self.dirty = false;
                self.state = SessionState::Committed;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Discarded;
                Err(e)
            }
        }
    }
    pub fn request_close(&mut self) -> Result<CloseRequest> {
        self.ensure_open()?;
        if self.dirty {
            return Ok(CloseRequest::NeedsDecision);
        }
        self.state = SessionState::Closed;
        Ok(CloseRequest::Closed)
    }
    pub fn resolve_close(
        &mut self,
        decision: CloseDecision,
        sprites: &mut SpriteCollection,
    ) -> Result<CloseOutcome> {
        self.ensure_open()?;
        match decision {
            CloseDecision::Discard => {
                self.dirty = false;
                self.state = SessionState::Discarded;
                Ok(CloseOutcome::Discarded)
            }
            CloseDecision::Keep => {
                self.commit(sprites)?;
                Ok(CloseOutcome::Committed)
            }
            CloseDecision::Cancel => Ok(CloseOutcome::Cancelled),
        }
    }
    #[inline]
    fn ensure_open(&self) -> Result<()> {
        match self.state.is_open() {
            true => Ok(()),
            false => Err(Error::NotOpen("edit session")),
        }
    }
}
