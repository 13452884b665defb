use crate::{
    Channel, CloseDecision, CloseOutcome, CloseRequest, Color, Document, EditSession,
    EncodeSummary, Error, Palette, PaletteStaging, Result, SpriteCollection, SpriteName,
};
use std::{io, path::Path};

/// The loaded document together with whatever is being edited in it.
///
/// At most one sprite edit session is open at a time, and the document
/// cannot be reloaded or unloaded underneath it.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    document: Document,
    staging: PaletteStaging,
    session: Option<EditSession>,
}

impl Workspace {
    pub fn new(document: Document) -> Self {
        let staging = PaletteStaging::new(document.palette());
        Self {
            document,
            staging,
            session: None,
        }
    }
    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }
    #[inline]
    pub fn palette(&self) -> &Palette {
        self.document.palette()
    }
    #[inline]
    pub fn sprites(&self) -> &SpriteCollection {
        self.document.sprites()
    }

    /// Replaces the document with the one read from `reader`. On error the
    /// current document is left exactly as it was.
    pub fn load(&mut self, reader: impl io::Read) -> Result<()> {
        self.ensure_no_session()?;
        let document = Document::read(reader)?;
        self.replace(document);
        Ok(())
    }
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_no_session()?;
        let document = Document::load(path)?;
        self.replace(document);
        Ok(())
    }
    /// Saves committed state only; open edits are not written.
    pub fn save(&self, w: &mut impl io::Write) -> Result<EncodeSummary> {
        self.document.write(w)
    }
    pub fn save_path(&self, path: impl AsRef<Path>) -> Result<EncodeSummary> {
        self.document.save(path)
    }
    pub fn unload(&mut self) -> Result<()> {
        self.ensure_no_session()?;
        self.document.sprites.remove_all();
        Ok(())
    }
    fn replace(&mut self, document: Document) {
        self.document = document;
        self.staging.resync(self.document.palette());
    }

    pub fn new_sprite(&mut self, name: SpriteName) -> Result<usize> {
        self.document.new_sprite(name)
    }

    /// Opens an edit session on sprite `index`. The returned handle may be
    /// closed directly; a closed session no longer counts as open here.
    pub fn open_sprite(&mut self, index: usize) -> Result<&mut EditSession> {
        self.ensure_no_session()?;
        let session = EditSession::open(self.document.sprites(), index)?;
        Ok(self.session.insert(session))
    }
    #[inline]
    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref().filter(|s| s.is_open())
    }
    pub fn session_mut(&mut self) -> Option<&mut EditSession> {
        self.drop_closed_session();
        self.session.as_mut()
    }
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.session().map_or(false, EditSession::is_dirty)
    }
    pub fn commit_session(&mut self) -> Result<()> {
        self.drop_closed_session();
        let session = self
            .session
            .as_mut()
            .ok_or(Error::NotOpen("edit session"))?;
        let res = session.commit(&mut self.document.sprites);
        self.session = None;
        res
    }
    pub fn request_close(&mut self) -> Result<CloseRequest> {
        let request = self
            .session_mut()
            .ok_or(Error::NotOpen("edit session"))?
            .request_close()?;
        self.drop_closed_session();
        Ok(request)
    }
    pub fn resolve_close(&mut self, decision: CloseDecision) -> Result<CloseOutcome> {
        self.drop_closed_session();
        let session = self
            .session
            .as_mut()
            .ok_or(Error::NotOpen("edit session"))?;
        let res = session.resolve_close(decision, &mut self.document.sprites);
        self.drop_closed_session();
        res
    }
    #[inline]
    fn drop_closed_session(&mut self) {
        if self.session.as_ref().map_or(false, |s| !s.is_open()) {
            self.session = None;
        }
    }

    #[inline]
    pub fn palette_staging(&self) -> &PaletteStaging {
        &self.staging
    }
    pub fn begin_palette(&mut self) {
        self.staging.begin(&self.document.palette);
    }
    pub fn set_working_color(&mut self, index: usize, color: Color) -> Result<()> {
        self.staging.set_color(index, color)
    }
    pub fn set_working_channel(&mut self, index: usize, channel: Channel, value: u8) -> Result<()> {
        self.staging.set_channel(index, channel, value)
    }
    pub fn commit_palette(&mut self) -> Result<()> {
        self.staging.commit_palette(&mut self.document.palette)
    }
    pub fn discard_palette(&mut self) {
        self.staging.discard_palette();
    }

    fn ensure_no_session(&mut self) -> Result<()> {
        self.drop_closed_session();
        match &self.session {
            Some(_) => Err(Error::Busy("edit session")),
            None => Ok(()),
        }
    }
}
