pub mod cli;
mod document;
mod palette;
mod pixels;
pub mod png;
mod session;
mod sprite;
mod workspace;

pub use document::*;
pub use palette::*;
pub use pixels::*;
pub use session::*;
pub use sprite::*;
pub use workspace::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad magic, truncated read or structurally invalid record
    #[error("{0}")]
    Format(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("out of memory allocating {0}")]
    Allocation(&'static str),
    /// Contract violation; callers are not expected to recover
    #[error("{what} index {index} out of range (length {len})")]
    Index {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("{0} is already open")]
    Busy(&'static str),
    #[error("no {0} is open")]
    NotOpen(&'static str),
    /// Saving would replace a document that could not be read
    #[error("Refusing to overwrite `{}`, which failed to load", .0.display())]
    WouldOverwrite(std::path::PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<std::collections::TryReserveError> for Error {
    #[inline]
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::Allocation("sprite table")
    }
}

#[derive(Debug, Default)]
pub struct FileFilters {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl FileFilters {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }
    pub fn matches(&self, s: &str) -> bool {
        if !self.includes.is_empty() && !self.includes.iter().any(|f| glob_match::glob_match(f, s))
        {
            return false;
        }
        !self.excludes.iter().any(|f| glob_match::glob_match(f, s))
    }
}

fn convert_error<I: std::ops::Deref<Target = [u8]>>(
    input: I,
    e: nom::Err<nom::error::VerboseError<I>>,
) -> String {
    use std::fmt::Write;

    let e = match e {
        nom::Err::Incomplete(nom::Needed::Unknown) => return "Incomplete".into(),
        nom::Err::Incomplete(nom::Needed::Size(n)) => return format!("Need {n} more bytes"),
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
    };
    let mut result = String::new();
    for (i, (substring, kind)) in e.errors.iter().enumerate() {
        let offset = nom::Offset::offset(&*input, substring);

        let _ = if i == 0 {
            write!(&mut result, "Parse error at position 0x{offset:x}")
        } else {
            write!(&mut result, ", 0x{offset:x}")
        };

        let _ = match kind {
            nom::error::VerboseErrorKind::Char(c) => write!(&mut result, " (expected '{c}')"),
            nom::error::VerboseErrorKind::Context(context) => write!(&mut result, " in {context}"),
            nom::error::VerboseErrorKind::Nom(err) => write!(&mut result, " ({err:?})"),
        };
    }
    result
}

#[inline]
fn is_log_level(lvl: log::LevelFilter) -> bool {
    lvl <= log::STATIC_MAX_LEVEL && lvl <= log::max_level()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_include_and_exclude() {
        let filters = FileFilters {
            includes: vec!["hero*".into()],
            excludes: vec!["*_old".into()],
        };
        assert!(filters.matches("hero_walk"));
        assert!(!filters.matches("hero_old"));
        assert!(!filters.matches("tree"));
        assert!(FileFilters::default().matches("anything"));
        assert!(FileFilters::default().is_empty());
    }

    #[test]
    fn parse_errors_report_offsets() {
        use nom::{bytes::complete::tag, error::context, error::VerboseError};

        let data: &[u8] = b"sprx";
        let err = context("magic", tag::<_, _, VerboseError<&[u8]>>(&b"sprt"[..]))(data)
            .unwrap_err();
        let msg = convert_error(data, err);
        assert!(msg.starts_with("Parse error at position 0x0"), "{msg}");
        assert!(msg.contains("in magic"), "{msg}");
    }
}
