use crate::{color_hex, png, Error, FileFilters, Result, SpriteName, Workspace};
use itertools::Itertools;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub struct Args {
    /// Sprite document to open
    path: Option<PathBuf>,
    /// Glob patterns to include sprite names
    #[arg(short, long)]
    include: Vec<String>,
    /// Directory to export sprites to as indexed PNGs
    #[arg(long)]
    export: Option<PathBuf>,
    /// 16x16 indexed PNGs to append as new sprites, then save the document
    #[arg(long, requires = "path")]
    add: Vec<PathBuf>,
}

/// Loads `path` into `workspace`. A missing file starts an empty document;
/// any other failure is logged and also leaves the document empty.
fn open(workspace: &mut Workspace, path: &Path) -> bool {
    match workspace.load_path(path) {
        Ok(()) => {
            log::info!("Opened `{}`", path.display());
            true
        }
        Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("`{}` does not exist, starting a new document", path.display());
            true
        }
        Err(e) => {
            log::error!("Failed to open `{}`: {e}", path.display());
            false
        }
    }
}

fn list(workspace: &Workspace, filters: &FileFilters) {
    let verbose = crate::is_log_level(log::LevelFilter::Debug);
    log::info!(
        "Palette: {}",
        workspace.palette().iter().map(color_hex).join(" ")
    );
    let sprites = workspace.sprites();
    log::info!("Sprites: {}", sprites.len());
    if sprites.is_empty() {
        return;
    }
    log::info!("  INDEX NAME                             HASH");
    for (index, sprite) in sprites.iter().enumerate() {
        let name = sprite.name().display();
        if !filters.is_empty() && !filters.matches(&name) {
            continue;
        }
        let hash = blake3::hash(sprite.pixels().as_bytes());
        log::info!("  {index: <5} {name: <32} 0x{hash}");
        if verbose {
            for row in sprite.pixels().rows() {
                log::debug!("        {row}");
            }
        }
    }
}

fn export(workspace: &Workspace, filters: &FileFilters, outdir: &Path) -> Result<()> {
    std::fs::create_dir_all(outdir)?;
    let mut count = 0usize;
    for (index, sprite) in workspace.sprites().iter().enumerate() {
        let name = sprite.name().display();
        if !filters.is_empty() && !filters.matches(&name) {
            continue;
        }
        let data = png::write_png(sprite.pixels(), workspace.palette())
            .map_err(|e| Error::Format(format!("Failed to encode sprite {index}: {e}")))?;
        let stem = match name.is_empty() {
            true => format!("{index:04}"),
            false => format!("{index:04}_{}", name.replace(['/', '\\'], "_")),
        };
        let filename = outdir.join(format!("{stem}.png"));
        log::debug!("writing `{}`", filename.display());
        std::fs::write(&filename, data)?;
        count += 1;
    }
    log::info!("Exported {count} sprites to `{}`", outdir.display());
    Ok(())
}

fn sprite_name_for(path: &Path) -> Result<SpriteName> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    SpriteName::new(&stem).ok_or_else(|| Error::Format(format!("Invalid sprite name `{stem}`")))
}

fn add(workspace: &mut Workspace, path: &Path) -> Result<usize> {
    let pixels = png::read_png(&std::fs::read(path)?).map_err(|e| match e {
        Error::Format(msg) => Error::Format(format!("`{}`: {msg}", path.display())),
        e => e,
    })?;
    let name = sprite_name_for(path)?;
    let index = workspace.new_sprite(name)?;
    let session = workspace.open_sprite(index)?;
    for (i, color) in pixels.iter().enumerate() {
        session.select_color(color)?;
        session.paint(i)?;
    }
    workspace.commit_session()?;
    log::info!("Added `{}` as sprite {index}", path.display());
    Ok(index)
}

/// Exit code for a command line that failed to parse. Usage errors exit
/// with 1; `--help` and `--version` keep clap's code.
pub fn usage_exit_code(e: &clap::Error) -> u8 {
    match e.use_stderr() {
        true => 1,
        false => u8::try_from(e.exit_code()).unwrap_or(1),
    }
}

pub fn run(args: Args) -> Result<()> {
    let Args {
        path,
        include,
        export: outdir,
        add: pngs,
    } = args;
    let filters = FileFilters {
        includes: include,
        excludes: Vec::new(),
    };
    let mut workspace = Workspace::default();
    let opened = path.as_deref().map_or(true, |p| open(&mut workspace, p));

    list(&workspace, &filters);
    if let Some(outdir) = outdir {
        export(&workspace, &filters, &outdir)?;
    }
    if let Some(path) = path.filter(|_| !pngs.is_empty()) {
        if !opened {
            return Err(Error::WouldOverwrite(path));
        }
        for png in &pngs {
            add(&mut workspace, png)?;
        }
        let summary = workspace.save_path(&path)?;
        if !summary.truncated_names.is_empty() {
            log::warn!(
                "{} sprite names were truncated",
                summary.truncated_names.len()
            );
        }
        log::info!("Saved `{}`", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, Palette, PixelBuffer, PIXEL_COUNT};

    fn args(path: Option<PathBuf>) -> Args {
        Args {
            path,
            include: Vec::new(),
            export: None,
            add: Vec::new(),
        }
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::default();
        assert!(open(&mut ws, &dir.path().join("nope.sprt")));
        assert!(ws.sprites().is_empty());
    }

    #[test]
    fn add_and_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let indices: Vec<u8> = (0..PIXEL_COUNT).map(|i| (i % 5) as u8).collect();
        let pixels = PixelBuffer::from_indices(&indices).unwrap();
        let png_path = dir.path().join("hero.png");
        std::fs::write(&png_path, png::write_png(&pixels, &Palette::default()).unwrap())
            .unwrap();

        let doc_path = dir.path().join("doc.sprt");
        let outdir = dir.path().join("out");
        run(Args {
            add: vec![png_path],
            ..args(Some(doc_path.clone()))
        })
        .unwrap();
        let doc = Document::load(&doc_path).unwrap();
        assert_eq!(doc.sprites().len(), 1);
        assert_eq!(doc.sprites().get(0).unwrap().name().display(), "hero");
        assert_eq!(doc.sprites().get(0).unwrap().pixels(), &pixels);

        run(Args {
            export: Some(outdir.clone()),
            include: vec!["he*".into()],
            ..args(Some(doc_path))
        })
        .unwrap();
        let exported = std::fs::read(outdir.join("0000_hero.png")).unwrap();
        assert_eq!(png::read_png(&exported).unwrap(), pixels);
    }

    #[test]
    fn corrupt_document_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("bad.sprt");
        std::fs::write(&doc_path, b"sprt").unwrap();
        let png_path = dir.path().join("x.png");
        std::fs::write(
            &png_path,
            png::write_png(&PixelBuffer::blank(), &Palette::default()).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            run(Args {
                add: vec![png_path],
                ..args(Some(doc_path.clone()))
            }),
            Err(Error::WouldOverwrite(p)) if p == doc_path
        ));
        assert_eq!(std::fs::read(&doc_path).unwrap(), b"sprt");
    }

    #[test]
    fn nul_in_file_stem_is_a_format_error() {
        assert!(matches!(
            sprite_name_for(Path::new("a\0b.png")),
            Err(Error::Format(_))
        ));
        assert_eq!(
            sprite_name_for(Path::new("dir/hero.v2.png")).unwrap().display(),
            "hero.v2"
        );
    }

    #[derive(clap::Parser)]
    struct Cli {
        #[command(flatten)]
        open: Args,
    }

    #[test]
    fn usage_errors_exit_with_one() {
        use clap::Parser;

        let e = Cli::try_parse_from(["sprtedit", "a.sprt", "b.sprt"])
            .err()
            .unwrap();
        assert_eq!(usage_exit_code(&e), 1);
        let e = Cli::try_parse_from(["sprtedit", "--help"]).err().unwrap();
        assert_eq!(usage_exit_code(&e), 0);
        let cli = Cli::try_parse_from(["sprtedit", "a.sprt"]).unwrap();
        assert_eq!(cli.open.path, Some(PathBuf::from("a.sprt")));
    }
}
