use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name offered to the browser for the downloaded archive.
pub const ARCHIVE_FILENAME: &str = "MyApp.zip";

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("Source folder does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to walk project tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read project file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Zip every file under `root` into an in-memory archive.
///
/// Entry names are relative to `root` and `/`-separated, so the project's
/// `public/` and `src/` folders appear at the top of the archive.
pub fn zip_directory(root: &Path) -> Result<Vec<u8>, ArchiveError> {
    if !root.is_dir() {
        return Err(ArchiveError::NotFound(root.to_path_buf()));
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name, options)?;
        zip.write_all(&std::fs::read(entry.path())?)?;
        entries += 1;
    }

    let cursor = zip.finish()?;
    log::info!("Packed {} files from {}", entries, root.display());

    Ok(cursor.into_inner())
}
