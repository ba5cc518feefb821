// In-process archive extraction for downloaded tool distributions.

use bzip2::read::BzDecoder;
use colored::Colorize;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tar::Archive;
use xz2::read::XzDecoder;
use zip::ZipArchive;

use crate::{log_debug, log_error};

/// Archive formats `extract_archive` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    TarXz,
    TarBz2,
    Tar,
}

/// Guesses the archive format from a file name. Matching is case-insensitive.
pub fn detect_archive_kind(file_name: &str) -> Option<ArchiveKind> {
    let name = file_name.to_lowercase();
    if name.ends_with(".zip") {
        Some(ArchiveKind::Zip)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveKind::TarGz)
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        Some(ArchiveKind::TarXz)
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
        Some(ArchiveKind::TarBz2)
    } else if name.ends_with(".tar") {
        Some(ArchiveKind::Tar)
    } else {
        None
    }
}

/// Extracts `src` into `dest`, creating `dest` if needed.
///
/// The format is detected from the file name of `src`. Unlike a staging
/// extraction, the archive contents land directly in `dest`; callers use
/// `find_install_root` afterwards to step into a versioned top-level folder.
pub fn extract_archive(src: &Path, dest: &Path) -> io::Result<()> {
    let file_name = src
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let kind = detect_archive_kind(&file_name).ok_or_else(|| {
        log_error!("[Devkit::Extract] Unsupported archive type: {}", file_name.red());
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unsupported archive type: {}", file_name),
        )
    })?;

    log_debug!(
        "[Devkit::Extract] Extracting {:?} archive {} into {}",
        kind,
        src.display().to_string().blue(),
        dest.display().to_string().cyan()
    );
    fs::create_dir_all(dest)?;

    let file = File::open(src)?;
    match kind {
        ArchiveKind::Zip => {
            let mut archive = ZipArchive::new(file)?;
            archive.extract(dest)?;
        }
        ArchiveKind::TarGz => Archive::new(GzDecoder::new(file)).unpack(dest)?,
        ArchiveKind::TarXz => Archive::new(XzDecoder::new(file)).unpack(dest)?,
        ArchiveKind::TarBz2 => Archive::new(BzDecoder::new(file)).unpack(dest)?,
        ArchiveKind::Tar => Archive::new(file).unpack(dest)?,
    }

    log_debug!("[Devkit::Extract] Archive contents available at {}", dest.display().to_string().green());
    Ok(())
}
