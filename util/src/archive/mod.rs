//! Archive expansion for student submissions.
//!
//! Students routinely hand in a zip of a folder instead of loose files.
//! Everything directly under a submission directory that looks like a
//! compressed container (zip, tar, gzip) is unpacked in place, the
//! container is deleted, and a single wrapping folder named after the
//! container is hoisted one level. Deeper nesting is left alone.

use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use zip::ZipArchive;

#[derive(Debug, PartialEq)]
enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    Gz,
}

fn detect_archive_format(bytes: &[u8]) -> Result<ArchiveFormat, String> {
    if bytes.len() < 4 {
        return Err("File too small to determine format".to_string());
    }

    if bytes[0] == 0x50 && bytes[1] == 0x4B {
        return Ok(ArchiveFormat::Zip);
    }

    if bytes.len() > 262 && &bytes[257..262] == b"ustar" {
        return Ok(ArchiveFormat::Tar);
    }

    if bytes[0] == 0x1F && bytes[1] == 0x8B {
        let cursor = Cursor::new(bytes);
        let mut decoder = GzDecoder::new(cursor);
        let mut decompressed = Vec::new();

        if decoder.read_to_end(&mut decompressed).is_ok()
            && decompressed.len() > 262
            && &decompressed[257..262] == b"ustar"
        {
            return Ok(ArchiveFormat::TarGz);
        }

        return Ok(ArchiveFormat::Gz);
    }

    Err("Unsupported archive format".to_string())
}

/// True if the file name carries a container extension worth expanding.
pub fn has_archive_extension(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n.to_ascii_lowercase(),
        None => return false,
    };
    name.ends_with(".zip")
        || name.ends_with(".tar")
        || name.ends_with(".tar.gz")
        || name.ends_with(".tgz")
        || name.ends_with(".gz")
}

/// The container name without its archive extension, used to recognize
/// a wrapping folder ("proj.tar.gz" → "proj").
fn container_base_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let lower = name.to_ascii_lowercase();
    for suffix in [".tar.gz", ".tgz", ".zip", ".tar", ".gz"] {
        if lower.ends_with(suffix) {
            return Some(name[..name.len() - suffix.len()].to_string());
        }
    }
    None
}

fn extract_zip(bytes: &[u8], output_dir: &Path) -> Result<(), String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("Failed to read zip archive: {e}"))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| format!("Failed to read file in archive: {e}"))?;

        let raw_name = file.name().to_string();
        if raw_name.contains("..") || raw_name.starts_with('/') || raw_name.contains('\\') {
            return Err(format!("Invalid file path in zip: {raw_name}"));
        }

        let outpath = output_dir.join(&raw_name);
        if raw_name.ends_with('/') {
            fs::create_dir_all(&outpath)
                .map_err(|e| format!("Failed to create {}: {e}", outpath.display()))?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
            }
            let mut outfile = File::create(&outpath)
                .map_err(|e| format!("Failed to create {}: {e}", outpath.display()))?;
            std::io::copy(&mut file, &mut outfile)
                .map_err(|e| format!("Failed to write {}: {e}", outpath.display()))?;
        }
    }

    Ok(())
}

fn extract_tar(bytes: &[u8], output_dir: &Path) -> Result<(), String> {
    let mut archive = Archive::new(Cursor::new(bytes));
    archive
        .unpack(output_dir)
        .map_err(|e| format!("Failed to unpack tar archive: {e}"))
}

fn extract_tar_gz(bytes: &[u8], output_dir: &Path) -> Result<(), String> {
    let decoder = GzDecoder::new(Cursor::new(bytes));
    let mut archive = Archive::new(decoder);
    archive
        .unpack(output_dir)
        .map_err(|e| format!("Failed to unpack tar.gz archive: {e}"))
}

fn extract_gz(bytes: &[u8], container: &Path, output_dir: &Path) -> Result<(), String> {
    let mut decoder = GzDecoder::new(Cursor::new(bytes));
    let mut contents = Vec::new();
    decoder
        .read_to_end(&mut contents)
        .map_err(|e| format!("Failed to decompress gz file: {e}"))?;

    let base = container_base_name(container)
        .ok_or_else(|| format!("Unrecognized gz name: {}", container.display()))?;
    fs::write(output_dir.join(base), contents)
        .map_err(|e| format!("Failed to write decompressed file: {e}"))
}

/// Extracts one container file into `output_dir`, dispatching on magic bytes.
pub fn extract_archive_file(path: &Path, output_dir: &Path) -> Result<(), String> {
    let bytes =
        fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;

    match detect_archive_format(&bytes)? {
        ArchiveFormat::Zip => extract_zip(&bytes, output_dir),
        ArchiveFormat::Tar => extract_tar(&bytes, output_dir),
        ArchiveFormat::TarGz => extract_tar_gz(&bytes, output_dir),
        ArchiveFormat::Gz => extract_gz(&bytes, path, output_dir),
    }
}

/// If extraction produced a single wrapping folder named after the
/// container, move its contents up one level and remove the folder.
fn hoist_wrapping_dir(dir: &Path, base_name: &str) -> Result<(), String> {
    let wrapped = dir.join(base_name);
    if !wrapped.is_dir() {
        return Ok(());
    }

    let entries = fs::read_dir(&wrapped)
        .map_err(|e| format!("Failed to read {}: {e}", wrapped.display()))?;
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry: {e}"))?;
        let target = dir.join(entry.file_name());
        fs::rename(entry.path(), &target)
            .map_err(|e| format!("Failed to hoist {}: {e}", entry.path().display()))?;
    }

    fs::remove_dir(&wrapped).map_err(|e| format!("Failed to remove {}: {e}", wrapped.display()))
}

/// Expands every container file directly under `dir` in place.
///
/// The container file is deleted after successful extraction. Only the
/// containers present before expansion are processed; archives nested
/// inside an archive stay packed.
///
/// # Errors
///
/// Returns a descriptive error for the first container that cannot be
/// expanded. Callers treat this as a per-student failure, not a batch
/// failure.
pub fn expand_in_place(dir: &Path) -> Result<(), String> {
    let entries =
        fs::read_dir(dir).map_err(|e| format!("Failed to read {}: {e}", dir.display()))?;

    let mut containers: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry: {e}"))?;
        let path = entry.path();
        if path.is_file() && has_archive_extension(&path) {
            containers.push(path);
        }
    }

    for container in containers {
        extract_archive_file(&container, dir)?;

        if let Some(base) = container_base_name(&container) {
            hoist_wrapping_dir(dir, &base)?;
        }

        fs::remove_file(&container)
            .map_err(|e| format!("Failed to remove {}: {e}", container.display()))?;

        tracing::debug!(container = %container.display(), "expanded student archive");
    }

    Ok(())
}
