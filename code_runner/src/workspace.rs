//! Ephemeral per-student execution workspaces.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use util::languages::is_gradable_file;

/// One student's execution directory. The backing temp directory is
/// removed when the value is dropped, success or failure, so nothing
/// leaks from one student's run into the next.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a fresh workspace containing the grading resources plus
    /// the student's source and build files. Student files win name
    /// collisions so a student-supplied Makefile replaces a default one.
    pub fn prepare(resources_dir: Option<&Path>, student_dir: &Path) -> Result<Self, String> {
        let dir = tempfile::Builder::new()
            .prefix("grading-run-")
            .tempdir()
            .map_err(|e| format!("Failed to create workspace: {e}"))?;

        if let Some(resources) = resources_dir {
            copy_files_into(resources, dir.path(), &|_| true)?;
        }
        copy_files_into(student_dir, dir.path(), &is_gradable_file)?;

        Ok(Workspace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Copies every regular file under `src` (recursively, flattened to its
/// file name) into `dest`, keeping only files the filter accepts.
fn copy_files_into(
    src: &Path,
    dest: &Path,
    filter: &dyn Fn(&Path) -> bool,
) -> Result<(), String> {
    let entries =
        fs::read_dir(src).map_err(|e| format!("Failed to read {}: {e}", src.display()))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read entry: {e}"))?;
        let path = entry.path();

        if path.is_dir() {
            copy_files_into(&path, dest, filter)?;
            continue;
        }
        if !filter(&path) {
            continue;
        }

        let target = dest.join(entry.file_name());
        fs::copy(&path, &target)
            .map_err(|e| format!("Failed to copy {} into workspace: {e}", path.display()))?;
    }

    Ok(())
}
