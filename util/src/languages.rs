//! File-type recognition for submissions.
//!
//! The grading workspaces only receive files the toolchain can actually
//! use; restored artifacts like `{id}.out.txt` never qualify.

use std::path::Path;

/// Extensions of files the cheat scanner inspects.
const SOURCE_EXTENSIONS: &[&str] = &["c", "h", "cc", "cpp", "hpp"];

/// Extensions of files copied into the execution workspace, beyond the
/// build files matched by name below.
const GRADABLE_EXTENSIONS: &[&str] = &["c", "h", "cc", "cpp", "hpp", "mk"];

/// Build files recognized by exact name rather than extension.
const BUILD_FILE_NAMES: &[&str] = &["Makefile", "makefile", "GNUmakefile"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn file_name_of(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// True if the file is program source the cheat scanner should read.
pub fn is_source_file(path: &Path) -> bool {
    match extension_of(path) {
        Some(ext) => SOURCE_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// True if the file belongs in the execution workspace (source or build file).
pub fn is_gradable_file(path: &Path) -> bool {
    if let Some(name) = file_name_of(path) {
        if BUILD_FILE_NAMES.contains(&name) {
            return true;
        }
    }
    match extension_of(path) {
        Some(ext) => GRADABLE_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_source_files() {
        assert!(is_source_file(&PathBuf::from("hw1.c")));
        assert!(is_source_file(&PathBuf::from("list.H")));
        assert!(!is_source_file(&PathBuf::from("notes.txt")));
        assert!(!is_source_file(&PathBuf::from("Makefile")));
    }

    #[test]
    fn test_gradable_files() {
        assert!(is_gradable_file(&PathBuf::from("hw1.c")));
        assert!(is_gradable_file(&PathBuf::from("Makefile")));
        assert!(is_gradable_file(&PathBuf::from("rules.mk")));
        assert!(!is_gradable_file(&PathBuf::from("abc123.out.txt")));
        assert!(!is_gradable_file(&PathBuf::from("report.pdf")));
    }
}
