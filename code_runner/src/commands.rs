//! Grading-command loading and per-workspace argument resolution.

use std::fs;
use std::path::Path;

/// One grading command, whitespace-tokenized from the commands file.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub argv: Vec<String>,
}

impl CommandSpec {
    /// The command as the grader typed it, for logs and failure notes.
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// Loads the grading-commands file: one command per line, blank lines
/// skipped.
pub fn load_commands(path: &Path) -> Result<Vec<CommandSpec>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read commands file {}: {e}", path.display()))?;

    Ok(content
        .lines()
        .map(str::split_whitespace)
        .map(|tokens| CommandSpec {
            argv: tokens.map(String::from).collect(),
        })
        .filter(|spec| !spec.argv.is_empty())
        .collect())
}

/// Matches `name` against a pattern where `*` spans any run of
/// characters. No shell is involved anywhere in command execution, so
/// this is the only wildcard the commands file supports.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    fn inner(p: &[u8], n: &[u8]) -> bool {
        match p.first() {
            None => n.is_empty(),
            Some(b'*') => {
                (0..=n.len()).any(|skip| inner(&p[1..], &n[skip..]))
            }
            Some(&c) => n.first() == Some(&c) && inner(&p[1..], &n[1..]),
        }
    }
    inner(pattern.as_bytes(), name.as_bytes())
}

/// Resolves one command's tokens against a concrete workspace.
///
/// A token containing `*` is matched against the workspace's file
/// names; it is replaced only when exactly one file matches, otherwise
/// it is passed through literally. A token containing `./` is resolved
/// to an absolute path inside the workspace so the built binary is
/// found without a shell PATH lookup.
pub fn resolve_argv(spec: &CommandSpec, workspace_dir: &Path) -> Vec<String> {
    let entries: Vec<String> = fs::read_dir(workspace_dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect()
        })
        .unwrap_or_default();

    spec.argv
        .iter()
        .map(|token| {
            if token.contains('*') {
                let matches: Vec<&String> = entries
                    .iter()
                    .filter(|name| wildcard_match(token, name))
                    .collect();
                match matches.as_slice() {
                    [only] => (*only).clone(),
                    _ => token.clone(),
                }
            } else if token.contains("./") {
                workspace_dir
                    .join(token.trim_start_matches("./"))
                    .display()
                    .to_string()
            } else {
                token.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_commands_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commands.txt");
        fs::write(&path, "gcc *.c -o hw1\n\n./hw1\n").unwrap();

        let specs = load_commands(&path).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].argv, vec!["gcc", "*.c", "-o", "hw1"]);
        assert_eq!(specs[1].display(), "./hw1");
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*.c", "hw1.c"));
        assert!(wildcard_match("hw*.c", "hw1.c"));
        assert!(!wildcard_match("*.c", "hw1.cpp"));
        assert!(wildcard_match("*", "anything"));
    }

    #[test]
    fn test_single_wildcard_match_is_substituted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("hw1.c"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let spec = CommandSpec {
            argv: vec!["gcc".into(), "*.c".into()],
        };
        assert_eq!(resolve_argv(&spec, dir.path()), vec!["gcc", "hw1.c"]);
    }

    #[test]
    fn test_ambiguous_wildcard_left_literal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.c"), "").unwrap();
        fs::write(dir.path().join("b.c"), "").unwrap();

        let spec = CommandSpec {
            argv: vec!["gcc".into(), "*.c".into()],
        };
        assert_eq!(resolve_argv(&spec, dir.path()), vec!["gcc", "*.c"]);
    }

    #[test]
    fn test_relative_marker_becomes_absolute() {
        let dir = tempdir().unwrap();
        let spec = CommandSpec {
            argv: vec!["./hw1".into()],
        };
        let resolved = resolve_argv(&spec, dir.path());
        assert_eq!(resolved[0], dir.path().join("hw1").display().to_string());
    }
}
