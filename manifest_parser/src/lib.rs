//! Parser for the metadata records inside a batch export.
//!
//! The export holds every student's files under obfuscated entry names,
//! plus one plain-text record per submission attempt. Each record names
//! the student, the file name the student chose, and the entry name the
//! export gave it. Parsing a record restores the student's files under
//! their original names in a per-student submission directory.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;

use util::paths;

static RECORD_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+_attempt_[0-9-]{19}\.txt$").unwrap());

/// True if a file name is a submission metadata record. The whole name
/// must match; a student file that merely embeds the pattern is not a
/// record.
pub fn is_manifest_record(file_name: &str) -> bool {
    RECORD_NAME_RE.is_match(file_name)
}

/// What a record has told us so far. A `Filename:` line is only
/// actionable once both the identity and the original name are known;
/// seeing one earlier means the record is corrupt and the whole batch
/// stops.
#[derive(Debug, Default)]
struct RecordState {
    student_id: Option<String>,
    original_name: Option<String>,
}

/// Processes every metadata record found directly under `temp_dir`.
///
/// For each record: creates (or reuses) the student's directory under
/// `submissions_dir`, moves the record there as `{id}.info.txt`, and
/// renames each obfuscated entry to the student's original file name.
///
/// Returns the distinct student ids in the order their first record was
/// seen. Records are visited in sorted file-name order so reruns over
/// the same export are deterministic.
///
/// # Errors
///
/// Fails the batch on a malformed record (a `Filename:` line before the
/// identity or original name is known) or on filesystem errors while
/// restoring files.
pub fn process_batch_records(temp_dir: &Path, submissions_dir: &Path) -> Result<Vec<String>> {
    let student_id_re = Regex::new(r"^Name:.+\((.+)\)$").unwrap();
    let orig_file_re = Regex::new(r"^\tOriginal filename: (.+)$").unwrap();
    let file_re = Regex::new(r"^\tFilename: (.+)$").unwrap();

    let entries = fs::read_dir(temp_dir)
        .with_context(|| format!("reading batch contents at {}", temp_dir.display()))?;

    let mut record_names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| is_manifest_record(name))
        .collect();
    record_names.sort();

    let mut student_ids: Vec<String> = Vec::new();

    for record_name in record_names {
        let record_path = temp_dir.join(&record_name);
        let content = fs::read_to_string(&record_path)
            .with_context(|| format!("reading record {record_name}"))?;

        let mut state = RecordState::default();

        for line in content.lines() {
            if let Some(caps) = student_id_re.captures(line) {
                let student_id = caps[1].to_string();
                let student_dir = submissions_dir.join(&student_id);
                fs::create_dir_all(&student_dir)
                    .with_context(|| format!("creating directory for {student_id}"))?;

                let info_dest = paths::info_file_path(&student_dir, &student_id);
                fs::rename(&record_path, &info_dest).with_context(|| {
                    format!("moving record {record_name} to {}", info_dest.display())
                })?;

                if !student_ids.iter().any(|id| id == &student_id) {
                    student_ids.push(student_id.clone());
                }
                state.student_id = Some(student_id);
                continue;
            }

            if let Some(caps) = orig_file_re.captures(line) {
                state.original_name = Some(caps[1].to_string());
                continue;
            }

            if let Some(caps) = file_re.captures(line) {
                let entry_name = caps[1].to_string();
                let (student_id, original_name) =
                    match (&state.student_id, &state.original_name) {
                        (Some(id), Some(orig)) => (id, orig),
                        _ => bail!(
                            "malformed record {record_name}: entry {entry_name} listed before \
                             student identity and original filename"
                        ),
                    };

                let source = temp_dir.join(&entry_name);
                let dest = submissions_dir.join(student_id).join(original_name);
                fs::rename(&source, &dest).with_context(|| {
                    format!("restoring {entry_name} as {original_name} for {student_id}")
                })?;

                tracing::debug!(
                    student_id,
                    original_name,
                    "restored submission file"
                );
            }
        }
    }

    Ok(student_ids)
}
