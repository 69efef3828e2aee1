use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::tempdir;
use zip::write::FileOptions;

use grader::pipeline::{BatchArgs, run_batch};
use marker::artifacts::StudentStatus;

const STAMP: &str = "2026-01-15-10-30-00";

fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options: FileOptions<'_, ()> = FileOptions::default();
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

/// A minimal batch export: one record plus one obfuscated entry per
/// (student, file) pair.
fn make_batch_zip(dest: &Path, submissions: &[(&str, &str, &[u8])]) {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    for (student_id, original_name, content) in submissions {
        let entry = format!("HW1_{student_id}_attempt_{STAMP}_{original_name}");
        let record = format!(
            "Name: Some Student ({student_id})\n\tOriginal filename: {original_name}\n\tFilename: {entry}\n"
        );
        files.push((format!("HW1_{student_id}_attempt_{STAMP}.txt"), record.into_bytes()));
        files.push((entry, content.to_vec()));
    }
    let refs: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(name, content)| (name.as_str(), content.as_slice()))
        .collect();
    fs::write(dest, zip_bytes(&refs)).unwrap();
}

fn write_commands(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("commands.txt");
    fs::write(&path, content).unwrap();
    path
}

fn batch_args(dir: &Path, zipfile: PathBuf, commands: PathBuf) -> BatchArgs {
    BatchArgs {
        zipfile,
        assignment: "HW1".to_string(),
        grader: "tutor7".to_string(),
        grading_dir: dir.to_path_buf(),
        resources_dir: None,
        commands_path: commands,
        expected_output: None,
    }
}

#[tokio::test]
async fn test_whitespace_differences_do_not_show_in_diff() {
    let dir = tempdir().unwrap();
    let zipfile = dir.path().join("batch.zip");
    make_batch_zip(&zipfile, &[("abc123", "hw1.c", b"Hello,   World!\n")]);
    let commands = write_commands(dir.path(), "cat hw1.c\n");
    let expected = dir.path().join("expected.txt");
    fs::write(&expected, "Hello, World!\n").unwrap();

    let mut args = batch_args(dir.path(), zipfile, commands);
    args.expected_output = Some(expected);

    let summary = run_batch(&args).await.unwrap();

    assert_eq!(summary.students.len(), 1);
    assert_eq!(summary.students[0].status, StudentStatus::Success);

    let student = dir.path().join("submissions").join("abc123");
    assert_eq!(
        fs::read_to_string(student.join("abc123.diff.txt")).unwrap(),
        "",
        "normalization hides spacing differences"
    );
    assert!(
        fs::read_to_string(student.join("abc123.out.txt"))
            .unwrap()
            .contains("Hello,   World!")
    );
    assert!(student.join("abc123.grading.txt").is_file());
    assert!(student.join("abc123.scan.txt").is_file());
    assert!(student.join("abc123.info.txt").is_file());
    assert!(!dir.path().join("temp").exists(), "scratch area removed");
}

#[tokio::test]
async fn test_failing_command_stops_sequence_and_skips_diff() {
    let dir = tempdir().unwrap();
    let zipfile = dir.path().join("batch.zip");
    make_batch_zip(&zipfile, &[("abc123", "hw1.c", b"int main() {}\n")]);
    let commands = write_commands(dir.path(), "false\necho never\n");
    let expected = dir.path().join("expected.txt");
    fs::write(&expected, "Hello, World!\n").unwrap();

    let mut args = batch_args(dir.path(), zipfile, commands);
    args.expected_output = Some(expected);

    let summary = run_batch(&args).await.unwrap();
    assert_eq!(summary.students[0].status, StudentStatus::CommandFailure);

    let student = dir.path().join("submissions").join("abc123");
    let output = fs::read_to_string(student.join("abc123.out.txt")).unwrap();
    assert!(output.contains("Command failed with exit code 1"));
    assert!(!output.contains("never"), "second command skipped");
    assert_eq!(
        fs::read_to_string(student.join("abc123.diff.txt")).unwrap(),
        "",
        "diff skipped for failed run"
    );
}

#[tokio::test]
async fn test_nested_zip_submission_is_flattened() {
    let dir = tempdir().unwrap();
    let inner = zip_bytes(&[("proj/hw1.c", b"int main() {}\n")]);

    let zipfile = dir.path().join("batch.zip");
    make_batch_zip(&zipfile, &[("xyz9", "proj.zip", &inner)]);
    let commands = write_commands(dir.path(), "cat hw1.c\n");

    let args = batch_args(dir.path(), zipfile, commands);
    let summary = run_batch(&args).await.unwrap();

    assert_eq!(summary.students[0].status, StudentStatus::Success);
    let student = dir.path().join("submissions").join("xyz9");
    assert!(student.join("hw1.c").is_file(), "wrapping folder hoisted");
    assert!(!student.join("proj.zip").exists());
}

#[tokio::test]
async fn test_suspicious_output_calls_land_in_scan_report() {
    let dir = tempdir().unwrap();
    let zipfile = dir.path().join("batch.zip");
    make_batch_zip(
        &zipfile,
        &[("abc123", "hw1.c", b"int main() { printf(\"42\"); }\n")],
    );
    let commands = write_commands(dir.path(), "cat hw1.c\n");

    let args = batch_args(dir.path(), zipfile, commands);
    run_batch(&args).await.unwrap();

    let scan = fs::read_to_string(
        dir.path()
            .join("submissions")
            .join("abc123")
            .join("abc123.scan.txt"),
    )
    .unwrap();
    assert!(scan.contains("hw1.c:1:"), "scan: {scan}");
}

#[tokio::test]
async fn test_preexisting_submissions_dir_aborts_batch() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("submissions")).unwrap();
    let zipfile = dir.path().join("batch.zip");
    make_batch_zip(&zipfile, &[("abc123", "hw1.c", b"x")]);
    let commands = write_commands(dir.path(), "cat hw1.c\n");

    let args = batch_args(dir.path(), zipfile, commands);
    let err = run_batch(&args).await.unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn test_one_student_failure_does_not_stop_the_batch() {
    let dir = tempdir().unwrap();
    let zipfile = dir.path().join("batch.zip");
    // First student submits a corrupt container, second a clean file.
    make_batch_zip(
        &zipfile,
        &[
            ("aaa1", "proj.zip", b"PK\x03\x04 not really a zip"),
            ("bbb2", "hw1.c", b"int main() {}\n"),
        ],
    );
    let commands = write_commands(dir.path(), "cat hw1.c\n");

    let args = batch_args(dir.path(), zipfile, commands);
    let summary = run_batch(&args).await.unwrap();

    assert_eq!(summary.students.len(), 2);
    assert_eq!(summary.students[0].status, StudentStatus::ExpandFailure);
    assert_eq!(summary.students[1].status, StudentStatus::Success);

    let failed = dir.path().join("submissions").join("aaa1");
    assert!(failed.join("aaa1.grading.txt").is_file());
    let output = fs::read_to_string(failed.join("aaa1.out.txt")).unwrap();
    assert!(output.contains("zip"), "failure noted: {output}");
}

#[tokio::test]
async fn test_scan_report_survives_workspace_failure() {
    let dir = tempdir().unwrap();
    let zipfile = dir.path().join("batch.zip");
    make_batch_zip(
        &zipfile,
        &[("abc123", "hw1.c", b"int main() { printf(\"42\"); }\n")],
    );
    let commands = write_commands(dir.path(), "cat hw1.c\n");

    let mut args = batch_args(dir.path(), zipfile, commands);
    // Resources directory vanished between argument validation and the
    // run; workspace preparation fails for every student.
    args.resources_dir = Some(dir.path().join("no-such-resources"));

    let summary = run_batch(&args).await.unwrap();
    assert_eq!(summary.students[0].status, StudentStatus::WorkspaceFailure);

    let student = dir.path().join("submissions").join("abc123");
    let scan = fs::read_to_string(student.join("abc123.scan.txt")).unwrap();
    assert!(scan.contains("hw1.c:1:"), "scan findings kept: {scan}");
    let output = fs::read_to_string(student.join("abc123.out.txt")).unwrap();
    assert!(output.contains("Failed to read"), "failure noted: {output}");
}

#[tokio::test]
async fn test_summary_json_written() {
    let dir = tempdir().unwrap();
    let zipfile = dir.path().join("batch.zip");
    make_batch_zip(&zipfile, &[("abc123", "hw1.c", b"int main() {}\n")]);
    let commands = write_commands(dir.path(), "cat hw1.c\n");

    let args = batch_args(dir.path(), zipfile, commands);
    run_batch(&args).await.unwrap();

    let json = fs::read_to_string(dir.path().join("summary.json")).unwrap();
    assert!(json.contains("\"assignment\": \"HW1\""));
    assert!(json.contains("\"grader\": \"tutor7\""));
    assert!(json.contains("abc123"));
}
