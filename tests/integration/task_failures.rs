//! Task failures arrive at the runner boundary as a `TaskException` that
//! still carries the original error.

use cdrip::config::MemoryConfigStore;
use cdrip::device::StaticDevices;
use cdrip::error::exit_status;
use cdrip::task::{FnTask, TaskError, TaskRunner};
use cdrip::tasks::{EncodeTask, Profile, QueryError};
use tempfile::{Builder, TempDir};

use crate::integration::run_cli;

/// File name suffixes that have tripped up quoting in the past.
const AWKWARD_SUFFIXES: &[&str] = &[".wav", "-\u{e9}\u{e8}\u{1f3b5}.wav", "-it's.wav", "-\"quoted\".wav"];

#[test]
fn test_empty_inputs_raise_query_error() {
    let out_dir = TempDir::new().unwrap();
    for suffix in AWKWARD_SUFFIXES {
        let input = Builder::new().prefix("track").suffix(suffix).tempfile().unwrap();
        let output = out_dir.path().join("out.wav");

        let mut task = EncodeTask::new(input.path(), &output, Profile::Wav);
        let err = TaskRunner::new().run(&mut task, false).unwrap_err();

        let query = err
            .downcast_ref::<QueryError>()
            .unwrap_or_else(|| panic!("expected QueryError for suffix {suffix:?}, got {err}"));
        assert_eq!(query.path.as_path(), input.path());
        assert!(!output.exists());
    }
}

#[test]
fn test_verbose_does_not_change_failure() {
    let input = Builder::new().suffix(".wav").tempfile().unwrap();
    let out_dir = TempDir::new().unwrap();

    let mut quiet = EncodeTask::new(input.path(), out_dir.path().join("a.wav"), Profile::Wav);
    let mut loud = EncodeTask::new(input.path(), out_dir.path().join("b.wav"), Profile::Wav);
    let quiet_err = TaskRunner::with_output(std::io::sink())
        .run(&mut quiet, false)
        .unwrap_err();
    let loud_err = TaskRunner::with_output(std::io::sink())
        .run(&mut loud, true)
        .unwrap_err();

    assert!(quiet_err.is::<QueryError>());
    assert!(loud_err.is::<QueryError>());
    assert_eq!(
        quiet_err.downcast_ref::<QueryError>().map(|e| e.reason.clone()),
        loud_err.downcast_ref::<QueryError>().map(|e| e.reason.clone())
    );
}

#[test]
fn test_wrapped_error_is_the_raised_error() {
    let mut task = FnTask::new("Querying", || -> Result<(), TaskError> {
        Err(Box::new(QueryError {
            path: "disc.toc".into(),
            reason: "no table of contents".to_string(),
        }))
    });
    let err = TaskRunner::new().run(&mut task, false).unwrap_err();
    assert_eq!(
        err.downcast_ref::<QueryError>(),
        Some(&QueryError {
            path: "disc.toc".into(),
            reason: "no table of contents".to_string(),
        })
    );
    assert_eq!(err.task(), "Querying");
}

#[test]
fn test_encode_command_surfaces_task_failure() {
    let input = Builder::new().suffix("-it's.wav").tempfile().unwrap();
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("out.wav");

    let (code, out) = run_cli(
        &MemoryConfigStore::new(),
        &StaticDevices::default(),
        &["encode", input.path().to_str().unwrap(), output.to_str().unwrap()],
    );
    assert_eq!(code, exit_status::TASK_FAILED);
    assert!(out.is_empty());
    assert!(!output.exists());
}

#[test]
fn test_checksum_command_surfaces_missing_file() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.wav");
    let (code, _) = run_cli(
        &MemoryConfigStore::new(),
        &StaticDevices::default(),
        &["checksum", missing.to_str().unwrap()],
    );
    assert_eq!(code, exit_status::TASK_FAILED);
}
