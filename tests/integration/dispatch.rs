//! Dispatch outcomes as seen through the CLI entry point.

use cdrip::argument::{ArgumentRegistry, ArgumentSpec};
use cdrip::command::{Command, CommandNode, DispatchContext};
use cdrip::config::MemoryConfigStore;
use cdrip::device::StaticDevices;
use cdrip::error::{exit_status, CommandError, RegistrationError};
use cdrip::options::ResolvedOptions;
use tempfile::TempDir;

use crate::integration::{argv, run_cli};

#[test]
fn test_no_subcommand_prints_help_and_succeeds() {
    let (code, out) = run_cli(&MemoryConfigStore::new(), &StaticDevices::default(), &[]);
    assert_eq!(code, exit_status::SUCCESS);
    assert!(out.contains("commands:"));

    // Subcommands listed in name order
    let checksum = out.find("checksum").unwrap();
    let drive = out.find("drive ").unwrap();
    let encode = out.find("encode ").unwrap();
    assert!(checksum < drive && drive < encode);
}

#[test]
fn test_nested_dispatcher_help() {
    let (code, out) = run_cli(&MemoryConfigStore::new(), &StaticDevices::default(), &["drive"]);
    assert_eq!(code, exit_status::SUCCESS);
    assert!(out.contains("cdrip drive"));
    assert!(out.contains("info"));
    assert!(out.contains("list"));
}

#[test]
fn test_unknown_subcommand_has_distinct_status() {
    let (code, out) = run_cli(&MemoryConfigStore::new(), &StaticDevices::default(), &["rip"]);
    assert_eq!(code, exit_status::UNKNOWN_SUBCOMMAND);
    assert_ne!(code, exit_status::SUCCESS);
    assert!(out.is_empty());
}

#[test]
fn test_drive_info_without_drives() {
    let (code, out) = run_cli(
        &MemoryConfigStore::new(),
        &StaticDevices::default(),
        &["drive", "info"],
    );
    assert_eq!(code, exit_status::NO_DEVICE);
    assert!(out.is_empty());
}

#[test]
fn test_drive_info_with_missing_device() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("sr0").to_string_lossy().into_owned();
    let (code, _) = run_cli(
        &MemoryConfigStore::new(),
        &StaticDevices(vec![missing]),
        &["drive", "info"],
    );
    assert_eq!(code, exit_status::DEVICE_NOT_FOUND);
}

#[test]
fn test_drive_info_uses_explicit_device() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("sr0");
    let second = temp.path().join("sr1");
    std::fs::write(&first, b"").unwrap();
    std::fs::write(&second, b"").unwrap();
    let devices = StaticDevices(vec![
        first.to_string_lossy().into_owned(),
        second.to_string_lossy().into_owned(),
    ]);

    let (code, out) = run_cli(&MemoryConfigStore::new(), &devices, &["drive", "info"]);
    assert_eq!(code, exit_status::SUCCESS);
    let expected = dunce::canonicalize(&first).unwrap();
    assert_eq!(out, format!("Device: {}\n", expected.display()));

    let (code, out) = run_cli(
        &MemoryConfigStore::new(),
        &devices,
        &["drive", "info", "--device", second.to_str().unwrap()],
    );
    assert_eq!(code, exit_status::SUCCESS);
    let expected = dunce::canonicalize(&second).unwrap();
    assert_eq!(out, format!("Device: {}\n", expected.display()));
}

#[test]
fn test_drive_list_without_drives() {
    let (code, out) = run_cli(
        &MemoryConfigStore::new(),
        &StaticDevices::default(),
        &["drive", "list"],
    );
    assert_eq!(code, exit_status::SUCCESS);
    assert_eq!(out, "No drives found.\n");
}

#[test]
fn test_drive_list_table() {
    let devices = StaticDevices(vec!["/dev/cdrip-test-absent".to_string()]);
    let (code, out) = run_cli(&MemoryConfigStore::new(), &devices, &["drive", "list"]);
    assert_eq!(code, exit_status::SUCCESS);
    assert!(out.contains("Device"));
    assert!(out.contains("/dev/cdrip-test-absent"));
    assert!(out.contains("(missing)"));
}

#[test]
fn test_bad_flag_is_usage_error() {
    let (code, _) = run_cli(
        &MemoryConfigStore::new(),
        &StaticDevices::default(),
        &["encode", "--bitrate", "loud", "in.wav", "out.wav"],
    );
    assert_eq!(code, exit_status::USAGE);
}

#[test]
fn test_non_positive_bitrate_is_rejected() {
    let (code, _) = run_cli(
        &MemoryConfigStore::new(),
        &StaticDevices::default(),
        &["encode", "--bitrate=0", "in.wav", "out.wav"],
    );
    assert_eq!(code, exit_status::USAGE);
}

#[derive(Default)]
struct Undestined;

impl Command for Undestined {
    fn description(&self) -> &str {
        "Registers an option without a destination."
    }

    fn add_arguments(&self, args: &mut ArgumentRegistry<'_>) -> Result<(), CommandError> {
        args.add(ArgumentSpec::new(&["--speed"]))
    }
}

#[test]
fn test_missing_dest_fails_before_parsing() {
    let store = MemoryConfigStore::new();
    let devices = StaticDevices::default();
    let ctx = DispatchContext {
        config: &store,
        devices: &devices,
    };
    let mut options = ResolvedOptions::new();

    // The argv would be a usage error if it were ever parsed
    let err = CommandNode::new(
        Box::new(Undestined),
        &argv(&["--no-such-flag"]),
        "undestined",
        &mut options,
        &ctx,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        CommandError::Registration(RegistrationError::MissingDest { .. })
    ));
    assert_eq!(err.exit_code(), exit_status::SOFTWARE);
    assert!(options.is_empty());
}
