//! Three-way precedence of option values: command line over configuration
//! file over code default.

use cdrip::argument::{ArgumentRegistry, ArgumentSpec};
use cdrip::command::{Command, CommandNode, DispatchContext};
use cdrip::commands::Cdrip;
use cdrip::config::{ConfigStore, FileConfigStore, MemoryConfigStore};
use cdrip::device::StaticDevices;
use cdrip::error::CommandError;
use cdrip::options::{OptionValue, ResolvedOptions, ValueKind};
use proptest::prelude::*;
use tempfile::TempDir;

use crate::integration::argv;

fn resolve_encode(store: &dyn ConfigStore, extra: &[&str]) -> ResolvedOptions {
    let devices = StaticDevices::default();
    let ctx = DispatchContext {
        config: store,
        devices: &devices,
    };
    let mut args = vec!["encode"];
    args.extend_from_slice(extra);
    args.extend_from_slice(&["in.wav", "out.wav"]);

    let mut options = ResolvedOptions::new();
    CommandNode::new(Box::new(Cdrip), &argv(&args), "cdrip", &mut options, &ctx).unwrap();
    options
}

#[test]
fn test_encode_bitrate_scenario_with_memory_store() {
    let empty = MemoryConfigStore::new();
    assert_eq!(resolve_encode(&empty, &[]).get_int("bitrate"), Some(320));

    let configured = MemoryConfigStore::new().with("encode", "bitrate", 192i64);
    assert_eq!(resolve_encode(&configured, &[]).get_int("bitrate"), Some(192));
    assert_eq!(
        resolve_encode(&configured, &["--bitrate", "128"]).get_int("bitrate"),
        Some(128)
    );
}

#[test]
fn test_encode_bitrate_scenario_with_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[encode]\nbitrate = 192\n").unwrap();
    let store = FileConfigStore::load_from_file(&path).unwrap();

    assert_eq!(resolve_encode(&store, &[]).get_int("bitrate"), Some(192));
    assert_eq!(
        resolve_encode(&store, &["-b", "128"]).get_int("bitrate"),
        Some(128)
    );
}

#[test]
fn test_section_is_per_command() {
    // A bitrate under [main] does not reach the encode command
    let store = MemoryConfigStore::new().with("main", "bitrate", 96i64);
    assert_eq!(resolve_encode(&store, &[]).get_int("bitrate"), Some(320));
}

#[test]
fn test_root_option_reads_main_section() {
    let store = MemoryConfigStore::new().with("main", "verbose", true);
    let options = resolve_encode(&store, &[]);
    assert_eq!(options.get_bool("verbose"), Some(true));
}

/// Leaf with a float option and an option read from a foreign section.
#[derive(Default)]
struct Normalize;

impl Command for Normalize {
    fn description(&self) -> &str {
        "Normalize track volume."
    }

    fn config_section(&self) -> Option<&'static str> {
        Some("normalize")
    }

    fn add_arguments(&self, args: &mut ArgumentRegistry<'_>) -> Result<(), CommandError> {
        args.add(
            ArgumentSpec::new(&["--gain"])
                .dest("gain")
                .kind(ValueKind::Float)
                .default_value(1i64),
        )?;
        args.add(
            ArgumentSpec::new(&["--offset"])
                .dest("offset")
                .kind(ValueKind::Int)
                .default_value(0i64)
                .section("drive"),
        )
    }
}

fn resolve_normalize(store: &dyn ConfigStore, args: &[&str]) -> ResolvedOptions {
    let devices = StaticDevices::default();
    let ctx = DispatchContext {
        config: store,
        devices: &devices,
    };
    let mut options = ResolvedOptions::new();
    CommandNode::new(Box::new(Normalize), &argv(args), "normalize", &mut options, &ctx).unwrap();
    options
}

#[test]
fn test_float_option_precedence() {
    // An integer code default is stored as a float
    let options = resolve_normalize(&MemoryConfigStore::new(), &[]);
    assert_eq!(options.get("gain"), Some(&OptionValue::Float(1.0)));

    let store = MemoryConfigStore::new().with("normalize", "gain", 0.5);
    assert_eq!(resolve_normalize(&store, &[]).get_float("gain"), Some(0.5));
    assert_eq!(
        resolve_normalize(&store, &["--gain", "1.25"]).get_float("gain"),
        Some(1.25)
    );
    assert_eq!(
        resolve_normalize(&store, &["--gain=3"]).get("gain"),
        Some(&OptionValue::Float(3.0))
    );
}

#[test]
fn test_section_override_reads_named_section() {
    let store = MemoryConfigStore::new()
        .with("normalize", "offset", 12i64)
        .with("drive", "offset", 6i64);
    assert_eq!(resolve_normalize(&store, &[]).get_int("offset"), Some(6));
    assert_eq!(
        resolve_normalize(&store, &["--offset=-3"]).get_int("offset"),
        Some(-3)
    );

    let only_command_section = MemoryConfigStore::new().with("normalize", "offset", 12i64);
    assert_eq!(
        resolve_normalize(&only_command_section, &[]).get_int("offset"),
        Some(0)
    );
}

proptest! {
    #[test]
    fn prop_cli_beats_config_beats_default(
        configured in proptest::option::of(1i64..10_000),
        flag in proptest::option::of(1i64..10_000),
    ) {
        let mut store = MemoryConfigStore::new();
        if let Some(v) = configured {
            store.set("encode", "bitrate", v);
        }
        let flag_arg = flag.map(|f| format!("--bitrate={f}"));
        let extra: Vec<&str> = flag_arg.iter().map(String::as_str).collect();

        let resolved = resolve_encode(&store, &extra).get_int("bitrate");
        let expected = flag.or(configured).unwrap_or(320);
        prop_assert_eq!(resolved, Some(expected));
    }
}
