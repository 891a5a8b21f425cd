use crate::argument::{ArgumentRegistry, ArgumentSpec, Arity};
use crate::command::{Command, DispatchContext};
use crate::commands::verbose;
use crate::error::{exit_status, CommandError};
use crate::options::{ResolvedOptions, ValueKind};
use crate::task::TaskRunner;
use crate::tasks::checksum::{ChecksumTask, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Serialize)]
struct ChecksumRecord {
    path: String,
    blake3: String,
}

/// Computes checksums of files, walking directories in name order.
#[derive(Debug, Default)]
pub struct Checksum {
    chunk_size: usize,
}

impl Command for Checksum {
    fn description(&self) -> &str {
        "Compute BLAKE3 checksums of files and directories."
    }

    fn config_section(&self) -> Option<&'static str> {
        Some("checksum")
    }

    fn add_arguments(&self, args: &mut ArgumentRegistry<'_>) -> Result<(), CommandError> {
        args.add(
            ArgumentSpec::new(&["--chunk-size"])
                .dest("chunk_size")
                .kind(ValueKind::Int)
                .default_value(DEFAULT_CHUNK_SIZE as i64)
                .metavar("BYTES")
                .help("Bytes read per step"),
        )?;
        args.add(
            ArgumentSpec::new(&["--json"])
                .dest("json")
                .kind(ValueKind::Boolean)
                .default_value(false)
                .help("Print results as JSON"),
        )?;
        args.positional("paths", "Files or directories", Arity::OneOrMore)
    }

    fn handle_arguments(
        &mut self,
        options: &mut ResolvedOptions,
        _ctx: &DispatchContext<'_>,
    ) -> Result<(), CommandError> {
        let chunk_size = options.get_int("chunk_size").unwrap_or(DEFAULT_CHUNK_SIZE as i64);
        self.chunk_size = usize::try_from(chunk_size)
            .ok()
            .filter(|n| (1..=MAX_CHUNK_SIZE).contains(n))
            .ok_or_else(|| {
                CommandError::InvalidArgument(format!(
                    "Invalid chunk size: {chunk_size} (must be between 1 and {MAX_CHUNK_SIZE})"
                ))
            })?;
        Ok(())
    }

    fn run(&mut self, options: &ResolvedOptions, out: &mut dyn Write) -> Result<i32, CommandError> {
        let mut runner = TaskRunner::new();
        let verbose = verbose(options);

        let mut records = Vec::new();
        for file in expand(&options.get_list("paths").unwrap_or_default()) {
            let mut task = ChecksumTask::new(&file, self.chunk_size);
            runner.run(&mut task, verbose)?;
            records.push(ChecksumRecord {
                path: file.display().to_string(),
                blake3: task.digest().unwrap_or_default().to_string(),
            });
        }

        if options.get_bool("json").unwrap_or(false) {
            let rendered = serde_json::to_string_pretty(&records)
                .map_err(|e| CommandError::Io(std::io::Error::other(e)))?;
            writeln!(out, "{rendered}")?;
        } else {
            for record in &records {
                writeln!(out, "{}  {}", record.blake3, record.path)?;
            }
        }
        Ok(exit_status::SUCCESS)
    }
}

/// Files named directly are kept as given, even when missing, so the task
/// reports the failure. Directories contribute their files in name order.
fn expand(paths: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths.iter().map(Path::new) {
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable entry"),
            }
        }
    }
    files
}
