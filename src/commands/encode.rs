use crate::argument::{ArgumentRegistry, ArgumentSpec, Arity};
use crate::command::{Command, DispatchContext};
use crate::commands::verbose;
use crate::error::{exit_status, CommandError};
use crate::options::{ResolvedOptions, ValueKind};
use crate::task::TaskRunner;
use crate::tasks::{EncodeSettings, EncodeTask, Profile};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Encodes one ripped file. Reads its option defaults from `[encode]`.
#[derive(Debug, Default)]
pub struct Encode {
    profile: Option<Profile>,
    settings: EncodeSettings,
}

impl Command for Encode {
    fn description(&self) -> &str {
        "Encode a ripped WAV file with the selected profile."
    }

    fn config_section(&self) -> Option<&'static str> {
        Some("encode")
    }

    fn add_arguments(&self, args: &mut ArgumentRegistry<'_>) -> Result<(), CommandError> {
        args.add(
            ArgumentSpec::new(&["-b", "--bitrate"])
                .dest("bitrate")
                .kind(ValueKind::Int)
                .default_value(320i64)
                .metavar("KBPS")
                .help("Target bitrate for lossy profiles"),
        )?;
        args.add(
            ArgumentSpec::new(&["--profile"])
                .dest("profile")
                .default_value("wav")
                .help("Encoding profile"),
        )?;
        args.positional("input", "Input WAV file", Arity::Required)?;
        args.positional("output", "Output file", Arity::Required)
    }

    fn handle_arguments(
        &mut self,
        options: &mut ResolvedOptions,
        _ctx: &DispatchContext<'_>,
    ) -> Result<(), CommandError> {
        let bitrate = options.get_int("bitrate").unwrap_or(320);
        self.settings.bitrate = u32::try_from(bitrate)
            .ok()
            .filter(|b| *b > 0)
            .ok_or_else(|| CommandError::InvalidArgument(format!("Invalid bitrate: {bitrate}")))?;

        let profile = options.get_str("profile").unwrap_or("wav");
        self.profile =
            Some(Profile::from_name(profile).map_err(|e| CommandError::InvalidArgument(e.to_string()))?);
        Ok(())
    }

    fn run(&mut self, options: &ResolvedOptions, out: &mut dyn Write) -> Result<i32, CommandError> {
        let input = PathBuf::from(options.get_str("input").unwrap_or_default());
        let output = PathBuf::from(options.get_str("output").unwrap_or_default());
        let profile = self.profile.unwrap_or(Profile::Wav);

        info!(input = %input.display(), output = %output.display(), profile = profile.name(), "encoding");
        let mut task = EncodeTask::with_settings(&input, &output, profile, self.settings);
        TaskRunner::new().run(&mut task, verbose(options))?;

        writeln!(out, "Encoded {} to {}", input.display(), output.display())?;
        Ok(exit_status::SUCCESS)
    }
}
