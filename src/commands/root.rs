use crate::argument::{ArgumentRegistry, ArgumentSpec};
use crate::command::{boxed, Command, CommandKind, SubcommandTable};
use crate::commands::{Checksum, Drive, Encode, VERBOSE_DEST};
use crate::error::CommandError;
use crate::options::ValueKind;

/// Top-level command.
#[derive(Debug, Default)]
pub struct Cdrip;

impl Command for Cdrip {
    fn description(&self) -> &str {
        "cdrip reads, encodes and verifies CD audio.\n\n\
         Option defaults can be set per command in the configuration file;\n\
         flags given on the command line take precedence."
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Dispatching(
            SubcommandTable::new()
                .with("checksum", "Compute BLAKE3 checksums of files", boxed::<Checksum>)
                .with("drive", "Inspect CD-DA drives", boxed::<Drive>)
                .with("encode", "Encode a ripped WAV file", boxed::<Encode>),
        )
    }

    fn add_arguments(&self, args: &mut ArgumentRegistry<'_>) -> Result<(), CommandError> {
        args.add(
            ArgumentSpec::new(&["-v", "--verbose"])
                .dest(VERBOSE_DEST)
                .kind(ValueKind::Boolean)
                .default_value(false)
                .help("Show task progress"),
        )
    }
}
