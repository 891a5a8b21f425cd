use crate::command::{boxed, Command, CommandKind, DispatchContext, SubcommandTable, DEVICE_DEST};
use crate::error::{exit_status, CommandError};
use crate::options::ResolvedOptions;
use comfy_table::Table;
use std::io::Write;

#[derive(Debug, Default)]
pub struct Drive;

impl Command for Drive {
    fn description(&self) -> &str {
        "Drive utilities."
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Dispatching(
            SubcommandTable::new()
                .with("info", "Show the selected drive", boxed::<DriveInfo>)
                .with("list", "List drives", boxed::<DriveList>),
        )
    }
}

/// Lists every enumerated drive with its resolved path.
#[derive(Debug, Default)]
pub struct DriveList {
    devices: Vec<String>,
}

impl Command for DriveList {
    fn description(&self) -> &str {
        "List available CD-DA drives."
    }

    fn handle_arguments(
        &mut self,
        _options: &mut ResolvedOptions,
        ctx: &DispatchContext<'_>,
    ) -> Result<(), CommandError> {
        self.devices = ctx.devices.device_paths();
        Ok(())
    }

    fn run(&mut self, _options: &ResolvedOptions, out: &mut dyn Write) -> Result<i32, CommandError> {
        if self.devices.is_empty() {
            writeln!(out, "No drives found.")?;
            return Ok(exit_status::SUCCESS);
        }

        let mut table = Table::new();
        table.set_header(vec!["Device", "Resolved path"]);
        for device in &self.devices {
            let resolved = dunce::canonicalize(device)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(missing)".to_string());
            table.add_row(vec![device.clone(), resolved]);
        }
        writeln!(out, "{table}")?;
        Ok(exit_status::SUCCESS)
    }
}

/// Shows the drive chosen with `-d/--device` (default: first drive).
#[derive(Debug, Default)]
pub struct DriveInfo;

impl Command for DriveInfo {
    fn description(&self) -> &str {
        "Show the selected CD-DA drive."
    }

    fn device_option(&self) -> bool {
        true
    }

    fn run(&mut self, options: &ResolvedOptions, out: &mut dyn Write) -> Result<i32, CommandError> {
        let device = options.get_str(DEVICE_DEST).unwrap_or_default();
        writeln!(out, "Device: {device}")?;
        Ok(exit_status::SUCCESS)
    }
}
