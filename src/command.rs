//! Recursive command dispatch.
//!
//! A [`CommandNode`] is one level of the command tree. Constructing the root
//! node registers its options, parses argv into the shared
//! [`ResolvedOptions`], and, for dispatching commands, recursively constructs
//! the selected child from the unconsumed remainder. `execute` then runs the
//! innermost leaf.

use crate::argument::{ArgumentRegistry, ArgumentSpec};
use crate::config::ConfigStore;
use crate::device::{resolve_device, DeviceEnumerator};
use crate::error::{exit_status, CommandError};
use crate::options::ResolvedOptions;
use clap::{Arg, ArgAction, ArgMatches};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, error};

/// Argument id of the catch-all positional holding tokens meant for a child.
const REMAINDER_ID: &str = "subcommand-remainder";

/// Argument id clap gives its generated help flag.
const HELP_ID: &str = "help";

/// Destination of the device option added for `device_option` commands.
pub const DEVICE_DEST: &str = "device";

/// Collaborators injected at the root and shared by every node.
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    pub config: &'a dyn ConfigStore,
    pub devices: &'a dyn DeviceEnumerator,
}

pub type CommandConstructor = fn() -> Box<dyn Command>;

/// Constructor for any default-constructible command.
pub fn boxed<C: Command + Default + 'static>() -> Box<dyn Command> {
    Box::new(C::default())
}

/// A registered subcommand.
#[derive(Clone, Copy)]
pub struct SubcommandEntry {
    pub summary: &'static str,
    pub construct: CommandConstructor,
}

/// Name to constructor registry, kept sorted by name.
#[derive(Clone, Default)]
pub struct SubcommandTable {
    entries: BTreeMap<&'static str, SubcommandEntry>,
}

impl SubcommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, summary: &'static str, construct: CommandConstructor) -> Self {
        self.entries.insert(name, SubcommandEntry { summary, construct });
        self
    }

    pub fn get(&self, name: &str) -> Option<&SubcommandEntry> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Help epilog listing every subcommand with its summary, sorted by name.
    pub fn epilog(&self) -> String {
        let mut s = String::from("commands:\n");
        for (name, entry) in &self.entries {
            s.push_str(&format!("  {:<8} {}\n", name, entry.summary));
        }
        s
    }
}

/// Whether a command does its own work or hands off to a subcommand.
pub enum CommandKind {
    Leaf,
    Dispatching(SubcommandTable),
}

/// One command in the tree. Implementors describe themselves, register their
/// options, and either perform work in [`Command::run`] (leaves) or name their
/// subcommands through [`Command::kind`].
pub trait Command {
    fn description(&self) -> &str;

    /// Decided once, when the node is constructed.
    fn kind(&self) -> CommandKind {
        CommandKind::Leaf
    }

    /// Configuration section for this command's options. `None` reads from
    /// `main`.
    fn config_section(&self) -> Option<&'static str> {
        None
    }

    /// Add a `-d/--device` option defaulting to the first enumerated drive.
    fn device_option(&self) -> bool {
        false
    }

    /// Whether `-h/--help` is registered.
    fn add_help(&self) -> bool {
        true
    }

    fn add_arguments(&self, _args: &mut ArgumentRegistry<'_>) -> Result<(), CommandError> {
        Ok(())
    }

    /// Post-process parsed options before any subcommand is dispatched.
    fn handle_arguments(
        &mut self,
        _options: &mut ResolvedOptions,
        _ctx: &DispatchContext<'_>,
    ) -> Result<(), CommandError> {
        Ok(())
    }

    /// Perform the command's work and return the intended exit status. Only
    /// called on the innermost node.
    fn run(&mut self, _options: &ResolvedOptions, _out: &mut dyn Write) -> Result<i32, CommandError> {
        Ok(exit_status::SUCCESS)
    }
}

/// A constructed level of the dispatch chain.
pub struct CommandNode {
    prog_name: String,
    command: Box<dyn Command>,
    child: Option<Box<CommandNode>>,
}

impl std::fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandNode")
            .field("prog_name", &self.prog_name)
            .field("child", &self.child)
            .finish()
    }
}

impl CommandNode {
    /// Parse `argv` for `command` and recursively construct the chosen child.
    ///
    /// Every value resolved at this level is written into `options`,
    /// replacing values a parent may have stored under the same `dest`.
    pub fn new(
        mut command: Box<dyn Command>,
        argv: &[String],
        prog_name: &str,
        options: &mut ResolvedOptions,
        ctx: &DispatchContext<'_>,
    ) -> Result<Self, CommandError> {
        let kind = command.kind();
        let subcommands = match &kind {
            CommandKind::Leaf => None,
            CommandKind::Dispatching(table) => Some(table),
        };

        let mut parser = clap::Command::new(prog_name.to_string())
            .bin_name(prog_name.to_string())
            .about(command.description().to_string())
            .no_binary_name(true)
            .disable_help_subcommand(true);
        if let Some(table) = subcommands {
            parser = parser.after_help(table.epilog());
        }
        if !command.add_help() {
            parser = parser.disable_help_flag(true);
        }

        let mut registry = ArgumentRegistry::new(ctx.config, command.config_section());
        if command.add_help() {
            registry.reserve(HELP_ID, &["-h", "--help"]);
        }
        if subcommands.is_some() {
            registry.reserve(REMAINDER_ID, &[]);
        }

        if command.device_option() {
            let drives = ctx.devices.device_paths();
            let Some(first) = drives.first() else {
                error!(severity = "critical", "No CD-DA drives found!");
                return Err(CommandError::NoDevice);
            };
            registry.add_plain(
                ArgumentSpec::new(&["-d", "--device"])
                    .dest(DEVICE_DEST)
                    .default_value(first.as_str())
                    .help("CD-DA device"),
            )?;
        }

        command.add_arguments(&mut registry)?;

        parser = parser.args(registry.clap_args());
        if subcommands.is_some() {
            parser = parser.arg(
                Arg::new(REMAINDER_ID)
                    .action(ArgAction::Set)
                    .num_args(1..)
                    .trailing_var_arg(true)
                    .hide(true),
            );
        }

        let matches = parser.try_get_matches_from_mut(argv)?;
        registry.resolve(&matches, options);

        if command.device_option() {
            if let Some(device) = options.get_str(DEVICE_DEST).map(str::to_string) {
                let resolved = resolve_device(&device)?;
                options.set(DEVICE_DEST, resolved.to_string_lossy().into_owned());
            }
        }

        command.handle_arguments(options, ctx)?;

        let child = match subcommands {
            None => None,
            Some(table) => {
                let remainder = remainder(&matches);
                let Some((name, rest)) = remainder.split_first() else {
                    debug!(prog = prog_name, "no subcommand given, showing help");
                    return Err(CommandError::HelpShown {
                        help: parser.render_help().to_string(),
                    });
                };
                let Some(entry) = table.get(name) else {
                    error!(severity = "critical", "incorrect subcommand: {}", name);
                    return Err(CommandError::UnknownSubcommand(name.clone()));
                };
                let child_prog = format!("{} {}", prog_name, name);
                debug!(prog = %child_prog, "dispatching subcommand");
                let node = CommandNode::new((entry.construct)(), rest, &child_prog, options, ctx)?;
                Some(Box::new(node))
            }
        };

        Ok(Self {
            prog_name: prog_name.to_string(),
            command,
            child,
        })
    }

    /// Run the innermost command of the chain.
    pub fn execute(&mut self, options: &ResolvedOptions, out: &mut dyn Write) -> Result<i32, CommandError> {
        match self.child.as_mut() {
            Some(child) => child.execute(options, out),
            None => self.command.run(options, out),
        }
    }

    pub fn prog_name(&self) -> &str {
        &self.prog_name
    }

    pub fn child(&self) -> Option<&CommandNode> {
        self.child.as_deref()
    }

    /// The innermost node of the chain.
    pub fn leaf(&self) -> &CommandNode {
        match &self.child {
            Some(child) => child.leaf(),
            None => self,
        }
    }
}

fn remainder(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>(REMAINDER_ID)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
