//! Option registration with configuration-file defaults.
//!
//! Every option is resolved from three sources in strict precedence order:
//! command-line flag, configuration-file value, code default. Registration
//! consults the [`ConfigStore`] once to compute the effective default; parsing
//! then lets a flag present on the command line override it.

use crate::config::{ConfigStore, DEFAULT_SECTION};
use crate::error::{CommandError, RegistrationError};
use crate::options::{OptionValue, ResolvedOptions, ValueKind};
use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::trace;

/// Declarative option descriptor.
///
/// The recognized keys are `flags`, `dest`, `type`, `default`, `section`,
/// `help` and `metavar`; descriptors read from data reject anything else.
/// `dest` names both the resolved option and its configuration key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentSpec {
    pub flags: Vec<String>,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: ValueKind,
    #[serde(default)]
    pub default: Option<OptionValue>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub metavar: Option<String>,
}

impl ArgumentSpec {
    pub fn new(flags: &[&str]) -> Self {
        Self {
            flags: flags.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Parse a descriptor from TOML, rejecting unrecognized keys.
    pub fn from_toml(source: &str) -> Result<Self, RegistrationError> {
        toml::from_str(source).map_err(|e| RegistrationError::InvalidDescriptor(e.to_string()))
    }

    pub fn dest(mut self, dest: &str) -> Self {
        self.dest = Some(dest.to_string());
        self
    }

    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Code default, used when the configuration file has no value.
    pub fn default_value(mut self, value: impl Into<OptionValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Read the configuration value from `section` instead of the owning
    /// command's section.
    pub fn section(mut self, section: &str) -> Self {
        self.section = Some(section.to_string());
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn metavar(mut self, metavar: &str) -> Self {
        self.metavar = Some(metavar.to_string());
        self
    }
}

/// How many values a positional argument takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Required,
    Optional,
    OneOrMore,
    ZeroOrMore,
}

/// An option after registration: flags validated, default resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredOption {
    pub dest: String,
    pub flags: Vec<String>,
    pub kind: ValueKind,
    /// Section the configuration value was looked up in, `None` for options
    /// registered without configuration support.
    pub section: Option<String>,
    pub effective_default: Option<OptionValue>,
    pub help: Option<String>,
    pub metavar: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Positional {
    name: String,
    help: String,
    arity: Arity,
}

/// Per-command option registry.
pub struct ArgumentRegistry<'a> {
    store: &'a dyn ConfigStore,
    config_section: Option<&'a str>,
    options: Vec<RegisteredOption>,
    positionals: Vec<Positional>,
    /// Flag to owning dest, including reserved flags.
    flags_in_use: HashMap<String, String>,
    reserved: Vec<String>,
}

impl<'a> ArgumentRegistry<'a> {
    pub fn new(store: &'a dyn ConfigStore, config_section: Option<&'a str>) -> Self {
        Self {
            store,
            config_section,
            options: Vec::new(),
            positionals: Vec::new(),
            flags_in_use: HashMap::new(),
            reserved: Vec::new(),
        }
    }

    /// Claim `id` and `flags` for an argument the parser adds itself, so a
    /// registration that reuses them fails here rather than inside clap.
    pub fn reserve(&mut self, id: &str, flags: &[&str]) {
        self.reserved.push(id.to_string());
        for flag in flags {
            self.flags_in_use.insert(flag.to_string(), id.to_string());
        }
    }

    /// Register an option whose default may come from the configuration file.
    ///
    /// The section is the descriptor's own override, else the owning command's
    /// section, else `main`. The effective default is the stored value for
    /// (section, dest) when one exists, otherwise the code default.
    pub fn add(&mut self, spec: ArgumentSpec) -> Result<(), CommandError> {
        let (dest, kind) = self.validate(&spec)?;

        let section = spec
            .section
            .clone()
            .or_else(|| self.config_section.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_SECTION.to_string());

        self.claim_flags(&dest, &spec.flags);

        let code_default = spec.default.clone().map(|v| v.normalize(kind));
        let effective_default = self.store.get(kind, &section, &dest, code_default)?;
        trace!(
            dest = %dest,
            section = %section,
            type_suffix = kind.type_suffix(),
            "option registered"
        );

        self.options.push(RegisteredOption {
            dest,
            flags: spec.flags,
            kind,
            section: Some(section),
            effective_default,
            help: spec.help,
            metavar: spec.metavar,
        });
        Ok(())
    }

    /// Register an option that never consults the configuration file.
    pub fn add_plain(&mut self, spec: ArgumentSpec) -> Result<(), CommandError> {
        let (dest, kind) = self.validate(&spec)?;
        self.claim_flags(&dest, &spec.flags);
        self.options.push(RegisteredOption {
            dest,
            flags: spec.flags,
            kind,
            section: None,
            effective_default: spec.default.map(|v| v.normalize(kind)),
            help: spec.help,
            metavar: spec.metavar,
        });
        Ok(())
    }

    /// Register a string positional. Positionals never consult the
    /// configuration file; multi-valued ones resolve to a list.
    pub fn positional(&mut self, name: &str, help: &str, arity: Arity) -> Result<(), CommandError> {
        if self.is_registered(name) {
            return Err(RegistrationError::DuplicateDest(name.to_string()).into());
        }
        self.positionals.push(Positional {
            name: name.to_string(),
            help: help.to_string(),
            arity,
        });
        Ok(())
    }

    pub fn options(&self) -> &[RegisteredOption] {
        &self.options
    }

    pub fn option(&self, dest: &str) -> Option<&RegisteredOption> {
        self.options.iter().find(|o| o.dest == dest)
    }

    fn is_registered(&self, dest: &str) -> bool {
        self.options.iter().any(|o| o.dest == dest)
            || self.positionals.iter().any(|p| p.name == dest)
            || self.reserved.iter().any(|r| r == dest)
    }

    fn claim_flags(&mut self, dest: &str, flags: &[String]) {
        for flag in flags {
            self.flags_in_use.insert(flag.clone(), dest.to_string());
        }
    }

    fn validate(&self, spec: &ArgumentSpec) -> Result<(String, ValueKind), RegistrationError> {
        let dest = spec.dest.clone().ok_or_else(|| RegistrationError::MissingDest {
            flags: spec.flags.clone(),
        })?;
        if spec.flags.is_empty() {
            return Err(RegistrationError::MissingFlags { dest });
        }
        for flag in &spec.flags {
            if parse_flag(flag).is_none() {
                return Err(RegistrationError::InvalidFlag {
                    dest,
                    flag: flag.clone(),
                });
            }
        }
        if self.is_registered(&dest) {
            return Err(RegistrationError::DuplicateDest(dest));
        }
        for (i, flag) in spec.flags.iter().enumerate() {
            let owner = match self.flags_in_use.get(flag) {
                Some(owner) => owner.clone(),
                None if spec.flags[..i].contains(flag) => dest.clone(),
                None => continue,
            };
            return Err(RegistrationError::DuplicateFlag {
                flag: flag.clone(),
                dest,
                owner,
            });
        }
        if let Some(default) = &spec.default {
            if !default.conforms_to(spec.kind) {
                return Err(RegistrationError::DefaultTypeMismatch {
                    dest,
                    expected: spec.kind.name(),
                });
            }
        }
        Ok((dest, spec.kind))
    }

    /// Build the clap arguments for every registration, in order.
    pub(crate) fn clap_args(&self) -> Vec<Arg> {
        let mut args: Vec<Arg> = self.options.iter().map(option_arg).collect();
        args.extend(self.positionals.iter().map(positional_arg));
        args
    }

    /// Write every registered value into `options`. A flag given on the
    /// command line wins; otherwise the effective default is used. Options
    /// with neither leave `options` untouched.
    pub(crate) fn resolve(&self, matches: &ArgMatches, options: &mut ResolvedOptions) {
        for option in &self.options {
            let from_cli = matches.value_source(&option.dest) == Some(ValueSource::CommandLine);
            let value = if from_cli {
                cli_value(matches, option)
            } else {
                option.effective_default.clone()
            };
            if let Some(value) = value {
                options.set(option.dest.clone(), value);
            }
        }

        for positional in &self.positionals {
            let Some(values) = matches.get_many::<String>(&positional.name) else {
                continue;
            };
            let values: Vec<String> = values.cloned().collect();
            match positional.arity {
                Arity::Required | Arity::Optional => {
                    if let Some(value) = values.into_iter().next() {
                        options.set(positional.name.clone(), value);
                    }
                }
                Arity::OneOrMore | Arity::ZeroOrMore => {
                    options.set(positional.name.clone(), values);
                }
            }
        }
    }
}

enum Flag<'f> {
    Short(char),
    Long(&'f str),
}

fn parse_flag(flag: &str) -> Option<Flag<'_>> {
    if let Some(long) = flag.strip_prefix("--") {
        let valid = !long.is_empty()
            && long
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        return valid.then_some(Flag::Long(long));
    }
    let short = flag.strip_prefix('-')?;
    let mut chars = short.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(Flag::Short(c)),
        _ => None,
    }
}

fn option_arg(option: &RegisteredOption) -> Arg {
    let mut arg = Arg::new(option.dest.clone());
    let mut has_long = false;
    let mut has_short = false;
    for flag in &option.flags {
        match parse_flag(flag) {
            Some(Flag::Long(long)) if !has_long => {
                arg = arg.long(long.to_string());
                has_long = true;
            }
            Some(Flag::Long(long)) => arg = arg.visible_alias(long.to_string()),
            Some(Flag::Short(c)) if !has_short => {
                arg = arg.short(c);
                has_short = true;
            }
            Some(Flag::Short(c)) => arg = arg.visible_short_alias(c),
            None => {}
        }
    }

    if let Some(help) = &option.help {
        arg = arg.help(help.clone());
    }

    match option.kind {
        ValueKind::Boolean => arg.action(ArgAction::SetTrue),
        kind => {
            arg = arg.action(ArgAction::Set);
            arg = match kind {
                ValueKind::Int => arg.value_parser(value_parser!(i64)),
                ValueKind::Float => arg.value_parser(value_parser!(f64)),
                _ => arg.value_parser(value_parser!(String)),
            };
            if let Some(metavar) = &option.metavar {
                arg = arg.value_name(metavar.clone());
            }
            if let Some(default) = &option.effective_default {
                arg = arg.default_value(default.to_string());
            }
            arg
        }
    }
}

fn positional_arg(positional: &Positional) -> Arg {
    let arg = Arg::new(positional.name.clone())
        .help(positional.help.clone())
        .value_parser(value_parser!(String));
    match positional.arity {
        Arity::Required => arg.required(true).num_args(1),
        Arity::Optional => arg.required(false).num_args(1),
        Arity::OneOrMore => arg.required(true).num_args(1..).action(ArgAction::Append),
        Arity::ZeroOrMore => arg.required(false).num_args(0..).action(ArgAction::Append),
    }
}

fn cli_value(matches: &ArgMatches, option: &RegisteredOption) -> Option<OptionValue> {
    let id = option.dest.as_str();
    match option.kind {
        ValueKind::Boolean => Some(OptionValue::Bool(matches.get_flag(id))),
        ValueKind::Int => matches.get_one::<i64>(id).copied().map(OptionValue::Int),
        ValueKind::Float => matches.get_one::<f64>(id).copied().map(OptionValue::Float),
        ValueKind::String => matches.get_one::<String>(id).cloned().map(OptionValue::Str),
    }
}
