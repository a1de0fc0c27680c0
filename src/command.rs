//! # Declarative Command Builder
//!
//! This module turns a static table of option descriptors into a validated
//! command line for an external tool such as `docker build` or `git diff`.
//!
//! ## Key Components
//!
//! - **`OptionSpec`**: Describes one option of one command segment: its flag,
//!   how an argument is attached to it (`Separator`), whether an argument is
//!   allowed or required (`ArgRequirement`), and how often it may be given
//!   (`Occurrence`). Specs are `const`-constructible so that every tool adapter
//!   can declare its schema as a `static` table.
//!
//! - **`CommandSpec`**: A named command segment (e.g. `docker`, `build`) with
//!   its option table.
//!
//! - **`CommandBuilder`**: Holds the ordered segments of one invocation, the
//!   option tokens queued per segment, and positional parameters. Options are
//!   looked up by name in the segment's table and dispatched through a single
//!   [`CommandBuilder::segment_option`] entry point, which validates the call
//!   before anything is queued.
//!
//! ## Assembly
//!
//! [`CommandBuilder::to_array`] emits, in declared segment order, each
//! segment's literal name followed by its queued option tokens and
//! segment-scoped parameters, then the trailing positional parameters. The
//! assembled argv and its string form are memoized until the next mutation.
//!
//! ```
//! use gam::command::{ArgRequirement, CommandBuilder, CommandSpec, OptionSpec, Separator};
//!
//! static TOOL: CommandSpec = CommandSpec::new("tool", &[]);
//! static RUN: CommandSpec = CommandSpec::new(
//!     "run",
//!     &[
//!         OptionSpec::switch("verbose", "--verbose"),
//!         OptionSpec::required("env", "--env", Separator::Space).multiple(),
//!     ],
//! );
//!
//! let mut command = CommandBuilder::new(&[&TOOL, &RUN]);
//! command
//!     .flag("verbose")
//!     .unwrap()
//!     .value("env", "A=1")
//!     .unwrap()
//!     .parameter("target");
//!
//! assert_eq!(command.to_string(), "tool run --verbose --env A=1 target");
//! ```

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::error::{Error, OptionViolation, Result};
use crate::process::{self, ProcessHandle, ProcessResult, RunOptions};

/// How an option's argument is attached to its flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `-Sfoo`: flag and argument joined with nothing in between.
    None,
    /// `--tag foo`: flag and argument as two argv tokens.
    Space,
    /// `--short=7`: flag and argument joined with `=`.
    Equals,
}

impl Separator {
    fn joiner(self) -> &'static str {
        match self {
            Separator::None | Separator::Space => "",
            Separator::Equals => "=",
        }
    }
}

/// Whether an option accepts an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRequirement {
    None,
    Optional,
    Required,
}

/// How many times an option may be given per builder lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    Single,
    Multiple,
}

/// Immutable descriptor for a single command-line option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    /// Name the option is looked up by (e.g. `buildArg`).
    pub name: &'static str,
    /// Literal flag written to argv (e.g. `--build-arg`).
    pub flag: &'static str,
    pub separator: Separator,
    pub requirement: ArgRequirement,
    pub occurrence: Occurrence,
}

impl OptionSpec {
    /// An option that never takes an argument.
    pub const fn switch(name: &'static str, flag: &'static str) -> Self {
        Self {
            name,
            flag,
            separator: Separator::None,
            requirement: ArgRequirement::None,
            occurrence: Occurrence::Single,
        }
    }

    /// An option that must always be given an argument.
    pub const fn required(name: &'static str, flag: &'static str, separator: Separator) -> Self {
        Self {
            name,
            flag,
            separator,
            requirement: ArgRequirement::Required,
            occurrence: Occurrence::Single,
        }
    }

    /// An option whose argument may be omitted.
    pub const fn optional(name: &'static str, flag: &'static str, separator: Separator) -> Self {
        Self {
            name,
            flag,
            separator,
            requirement: ArgRequirement::Optional,
            occurrence: Occurrence::Single,
        }
    }

    /// Allow the option to be given more than once.
    pub const fn multiple(self) -> Self {
        Self {
            occurrence: Occurrence::Multiple,
            ..self
        }
    }

    /// Check an invocation against this descriptor.
    ///
    /// `previous` is the number of times the option was already accepted on
    /// the current builder. A whitespace-only argument counts as no argument.
    pub fn validate(&self, arg: Option<&str>, previous: usize) -> Result<()> {
        let has_arg = arg.is_some_and(|a| !a.trim().is_empty());

        if !has_arg && self.requirement == ArgRequirement::Required {
            return Err(Error::option(self.name, OptionViolation::MissingArgument));
        }
        if arg.is_some() && has_arg && self.requirement == ArgRequirement::None {
            return Err(Error::option(self.name, OptionViolation::TooManyArguments));
        }
        if previous > 0 && self.occurrence == Occurrence::Single {
            return Err(Error::option(self.name, OptionViolation::Duplicate));
        }

        Ok(())
    }

    /// Turn a validated invocation into argv tokens.
    pub fn transform(&self, arg: Option<&str>) -> Vec<String> {
        match arg.map(str::trim).filter(|a| !a.is_empty()) {
            None => vec![self.flag.to_string()],
            Some(arg) if self.separator == Separator::Space => {
                vec![self.flag.to_string(), arg.to_string()]
            }
            Some(arg) => vec![format!("{}{}{}", self.flag, self.separator.joiner(), arg)],
        }
    }
}

/// A named command segment and its option table.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub options: &'static [OptionSpec],
}

impl CommandSpec {
    pub const fn new(name: &'static str, options: &'static [OptionSpec]) -> Self {
        Self { name, options }
    }

    /// Look up an option descriptor by name.
    pub fn find(&self, name: &str) -> Option<&'static OptionSpec> {
        self.options.iter().find(|spec| spec.name == name)
    }
}

#[derive(Debug)]
struct Segment {
    spec: &'static CommandSpec,
    tokens: Vec<String>,
    parameters: Vec<String>,
    counts: HashMap<&'static str, usize>,
}

impl Segment {
    fn new(spec: &'static CommandSpec) -> Self {
        Self {
            spec,
            tokens: Vec::new(),
            parameters: Vec::new(),
            counts: HashMap::new(),
        }
    }

    fn clear(&mut self) {
        self.tokens.clear();
        self.parameters.clear();
        self.counts.clear();
    }
}

/// Builder for one invocation of an external command.
///
/// Schemas are static per builder; [`CommandBuilder::reset`] clears queued
/// options, parameters and occurrence counters so the builder can be reused.
#[derive(Debug)]
pub struct CommandBuilder {
    segments: Vec<Segment>,
    parameters: Vec<String>,
    argv: OnceCell<Vec<String>>,
    text: OnceCell<String>,
    #[cfg(test)]
    assemblies: std::cell::Cell<usize>,
}

impl CommandBuilder {
    /// Create a builder from segment specs in command-line order, e.g.
    /// `[&DOCKER, &BUILD]`. The last segment is the primary one that
    /// [`CommandBuilder::option`] targets.
    pub fn new(segments: &[&'static CommandSpec]) -> Self {
        Self {
            segments: segments.iter().map(|spec| Segment::new(*spec)).collect(),
            parameters: Vec::new(),
            argv: OnceCell::new(),
            text: OnceCell::new(),
            #[cfg(test)]
            assemblies: std::cell::Cell::new(0),
        }
    }

    /// Invoke an option of the primary (last) segment.
    pub fn option(&mut self, name: &str, arg: Option<&str>) -> Result<&mut Self> {
        let index = self.segments.len().checked_sub(1).ok_or_else(|| Error::SegmentNotFound {
            segment: String::new(),
        })?;
        self.apply(index, name, arg)
    }

    /// Invoke an argument-less option of the primary segment.
    pub fn flag(&mut self, name: &str) -> Result<&mut Self> {
        self.option(name, None)
    }

    /// Invoke an option of the primary segment with an argument.
    pub fn value(&mut self, name: &str, arg: &str) -> Result<&mut Self> {
        self.option(name, Some(arg))
    }

    /// Invoke an option of a specific segment, e.g. `git -C <dir>`.
    pub fn segment_option(&mut self, segment: &str, name: &str, arg: Option<&str>) -> Result<&mut Self> {
        let index = self.segment_index(segment)?;
        self.apply(index, name, arg)
    }

    /// Append a trailing positional parameter. Whitespace-only values are
    /// ignored.
    pub fn parameter(&mut self, value: &str) -> &mut Self {
        let value = value.trim();
        if !value.is_empty() {
            self.parameters.push(value.to_string());
            self.invalidate();
        }
        self
    }

    /// Append a positional parameter right after a segment's own options.
    pub fn segment_parameter(&mut self, segment: &str, value: &str) -> Result<&mut Self> {
        let index = self.segment_index(segment)?;
        let value = value.trim();
        if !value.is_empty() {
            self.segments[index].parameters.push(value.to_string());
            self.invalidate();
        }
        Ok(self)
    }

    /// Clear all queued options, parameters, and occurrence counters.
    pub fn reset(&mut self) -> &mut Self {
        for segment in &mut self.segments {
            segment.clear();
        }
        self.parameters.clear();
        self.invalidate();
        self
    }

    /// The full argv, memoized until the next mutation.
    pub fn to_array(&self) -> Vec<String> {
        self.argv.get_or_init(|| self.assemble()).clone()
    }

    /// Run the command synchronously with bounded output capture.
    pub fn run_sync(&self, options: &RunOptions) -> Result<ProcessResult> {
        debug!("Running: {}", self);
        process::run_sync(&self.to_array(), options)
    }

    /// Spawn the command on the current tokio runtime.
    pub fn spawn(&self, options: &RunOptions) -> ProcessHandle {
        debug!("Spawning: {}", self);
        process::spawn(&self.to_array(), options)
    }

    fn segment_index(&self, segment: &str) -> Result<usize> {
        self.segments
            .iter()
            .position(|s| s.spec.name == segment)
            .ok_or_else(|| Error::SegmentNotFound {
                segment: segment.to_string(),
            })
    }

    fn apply(&mut self, index: usize, name: &str, arg: Option<&str>) -> Result<&mut Self> {
        let segment = &mut self.segments[index];
        let spec = segment
            .spec
            .find(name)
            .ok_or_else(|| Error::option(name, OptionViolation::Unknown))?;

        let previous = segment.counts.get(spec.name).copied().unwrap_or(0);
        spec.validate(arg, previous)?;

        segment.tokens.extend(spec.transform(arg));
        *segment.counts.entry(spec.name).or_insert(0) += 1;
        self.invalidate();

        Ok(self)
    }

    fn assemble(&self) -> Vec<String> {
        #[cfg(test)]
        self.assemblies.set(self.assemblies.get() + 1);

        let mut argv = Vec::new();
        for segment in &self.segments {
            if segment.spec.name.is_empty() {
                continue;
            }
            argv.push(segment.spec.name.to_string());
            argv.extend(segment.tokens.iter().cloned());
            argv.extend(segment.parameters.iter().cloned());
        }
        argv.extend(self.parameters.iter().cloned());
        argv
    }

    fn invalidate(&mut self) {
        self.argv.take();
        self.text.take();
    }
}

impl fmt::Display for CommandBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.text.get_or_init(|| {
            self.argv
                .get_or_init(|| self.assemble())
                .join(" ")
        });
        f.write_str(text)
    }
}
