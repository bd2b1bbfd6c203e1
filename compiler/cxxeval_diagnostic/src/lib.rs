//! Contains the definition of the [`Diagnostic`] struct and related types
//! used to report engine failures to the hosting checker.

use std::fmt::Display;

use colored::Colorize;
use serde::{Deserialize, Serialize};

pub mod handler;

pub use handler::{Dummy, Handler, Storage};

/// Implement this trait for a type that can report a diagnostic.
///
/// This trait is typically implemented by the failure types produced by the
/// engine. The parameter is whatever extra context the failure needs to be
/// rendered (most of the time `()`).
pub trait Report<Param> {
    /// Creates a diagnostic.
    fn report(&self, parameter: Param) -> Diagnostic;
}

/// Enumeration of the severity levels of a diagnostic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum Severity {
    /// An error that makes the expression invalid.
    Error,

    /// A warning that does not invalidate the expression.
    Warning,

    /// An informational message.
    Info,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "{}", "[error]".bright_red().bold()),
            Self::Warning => {
                write!(f, "{}", "[warning]".bright_yellow().bold())
            }
            Self::Info => write!(f, "{}", "[info]".bright_green().bold()),
        }
    }
}

/// A byte range inside the translation unit that is handed to the engine by
/// the checker. The engine never interprets it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_new::new,
)]
pub struct Span {
    /// The inclusive start byte offset.
    pub start: usize,

    /// The exclusive end byte offset.
    pub end: usize,
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A message with a severity prefix, e.g. `[error]: something went wrong`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_new::new)]
pub struct Message<T> {
    /// The severity of the message.
    pub severity: Severity,

    /// The content of the message.
    pub display: T,
}

impl<T: Display> Display for Message<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.display.to_string().bold())
    }
}

/// The related information that is displayed alongside the main
/// [`Diagnostic`].
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Related {
    /// The span location to display the message.
    pub span: Span,

    /// The message to display to the user.
    pub message: String,
}

/// A struct containing all the information required to display the diagnostic
/// to the user.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Diagnostic {
    /// The span location where the diagnostic occurred.
    pub span: Span,

    /// The message to display to the user.
    pub message: String,

    /// The severity of the diagnostic.
    pub severity: Severity,

    /// The optional help message to display to the user. This will be
    /// displayed alongside the main message.
    pub help_message: Option<String>,

    /// List of related useful information to display to the user.
    pub related: Vec<Related>,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\n  {} {}",
            Message::new(self.severity, &self.message),
            "-->".bright_blue().bold(),
            self.span
        )?;

        if let Some(help_message) = &self.help_message {
            write!(f, "\n  {}: {help_message}", "help".bold())?;
        }

        for related in &self.related {
            write!(
                f,
                "\n  {} {}: {}",
                "-->".bright_blue().bold(),
                related.span,
                related.message
            )?;
        }

        Ok(())
    }
}
