//! Contains the main `run()` function of the command line front end.
//!
//! The front end reads a request written in RON: a table of declarations, the
//! template arguments to instantiate with and the expression to evaluate. It
//! answers every query of the engine and prints the outcome, again in RON.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use cxxeval_diagnostic::{
    Diagnostic, Handler, Message, Report, Severity, Span, Storage,
};
use cxxeval_evaluation::{
    config::Config,
    scope::{Scope, Table},
    Evaluation,
};
use cxxeval_term::{
    r#type::Type, signature::Marshal, template::TemplateParameterMap,
    value::Value, ValueCategory,
};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

/// The arguments to the program.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, clap::Parser)]
#[clap(
    name = "cxxeval",
    about = "Evaluates and instantiates C++ expression trees",
    author = "Simmypeet"
)]
pub struct Arguments {
    /// The request file to evaluate.
    pub file: PathBuf,

    /// Overrides the step limit of the constant evaluation.
    #[clap(short, long)]
    pub step_limit: Option<usize>,

    /// Overrides the depth budget of the instantiation.
    #[clap(short, long)]
    pub max_depth: Option<usize>,
}

/// An expression to evaluate, together with everything it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// The point of instantiation.
    #[serde(default)]
    pub table: Table,

    /// The template arguments the expression is instantiated with.
    #[serde(default)]
    pub arguments: TemplateParameterMap,

    /// The expression to evaluate.
    pub expression: Evaluation,

    /// The span reported alongside the failures.
    #[serde(default)]
    pub span: Span,

    /// The budgets of the engine.
    #[serde(default)]
    pub config: Config,
}

/// The answers to the queries on the instantiated expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// See [`Evaluation::is_type_dependent`].
    pub is_type_dependent: bool,

    /// See [`Evaluation::is_value_dependent`].
    pub is_value_dependent: bool,

    /// See [`Evaluation::is_constant_expression`].
    pub is_constant_expression: bool,

    /// See [`Evaluation::type_or_function_set`].
    pub ty: Type,

    /// See [`Evaluation::value_category`].
    pub category: ValueCategory,

    /// The value of the expression; [`Value::Unknown`] if the constant
    /// evaluation failed.
    pub value: Value,

    /// The number of steps the constant evaluation performed.
    pub steps_performed: usize,

    /// The hexadecimal signature of the instantiated expression.
    pub signature: String,
}

/// The errors of the front end.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid request: {0}")]
    Request(#[from] ron::error::SpannedError),

    #[error("failed to write the outcome: {0}")]
    Outcome(#[from] ron::Error),
}

impl Request {
    /// Parses a request written in RON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Request`] if the source isn't a valid request.
    pub fn parse(source: &str) -> Result<Self, Error> {
        Ok(ron::from_str(source)?)
    }

    /// Reads and parses the request stored in the given file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file can't be read and [`Error::Request`]
    /// if it isn't a valid request.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let source =
            std::fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Self::parse(&source)
    }
}

/// Instantiates the expression of the request and answers every query on it.
///
/// A failed constant evaluation is reported to `handler`.
#[must_use]
pub fn evaluate(
    request: &Request,
    handler: &dyn Handler<Diagnostic>,
) -> Outcome {
    let scope: &dyn Scope = &request.table;
    let expression = request.expression.instantiate(
        &request.arguments,
        None,
        None,
        request.config.max_depth,
        scope,
    );

    let mut context = request.config.context(scope);
    let value = if expression.is_value_dependent() {
        Value::Dependent
    } else {
        match expression.constant_value(&mut context) {
            Ok(value) => value,
            Err(error) => {
                log::info!("constant evaluation failed: {error}");
                handler.receive(
                    error.into_diagnostic(request.span).report(scope),
                );
                Value::Unknown
            }
        }
    };

    Outcome {
        is_type_dependent: expression.is_type_dependent(),
        is_value_dependent: expression.is_value_dependent(),
        is_constant_expression: expression.is_constant_expression(scope),
        ty: expression.type_or_function_set(scope),
        category: expression.value_category(scope),
        value,
        steps_performed: context.steps_performed(),
        signature: expression.signature().to_string(),
    }
}

fn print_error(error: &Error) {
    eprintln!("{}", Message::new(Severity::Error, error));
}

/// Runs the program with the given arguments.
#[must_use]
pub fn run(arguments: Arguments) -> ExitCode {
    let mut request = match Request::load(&arguments.file) {
        Ok(request) => request,
        Err(error) => {
            print_error(&error);
            return ExitCode::FAILURE;
        }
    };

    if let Some(step_limit) = arguments.step_limit {
        request.config.step_limit = step_limit;
    }
    if let Some(max_depth) = arguments.max_depth {
        request.config.max_depth = max_depth;
    }

    log::info!(
        "evaluating {} with {:?}",
        arguments.file.display(),
        request.config
    );

    let storage = Storage::new();
    let outcome = evaluate(&request, &storage);

    match ron::ser::to_string_pretty(&outcome, PrettyConfig::default()) {
        Ok(output) => println!("{output}"),
        Err(error) => {
            print_error(&error.into());
            return ExitCode::FAILURE;
        }
    }

    let failed = storage.has_errors();
    for diagnostic in storage.into_vec() {
        eprintln!("{diagnostic}\n");
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
