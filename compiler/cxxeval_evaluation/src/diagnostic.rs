//! Turns the failures of a constant evaluation into diagnostics for the
//! hosting checker.

use cxxeval_diagnostic::{Diagnostic, Report, Severity, Span};
use cxxeval_term::FunctionID;

use crate::{
    constexpr::{ConstexprError, StepLimitExceeded, Unsupported},
    scope::Scope,
};

/// The constant evaluation of the expression at `span` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_new::new)]
pub struct ConstantEvaluationFailure {
    /// The span of the expression whose evaluation failed.
    pub span: Span,

    /// The reason of the failure.
    pub error: ConstexprError,
}

impl ConstexprError {
    /// Attaches the span of the evaluated expression to the error so that it
    /// can be reported.
    #[must_use]
    pub const fn into_diagnostic(self, span: Span) -> ConstantEvaluationFailure {
        ConstantEvaluationFailure { span, error: self }
    }
}

fn function_name(scope: &dyn Scope, id: FunctionID) -> String {
    scope.function(id).map_or_else(
        || id.to_string(),
        |function| format!("`{}`", function.name()),
    )
}

impl<'a> Report<&'a dyn Scope> for ConstantEvaluationFailure {
    fn report(&self, scope: &'a dyn Scope) -> Diagnostic {
        let (message, help_message) = match self.error {
            ConstexprError::StepLimitExceeded(StepLimitExceeded {
                limit,
                call,
                ..
            }) => (
                call.map_or_else(
                    || {
                        format!(
                            "constant evaluation exceeded the limit of {limit} \
                             steps"
                        )
                    },
                    |call| {
                        format!(
                            "constant evaluation of the call to {} exceeded \
                             the limit of {limit} steps",
                            function_name(scope, call)
                        )
                    },
                ),
                Some(
                    "the recursion may not terminate; otherwise raise the \
                     step limit"
                        .to_string(),
                ),
            ),

            ConstexprError::Unsupported(Unsupported::NonConstexprFunction(
                id,
            )) => (
                format!(
                    "{} can't be called in a constant expression",
                    function_name(scope, id)
                ),
                Some("declare the function `constexpr`".to_string()),
            ),
            ConstexprError::Unsupported(Unsupported::MissingDefinition(id)) => {
                (
                    format!(
                        "{} is called before its definition is known",
                        function_name(scope, id)
                    ),
                    None,
                )
            }
            ConstexprError::Unsupported(Unsupported::Modification) => (
                "the expression modifies an object, which isn't allowed in a \
                 constant expression"
                    .to_string(),
                Some(
                    "assignments and increments can't be evaluated at compile \
                     time"
                        .to_string(),
                ),
            ),
            ConstexprError::Unsupported(unsupported) => {
                (format!("the expression isn't constant: {unsupported}"), None)
            }
        };

        Diagnostic {
            span: self.span,
            message,
            severity: Severity::Error,
            help_message,
            related: Vec::new(),
        }
    }
}
