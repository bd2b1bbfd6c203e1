//! Contains the [`Scope`] trait, the point of instantiation every query is
//! answered against, and [`Table`], an in-memory implementation of it.

use cxxeval_term::{r#type::Type, FunctionID, VariableID};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

use crate::Evaluation;

/// A function declaration visible from the point of instantiation.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    CopyGetters,
    derive_new::new,
)]
pub struct Function {
    /// The name of the function.
    #[get = "pub"]
    name: String,

    /// The types of the parameters, in declaration order.
    #[get = "pub"]
    parameters: Vec<Type>,

    /// The return type of the function.
    #[get = "pub"]
    return_type: Type,

    /// The expression returned by the function, with its parameters referred
    /// to by position. Absent for a declaration without a definition.
    #[get = "pub"]
    #[serde(default)]
    body: Option<Evaluation>,

    /// Whether the function is declared `constexpr`.
    #[get_copy = "pub"]
    #[serde(default)]
    is_constexpr: bool,
}

impl Function {
    /// Replaces the body of the function.
    pub fn set_body(&mut self, body: Evaluation) { self.body = Some(body); }
}

/// A variable declaration visible from the point of instantiation.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    CopyGetters,
    derive_new::new,
)]
pub struct Variable {
    /// The name of the variable.
    #[get = "pub"]
    name: String,

    /// The declared type of the variable.
    #[get = "pub"]
    ty: Type,

    /// The initializer of the variable, if any.
    #[get = "pub"]
    #[serde(default)]
    initializer: Option<Evaluation>,

    /// Whether the variable is declared `constexpr`.
    #[get_copy = "pub"]
    #[serde(default)]
    is_constexpr: bool,
}

impl Variable {
    /// Returns `true` if the variable can be used in a constant expression:
    /// it's `constexpr`, or it's a `const` integral variable with an
    /// initializer.
    #[must_use]
    pub fn is_usable_in_constant_expression(&self) -> bool {
        if self.initializer.is_none() {
            return false;
        }

        self.is_constexpr
            || (matches!(self.ty, Type::Const(_)) && self.ty.is_integral())
    }
}

/// The point of instantiation: resolves the entities an evaluation refers to.
///
/// The engine only ever borrows the scope; the caller is responsible for
/// keeping it unchanged for the duration of a query.
pub trait Scope {
    /// Returns the function with the given ID.
    fn function(&self, id: FunctionID) -> Option<&Function>;

    /// Returns the variable with the given ID.
    fn variable(&self, id: VariableID) -> Option<&Variable>;
}

/// A flat table of declarations, indexed by their IDs.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct Table {
    #[serde(default)]
    functions: Vec<Function>,

    #[serde(default)]
    variables: Vec<Variable>,
}

impl Table {
    /// Adds a function and returns its ID.
    pub fn add_function(&mut self, function: Function) -> FunctionID {
        self.functions.push(function);
        FunctionID(self.functions.len() - 1)
    }

    /// Adds a variable and returns its ID.
    pub fn add_variable(&mut self, variable: Variable) -> VariableID {
        self.variables.push(variable);
        VariableID(self.variables.len() - 1)
    }

    /// Returns a mutable reference to the function with the given ID, used to
    /// attach the body of a (possibly recursive) function after declaring it.
    pub fn function_mut(&mut self, id: FunctionID) -> Option<&mut Function> {
        self.functions.get_mut(id.0)
    }

    /// Iterates over the functions of the table.
    pub fn functions(&self) -> impl Iterator<Item = (FunctionID, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(index, function)| (FunctionID(index), function))
    }
}

impl Scope for Table {
    fn function(&self, id: FunctionID) -> Option<&Function> {
        self.functions.get(id.0)
    }

    fn variable(&self, id: VariableID) -> Option<&Variable> {
        self.variables.get(id.0)
    }
}
