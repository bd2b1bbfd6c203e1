//! Contains the definition of the basic terms the evaluation engine works
//! with: types, compile-time values, template parameters and the maps that
//! bind them.

use serde::{Deserialize, Serialize};

pub mod signature;
pub mod template;
pub mod r#type;
pub mod value;

/// The ID of a function declared in the point of instantiation.
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
    derive_more::Display,
)]
#[display(fmt = "function#{_0}")]
pub struct FunctionID(pub usize);

/// The ID of a variable declared in the point of instantiation.
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
    derive_more::Display,
)]
#[display(fmt = "variable#{_0}")]
pub struct VariableID(pub usize);

/// The ID of a template definition (function, class or variable template).
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
    derive_more::Display,
)]
#[display(fmt = "template#{_0}")]
pub struct TemplateID(pub usize);

/// The category of an expression's value.
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
    derive_more::Display,
)]
pub enum ValueCategory {
    /// Designates an object or a function.
    #[display(fmt = "lvalue")]
    LValue,

    /// An "eXpiring" object whose resources may be reused.
    #[display(fmt = "xvalue")]
    XValue,

    /// A pure value, such as a literal or a temporary.
    #[default]
    #[display(fmt = "prvalue")]
    PRValue,
}
