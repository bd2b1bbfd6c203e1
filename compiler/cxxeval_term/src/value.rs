//! Contains the definition of [`Value`], the compile-time value of an
//! expression.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::r#type::{Primitive, Type};

/// The compile-time value of an expression.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum Value {
    /// The value of an integral, boolean or character expression.
    Integral(i128),

    /// The value of a braced initializer list, element by element.
    Composite(Vec<Value>),

    /// The value depends on a template parameter that isn't bound yet.
    Dependent,

    /// The expression has no compile-time value.
    Unknown,
}

impl From<i128> for Value {
    fn from(value: i128) -> Self { Self::Integral(value) }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self { Self::Integral(i128::from(value)) }
}

impl Value {
    /// Returns `true` if the value depends on a template parameter.
    #[must_use]
    pub fn is_dependent(&self) -> bool {
        match self {
            Self::Dependent => true,
            Self::Composite(elements) => elements.iter().any(Self::is_dependent),
            Self::Integral(_) | Self::Unknown => false,
        }
    }

    /// Returns `true` if the value is completely known at compile time.
    #[must_use]
    pub fn is_known(&self) -> bool {
        match self {
            Self::Integral(_) => true,
            Self::Composite(elements) => elements.iter().all(Self::is_known),
            Self::Dependent | Self::Unknown => false,
        }
    }

    /// Returns the integral value, if any.
    #[must_use]
    pub const fn integral(&self) -> Option<i128> {
        match self {
            Self::Integral(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value converted to `bool`, if it's integral.
    #[must_use]
    pub const fn truthiness(&self) -> Option<bool> {
        match self {
            Self::Integral(value) => Some(*value != 0),
            _ => None,
        }
    }

    /// Converts the value to the given type, truncating integers to the
    /// width of the target type.
    #[must_use]
    pub fn convert_to(&self, ty: &Type) -> Self {
        let Self::Integral(value) = self else {
            return self.clone();
        };

        match ty.unqualified() {
            Type::Primitive(Primitive::Bool) => Self::from(*value != 0),
            Type::Primitive(primitive) if primitive.is_integral() => {
                Self::Integral(truncate(*value, *primitive))
            }
            Type::Primitive(Primitive::Void) | Type::Problem => Self::Unknown,
            _ => self.clone(),
        }
    }
}

fn truncate(value: i128, primitive: Primitive) -> i128 {
    let Some(size) = primitive.size() else {
        return value;
    };

    let bits = u32::try_from(size * 8).unwrap_or(128);
    if bits >= 128 {
        return value;
    }

    let mask = (1_i128 << bits) - 1;
    let truncated = value & mask;

    if primitive.is_signed() && (truncated >> (bits - 1)) & 1 == 1 {
        truncated - (1_i128 << bits)
    } else {
        truncated
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integral(value) => write!(f, "{value}"),
            Self::Composite(elements) => {
                write!(f, "{{")?;

                let mut peekable = elements.iter().peekable();
                while let Some(element) = peekable.next() {
                    write!(f, "{element}")?;

                    if peekable.peek().is_some() {
                        write!(f, ", ")?;
                    }
                }

                write!(f, "}}")
            }
            Self::Dependent => write!(f, "<dependent>"),
            Self::Unknown => write!(f, "<unknown>"),
        }
    }
}

#[cfg(test)]
mod test;
