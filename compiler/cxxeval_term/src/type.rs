//! Contains the definition of [`Type`].

use std::fmt::{self, Display};

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::{
    signature::Signature,
    template::{
        PackSize, TemplateArgument, TemplateParameter, TemplateParameterMap,
    },
    ValueCategory,
};

/// The fundamental types. Sizes follow the LP64 data model.
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
#[allow(missing_docs)]
pub enum Primitive {
    #[display(fmt = "void")]
    Void,
    #[display(fmt = "bool")]
    Bool,
    #[display(fmt = "char")]
    Char,
    #[display(fmt = "signed char")]
    SignedChar,
    #[display(fmt = "unsigned char")]
    UnsignedChar,
    #[display(fmt = "short")]
    Short,
    #[display(fmt = "unsigned short")]
    UnsignedShort,
    #[display(fmt = "int")]
    Int,
    #[display(fmt = "unsigned int")]
    UnsignedInt,
    #[display(fmt = "long")]
    Long,
    #[display(fmt = "unsigned long")]
    UnsignedLong,
    #[display(fmt = "long long")]
    LongLong,
    #[display(fmt = "unsigned long long")]
    UnsignedLongLong,
    #[display(fmt = "std::nullptr_t")]
    NullPtr,
}

impl Primitive {
    /// The type of `sizeof`, `alignof` and `sizeof...` expressions.
    pub const SIZE_T: Self = Self::UnsignedLong;

    /// Returns the size of the type in bytes, `None` for `void`.
    #[must_use]
    pub const fn size(self) -> Option<u64> {
        match self {
            Self::Void => None,
            Self::Bool | Self::Char | Self::SignedChar | Self::UnsignedChar => {
                Some(1)
            }
            Self::Short | Self::UnsignedShort => Some(2),
            Self::Int | Self::UnsignedInt => Some(4),
            Self::Long
            | Self::UnsignedLong
            | Self::LongLong
            | Self::UnsignedLongLong
            | Self::NullPtr => Some(8),
        }
    }

    /// Returns `true` for `bool`, the character types and the integer types.
    #[must_use]
    pub const fn is_integral(self) -> bool {
        !matches!(self, Self::Void | Self::NullPtr)
    }

    /// Returns `true` if the type can represent negative values.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::SignedChar
                | Self::Short
                | Self::Int
                | Self::Long
                | Self::LongLong
        )
    }

    /// The integer conversion rank.
    const fn rank(self) -> u8 {
        match self {
            Self::Void | Self::NullPtr => 0,
            Self::Bool => 1,
            Self::Char | Self::SignedChar | Self::UnsignedChar => 2,
            Self::Short | Self::UnsignedShort => 3,
            Self::Int | Self::UnsignedInt => 4,
            Self::Long | Self::UnsignedLong => 5,
            Self::LongLong | Self::UnsignedLongLong => 6,
        }
    }

    const fn to_unsigned(self) -> Self {
        match self {
            Self::Char | Self::SignedChar => Self::UnsignedChar,
            Self::Short => Self::UnsignedShort,
            Self::Int => Self::UnsignedInt,
            Self::Long => Self::UnsignedLong,
            Self::LongLong => Self::UnsignedLongLong,
            other => other,
        }
    }

    /// Applies the integral promotion.
    #[must_use]
    pub const fn promote(self) -> Self {
        match self {
            Self::Bool
            | Self::Char
            | Self::SignedChar
            | Self::UnsignedChar
            | Self::Short
            | Self::UnsignedShort => Self::Int,
            other => other,
        }
    }

    /// Computes the common type of the operands of an arithmetic binary
    /// operator (the usual arithmetic conversions).
    #[must_use]
    pub const fn usual_arithmetic_conversion(self, other: Self) -> Self {
        let lhs = self.promote();
        let rhs = other.promote();

        if lhs as u8 == rhs as u8 {
            return lhs;
        }

        if lhs.is_signed() == rhs.is_signed() {
            return if lhs.rank() >= rhs.rank() { lhs } else { rhs };
        }

        let (signed, unsigned) =
            if lhs.is_signed() { (lhs, rhs) } else { (rhs, lhs) };

        if unsigned.rank() >= signed.rank() {
            return unsigned;
        }

        match (signed.size(), unsigned.size()) {
            (Some(signed_size), Some(unsigned_size))
                if signed_size > unsigned_size =>
            {
                signed
            }
            _ => signed.to_unsigned(),
        }
    }
}

/// The kind of a reference type.
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
pub enum ReferenceKind {
    /// `T&`
    LValue,

    /// `T&&`
    RValue,
}

/// Represents a reference type, denoted by `T&` or `T&&`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Reference {
    /// The kind of the reference.
    pub kind: ReferenceKind,

    /// The type being referred to.
    pub referee: Box<Type>,
}

/// The type of an expression.
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
    EnumAsInner,
)]
pub enum Type {
    /// A fundamental type.
    Primitive(Primitive),

    /// `T*`
    Pointer(Box<Type>),

    /// `T&` or `T&&`
    Reference(Reference),

    /// `const T`
    Const(Box<Type>),

    /// A type template parameter.
    Parameter(TemplateParameter),

    /// `T...`, the expansion of a pattern that contains a type parameter
    /// pack.
    PackExpansion(Box<Type>),

    /// The type of a braced initializer list.
    InitializerList,

    /// The marker type of an expression naming an overload set.
    FunctionSet,

    /// The type of a type-dependent expression, identified by the signature
    /// of that expression.
    DependentExpression(Signature),

    /// An erroneous type.
    Problem,
}

impl From<Primitive> for Type {
    fn from(value: Primitive) -> Self { Self::Primitive(value) }
}

impl Type {
    /// Creates a `T&` type.
    #[must_use]
    pub fn lvalue_reference(referee: Self) -> Self {
        Self::Reference(Reference {
            kind: ReferenceKind::LValue,
            referee: Box::new(referee),
        })
    }

    /// Creates a `T&&` type.
    #[must_use]
    pub fn rvalue_reference(referee: Self) -> Self {
        Self::Reference(Reference {
            kind: ReferenceKind::RValue,
            referee: Box::new(referee),
        })
    }

    /// Creates a `T*` type.
    #[must_use]
    pub fn pointer(pointee: Self) -> Self { Self::Pointer(Box::new(pointee)) }

    /// Returns `true` if the type depends on a template parameter.
    #[must_use]
    pub fn is_dependent(&self) -> bool {
        match self {
            Self::Parameter(_)
            | Self::PackExpansion(_)
            | Self::DependentExpression(_) => true,

            Self::Pointer(inner) | Self::Const(inner) => inner.is_dependent(),
            Self::Reference(reference) => reference.referee.is_dependent(),

            Self::Primitive(_)
            | Self::InitializerList
            | Self::FunctionSet
            | Self::Problem => false,
        }
    }

    /// Returns `true` if the type mentions a template parameter.
    #[must_use]
    pub fn references_template_parameter(&self) -> bool {
        match self {
            Self::Parameter(_) | Self::DependentExpression(_) => true,

            Self::Pointer(inner)
            | Self::Const(inner)
            | Self::PackExpansion(inner) => inner.references_template_parameter(),
            Self::Reference(reference) => {
                reference.referee.references_template_parameter()
            }

            Self::Primitive(_)
            | Self::InitializerList
            | Self::FunctionSet
            | Self::Problem => false,
        }
    }

    /// Applies the substitution to the type.
    ///
    /// A parameter pack is only substituted when `pack_offset` selects one of
    /// its elements. Binding a type parameter to a non-type argument yields
    /// [`Type::Problem`].
    #[must_use]
    pub fn instantiate(
        &self,
        map: &TemplateParameterMap,
        pack_offset: Option<usize>,
    ) -> Self {
        match self {
            Self::Parameter(parameter) => {
                match map.argument(parameter.id, pack_offset) {
                    Some(TemplateArgument::Type(ty)) => ty.clone(),
                    Some(TemplateArgument::NonType { .. }) => {
                        log::debug!(
                            "type parameter {} bound to a non-type argument",
                            parameter.id
                        );
                        Self::Problem
                    }
                    None => self.clone(),
                }
            }

            Self::Pointer(inner) => {
                Self::Pointer(Box::new(inner.instantiate(map, pack_offset)))
            }
            Self::Const(inner) => {
                Self::Const(Box::new(inner.instantiate(map, pack_offset)))
            }
            Self::PackExpansion(inner) => Self::PackExpansion(Box::new(
                inner.instantiate(map, pack_offset),
            )),
            Self::Reference(reference) => Self::Reference(Reference {
                kind: reference.kind,
                referee: Box::new(reference.referee.instantiate(map, pack_offset)),
            }),

            Self::Primitive(_)
            | Self::InitializerList
            | Self::FunctionSet
            | Self::DependentExpression(_)
            | Self::Problem => self.clone(),
        }
    }

    /// Searches the type for a usage of a parameter pack and returns the
    /// number of arguments the map binds to it.
    ///
    /// Nested pack expansions are expanded on their own and are not counted.
    #[must_use]
    pub fn determine_pack_size(&self, map: &TemplateParameterMap) -> PackSize {
        match self {
            Self::Parameter(parameter) => map.determine_pack_size(*parameter),

            Self::Pointer(inner) | Self::Const(inner) => {
                inner.determine_pack_size(map)
            }
            Self::Reference(reference) => {
                reference.referee.determine_pack_size(map)
            }

            Self::PackExpansion(_)
            | Self::Primitive(_)
            | Self::InitializerList
            | Self::FunctionSet
            | Self::DependentExpression(_)
            | Self::Problem => PackSize::NotFound,
        }
    }

    /// Removes the top-level reference and `const` qualifiers.
    #[must_use]
    pub fn unqualified(&self) -> &Self {
        match self {
            Self::Reference(reference) => reference.referee.unqualified(),
            Self::Const(inner) => inner.unqualified(),
            other => other,
        }
    }

    /// Removes the top-level reference, if any.
    #[must_use]
    pub fn without_reference(&self) -> &Self {
        match self {
            Self::Reference(reference) => &reference.referee,
            other => other,
        }
    }

    /// Returns the fundamental type after removing references and
    /// qualifiers, if any.
    #[must_use]
    pub fn primitive(&self) -> Option<Primitive> {
        self.unqualified().as_primitive().copied()
    }

    /// Returns `true` for integral types (possibly qualified or referenced).
    #[must_use]
    pub fn is_integral(&self) -> bool {
        self.primitive().is_some_and(Primitive::is_integral)
    }

    /// Returns the value of `sizeof(T)`, `None` if it can't be determined.
    #[must_use]
    pub fn size_of(&self) -> Option<u64> {
        match self.unqualified() {
            Self::Primitive(primitive) => primitive.size(),
            Self::Pointer(_) => Some(8),
            _ => None,
        }
    }

    /// Returns the value of `alignof(T)`, `None` if it can't be determined.
    #[must_use]
    pub fn align_of(&self) -> Option<u64> {
        // every complete type of this model is aligned to its size
        self.size_of()
    }

    /// The value category of a call returning this type (or a cast to it).
    #[must_use]
    pub const fn result_category(&self) -> ValueCategory {
        match self {
            Self::Reference(Reference { kind: ReferenceKind::LValue, .. }) => {
                ValueCategory::LValue
            }
            Self::Reference(Reference { kind: ReferenceKind::RValue, .. }) => {
                ValueCategory::XValue
            }
            _ => ValueCategory::PRValue,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(primitive) => write!(f, "{primitive}"),
            Self::Pointer(inner) => write!(f, "{inner}*"),
            Self::Reference(Reference { kind: ReferenceKind::LValue, referee }) => {
                write!(f, "{referee}&")
            }
            Self::Reference(Reference { kind: ReferenceKind::RValue, referee }) => {
                write!(f, "{referee}&&")
            }
            Self::Const(inner) => write!(f, "const {inner}"),
            Self::Parameter(parameter) => write!(f, "T{}", parameter.id),
            Self::PackExpansion(inner) => write!(f, "{inner}..."),
            Self::InitializerList => write!(f, "std::initializer_list"),
            Self::FunctionSet => write!(f, "<function set>"),
            Self::DependentExpression(_) => write!(f, "<dependent>"),
            Self::Problem => write!(f, "<problem>"),
        }
    }
}

#[cfg(test)]
mod test;
