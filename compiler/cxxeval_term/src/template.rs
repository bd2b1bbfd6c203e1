//! Contains the template parameters, the arguments bound to them and the
//! [`TemplateParameterMap`] that drives substitution.

use std::collections::{btree_map::Entry, BTreeMap};

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::{r#type::Type, value::Value};

/// Identifies a template parameter by its nesting depth and its position in
/// the parameter list of that depth.
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
    derive_new::new,
    derive_more::Display,
)]
#[display(fmt = "#{depth}.{index}")]
pub struct TemplateParameterID {
    /// The nesting level of the template that declares the parameter.
    pub depth: u32,

    /// The position of the parameter in its template parameter list.
    pub index: u32,
}

/// A reference to a template parameter.
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
    derive_new::new,
)]
pub struct TemplateParameter {
    /// The identity of the parameter.
    pub id: TemplateParameterID,

    /// Whether the parameter is a parameter pack (`class... Ts`).
    pub is_pack: bool,
}

/// An argument bound to a template parameter.
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
pub enum TemplateArgument {
    /// An argument for a type template parameter.
    Type(Type),

    /// An argument for a non-type template parameter.
    NonType {
        /// The value of the argument.
        value: Value,

        /// The type of the argument.
        r#type: Type,
    },
}

impl TemplateArgument {
    /// Returns `true` if the argument still depends on a template parameter.
    #[must_use]
    pub fn is_dependent(&self) -> bool {
        match self {
            Self::Type(ty) => ty.is_dependent(),
            Self::NonType { value, r#type } => {
                value.is_dependent() || r#type.is_dependent()
            }
        }
    }

    /// Returns `true` if the argument mentions a template parameter.
    #[must_use]
    pub fn references_template_parameter(&self) -> bool {
        match self {
            Self::Type(ty) => ty.references_template_parameter(),
            Self::NonType { r#type, .. } => {
                r#type.references_template_parameter()
            }
        }
    }

    /// Applies the substitution to the argument.
    #[must_use]
    pub fn instantiate(
        &self,
        map: &TemplateParameterMap,
        pack_offset: Option<usize>,
    ) -> Self {
        match self {
            Self::Type(ty) => Self::Type(ty.instantiate(map, pack_offset)),
            Self::NonType { value, r#type } => Self::NonType {
                value: value.clone(),
                r#type: r#type.instantiate(map, pack_offset),
            },
        }
    }

    /// Searches the argument for a usage of a parameter pack.
    #[must_use]
    pub fn determine_pack_size(&self, map: &TemplateParameterMap) -> PackSize {
        match self {
            Self::Type(ty) | Self::NonType { r#type: ty, .. } => {
                ty.determine_pack_size(map)
            }
        }
    }
}

/// What a template parameter is bound to in a [`TemplateParameterMap`].
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
pub enum Binding {
    /// A single argument, for an ordinary template parameter.
    Single(TemplateArgument),

    /// Zero or more arguments, for a template parameter pack.
    Pack(Vec<TemplateArgument>),
}

/// Returned by [`TemplateParameterMap::insert`] and
/// [`TemplateParameterMap::insert_pack`] when the parameter is already bound.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[error("the template parameter {parameter} is already bound")]
pub struct Collision {
    /// The parameter that was already bound.
    pub parameter: TemplateParameterID,

    /// The binding that was rejected.
    pub rejected: Binding,
}

/// Maps template parameters to the arguments bound to them.
///
/// The map is built by the caller requesting an instantiation and is never
/// mutated by the engine.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
pub struct TemplateParameterMap {
    bindings: BTreeMap<TemplateParameterID, Binding>,
}

impl TemplateParameterMap {
    /// Binds a single argument to the given parameter.
    ///
    /// # Errors
    ///
    /// See [`Collision`]; the prior binding is preserved.
    pub fn insert(
        &mut self,
        parameter: TemplateParameterID,
        argument: TemplateArgument,
    ) -> Result<(), Collision> {
        self.bind(parameter, Binding::Single(argument))
    }

    /// Binds a list of arguments to the given parameter pack.
    ///
    /// # Errors
    ///
    /// See [`Collision`]; the prior binding is preserved.
    pub fn insert_pack(
        &mut self,
        parameter: TemplateParameterID,
        arguments: Vec<TemplateArgument>,
    ) -> Result<(), Collision> {
        self.bind(parameter, Binding::Pack(arguments))
    }

    fn bind(
        &mut self,
        parameter: TemplateParameterID,
        binding: Binding,
    ) -> Result<(), Collision> {
        match self.bindings.entry(parameter) {
            Entry::Occupied(_) => {
                Err(Collision { parameter, rejected: binding })
            }
            Entry::Vacant(entry) => {
                entry.insert(binding);
                Ok(())
            }
        }
    }

    /// Returns the raw binding of the given parameter.
    #[must_use]
    pub fn binding(&self, parameter: TemplateParameterID) -> Option<&Binding> {
        self.bindings.get(&parameter)
    }

    /// Returns the argument that should replace the given parameter.
    ///
    /// For a parameter pack the argument at `pack_offset` is returned; with
    /// no pack offset a pack is never substituted.
    #[must_use]
    pub fn argument(
        &self,
        parameter: TemplateParameterID,
        pack_offset: Option<usize>,
    ) -> Option<&TemplateArgument> {
        match self.bindings.get(&parameter)? {
            Binding::Single(argument) => Some(argument),
            Binding::Pack(arguments) => arguments.get(pack_offset?),
        }
    }

    /// Returns the arguments bound to the given parameter pack.
    #[must_use]
    pub fn pack(&self, parameter: TemplateParameterID) -> Option<&[TemplateArgument]> {
        self.bindings.get(&parameter)?.as_pack().map(Vec::as_slice)
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.bindings.is_empty() }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize { self.bindings.len() }

    /// Iterates over the bindings in parameter order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&TemplateParameterID, &Binding)> {
        self.bindings.iter()
    }

    /// Determines the size of the given parameter, if it's a pack.
    #[must_use]
    pub fn determine_pack_size(&self, parameter: TemplateParameter) -> PackSize {
        if !parameter.is_pack {
            return PackSize::NotFound;
        }

        match self.bindings.get(&parameter.id) {
            Some(Binding::Pack(arguments)) => PackSize::Count(arguments.len()),

            // a pack parameter bound to a single argument is inconsistent
            Some(Binding::Single(_)) => PackSize::Fail,

            None => PackSize::Defer,
        }
    }
}

/// The outcome of searching a term for a usage of a parameter pack.
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
    EnumAsInner,
)]
pub enum PackSize {
    /// A pack is referenced but it's not bound yet; retry with more context.
    Defer,

    /// The packs found have conflicting sizes.
    Fail,

    /// No pack is referenced at all.
    NotFound,

    /// The number of arguments bound to the referenced pack.
    Count(usize),
}

impl PackSize {
    /// Combines the pack size found in one part of a term with the one found
    /// in another part.
    ///
    /// A deferral or failure found first is kept, [`PackSize::NotFound`] is
    /// neutral and two different counts make the term invalid.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Defer | Self::Fail, _) | (_, Self::NotFound) => self,
            (_, Self::Defer | Self::Fail) | (Self::NotFound, _) => other,
            (Self::Count(lhs), Self::Count(rhs)) => {
                if lhs == rhs {
                    self
                } else {
                    log::debug!(
                        "conflicting parameter pack sizes: {lhs} and {rhs}"
                    );
                    Self::Fail
                }
            }
        }
    }
}

impl FromIterator<PackSize> for PackSize {
    fn from_iter<T: IntoIterator<Item = PackSize>>(iter: T) -> Self {
        iter.into_iter().fold(Self::NotFound, Self::combine)
    }
}
