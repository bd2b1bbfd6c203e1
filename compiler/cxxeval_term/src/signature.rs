//! Contains the canonical byte encoding used to identify terms.
//!
//! Every encoding is self-delimiting: a tag selects the shape of what
//! follows and every sequence is prefixed by its length. Two terms therefore
//! share a [`Signature`] if and only if they are structurally equal.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::{
    r#type::{Primitive, Reference, ReferenceKind, Type},
    template::{TemplateArgument, TemplateParameter, TemplateParameterID},
    value::Value,
    FunctionID, TemplateID, ValueCategory, VariableID,
};

/// Canonical identity bytes of a term. Usable as a cache key.
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
    derive_more::Deref,
)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Returns the raw bytes of the signature.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.0 }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

/// Accumulates the bytes of a [`Signature`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureBuffer {
    bytes: Vec<u8>,
}

impl SignatureBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self { Self { bytes: Vec::new() } }

    /// Writes a discriminant byte.
    pub fn put_tag(&mut self, tag: u8) { self.bytes.push(tag); }

    /// Writes a boolean.
    pub fn put_bool(&mut self, value: bool) {
        self.bytes.push(u8::from(value));
    }

    /// Writes an unsigned integer in fixed-width little-endian.
    pub fn put_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a length or an index.
    pub fn put_usize(&mut self, value: usize) {
        // usize never exceeds 64 bits on the supported targets
        self.put_u64(value as u64);
    }

    /// Writes a signed integer in fixed-width little-endian.
    pub fn put_i128(&mut self, value: i128) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a length-prefixed byte string.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_usize(bytes.len());
        self.bytes.extend_from_slice(bytes);
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn put_str(&mut self, string: &str) { self.put_bytes(string.as_bytes()); }

    /// Writes a length-prefixed sequence of terms.
    pub fn put_sequence<'a, T: Marshal + 'a>(
        &mut self,
        items: impl ExactSizeIterator<Item = &'a T>,
    ) {
        self.put_usize(items.len());

        for item in items {
            item.marshal(self);
        }
    }

    /// Writes an optional term.
    pub fn put_option<T: Marshal>(&mut self, item: Option<&T>) {
        match item {
            Some(item) => {
                self.put_tag(1);
                item.marshal(self);
            }
            None => self.put_tag(0),
        }
    }

    /// Finishes the buffer into a [`Signature`].
    #[must_use]
    pub fn finish(self) -> Signature { Signature(self.bytes) }
}

/// Implemented by every term that has a canonical byte encoding.
pub trait Marshal {
    /// Appends the canonical encoding of the term to the buffer.
    fn marshal(&self, buffer: &mut SignatureBuffer);

    /// Computes the signature of the term.
    fn signature(&self) -> Signature {
        let mut buffer = SignatureBuffer::new();
        self.marshal(&mut buffer);
        buffer.finish()
    }
}

impl<T: Marshal + ?Sized> Marshal for &T {
    fn marshal(&self, buffer: &mut SignatureBuffer) { (**self).marshal(buffer); }
}

impl Marshal for FunctionID {
    fn marshal(&self, buffer: &mut SignatureBuffer) { buffer.put_usize(self.0); }
}

impl Marshal for VariableID {
    fn marshal(&self, buffer: &mut SignatureBuffer) { buffer.put_usize(self.0); }
}

impl Marshal for TemplateID {
    fn marshal(&self, buffer: &mut SignatureBuffer) { buffer.put_usize(self.0); }
}

impl Marshal for ValueCategory {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        buffer.put_tag(match self {
            Self::LValue => 0,
            Self::XValue => 1,
            Self::PRValue => 2,
        });
    }
}

impl Marshal for TemplateParameterID {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        buffer.put_u64(u64::from(self.depth));
        buffer.put_u64(u64::from(self.index));
    }
}

impl Marshal for TemplateParameter {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        self.id.marshal(buffer);
        buffer.put_bool(self.is_pack);
    }
}

impl Marshal for Primitive {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        buffer.put_tag(match self {
            Self::Void => 0,
            Self::Bool => 1,
            Self::Char => 2,
            Self::SignedChar => 3,
            Self::UnsignedChar => 4,
            Self::Short => 5,
            Self::UnsignedShort => 6,
            Self::Int => 7,
            Self::UnsignedInt => 8,
            Self::Long => 9,
            Self::UnsignedLong => 10,
            Self::LongLong => 11,
            Self::UnsignedLongLong => 12,
            Self::NullPtr => 13,
        });
    }
}

impl Marshal for Type {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        match self {
            Self::Primitive(primitive) => {
                buffer.put_tag(0);
                primitive.marshal(buffer);
            }
            Self::Pointer(inner) => {
                buffer.put_tag(1);
                inner.marshal(buffer);
            }
            Self::Reference(Reference { kind, referee }) => {
                buffer.put_tag(match kind {
                    ReferenceKind::LValue => 2,
                    ReferenceKind::RValue => 3,
                });
                referee.marshal(buffer);
            }
            Self::Const(inner) => {
                buffer.put_tag(4);
                inner.marshal(buffer);
            }
            Self::Parameter(parameter) => {
                buffer.put_tag(5);
                parameter.marshal(buffer);
            }
            Self::PackExpansion(inner) => {
                buffer.put_tag(6);
                inner.marshal(buffer);
            }
            Self::InitializerList => buffer.put_tag(7),
            Self::FunctionSet => buffer.put_tag(8),
            Self::DependentExpression(signature) => {
                buffer.put_tag(9);
                buffer.put_bytes(signature.as_bytes());
            }
            Self::Problem => buffer.put_tag(10),
        }
    }
}

impl Marshal for Value {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        match self {
            Self::Integral(value) => {
                buffer.put_tag(0);
                buffer.put_i128(*value);
            }
            Self::Composite(elements) => {
                buffer.put_tag(1);
                buffer.put_sequence(elements.iter());
            }
            Self::Dependent => buffer.put_tag(2),
            Self::Unknown => buffer.put_tag(3),
        }
    }
}

impl Marshal for TemplateArgument {
    fn marshal(&self, buffer: &mut SignatureBuffer) {
        match self {
            Self::Type(ty) => {
                buffer.put_tag(0);
                ty.marshal(buffer);
            }
            Self::NonType { value, r#type } => {
                buffer.put_tag(1);
                value.marshal(buffer);
                r#type.marshal(buffer);
            }
        }
    }
}
