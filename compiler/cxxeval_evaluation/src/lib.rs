//! The expression evaluation engine.
//!
//! An [`Evaluation`] is an immutable tree describing a C++ expression. Given a
//! point of instantiation ([`scope::Scope`]) it answers the type, value and
//! value category of the expression, can be instantiated under a
//! [`TemplateParameterMap`] and evaluates constant expressions under a bounded
//! [`constexpr::ConstexprContext`].

use std::sync::Arc;

use cxxeval_term::{
    r#type::{Primitive, Type},
    template::TemplateParameterMap,
    value::Value,
    TemplateID, ValueCategory,
};
use kind::{Binary, BinaryOperator, Binding, Fixed, Kind, Unary, UnaryOperator};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod constexpr;
pub mod diagnostic;
pub mod instantiation;
pub mod kind;
pub mod pack;
pub mod query;
pub mod scope;
pub mod signature;
mod stack;

#[cfg(test)]
mod arbitrary;

/// An immutable, cheaply clonable expression tree.
///
/// The dependence flags are computed once when the node is built: a node is
/// dependent if and only if it or one of its children is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Node", into = "Node")]
pub struct Evaluation(Arc<Inner>);

#[derive(Debug, PartialEq, Eq, Hash)]
struct Inner {
    kind: Kind,
    template_definition: Option<TemplateID>,
    is_type_dependent: bool,
    is_value_dependent: bool,
    references_template_parameter: bool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // children are released one stack-checked level at a time
        let kind = std::mem::replace(
            &mut self.kind,
            Kind::Fixed(Fixed::new(
                Type::Problem,
                Value::Unknown,
                ValueCategory::PRValue,
            )),
        );

        stack::ensure_sufficient_stack(|| drop(kind));
    }
}

/// The serialized shape of an [`Evaluation`]; the flags are derived again when
/// the tree is read back.
#[derive(Clone, Serialize, Deserialize)]
struct Node {
    kind: Kind,

    #[serde(default)]
    template_definition: Option<TemplateID>,
}

impl From<Node> for Evaluation {
    fn from(node: Node) -> Self { Self::build(node.kind, node.template_definition) }
}

impl From<Evaluation> for Node {
    fn from(evaluation: Evaluation) -> Self {
        Self {
            kind: evaluation.0.kind.clone(),
            template_definition: evaluation.0.template_definition,
        }
    }
}

impl From<Kind> for Evaluation {
    fn from(kind: Kind) -> Self { Self::new(kind) }
}

impl Evaluation {
    /// Creates a node outside of any template; a template definition is only
    /// inherited from the children.
    #[must_use]
    pub fn new(kind: impl Into<Kind>) -> Self { Self::build(kind.into(), None) }

    /// Creates a node that occurs in the given template definition.
    #[must_use]
    pub fn in_template(kind: impl Into<Kind>, template: TemplateID) -> Self {
        Self::build(kind.into(), Some(template))
    }

    fn build(kind: Kind, template_definition: Option<TemplateID>) -> Self {
        let own = kind.own_dependence();
        let children = kind.children();

        let is_type_dependent =
            own.ty || children.iter().any(|child| child.is_type_dependent());
        let is_value_dependent = is_type_dependent
            || own.value
            || children.iter().any(|child| child.is_value_dependent());
        let references_template_parameter = own.references_template_parameter
            || children
                .iter()
                .any(|child| child.references_template_parameter());

        let template_definition = template_definition.or_else(|| {
            children.iter().find_map(|child| child.template_definition())
        });

        Self(Arc::new(Inner {
            kind,
            template_definition,
            is_type_dependent,
            is_value_dependent,
            references_template_parameter,
        }))
    }

    /// Rebuilds a node derived from `self`, keeping its template definition.
    pub(crate) fn derive(&self, kind: impl Into<Kind>) -> Self {
        Self::build(kind.into(), self.0.template_definition)
    }

    /// Creates a literal of the given type.
    #[must_use]
    pub fn fixed(ty: Type, value: Value) -> Self {
        Self::new(Fixed::new(ty, value, ValueCategory::PRValue))
    }

    /// Creates an `int` literal.
    #[must_use]
    pub fn int(value: i128) -> Self {
        Self::fixed(Type::Primitive(Primitive::Int), Value::Integral(value))
    }

    /// Creates a `bool` literal.
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::fixed(Type::Primitive(Primitive::Bool), Value::from(value))
    }

    /// The evaluation standing for an invalid expression.
    #[must_use]
    pub fn problem() -> Self { Self::fixed(Type::Problem, Value::Unknown) }

    /// Creates a unary operation.
    #[must_use]
    pub fn unary(operator: UnaryOperator, operand: Self) -> Self {
        Self::new(Unary::new(operator, operand))
    }

    /// Creates a binary operation.
    #[must_use]
    pub fn binary(operator: BinaryOperator, lhs: Self, rhs: Self) -> Self {
        Self::new(Binary::new(operator, lhs, rhs))
    }

    /// Creates a reference to a function parameter.
    #[must_use]
    pub fn function_parameter(position: usize, ty: Type) -> Self {
        Self::new(Binding::FunctionParameter { position, ty, is_pack: false })
    }

    /// Returns the expression kind of the node.
    #[must_use]
    pub fn kind(&self) -> &Kind { &self.0.kind }

    /// Returns `true` if the type of the expression depends on a template
    /// parameter that isn't bound yet.
    #[must_use]
    pub fn is_type_dependent(&self) -> bool { self.0.is_type_dependent }

    /// Returns `true` if the value of the expression depends on a template
    /// parameter that isn't bound yet.
    #[must_use]
    pub fn is_value_dependent(&self) -> bool { self.0.is_value_dependent }

    /// Returns `true` if the tree mentions a template parameter anywhere,
    /// including in the types it carries.
    #[must_use]
    pub fn references_template_parameter(&self) -> bool {
        self.0.references_template_parameter
    }

    /// Returns the template definition the expression occurs in, if any.
    #[must_use]
    pub fn template_definition(&self) -> Option<TemplateID> {
        self.0.template_definition
    }

    /// Returns `true` if the expression is a braced initializer list.
    #[must_use]
    pub fn is_initializer_list(&self) -> bool {
        self.0.kind.is_initializer_list()
    }

    /// Returns `true` if the expression names an overload set.
    #[must_use]
    pub fn is_function_set(&self) -> bool { self.0.kind.is_function_set() }

    /// Returns `true` if both handles point to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }

    /// Returns the value of a [`Kind::Fixed`] node.
    pub(crate) fn fixed_value(&self) -> Option<&Value> {
        self.0.kind.as_fixed().map(Fixed::value)
    }

    /// Returns the integral value of a [`Kind::Fixed`] node.
    pub(crate) fn fixed_integral(&self) -> Option<i128> {
        self.fixed_value().and_then(Value::integral)
    }

    /// Instantiates the tree with the default depth budget and no enclosing
    /// specialization.
    #[must_use]
    pub fn instantiate_with(
        &self,
        map: &TemplateParameterMap,
        scope: &dyn scope::Scope,
    ) -> Self {
        self.instantiate(
            map,
            None,
            None,
            config::DEFAULT_MAX_DEPTH,
            scope,
        )
    }
}
