//! Strategies generating arithmetic expression trees.

use cxxeval_term::{
    r#type::{Primitive, Type},
    template::{
        TemplateArgument, TemplateParameter, TemplateParameterID,
        TemplateParameterMap,
    },
    value::Value,
};
use proptest::{
    prelude::{Arbitrary, BoxedStrategy, Just, Strategy as _},
    prop_oneof,
};

use crate::{
    kind::{BinaryOperator, Binding, Conditional, UnaryOperator},
    Evaluation,
};

/// The shape of an integral expression over literals and the non-type
/// template parameters `N0`, `N1` and `N2`.
///
/// The operators are chosen so that the evaluation never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Literal(i128),
    Parameter(u32),
    Unary(UnaryOperator, Box<Shape>),
    Binary(BinaryOperator, Box<Shape>, Box<Shape>),
    Conditional(Box<Shape>, Box<Shape>, Box<Shape>),
}

impl Shape {
    /// The values bound to `N0`, `N1` and `N2` by [`Shape::map`].
    pub const ARGUMENTS: [i128; 3] = [3, -7, 11];

    pub fn parameter(index: u32) -> TemplateParameter {
        TemplateParameter::new(TemplateParameterID::new(0, index), false)
    }

    /// Binds every parameter to its value in [`Shape::ARGUMENTS`].
    pub fn map() -> TemplateParameterMap {
        let mut map = TemplateParameterMap::default();

        for (index, value) in (0..).zip(Self::ARGUMENTS) {
            map.insert(
                Self::parameter(index).id,
                TemplateArgument::NonType {
                    value: Value::Integral(value),
                    r#type: Type::Primitive(Primitive::Int),
                },
            )
            .expect("parameters should be distinct");
        }

        map
    }

    /// Builds the tree, referring to the template parameters.
    pub fn template(&self) -> Evaluation {
        self.build(&|index| {
            Evaluation::new(Binding::TemplateParameter {
                parameter: Self::parameter(index),
                ty: Type::Primitive(Primitive::Int),
            })
        })
    }

    /// Builds the tree with the arguments of [`Shape::map`] written in place
    /// of the parameters.
    pub fn substituted(&self) -> Evaluation {
        self.build(&|index| {
            Evaluation::int(Self::ARGUMENTS[index as usize])
        })
    }

    /// Returns `true` if no template parameter occurs in the tree.
    pub fn is_constant(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Parameter(_) => false,
            Self::Unary(_, operand) => operand.is_constant(),
            Self::Binary(_, lhs, rhs) => lhs.is_constant() && rhs.is_constant(),
            Self::Conditional(condition, positive, negative) => {
                condition.is_constant()
                    && positive.is_constant()
                    && negative.is_constant()
            }
        }
    }

    fn build(&self, parameter: &dyn Fn(u32) -> Evaluation) -> Evaluation {
        match self {
            Self::Literal(value) => Evaluation::int(*value),
            Self::Parameter(index) => parameter(*index),
            Self::Unary(operator, operand) => {
                Evaluation::unary(*operator, operand.build(parameter))
            }
            Self::Binary(operator, lhs, rhs) => Evaluation::binary(
                *operator,
                lhs.build(parameter),
                rhs.build(parameter),
            ),
            Self::Conditional(condition, positive, negative) => {
                Evaluation::new(Conditional::new(
                    condition.build(parameter),
                    positive.build(parameter),
                    negative.build(parameter),
                ))
            }
        }
    }
}

fn unary_operator() -> BoxedStrategy<UnaryOperator> {
    prop_oneof![
        Just(UnaryOperator::Plus),
        Just(UnaryOperator::Minus),
        Just(UnaryOperator::BitwiseNot),
        Just(UnaryOperator::LogicalNot),
    ]
    .boxed()
}

fn binary_operator() -> BoxedStrategy<BinaryOperator> {
    prop_oneof![
        Just(BinaryOperator::Add),
        Just(BinaryOperator::Subtract),
        Just(BinaryOperator::Multiply),
        Just(BinaryOperator::BitwiseAnd),
        Just(BinaryOperator::BitwiseOr),
        Just(BinaryOperator::BitwiseXor),
        Just(BinaryOperator::Less),
        Just(BinaryOperator::GreaterEqual),
        Just(BinaryOperator::Equal),
        Just(BinaryOperator::NotEqual),
        Just(BinaryOperator::LogicalAnd),
        Just(BinaryOperator::LogicalOr),
    ]
    .boxed()
}

impl Arbitrary for Shape {
    /// Whether template parameters may occur in the tree.
    type Parameters = bool;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(with_parameters: Self::Parameters) -> Self::Strategy {
        let literal = (-1000_i128..1000).prop_map(Self::Literal);
        let leaf = if with_parameters {
            prop_oneof![literal, (0..3_u32).prop_map(Self::Parameter)].boxed()
        } else {
            literal.boxed()
        };

        leaf.prop_recursive(4, 32, 3, |inner| {
            prop_oneof![
                (unary_operator(), inner.clone()).prop_map(
                    |(operator, operand)| {
                        Self::Unary(operator, Box::new(operand))
                    }
                ),
                (binary_operator(), inner.clone(), inner.clone()).prop_map(
                    |(operator, lhs, rhs)| {
                        Self::Binary(operator, Box::new(lhs), Box::new(rhs))
                    }
                ),
                (inner.clone(), inner.clone(), inner).prop_map(
                    |(condition, positive, negative)| {
                        Self::Conditional(
                            Box::new(condition),
                            Box::new(positive),
                            Box::new(negative),
                        )
                    }
                ),
            ]
        })
        .boxed()
    }
}
