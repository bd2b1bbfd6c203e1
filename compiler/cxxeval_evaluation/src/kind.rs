//! Contains the expression kinds an [`Evaluation`] can be made of.

use cxxeval_term::{
    r#type::Type,
    template::{TemplateArgument, TemplateParameter},
    value::Value,
    FunctionID, ValueCategory, VariableID,
};
use enum_as_inner::EnumAsInner;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

use crate::{scope::Scope, Evaluation};

/// A literal or a value that has already been computed.
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
pub struct Fixed {
    /// The type of the value.
    #[get = "pub"]
    ty: Type,

    /// The value itself.
    #[get = "pub"]
    value: Value,

    /// The value category the expression had before it was folded.
    #[get_copy = "pub"]
    category: ValueCategory,
}

/// A named entity referenced by an id-expression.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumAsInner,
)]
pub enum Binding {
    /// A non-type template parameter, e.g. `N` in `template<int N>`.
    TemplateParameter {
        /// The referenced parameter.
        parameter: TemplateParameter,

        /// The declared type of the parameter.
        ty: Type,
    },

    /// A parameter of the function whose body is being evaluated.
    FunctionParameter {
        /// The position of the parameter in the parameter list.
        position: usize,

        /// The declared type of the parameter; the element type for a
        /// function parameter pack.
        ty: Type,

        /// Whether the parameter is a function parameter pack (`Ts... args`).
        is_pack: bool,
    },

    /// A variable declared in the point of instantiation.
    Variable {
        /// The referenced variable.
        id: VariableID,

        /// The declared type of the variable.
        ty: Type,
    },
}

impl Binding {
    /// Returns the declared type of the entity.
    #[must_use]
    pub const fn declared_type(&self) -> &Type {
        match self {
            Self::TemplateParameter { ty, .. }
            | Self::FunctionParameter { ty, .. }
            | Self::Variable { ty, .. } => ty,
        }
    }
}

/// An operator that takes a single operand.
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
pub enum UnaryOperator {
    #[display(fmt = "+")]
    Plus,
    #[display(fmt = "-")]
    Minus,
    #[display(fmt = "~")]
    BitwiseNot,
    #[display(fmt = "!")]
    LogicalNot,
    #[display(fmt = "*")]
    Dereference,
    #[display(fmt = "&")]
    AddressOf,
    #[display(fmt = "++")]
    PreIncrement,
    #[display(fmt = "--")]
    PreDecrement,
    #[display(fmt = "++ (postfix)")]
    PostIncrement,
    #[display(fmt = "-- (postfix)")]
    PostDecrement,

    /// `sizeof...(pack)`
    #[display(fmt = "sizeof...")]
    SizeofPack,
}

impl UnaryOperator {
    /// Returns `true` if the operator modifies its operand.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::PreIncrement
                | Self::PreDecrement
                | Self::PostIncrement
                | Self::PostDecrement
        )
    }
}

/// A unary operation such as `-x` or `sizeof...(Ts)`.
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
pub struct Unary {
    /// The operator applied.
    #[get_copy = "pub"]
    operator: UnaryOperator,

    /// The operand.
    #[get = "pub"]
    operand: Evaluation,
}

/// An operator that takes two operands.
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
pub enum BinaryOperator {
    #[display(fmt = "+")]
    Add,
    #[display(fmt = "-")]
    Subtract,
    #[display(fmt = "*")]
    Multiply,
    #[display(fmt = "/")]
    Divide,
    #[display(fmt = "%")]
    Modulo,
    #[display(fmt = "<<")]
    ShiftLeft,
    #[display(fmt = ">>")]
    ShiftRight,
    #[display(fmt = "&")]
    BitwiseAnd,
    #[display(fmt = "|")]
    BitwiseOr,
    #[display(fmt = "^")]
    BitwiseXor,
    #[display(fmt = "<")]
    Less,
    #[display(fmt = "<=")]
    LessEqual,
    #[display(fmt = ">")]
    Greater,
    #[display(fmt = ">=")]
    GreaterEqual,
    #[display(fmt = "==")]
    Equal,
    #[display(fmt = "!=")]
    NotEqual,
    #[display(fmt = "&&")]
    LogicalAnd,
    #[display(fmt = "||")]
    LogicalOr,
    #[display(fmt = "=")]
    Assign,

    /// A compound assignment such as `+=`, carrying the arithmetic operator.
    #[display(fmt = "{_0}=")]
    CompoundAssign(ArithmeticOperator),
}

/// The arithmetic part of a compound assignment.
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
pub enum ArithmeticOperator {
    #[display(fmt = "+")]
    Add,
    #[display(fmt = "-")]
    Subtract,
    #[display(fmt = "*")]
    Multiply,
    #[display(fmt = "/")]
    Divide,
    #[display(fmt = "%")]
    Modulo,
    #[display(fmt = "<<")]
    ShiftLeft,
    #[display(fmt = ">>")]
    ShiftRight,
    #[display(fmt = "&")]
    BitwiseAnd,
    #[display(fmt = "|")]
    BitwiseOr,
    #[display(fmt = "^")]
    BitwiseXor,
}

impl BinaryOperator {
    /// Returns `true` for the operators whose result is `bool`.
    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(
            self,
            Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
                | Self::Equal
                | Self::NotEqual
                | Self::LogicalAnd
                | Self::LogicalOr
        )
    }

    /// Returns `true` for `=` and the compound assignments.
    #[must_use]
    pub const fn is_assignment(self) -> bool {
        matches!(self, Self::Assign | Self::CompoundAssign(_))
    }

    /// Returns `true` for `<<` and `>>`.
    #[must_use]
    pub const fn is_shift(self) -> bool {
        matches!(self, Self::ShiftLeft | Self::ShiftRight)
    }
}

impl From<ArithmeticOperator> for BinaryOperator {
    fn from(value: ArithmeticOperator) -> Self {
        match value {
            ArithmeticOperator::Add => Self::Add,
            ArithmeticOperator::Subtract => Self::Subtract,
            ArithmeticOperator::Multiply => Self::Multiply,
            ArithmeticOperator::Divide => Self::Divide,
            ArithmeticOperator::Modulo => Self::Modulo,
            ArithmeticOperator::ShiftLeft => Self::ShiftLeft,
            ArithmeticOperator::ShiftRight => Self::ShiftRight,
            ArithmeticOperator::BitwiseAnd => Self::BitwiseAnd,
            ArithmeticOperator::BitwiseOr => Self::BitwiseOr,
            ArithmeticOperator::BitwiseXor => Self::BitwiseXor,
        }
    }
}

/// A binary operation such as `a + b`.
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
pub struct Binary {
    /// The operator applied.
    #[get_copy = "pub"]
    operator: BinaryOperator,

    /// The left-hand side operand.
    #[get = "pub"]
    lhs: Evaluation,

    /// The right-hand side operand.
    #[get = "pub"]
    rhs: Evaluation,
}

/// An operator applied to a type rather than to an expression.
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
pub enum TypeOperator {
    #[display(fmt = "sizeof")]
    SizeOf,
    #[display(fmt = "alignof")]
    AlignOf,
    #[display(fmt = "__is_integral")]
    IsIntegral,
    #[display(fmt = "__is_signed")]
    IsSigned,
    #[display(fmt = "__is_pointer")]
    IsPointer,
}

/// `sizeof(T)`, `alignof(T)` or a type trait.
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
pub struct UnaryTypeId {
    /// The operator applied.
    #[get_copy = "pub"]
    operator: TypeOperator,

    /// The operand type.
    #[get = "pub"]
    ty: Type,
}

/// `condition ? positive : negative`
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    derive_new::new,
)]
#[get = "pub"]
pub struct Conditional {
    /// The condition.
    condition: Evaluation,

    /// The branch taken when the condition is `true`.
    positive: Evaluation,

    /// The branch taken when the condition is `false`.
    negative: Evaluation,
}

/// `a, b, c`
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    derive_new::new,
)]
pub struct Comma {
    /// The expressions, evaluated from left to right.
    #[get = "pub"]
    expressions: Vec<Evaluation>,
}

/// `callee(arguments...)`
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    derive_new::new,
)]
#[get = "pub"]
pub struct FunctionCall {
    /// The expression designating the called function.
    callee: Evaluation,

    /// The arguments, possibly containing pack expansions.
    arguments: Vec<Evaluation>,
}

/// The name of an overloaded function, optionally with explicit template
/// arguments (`f<int>`).
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    derive_new::new,
)]
#[get = "pub"]
pub struct FunctionSet {
    /// The functions the name was resolved to.
    candidates: Vec<FunctionID>,

    /// The name as written.
    name: String,

    /// The explicit template arguments, if any were written.
    template_arguments: Option<Vec<TemplateArgument>>,
}

impl FunctionSet {
    /// Picks the only candidate that accepts `arity` arguments.
    ///
    /// Overload resolution is limited to the number of parameters; `None` is
    /// returned when no candidate or more than one candidate is viable.
    #[must_use]
    pub fn resolve(&self, arity: usize, scope: &dyn Scope) -> Option<FunctionID> {
        let mut viable = self.candidates.iter().copied().filter(|candidate| {
            scope
                .function(*candidate)
                .is_some_and(|function| function.parameters().len() == arity)
        });

        let function = viable.next()?;
        viable.next().is_none().then_some(function)
    }
}

impl FunctionCall {
    /// Returns the function the call resolves to, if the callee names an
    /// overload set and every pack expansion among the arguments has been
    /// expanded.
    #[must_use]
    pub fn target(&self, scope: &dyn Scope) -> Option<FunctionID> {
        if self
            .arguments
            .iter()
            .any(|argument| argument.kind().is_parameter_pack())
        {
            return None;
        }

        self.callee.kind().as_function_set()?.resolve(self.arguments.len(), scope)
    }
}

/// `{clauses...}`
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    derive_new::new,
)]
pub struct InitializerList {
    /// The initializer clauses, possibly containing pack expansions.
    #[get = "pub"]
    clauses: Vec<Evaluation>,
}

/// A functional cast or value initialization: `T(x)`, `T()`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    derive_new::new,
)]
#[get = "pub"]
pub struct TypeId {
    /// The type being constructed.
    ty: Type,

    /// The constructor arguments.
    arguments: Vec<Evaluation>,
}

/// A pack expansion `pattern...`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    derive_new::new,
)]
pub struct ParameterPack {
    /// The pattern that is repeated once per pack element.
    #[get = "pub"]
    pattern: Evaluation,
}

/// The closed set of expression kinds.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumAsInner,
    derive_more::From,
)]
#[allow(missing_docs)]
pub enum Kind {
    Fixed(Fixed),
    Binding(Binding),
    Unary(Unary),
    Binary(Binary),
    UnaryTypeId(UnaryTypeId),
    Conditional(Conditional),
    Comma(Comma),
    FunctionCall(FunctionCall),
    FunctionSet(FunctionSet),
    InitializerList(InitializerList),
    TypeId(TypeId),
    ParameterPack(ParameterPack),
}

/// The dependence a node has on its own, ignoring its children.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Dependence {
    pub(crate) ty: bool,
    pub(crate) value: bool,
    pub(crate) references_template_parameter: bool,
}

impl Kind {
    /// Returns the child evaluations, in source order.
    pub(crate) fn children(&self) -> Vec<&Evaluation> {
        match self {
            Self::Fixed(_)
            | Self::Binding(_)
            | Self::UnaryTypeId(_)
            | Self::FunctionSet(_) => Vec::new(),

            Self::Unary(unary) => vec![&unary.operand],
            Self::Binary(binary) => vec![&binary.lhs, &binary.rhs],
            Self::Conditional(conditional) => vec![
                &conditional.condition,
                &conditional.positive,
                &conditional.negative,
            ],
            Self::Comma(comma) => comma.expressions.iter().collect(),
            Self::FunctionCall(call) => std::iter::once(&call.callee)
                .chain(call.arguments.iter())
                .collect(),
            Self::InitializerList(list) => list.clauses.iter().collect(),
            Self::TypeId(type_id) => type_id.arguments.iter().collect(),
            Self::ParameterPack(pack) => vec![&pack.pattern],
        }
    }

    /// Computes the dependence contributed by the node itself.
    pub(crate) fn own_dependence(&self) -> Dependence {
        match self {
            Self::Fixed(fixed) => Dependence {
                ty: fixed.ty.is_dependent(),
                value: fixed.value.is_dependent(),
                references_template_parameter: fixed
                    .ty
                    .references_template_parameter(),
            },

            Self::Binding(Binding::TemplateParameter { ty, .. }) => {
                Dependence {
                    ty: ty.is_dependent(),
                    value: true,
                    references_template_parameter: true,
                }
            }
            Self::Binding(Binding::FunctionParameter {
                ty, is_pack, ..
            }) => Dependence {
                ty: *is_pack || ty.is_dependent(),
                value: *is_pack,
                references_template_parameter: ty
                    .references_template_parameter(),
            },
            Self::Binding(Binding::Variable { ty, .. }) => Dependence {
                ty: ty.is_dependent(),
                value: false,
                references_template_parameter: ty
                    .references_template_parameter(),
            },

            Self::UnaryTypeId(type_id) => Dependence {
                ty: false,
                value: type_id.ty.is_dependent(),
                references_template_parameter: type_id
                    .ty
                    .references_template_parameter(),
            },
            Self::TypeId(type_id) => Dependence {
                ty: type_id.ty.is_dependent(),
                value: false,
                references_template_parameter: type_id
                    .ty
                    .references_template_parameter(),
            },

            Self::FunctionSet(set) => {
                let mut arguments = set.template_arguments.iter().flatten();
                let dependent = arguments
                    .clone()
                    .any(TemplateArgument::is_dependent);

                Dependence {
                    ty: dependent,
                    value: dependent,
                    references_template_parameter: arguments.any(
                        TemplateArgument::references_template_parameter,
                    ),
                }
            }

            Self::ParameterPack(_) => Dependence {
                ty: true,
                value: true,
                references_template_parameter: false,
            },

            Self::Unary(_)
            | Self::Binary(_)
            | Self::Conditional(_)
            | Self::Comma(_)
            | Self::FunctionCall(_)
            | Self::InitializerList(_) => Dependence::default(),
        }
    }
}
