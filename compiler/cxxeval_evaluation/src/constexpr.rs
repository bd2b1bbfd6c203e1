//! Contains the bounded evaluator of constant expressions.
//!
//! Every node visited records one step in the [`ConstexprContext`] before it
//! is processed. All the calls reachable from one top-level evaluation share
//! the same context, so the step limit bounds the whole evaluation rather than
//! a single call frame.

use std::fmt::{self, Debug};

use cxxeval_term::{
    r#type::{Primitive, Type},
    value::Value,
    FunctionID, ValueCategory,
};
use enum_as_inner::EnumAsInner;
use getset::CopyGetters;

pub use crate::config::DEFAULT_STEP_LIMIT;
use crate::{
    kind::{
        Binary, BinaryOperator, Binding, Comma, Conditional, Fixed,
        FunctionCall, InitializerList, Kind, TypeId, TypeOperator, Unary,
        UnaryOperator, UnaryTypeId,
    },
    scope::Scope,
    stack::ensure_sufficient_stack,
    Evaluation,
};

/// The state shared by one top-level constant evaluation.
///
/// The context is either active (`steps_performed < limit`) or exhausted. An
/// exhausted context refuses every further step.
#[derive(CopyGetters)]
#[allow(missing_copy_implementations)]
pub struct ConstexprContext<'a> {
    /// The number of steps recorded so far.
    #[get_copy = "pub"]
    steps_performed: usize,

    /// The maximum number of steps that can be recorded.
    #[get_copy = "pub"]
    limit: usize,

    point: &'a dyn Scope,
}

impl Debug for ConstexprContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstexprContext")
            .field("steps_performed", &self.steps_performed)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl<'a> ConstexprContext<'a> {
    /// Creates a context with the [`DEFAULT_STEP_LIMIT`].
    #[must_use]
    pub const fn new(point: &'a dyn Scope) -> Self {
        Self::with_limit(point, DEFAULT_STEP_LIMIT)
    }

    /// Creates a context with the given step limit.
    #[must_use]
    pub const fn with_limit(point: &'a dyn Scope, limit: usize) -> Self {
        Self { steps_performed: 0, limit, point }
    }

    /// Returns the point of instantiation the evaluation runs in.
    #[must_use]
    pub fn point(&self) -> &'a dyn Scope { self.point }

    /// Returns `true` if no more steps can be recorded.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.steps_performed >= self.limit
    }

    /// Records one evaluation step.
    ///
    /// # Errors
    ///
    /// Returns [`StepLimitExceeded`] if the context is exhausted; the step
    /// count is left unchanged.
    pub fn record_step(&mut self) -> Result<(), StepLimitExceeded> {
        if self.is_exhausted() {
            log::trace!(
                "constant evaluation stopped after {} steps",
                self.steps_performed
            );

            return Err(StepLimitExceeded {
                steps_performed: self.steps_performed,
                limit: self.limit,
                call: None,
            });
        }

        self.steps_performed += 1;
        Ok(())
    }
}

/// Binds the parameters of the function being evaluated, by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FunctionParameterMap {
    arguments: Vec<Evaluation>,
}

impl FunctionParameterMap {
    /// Creates a map binding the `i`th argument to the parameter at position
    /// `i`.
    #[must_use]
    pub const fn new(arguments: Vec<Evaluation>) -> Self { Self { arguments } }

    /// Returns the evaluation bound to the parameter at the given position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Evaluation> {
        self.arguments.get(position)
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize { self.arguments.len() }

    /// Returns `true` if no parameter is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.arguments.is_empty() }
}

impl FromIterator<Evaluation> for FunctionParameterMap {
    fn from_iter<T: IntoIterator<Item = Evaluation>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The constant evaluation performed more steps than its context allows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[error(
    "constant evaluation exceeded the limit of {limit} steps after \
     {steps_performed} steps"
)]
pub struct StepLimitExceeded {
    /// The number of steps performed when the evaluation stopped.
    pub steps_performed: usize,

    /// The step limit of the context.
    pub limit: usize,

    /// The outermost call that was being evaluated, if the limit was reached
    /// inside of a function call.
    pub call: Option<FunctionID>,
}

/// A construct the constant evaluator can't process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error,
)]
#[allow(missing_docs)]
pub enum Unsupported {
    #[error("{0} isn't declared constexpr")]
    NonConstexprFunction(FunctionID),

    #[error("the call doesn't resolve to exactly one function")]
    UnresolvedFunctionSet,

    #[error("{0} has no definition")]
    MissingDefinition(FunctionID),

    #[error("division by zero")]
    DivisionByZero,

    #[error("the shift amount is negative or exceeds the width of the operand")]
    InvalidShift,

    #[error("an operand depends on a template parameter")]
    DependentOperand,

    #[error("the expression modifies an object")]
    Modification,
}

/// The failure of a constant evaluation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    thiserror::Error,
    EnumAsInner,
)]
#[allow(missing_docs)]
pub enum ConstexprError {
    #[error(transparent)]
    StepLimitExceeded(#[from] StepLimitExceeded),

    #[error(transparent)]
    Unsupported(#[from] Unsupported),
}

impl ConstexprError {
    /// Attributes a step limit failure to the given call. Called while
    /// unwinding, so the outermost call is the one that remains.
    #[must_use]
    const fn within_call(self, function: FunctionID) -> Self {
        match self {
            Self::StepLimitExceeded(error) => {
                Self::StepLimitExceeded(StepLimitExceeded {
                    call: Some(function),
                    ..error
                })
            }
            Self::Unsupported(_) => self,
        }
    }
}

impl Evaluation {
    /// Evaluates the tree with the function parameters bound by `parameters`.
    ///
    /// Sub-expressions whose value becomes known are folded into
    /// [`Kind::Fixed`] nodes; the ones that can't be folded are rebuilt from
    /// their evaluated children.
    ///
    /// # Errors
    ///
    /// See [`ConstexprError`].
    pub fn compute_for_function_call(
        &self,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        context.record_step()?;

        ensure_sufficient_stack(|| self.compute(parameters, context))
    }

    /// Evaluates the expression outside of any function call and returns its
    /// value, [`Value::Unknown`] if the expression isn't constant.
    ///
    /// # Errors
    ///
    /// See [`ConstexprError`].
    pub fn constant_value(
        &self,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Value, ConstexprError> {
        if self.is_value_dependent() {
            return Err(Unsupported::DependentOperand.into());
        }

        let computed = self
            .compute_for_function_call(&FunctionParameterMap::default(), context)?;

        Ok(computed.fixed_value().cloned().unwrap_or(Value::Unknown))
    }

    fn compute(
        &self,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        match self.kind() {
            Kind::Fixed(_) | Kind::FunctionSet(_) | Kind::ParameterPack(_) => {
                Ok(self.clone())
            }
            Kind::Binding(binding) => {
                self.compute_binding(binding, parameters, context)
            }
            Kind::Unary(unary) => self.compute_unary(unary, parameters, context),
            Kind::Binary(binary) => {
                self.compute_binary(binary, parameters, context)
            }
            Kind::UnaryTypeId(type_id) => {
                Ok(self.compute_unary_type_id(type_id, context))
            }
            Kind::Conditional(conditional) => {
                self.compute_conditional(conditional, parameters, context)
            }
            Kind::Comma(comma) => self.compute_comma(comma, parameters, context),
            Kind::FunctionCall(call) => {
                self.compute_call(call, parameters, context)
            }
            Kind::InitializerList(list) => {
                self.compute_initializer_list(list, parameters, context)
            }
            Kind::TypeId(type_id) => {
                self.compute_type_id(type_id, parameters, context)
            }
        }
    }

    fn compute_all(
        evaluations: &[Self],
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Vec<Self>, ConstexprError> {
        evaluations
            .iter()
            .map(|evaluation| {
                evaluation.compute_for_function_call(parameters, context)
            })
            .collect()
    }

    fn compute_binding(
        &self,
        binding: &Binding,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        match binding {
            Binding::FunctionParameter { position, is_pack: false, .. } => {
                Ok(parameters
                    .get(*position)
                    .cloned()
                    .unwrap_or_else(|| self.clone()))
            }

            Binding::Variable { id, ty } => {
                let Some(initializer) = context
                    .point()
                    .variable(*id)
                    .filter(|variable| {
                        variable.is_usable_in_constant_expression()
                    })
                    .and_then(|variable| variable.initializer().as_ref())
                else {
                    return Ok(self.clone());
                };

                let value = initializer.compute_for_function_call(
                    &FunctionParameterMap::default(),
                    context,
                )?;

                Ok(value.converted_to(ty))
            }

            Binding::TemplateParameter { .. }
            | Binding::FunctionParameter { is_pack: true, .. } => {
                Ok(self.clone())
            }
        }
    }

    fn compute_unary(
        &self,
        unary: &Unary,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        if unary.operator().is_mutation() {
            return Err(Unsupported::Modification.into());
        }

        let operand =
            unary.operand().compute_for_function_call(parameters, context)?;
        let Some(value) = operand.fixed_integral() else {
            return Ok(self.derive(Unary::new(unary.operator(), operand)));
        };

        let result = match unary.operator() {
            UnaryOperator::Plus => value,
            UnaryOperator::Minus => value.wrapping_neg(),
            UnaryOperator::BitwiseNot => !value,
            UnaryOperator::LogicalNot => i128::from(value == 0),

            // pointers have no integral value to fold into; the mutations
            // were rejected above
            UnaryOperator::Dereference
            | UnaryOperator::AddressOf
            | UnaryOperator::SizeofPack
            | UnaryOperator::PreIncrement
            | UnaryOperator::PreDecrement
            | UnaryOperator::PostIncrement
            | UnaryOperator::PostDecrement => {
                return Ok(self.derive(Unary::new(unary.operator(), operand)));
            }
        };

        let rebuilt = self.derive(Unary::new(unary.operator(), operand));
        Ok(rebuilt.folded(result, context.point()))
    }

    fn compute_binary(
        &self,
        binary: &Binary,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        let operator = binary.operator();
        if operator.is_assignment() {
            return Err(Unsupported::Modification.into());
        }

        let lhs = binary.lhs().compute_for_function_call(parameters, context)?;

        // `&&` and `||` don't evaluate their right-hand side once the result
        // is decided
        if matches!(operator, BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr)
        {
            let short_circuit = operator == BinaryOperator::LogicalOr;

            if lhs.fixed_value().and_then(Value::truthiness) == Some(short_circuit)
            {
                return Ok(self.derive(Fixed::new(
                    Type::Primitive(Primitive::Bool),
                    Value::from(short_circuit),
                    ValueCategory::PRValue,
                )));
            }
        }

        let rhs = binary.rhs().compute_for_function_call(parameters, context)?;
        let rebuilt =
            self.derive(Binary::new(operator, lhs.clone(), rhs.clone()));

        let (Some(lhs_value), Some(rhs_value)) =
            (lhs.fixed_integral(), rhs.fixed_integral())
        else {
            return Ok(rebuilt);
        };

        let scope = context.point();
        let (Some(lhs_type), Some(rhs_type)) = (
            lhs.type_or_function_set(scope).primitive(),
            rhs.type_or_function_set(scope).primitive(),
        ) else {
            return Ok(rebuilt);
        };

        let result = apply_binary(
            operator,
            (lhs_value, lhs_type),
            (rhs_value, rhs_type),
        )?;

        Ok(rebuilt.folded(result, scope))
    }

    fn compute_unary_type_id(
        &self,
        type_id: &UnaryTypeId,
        context: &ConstexprContext<'_>,
    ) -> Self {
        if self.is_value_dependent() {
            return self.clone();
        }

        let ty = type_id.ty();
        let result = match type_id.operator() {
            TypeOperator::SizeOf => ty.size_of().map(i128::from),
            TypeOperator::AlignOf => ty.align_of().map(i128::from),
            TypeOperator::IsIntegral => Some(i128::from(ty.is_integral())),
            TypeOperator::IsSigned => Some(i128::from(
                ty.primitive().is_some_and(Primitive::is_signed),
            )),
            TypeOperator::IsPointer => {
                Some(i128::from(matches!(ty.unqualified(), Type::Pointer(_))))
            }
        };

        result.map_or_else(
            || self.clone(),
            |result| self.folded(result, context.point()),
        )
    }

    fn compute_conditional(
        &self,
        conditional: &Conditional,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        let condition = conditional
            .condition()
            .compute_for_function_call(parameters, context)?;

        if let Some(truth) = condition.fixed_value().and_then(Value::truthiness)
        {
            let branch = if truth {
                conditional.positive()
            } else {
                conditional.negative()
            };

            let result = branch.compute_for_function_call(parameters, context)?;
            let ty = self.type_or_function_set(context.point());

            return Ok(result.converted_to(&ty));
        }

        let positive = conditional
            .positive()
            .compute_for_function_call(parameters, context)?;
        let negative = conditional
            .negative()
            .compute_for_function_call(parameters, context)?;

        Ok(self.derive(Conditional::new(condition, positive, negative)))
    }

    fn compute_comma(
        &self,
        comma: &Comma,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        let expressions =
            Self::compute_all(comma.expressions(), parameters, context)?;

        match expressions.last() {
            Some(last) if last.fixed_value().is_some() => Ok(last.clone()),
            _ => Ok(self.derive(Comma::new(expressions))),
        }
    }

    fn compute_call(
        &self,
        call: &FunctionCall,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        let callee =
            call.callee().compute_for_function_call(parameters, context)?;
        let arguments =
            Self::compute_all(call.arguments(), parameters, context)?;

        let all_known = arguments.iter().all(|argument| {
            argument.fixed_value().is_some_and(Value::is_known)
        });

        let Some(set) = callee.kind().as_function_set() else {
            return Ok(self.derive(FunctionCall::new(callee, arguments)));
        };

        if !all_known || callee.is_value_dependent() {
            return Ok(self.derive(FunctionCall::new(callee, arguments)));
        }

        let scope = context.point();
        let id = set
            .resolve(arguments.len(), scope)
            .ok_or(Unsupported::UnresolvedFunctionSet)?;
        let function =
            scope.function(id).ok_or(Unsupported::MissingDefinition(id))?;

        if !function.is_constexpr() {
            return Err(Unsupported::NonConstexprFunction(id).into());
        }

        let Some(body) = function.body() else {
            return Err(Unsupported::MissingDefinition(id).into());
        };

        let bound = arguments
            .iter()
            .zip(function.parameters())
            .map(|(argument, ty)| argument.clone().converted_to(ty))
            .collect::<FunctionParameterMap>();

        let result = body
            .compute_for_function_call(&bound, context)
            .map_err(|error| error.within_call(id))?;

        if result.fixed_value().is_none() {
            log::debug!("the call to {id} doesn't produce a constant");
            return Ok(self.derive(FunctionCall::new(callee, arguments)));
        }

        Ok(result.converted_to(function.return_type()))
    }

    fn compute_initializer_list(
        &self,
        list: &InitializerList,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        let clauses = Self::compute_all(list.clauses(), parameters, context)?;
        let values = clauses
            .iter()
            .map(|clause| clause.fixed_value().cloned())
            .collect::<Option<Vec<_>>>();

        Ok(match values {
            Some(values) => self.derive(Fixed::new(
                Type::InitializerList,
                Value::Composite(values),
                ValueCategory::PRValue,
            )),
            None => self.derive(InitializerList::new(clauses)),
        })
    }

    fn compute_type_id(
        &self,
        type_id: &TypeId,
        parameters: &FunctionParameterMap,
        context: &mut ConstexprContext<'_>,
    ) -> Result<Self, ConstexprError> {
        let arguments =
            Self::compute_all(type_id.arguments(), parameters, context)?;
        let ty = type_id.ty();

        if ty.is_dependent() {
            return Ok(self.derive(TypeId::new(ty.clone(), arguments)));
        }

        let is_scalar = matches!(
            ty.without_reference().unqualified(),
            Type::Primitive(_) | Type::Pointer(_)
        );

        Ok(match arguments.as_slice() {
            // value initialization zeroes scalars
            [] if is_scalar => self.folded(0, context.point()),
            [argument] if is_scalar && argument.fixed_value().is_some() => {
                argument.clone().converted_to(ty)
            }
            _ => self.derive(TypeId::new(ty.clone(), arguments)),
        })
    }

    /// Replaces the node by a [`Kind::Fixed`] holding `value` converted to the
    /// type of the node.
    fn folded(&self, value: i128, scope: &dyn Scope) -> Self {
        let ty = self.type_or_function_set(scope).without_reference().clone();
        let value = Value::Integral(value).convert_to(&ty);

        self.derive(Fixed::new(ty, value, ValueCategory::PRValue))
    }

    /// Converts a folded value to the given type. Nodes that aren't folded and
    /// conversions to non-scalar types are left as is.
    pub(crate) fn converted_to(self, ty: &Type) -> Self {
        let ty = ty.without_reference();

        if let Kind::Fixed(fixed) = self.kind() {
            let convertible =
                matches!(ty.unqualified(), Type::Primitive(_) | Type::Pointer(_));

            if convertible && fixed.ty() != ty {
                return self.derive(Fixed::new(
                    ty.clone(),
                    fixed.value().convert_to(ty),
                    ValueCategory::PRValue,
                ));
            }
        }

        self
    }
}

/// Converts an integral value to the given type.
fn convert(value: i128, primitive: Primitive) -> i128 {
    Value::Integral(value)
        .convert_to(&Type::Primitive(primitive))
        .integral()
        .unwrap_or(value)
}

/// Computes a binary operator over two integral values of the given types.
fn apply_binary(
    operator: BinaryOperator,
    (lhs, lhs_type): (i128, Primitive),
    (rhs, rhs_type): (i128, Primitive),
) -> Result<i128, Unsupported> {
    let common = lhs_type.usual_arithmetic_conversion(rhs_type);
    let (lhs_common, rhs_common) = (convert(lhs, common), convert(rhs, common));

    let result = match operator {
        BinaryOperator::Add => lhs_common.wrapping_add(rhs_common),
        BinaryOperator::Subtract => lhs_common.wrapping_sub(rhs_common),
        BinaryOperator::Multiply => lhs_common.wrapping_mul(rhs_common),
        BinaryOperator::Divide | BinaryOperator::Modulo => {
            if rhs_common == 0 {
                return Err(Unsupported::DivisionByZero);
            }

            if operator == BinaryOperator::Divide {
                lhs_common.wrapping_div(rhs_common)
            } else {
                lhs_common.wrapping_rem(rhs_common)
            }
        }
        BinaryOperator::BitwiseAnd => lhs_common & rhs_common,
        BinaryOperator::BitwiseOr => lhs_common | rhs_common,
        BinaryOperator::BitwiseXor => lhs_common ^ rhs_common,

        BinaryOperator::ShiftLeft | BinaryOperator::ShiftRight => {
            let promoted = lhs_type.promote();
            let width = promoted.size().unwrap_or(0) * 8;
            let lhs = convert(lhs, promoted);

            let amount = u32::try_from(rhs)
                .ok()
                .filter(|amount| u64::from(*amount) < width)
                .ok_or(Unsupported::InvalidShift)?;

            if operator == BinaryOperator::ShiftLeft {
                lhs.wrapping_shl(amount)
            } else {
                lhs >> amount
            }
        }

        BinaryOperator::Less => i128::from(lhs_common < rhs_common),
        BinaryOperator::LessEqual => i128::from(lhs_common <= rhs_common),
        BinaryOperator::Greater => i128::from(lhs_common > rhs_common),
        BinaryOperator::GreaterEqual => i128::from(lhs_common >= rhs_common),
        BinaryOperator::Equal => i128::from(lhs_common == rhs_common),
        BinaryOperator::NotEqual => i128::from(lhs_common != rhs_common),
        BinaryOperator::LogicalAnd => i128::from(lhs != 0 && rhs != 0),
        BinaryOperator::LogicalOr => i128::from(lhs != 0 || rhs != 0),

        BinaryOperator::Assign | BinaryOperator::CompoundAssign(_) => {
            return Err(Unsupported::Modification);
        }
    };

    Ok(result)
}

#[cfg(test)]
mod test;
