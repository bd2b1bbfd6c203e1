//! Implements the queries answered by an [`Evaluation`] against a point of
//! instantiation: constness, type, value and value category.

use cxxeval_term::{
    r#type::{Primitive, Type},
    signature::Marshal,
    value::Value,
    ValueCategory,
};

use crate::{
    constexpr::ConstexprContext,
    kind::{
        Binary, Binding, Conditional, Kind, TypeOperator, Unary,
        UnaryOperator,
    },
    scope::Scope,
    stack::ensure_sufficient_stack,
    Evaluation,
};

impl Evaluation {
    /// Returns `true` if the expression qualifies as a constant expression.
    ///
    /// Only the structure of the tree is inspected; whether the evaluation
    /// actually succeeds is answered by [`Evaluation::value`].
    #[must_use]
    pub fn is_constant_expression(&self, scope: &dyn Scope) -> bool {
        ensure_sufficient_stack(|| {
            let all_constant = |evaluations: &[Self]| {
                evaluations
                    .iter()
                    .all(|evaluation| evaluation.is_constant_expression(scope))
            };

            match self.kind() {
                Kind::Fixed(fixed) => {
                    !fixed.ty().is_problem()
                        && !matches!(fixed.value(), Value::Unknown)
                }

                Kind::Binding(Binding::TemplateParameter { .. }) => true,
                Kind::Binding(Binding::FunctionParameter { .. }) => false,
                Kind::Binding(Binding::Variable { id, .. }) => scope
                    .variable(*id)
                    .is_some_and(|variable| {
                        variable.is_usable_in_constant_expression()
                    }),

                Kind::Unary(unary) => {
                    !matches!(
                        unary.operator(),
                        UnaryOperator::Dereference | UnaryOperator::AddressOf
                    ) && !unary.operator().is_mutation()
                        && unary.operand().is_constant_expression(scope)
                }
                Kind::Binary(binary) => {
                    !binary.operator().is_assignment()
                        && binary.lhs().is_constant_expression(scope)
                        && binary.rhs().is_constant_expression(scope)
                }

                Kind::UnaryTypeId(_) | Kind::FunctionSet(_) => true,

                Kind::Conditional(conditional) => {
                    conditional.condition().is_constant_expression(scope)
                        && conditional.positive().is_constant_expression(scope)
                        && conditional.negative().is_constant_expression(scope)
                }
                Kind::Comma(comma) => all_constant(comma.expressions()),
                Kind::FunctionCall(call) => {
                    let target_is_constexpr = call
                        .target(scope)
                        .and_then(|id| scope.function(id))
                        .is_some_and(|function| function.is_constexpr());

                    target_is_constexpr && all_constant(call.arguments())
                }
                Kind::InitializerList(list) => all_constant(list.clauses()),
                Kind::TypeId(type_id) => {
                    !type_id.ty().is_problem()
                        && all_constant(type_id.arguments())
                }
                Kind::ParameterPack(pack) => {
                    pack.pattern().is_constant_expression(scope)
                }
            }
        })
    }

    /// Returns the type of the expression, or [`Type::FunctionSet`] if the
    /// expression names an overload set.
    ///
    /// The type of a type-dependent expression is
    /// [`Type::DependentExpression`], identified by the signature of the
    /// expression.
    #[must_use]
    pub fn type_or_function_set(&self, scope: &dyn Scope) -> Type {
        ensure_sufficient_stack(|| {
            match self.kind() {
                Kind::FunctionSet(_) => Type::FunctionSet,
                Kind::ParameterPack(pack) => Type::PackExpansion(Box::new(
                    pack.pattern().type_or_function_set(scope),
                )),
                Kind::Fixed(fixed) => fixed.ty().clone(),
                Kind::Binding(binding) => {
                    binding.declared_type().without_reference().clone()
                }
                Kind::TypeId(type_id) => {
                    type_id.ty().without_reference().clone()
                }
                Kind::UnaryTypeId(type_id) => match type_id.operator() {
                    TypeOperator::SizeOf | TypeOperator::AlignOf => {
                        Type::Primitive(Primitive::SIZE_T)
                    }
                    TypeOperator::IsIntegral
                    | TypeOperator::IsSigned
                    | TypeOperator::IsPointer => Type::Primitive(Primitive::Bool),
                },
                Kind::Unary(unary)
                    if unary.operator() == UnaryOperator::SizeofPack =>
                {
                    Type::Primitive(Primitive::SIZE_T)
                }

                _ if self.is_type_dependent() => {
                    Type::DependentExpression(self.signature())
                }

                Kind::Unary(unary) => unary_type(unary, scope),
                Kind::Binary(binary) => binary_type(binary, scope),
                Kind::Conditional(conditional) => {
                    conditional_type(conditional, scope)
                }
                Kind::Comma(comma) => comma.expressions().last().map_or(
                    Type::Primitive(Primitive::Void),
                    |last| last.type_or_function_set(scope),
                ),
                Kind::FunctionCall(call) => call
                    .target(scope)
                    .and_then(|id| scope.function(id))
                    .map_or(Type::Problem, |function| {
                        function.return_type().without_reference().clone()
                    }),
                Kind::InitializerList(_) => Type::InitializerList,
            }
        })
    }

    /// Returns the compile-time value of the expression.
    ///
    /// [`Value::Dependent`] is returned for a value-dependent expression and
    /// [`Value::Unknown`] if the expression isn't constant or its evaluation
    /// fails.
    #[must_use]
    pub fn value(&self, scope: &dyn Scope) -> Value {
        if self.is_value_dependent() {
            return Value::Dependent;
        }

        match self.constant_value(&mut ConstexprContext::new(scope)) {
            Ok(value) => value,
            Err(error) => {
                log::debug!("the expression has no value: {error}");
                Value::Unknown
            }
        }
    }

    /// Returns the value category of the expression.
    #[must_use]
    pub fn value_category(&self, scope: &dyn Scope) -> ValueCategory {
        ensure_sufficient_stack(|| {
            match self.kind() {
                Kind::Fixed(fixed) => fixed.category(),

                Kind::Binding(Binding::TemplateParameter { .. }) => {
                    ValueCategory::PRValue
                }
                Kind::Binding(
                    Binding::FunctionParameter { .. } | Binding::Variable { .. },
                )
                | Kind::FunctionSet(_) => ValueCategory::LValue,

                Kind::Unary(unary) => match unary.operator() {
                    UnaryOperator::Dereference
                    | UnaryOperator::PreIncrement
                    | UnaryOperator::PreDecrement => ValueCategory::LValue,
                    _ => ValueCategory::PRValue,
                },
                Kind::Binary(binary) => {
                    if binary.operator().is_assignment() {
                        ValueCategory::LValue
                    } else {
                        ValueCategory::PRValue
                    }
                }

                Kind::UnaryTypeId(_) | Kind::InitializerList(_) => {
                    ValueCategory::PRValue
                }

                Kind::Conditional(conditional) => {
                    match (
                        conditional.positive().value_category(scope),
                        conditional.negative().value_category(scope),
                    ) {
                        (ValueCategory::LValue, ValueCategory::LValue) => {
                            ValueCategory::LValue
                        }
                        (ValueCategory::XValue, ValueCategory::XValue) => {
                            ValueCategory::XValue
                        }
                        _ => ValueCategory::PRValue,
                    }
                }
                Kind::Comma(comma) => comma
                    .expressions()
                    .last()
                    .map_or(ValueCategory::PRValue, |last| {
                        last.value_category(scope)
                    }),
                Kind::FunctionCall(call) => call
                    .target(scope)
                    .and_then(|id| scope.function(id))
                    .map_or(ValueCategory::PRValue, |function| {
                        function.return_type().result_category()
                    }),
                Kind::TypeId(type_id) => type_id.ty().result_category(),
                Kind::ParameterPack(pack) => {
                    pack.pattern().value_category(scope)
                }
            }
        })
    }
}

fn unary_type(unary: &Unary, scope: &dyn Scope) -> Type {
    let operand = unary.operand().type_or_function_set(scope);

    match unary.operator() {
        UnaryOperator::Plus | UnaryOperator::Minus | UnaryOperator::BitwiseNot => {
            operand
                .primitive()
                .map_or(Type::Problem, |primitive| primitive.promote().into())
        }
        UnaryOperator::LogicalNot => Type::Primitive(Primitive::Bool),
        UnaryOperator::Dereference => match operand.unqualified() {
            Type::Pointer(pointee) => (**pointee).clone(),
            _ => Type::Problem,
        },
        UnaryOperator::AddressOf => Type::pointer(operand),
        UnaryOperator::PreIncrement
        | UnaryOperator::PreDecrement
        | UnaryOperator::PostIncrement
        | UnaryOperator::PostDecrement => operand,
        UnaryOperator::SizeofPack => Type::Primitive(Primitive::SIZE_T),
    }
}

fn binary_type(binary: &Binary, scope: &dyn Scope) -> Type {
    let operator = binary.operator();

    if operator.is_boolean() {
        return Type::Primitive(Primitive::Bool);
    }

    let lhs = binary.lhs().type_or_function_set(scope);
    if operator.is_assignment() {
        return lhs;
    }

    let rhs = binary.rhs().type_or_function_set(scope);

    match (lhs.primitive(), rhs.primitive()) {
        (Some(lhs), _) if operator.is_shift() => lhs.promote().into(),
        (Some(lhs), Some(rhs)) if lhs.is_integral() && rhs.is_integral() => {
            lhs.usual_arithmetic_conversion(rhs).into()
        }
        _ => {
            log::debug!("no arithmetic conversion for `{lhs} {operator} {rhs}`");
            Type::Problem
        }
    }
}

fn conditional_type(conditional: &Conditional, scope: &dyn Scope) -> Type {
    let positive = conditional.positive().type_or_function_set(scope);
    let negative = conditional.negative().type_or_function_set(scope);

    if positive == negative {
        return positive;
    }

    match (positive.primitive(), negative.primitive()) {
        (Some(lhs), Some(rhs)) if lhs.is_integral() && rhs.is_integral() => {
            lhs.usual_arithmetic_conversion(rhs).into()
        }
        _ => positive,
    }
}

#[cfg(test)]
mod test;
