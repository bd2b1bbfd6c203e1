use cxxeval_term::{
    r#type::{Primitive, Type},
    value::Value,
    FunctionID,
};
use proptest::{
    prelude::Arbitrary, prop_assert, prop_assert_eq, proptest,
    test_runner::TestCaseError,
};

use crate::{
    arbitrary::Shape,
    constexpr::{
        ConstexprContext, ConstexprError, FunctionParameterMap,
        StepLimitExceeded, Unsupported, DEFAULT_STEP_LIMIT,
    },
    kind::{
        ArithmeticOperator, BinaryOperator, Binding, Conditional, FunctionCall,
        FunctionSet, InitializerList, TypeId, TypeOperator, UnaryOperator,
        UnaryTypeId,
    },
    scope::{Function, Table, Variable},
    Evaluation,
};

fn int() -> Type { Type::Primitive(Primitive::Int) }

fn call(function: FunctionID, arguments: Vec<Evaluation>) -> Evaluation {
    let callee =
        Evaluation::new(FunctionSet::new(vec![function], "f".to_string(), None));

    Evaluation::new(FunctionCall::new(callee, arguments))
}

/// Declares `constexpr int f(int n) { return n <= 0 ? 0 : f(n - 1) + 1; }`.
fn counting_function(table: &mut Table) -> FunctionID {
    let id = table.add_function(Function::new(
        "f".to_string(),
        vec![int()],
        int(),
        None,
        true,
    ));

    let n = || Evaluation::function_parameter(0, int());
    let body = Evaluation::new(Conditional::new(
        Evaluation::binary(BinaryOperator::LessEqual, n(), Evaluation::int(0)),
        Evaluation::int(0),
        Evaluation::binary(
            BinaryOperator::Add,
            call(id, vec![Evaluation::binary(
                BinaryOperator::Subtract,
                n(),
                Evaluation::int(1),
            )]),
            Evaluation::int(1),
        ),
    ));

    table.function_mut(id).unwrap().set_body(body);
    id
}

#[test]
fn recursion_within_budget() {
    let mut table = Table::default();
    let f = counting_function(&mut table);

    let mut context = ConstexprContext::new(&table);
    let value = call(f, vec![Evaluation::int(5)]).constant_value(&mut context);

    assert_eq!(value, Ok(Value::Integral(5)));
    assert!(context.steps_performed() > 0);
    assert!(!context.is_exhausted());
}

#[test]
fn runaway_recursion_exhausts_budget() {
    let mut table = Table::default();
    let f = counting_function(&mut table);

    let mut context = ConstexprContext::new(&table);
    let error = call(f, vec![Evaluation::int(2000)])
        .constant_value(&mut context)
        .unwrap_err();

    assert_eq!(
        error,
        ConstexprError::StepLimitExceeded(StepLimitExceeded {
            steps_performed: DEFAULT_STEP_LIMIT,
            limit: DEFAULT_STEP_LIMIT,
            call: Some(f),
        })
    );
    assert!(context.is_exhausted());

    // the public query reports the failure as an unknown value
    assert_eq!(call(f, vec![Evaluation::int(2000)]).value(&table), Value::Unknown);
}

#[test]
fn exhausted_context_refuses_steps() {
    let table = Table::default();
    let mut context = ConstexprContext::with_limit(&table, 2);

    assert!(context.record_step().is_ok());
    assert!(context.record_step().is_ok());
    assert_eq!(
        context.record_step(),
        Err(StepLimitExceeded { steps_performed: 2, limit: 2, call: None })
    );
    assert_eq!(context.steps_performed(), 2);
}

#[test]
fn short_circuit_skips_right_hand_side() {
    let table = Table::default();
    let division_by_zero = Evaluation::binary(
        BinaryOperator::Divide,
        Evaluation::int(1),
        Evaluation::int(0),
    );

    let or = Evaluation::binary(
        BinaryOperator::LogicalOr,
        Evaluation::boolean(true),
        division_by_zero.clone(),
    );
    assert_eq!(or.value(&table), Value::from(true));

    let and = Evaluation::binary(
        BinaryOperator::LogicalAnd,
        Evaluation::boolean(false),
        division_by_zero,
    );
    assert_eq!(and.value(&table), Value::from(false));
}

#[test]
fn division_by_zero_fails() {
    let table = Table::default();
    let division = Evaluation::binary(
        BinaryOperator::Modulo,
        Evaluation::int(7),
        Evaluation::int(0),
    );

    assert_eq!(
        division.constant_value(&mut ConstexprContext::new(&table)),
        Err(ConstexprError::Unsupported(Unsupported::DivisionByZero))
    );
    assert_eq!(division.value(&table), Value::Unknown);
}

#[test]
fn shift_by_width_fails() {
    let table = Table::default();
    let shift = Evaluation::binary(
        BinaryOperator::ShiftLeft,
        Evaluation::int(1),
        Evaluation::int(32),
    );

    assert_eq!(
        shift.constant_value(&mut ConstexprContext::new(&table)),
        Err(ConstexprError::Unsupported(Unsupported::InvalidShift))
    );

    let shift = Evaluation::binary(
        BinaryOperator::ShiftLeft,
        Evaluation::int(1),
        Evaluation::int(4),
    );
    assert_eq!(shift.value(&table), Value::Integral(16));
}

#[test]
fn arithmetic_wraps_to_the_type() {
    let table = Table::default();
    let overflow = Evaluation::binary(
        BinaryOperator::Add,
        Evaluation::int(i128::from(i32::MAX)),
        Evaluation::int(1),
    );

    assert_eq!(overflow.value(&table), Value::Integral(i128::from(i32::MIN)));
}

#[test]
fn only_the_taken_branch_is_evaluated() {
    let table = Table::default();
    let conditional = Evaluation::new(Conditional::new(
        Evaluation::boolean(true),
        Evaluation::int(1),
        Evaluation::binary(
            BinaryOperator::Divide,
            Evaluation::int(1),
            Evaluation::int(0),
        ),
    ));

    assert_eq!(conditional.value(&table), Value::Integral(1));
}

#[test]
fn non_constexpr_function() {
    let mut table = Table::default();
    let id = table.add_function(Function::new(
        "g".to_string(),
        vec![],
        int(),
        Some(Evaluation::int(1)),
        false,
    ));

    assert_eq!(
        call(id, Vec::new()).constant_value(&mut ConstexprContext::new(&table)),
        Err(ConstexprError::Unsupported(Unsupported::NonConstexprFunction(id)))
    );
}

#[test]
fn missing_definition() {
    let mut table = Table::default();
    let id = table.add_function(Function::new(
        "g".to_string(),
        vec![int()],
        int(),
        None,
        true,
    ));

    assert_eq!(
        call(id, vec![Evaluation::int(1)])
            .constant_value(&mut ConstexprContext::new(&table)),
        Err(ConstexprError::Unsupported(Unsupported::MissingDefinition(id)))
    );
}

#[test]
fn modifications_are_rejected() {
    let table = Table::default();
    let modification =
        Err(ConstexprError::Unsupported(Unsupported::Modification));

    for operator in [
        BinaryOperator::Assign,
        BinaryOperator::CompoundAssign(ArithmeticOperator::Add),
    ] {
        let assignment =
            Evaluation::binary(operator, Evaluation::int(1), Evaluation::int(2));

        assert_eq!(
            assignment.constant_value(&mut ConstexprContext::new(&table)),
            modification
        );
        assert!(!assignment.is_constant_expression(&table));
        assert_eq!(assignment.value(&table), Value::Unknown);
    }

    for operator in [
        UnaryOperator::PreIncrement,
        UnaryOperator::PreDecrement,
        UnaryOperator::PostIncrement,
        UnaryOperator::PostDecrement,
    ] {
        let mutation = Evaluation::unary(operator, Evaluation::int(1));

        assert_eq!(
            mutation.constant_value(&mut ConstexprContext::new(&table)),
            modification
        );
    }
}

#[test]
fn modification_inside_a_call_body() {
    let mut table = Table::default();
    let id = table.add_function(Function::new(
        "bump".to_string(),
        vec![int()],
        int(),
        Some(Evaluation::unary(
            UnaryOperator::PreIncrement,
            Evaluation::function_parameter(0, int()),
        )),
        true,
    ));

    assert_eq!(
        call(id, vec![Evaluation::int(4)])
            .constant_value(&mut ConstexprContext::new(&table)),
        Err(ConstexprError::Unsupported(Unsupported::Modification))
    );
}

#[test]
fn ambiguous_or_unviable_calls_are_unresolved() {
    let mut table = Table::default();
    let overload = |table: &mut Table| {
        table.add_function(Function::new(
            "h".to_string(),
            vec![int()],
            int(),
            Some(Evaluation::int(1)),
            true,
        ))
    };
    let first = overload(&mut table);
    let second = overload(&mut table);

    let set = |candidates| {
        Evaluation::new(FunctionSet::new(candidates, "h".to_string(), None))
    };
    let unresolved =
        Err(ConstexprError::Unsupported(Unsupported::UnresolvedFunctionSet));

    // two candidates accept one argument
    let ambiguous = Evaluation::new(FunctionCall::new(
        set(vec![first, second]),
        vec![Evaluation::int(3)],
    ));
    assert_eq!(
        ambiguous.constant_value(&mut ConstexprContext::new(&table)),
        unresolved
    );

    // no candidate accepts two arguments
    let unviable = Evaluation::new(FunctionCall::new(
        set(vec![first]),
        vec![Evaluation::int(3), Evaluation::int(4)],
    ));
    assert_eq!(
        unviable.constant_value(&mut ConstexprContext::new(&table)),
        unresolved
    );
}

#[test]
fn arguments_are_converted_to_parameter_types() {
    let mut table = Table::default();
    let char_type = Type::Primitive(Primitive::SignedChar);
    let id = table.add_function(Function::new(
        "narrow".to_string(),
        vec![char_type.clone()],
        int(),
        Some(Evaluation::function_parameter(0, char_type)),
        true,
    ));

    assert_eq!(
        call(id, vec![Evaluation::int(300)]).value(&table),
        Value::Integral(44)
    );
}

#[test]
fn constant_variables() {
    let mut table = Table::default();
    let constant = table.add_variable(Variable::new(
        "N".to_string(),
        Type::Const(Box::new(int())),
        Some(Evaluation::int(12)),
        false,
    ));
    let mutable = table.add_variable(Variable::new(
        "m".to_string(),
        int(),
        Some(Evaluation::int(12)),
        false,
    ));

    let read = |id| {
        Evaluation::new(Binding::Variable {
            id,
            ty: Type::Const(Box::new(int())),
        })
    };

    assert!(read(constant).is_constant_expression(&table));
    assert_eq!(read(constant).value(&table), Value::Integral(12));

    assert!(!read(mutable).is_constant_expression(&table));
    assert_eq!(read(mutable).value(&table), Value::Unknown);
}

#[test]
fn type_traits_and_sizes() {
    let table = Table::default();

    let size = Evaluation::new(UnaryTypeId::new(TypeOperator::SizeOf, int()));
    assert_eq!(size.value(&table), Value::Integral(4));

    let pointer = Evaluation::new(UnaryTypeId::new(
        TypeOperator::IsPointer,
        Type::pointer(int()),
    ));
    assert_eq!(pointer.value(&table), Value::from(true));

    let signed = Evaluation::new(UnaryTypeId::new(
        TypeOperator::IsSigned,
        Type::Primitive(Primitive::UnsignedInt),
    ));
    assert_eq!(signed.value(&table), Value::from(false));
}

#[test]
fn value_initialization_and_lists() {
    let table = Table::default();

    let zero = Evaluation::new(TypeId::new(int(), Vec::new()));
    assert_eq!(zero.value(&table), Value::Integral(0));

    let list = Evaluation::new(InitializerList::new(vec![
        Evaluation::int(1),
        Evaluation::int(2),
    ]));
    assert_eq!(
        list.value(&table),
        Value::Composite(vec![Value::Integral(1), Value::Integral(2)])
    );
}

#[test]
fn unbound_parameters_are_left_in_place() {
    let table = Table::default();
    let parameter = Evaluation::function_parameter(0, int());
    let sum = Evaluation::binary(
        BinaryOperator::Add,
        parameter,
        Evaluation::int(1),
    );

    let computed = sum
        .compute_for_function_call(
            &FunctionParameterMap::default(),
            &mut ConstexprContext::new(&table),
        )
        .unwrap();
    assert_eq!(computed, sum);

    let computed = sum
        .compute_for_function_call(
            &std::iter::once(Evaluation::int(41)).collect(),
            &mut ConstexprContext::new(&table),
        )
        .unwrap();
    assert_eq!(computed.fixed_integral(), Some(42));
}

#[test]
fn dependent_expression_has_no_constant_value() {
    let table = Table::default();
    let shape = Shape::Parameter(0);

    assert_eq!(
        shape.template().constant_value(&mut ConstexprContext::new(&table)),
        Err(ConstexprError::Unsupported(Unsupported::DependentOperand))
    );
    assert_eq!(shape.template().value(&table), Value::Dependent);
}

fn check_step_limit(limit: usize) -> Result<(), TestCaseError> {
    let mut table = Table::default();
    let f = counting_function(&mut table);

    let mut context = ConstexprContext::with_limit(&table, limit);
    let result = call(f, vec![Evaluation::int(100_000)])
        .constant_value(&mut context);

    prop_assert_eq!(
        result,
        Err(ConstexprError::StepLimitExceeded(StepLimitExceeded {
            steps_performed: limit,
            limit,
            call: Some(f),
        }))
    );
    prop_assert_eq!(context.steps_performed(), limit);

    Ok(())
}

proptest! {
    #[test]
    fn step_limit_is_exact(limit in 3..4096_usize) {
        check_step_limit(limit)?;
    }

    #[test]
    fn constant_trees_have_known_values(shape in Shape::arbitrary_with(false)) {
        let table = Table::default();
        let tree = shape.substituted();

        prop_assert!(tree.is_constant_expression(&table));
        prop_assert!(tree.value(&table).integral().is_some());
    }
}
