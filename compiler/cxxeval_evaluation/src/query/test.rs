use cxxeval_term::{
    r#type::{Primitive, Type},
    signature::Marshal,
    template::{
        TemplateArgument, TemplateParameter, TemplateParameterID,
        TemplateParameterMap,
    },
    value::Value,
    ValueCategory,
};
use proptest::{prelude::Arbitrary, prop_assert, prop_assert_eq, proptest};

use crate::{
    arbitrary::Shape,
    kind::{
        BinaryOperator, Binding, Comma, Conditional, FunctionCall, FunctionSet,
        InitializerList, ParameterPack, TypeOperator, UnaryOperator,
        UnaryTypeId,
    },
    scope::{Function, Table},
    Evaluation,
};

fn int() -> Type { Type::Primitive(Primitive::Int) }

fn non_type_parameter(index: u32) -> Evaluation {
    Evaluation::new(Binding::TemplateParameter {
        parameter: TemplateParameter::new(
            TemplateParameterID::new(0, index),
            false,
        ),
        ty: int(),
    })
}

fn type_parameter(index: u32) -> Type {
    Type::Parameter(TemplateParameter::new(
        TemplateParameterID::new(0, index),
        false,
    ))
}

#[test]
fn instantiated_sum_has_a_value() {
    let table = Table::default();
    let sum = Evaluation::binary(
        BinaryOperator::Add,
        non_type_parameter(0),
        Evaluation::int(1),
    );

    assert_eq!(sum.value(&table), Value::Dependent);
    assert!(sum.is_constant_expression(&table));

    let mut map = TemplateParameterMap::default();
    map.insert(TemplateParameterID::new(0, 0), TemplateArgument::NonType {
        value: Value::Integral(5),
        r#type: int(),
    })
    .unwrap();

    let instantiated = sum.instantiate_with(&map, &table);

    assert!(!instantiated.is_value_dependent());
    assert_eq!(instantiated.value(&table), Value::Integral(6));
    assert_eq!(instantiated.type_or_function_set(&table), int());
}

#[test]
fn arithmetic_types() {
    let table = Table::default();
    let long = Evaluation::fixed(
        Type::Primitive(Primitive::Long),
        Value::Integral(2),
    );

    let sum = Evaluation::binary(BinaryOperator::Add, Evaluation::int(1), long);
    assert_eq!(
        sum.type_or_function_set(&table),
        Type::Primitive(Primitive::Long)
    );

    let comparison = Evaluation::binary(
        BinaryOperator::Less,
        Evaluation::int(1),
        Evaluation::int(2),
    );
    assert_eq!(
        comparison.type_or_function_set(&table),
        Type::Primitive(Primitive::Bool)
    );

    let promoted = Evaluation::unary(UnaryOperator::Minus, Evaluation::boolean(true));
    assert_eq!(promoted.type_or_function_set(&table), int());

    let size = Evaluation::new(UnaryTypeId::new(TypeOperator::SizeOf, int()));
    assert_eq!(
        size.type_or_function_set(&table),
        Type::Primitive(Primitive::SIZE_T)
    );
}

#[test]
fn dependent_type_is_identified_by_signature() {
    let table = Table::default();
    let element = |index| {
        Evaluation::new(Binding::FunctionParameter {
            position: 0,
            ty: type_parameter(index),
            is_pack: false,
        })
    };

    let sum = |index| {
        Evaluation::binary(BinaryOperator::Add, element(index), Evaluation::int(1))
    };

    assert_eq!(
        sum(0).type_or_function_set(&table),
        Type::DependentExpression(sum(0).signature())
    );
    assert_eq!(
        sum(0).type_or_function_set(&table),
        sum(0).type_or_function_set(&table)
    );
    assert_ne!(
        sum(0).type_or_function_set(&table),
        sum(1).type_or_function_set(&table)
    );

    // the declared type is known even if it's dependent
    assert_eq!(element(0).type_or_function_set(&table), type_parameter(0));
}

#[test]
fn special_types() {
    let table = Table::default();

    let set = Evaluation::new(FunctionSet::new(Vec::new(), "f".to_string(), None));
    assert!(set.is_function_set());
    assert_eq!(set.type_or_function_set(&table), Type::FunctionSet);

    let list = Evaluation::new(InitializerList::new(vec![Evaluation::int(1)]));
    assert!(list.is_initializer_list());
    assert_eq!(list.type_or_function_set(&table), Type::InitializerList);

    let pack = Evaluation::new(ParameterPack::new(Evaluation::int(1)));
    assert_eq!(
        pack.type_or_function_set(&table),
        Type::PackExpansion(Box::new(int()))
    );

    let empty = Evaluation::new(Comma::new(Vec::new()));
    assert_eq!(
        empty.type_or_function_set(&table),
        Type::Primitive(Primitive::Void)
    );
}

#[test]
fn value_categories() {
    let mut table = Table::default();
    let reference = table.add_function(Function::new(
        "get".to_string(),
        Vec::new(),
        Type::lvalue_reference(int()),
        None,
        true,
    ));
    let moved = table.add_function(Function::new(
        "take".to_string(),
        vec![int()],
        Type::rvalue_reference(int()),
        None,
        true,
    ));

    let call = |function, arguments| {
        Evaluation::new(FunctionCall::new(
            Evaluation::new(FunctionSet::new(
                vec![function],
                "f".to_string(),
                None,
            )),
            arguments,
        ))
    };

    let lvalue = call(reference, Vec::new());
    assert_eq!(lvalue.value_category(&table), ValueCategory::LValue);
    assert_eq!(lvalue.type_or_function_set(&table), int());

    let xvalue = call(moved, vec![Evaluation::int(1)]);
    assert_eq!(xvalue.value_category(&table), ValueCategory::XValue);

    let parameter = Evaluation::function_parameter(0, int());
    assert_eq!(parameter.value_category(&table), ValueCategory::LValue);

    let assignment = Evaluation::binary(
        BinaryOperator::Assign,
        parameter.clone(),
        Evaluation::int(1),
    );
    assert_eq!(assignment.value_category(&table), ValueCategory::LValue);
    assert!(!assignment.is_constant_expression(&table));

    let mixed = Evaluation::new(Conditional::new(
        Evaluation::boolean(true),
        parameter,
        Evaluation::int(1),
    ));
    assert_eq!(mixed.value_category(&table), ValueCategory::PRValue);

    assert_eq!(Evaluation::int(1).value_category(&table), ValueCategory::PRValue);
}

#[test]
fn unresolved_call_is_a_problem() {
    let mut table = Table::default();
    let unary = table.add_function(Function::new(
        "f".to_string(),
        vec![int()],
        int(),
        None,
        true,
    ));
    let binary = table.add_function(Function::new(
        "f".to_string(),
        vec![int(), int()],
        int(),
        None,
        true,
    ));

    let call = |arguments| {
        Evaluation::new(FunctionCall::new(
            Evaluation::new(FunctionSet::new(
                vec![unary, binary],
                "f".to_string(),
                None,
            )),
            arguments,
        ))
    };

    assert_eq!(call(vec![Evaluation::int(1)]).type_or_function_set(&table), int());
    assert_eq!(call(Vec::new()).type_or_function_set(&table), Type::Problem);
}

proptest! {
    #[test]
    fn dependence_queries(shape in Shape::arbitrary_with(true)) {
        let table = Table::default();
        let tree = shape.template();

        prop_assert!(tree.is_constant_expression(&table));
        prop_assert_eq!(tree.is_value_dependent(), !shape.is_constant());
        prop_assert!(!tree.is_type_dependent());

        if tree.is_value_dependent() {
            prop_assert_eq!(tree.value(&table), Value::Dependent);
        }
    }
}
