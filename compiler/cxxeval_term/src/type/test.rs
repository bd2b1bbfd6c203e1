use proptest::{prop_assert_eq, proptest};

use crate::{
    r#type::{Primitive, Type},
    template::{
        PackSize, TemplateArgument, TemplateParameter, TemplateParameterID,
        TemplateParameterMap,
    },
    value::Value,
    ValueCategory,
};

const ALL_PRIMITIVES: [Primitive; 14] = [
    Primitive::Void,
    Primitive::Bool,
    Primitive::Char,
    Primitive::SignedChar,
    Primitive::UnsignedChar,
    Primitive::Short,
    Primitive::UnsignedShort,
    Primitive::Int,
    Primitive::UnsignedInt,
    Primitive::Long,
    Primitive::UnsignedLong,
    Primitive::LongLong,
    Primitive::UnsignedLongLong,
    Primitive::NullPtr,
];

fn parameter(index: u32, is_pack: bool) -> Type {
    Type::Parameter(TemplateParameter::new(
        TemplateParameterID::new(0, index),
        is_pack,
    ))
}

#[test]
fn usual_arithmetic_conversion() {
    use Primitive::{Char, Int, Long, Short, UnsignedInt, UnsignedLong};

    assert_eq!(Char.usual_arithmetic_conversion(Short), Int);
    assert_eq!(Int.usual_arithmetic_conversion(Long), Long);
    assert_eq!(Int.usual_arithmetic_conversion(UnsignedInt), UnsignedInt);
    assert_eq!(Long.usual_arithmetic_conversion(UnsignedInt), Long);
    assert_eq!(Long.usual_arithmetic_conversion(UnsignedLong), UnsignedLong);
}

proptest! {
    #[test]
    fn usual_arithmetic_conversion_is_symmetric(
        // `void` and `nullptr_t` aren't arithmetic
        lhs in 1..ALL_PRIMITIVES.len() - 1,
        rhs in 1..ALL_PRIMITIVES.len() - 1,
    ) {
        let lhs = ALL_PRIMITIVES[lhs];
        let rhs = ALL_PRIMITIVES[rhs];

        prop_assert_eq!(
            lhs.usual_arithmetic_conversion(rhs),
            rhs.usual_arithmetic_conversion(lhs)
        );
    }
}

#[test]
fn instantiate_nested_parameter() {
    let mut map = TemplateParameterMap::default();
    map.insert(
        TemplateParameterID::new(0, 0),
        TemplateArgument::Type(Type::Primitive(Primitive::Long)),
    )
    .unwrap();

    let ty = Type::lvalue_reference(Type::Const(Box::new(parameter(0, false))));

    assert!(ty.is_dependent());
    assert_eq!(
        ty.instantiate(&map, None),
        Type::lvalue_reference(Type::Const(Box::new(Type::Primitive(
            Primitive::Long
        ))))
    );
}

#[test]
fn instantiate_pack_element() {
    let mut map = TemplateParameterMap::default();
    map.insert_pack(TemplateParameterID::new(0, 0), vec![
        TemplateArgument::Type(Type::Primitive(Primitive::Int)),
        TemplateArgument::Type(Type::Primitive(Primitive::Char)),
    ])
    .unwrap();

    let pack = parameter(0, true);

    assert_eq!(pack.instantiate(&map, None), pack);
    assert_eq!(
        pack.instantiate(&map, Some(1)),
        Type::Primitive(Primitive::Char)
    );
    assert_eq!(Type::pointer(pack.clone()).determine_pack_size(&map), PackSize::Count(2));
    assert_eq!(
        Type::PackExpansion(Box::new(pack)).determine_pack_size(&map),
        PackSize::NotFound
    );
}

#[test]
fn non_type_argument_for_type_parameter_is_a_problem() {
    let mut map = TemplateParameterMap::default();
    map.insert(TemplateParameterID::new(0, 0), TemplateArgument::NonType {
        value: Value::Integral(1),
        r#type: Type::Primitive(Primitive::Int),
    })
    .unwrap();

    assert_eq!(parameter(0, false).instantiate(&map, None), Type::Problem);
}

#[test]
fn sizes_and_categories() {
    assert_eq!(Type::Primitive(Primitive::Int).size_of(), Some(4));
    assert_eq!(Type::pointer(Type::Primitive(Primitive::Void)).size_of(), Some(8));
    assert_eq!(
        Type::lvalue_reference(Type::Primitive(Primitive::Short)).size_of(),
        Some(2)
    );
    assert_eq!(Type::Primitive(Primitive::Void).size_of(), None);
    assert_eq!(parameter(0, false).size_of(), None);

    assert_eq!(
        Type::lvalue_reference(Type::Primitive(Primitive::Int)).result_category(),
        ValueCategory::LValue
    );
    assert_eq!(
        Type::rvalue_reference(Type::Primitive(Primitive::Int)).result_category(),
        ValueCategory::XValue
    );
    assert_eq!(
        Type::Primitive(Primitive::Int).result_category(),
        ValueCategory::PRValue
    );
}
