use crate::{
    r#type::{Primitive, Type},
    value::Value,
};

#[test]
fn convert_truncates_to_width() {
    let value = Value::Integral(300);

    assert_eq!(
        value.convert_to(&Type::Primitive(Primitive::UnsignedChar)),
        Value::Integral(44)
    );
    assert_eq!(
        value.convert_to(&Type::Primitive(Primitive::SignedChar)),
        Value::Integral(44)
    );
    assert_eq!(
        Value::Integral(200).convert_to(&Type::Primitive(Primitive::SignedChar)),
        Value::Integral(-56)
    );
    assert_eq!(
        Value::Integral(-1).convert_to(&Type::Primitive(Primitive::UnsignedInt)),
        Value::Integral(4_294_967_295)
    );
    assert_eq!(
        Value::Integral(7).convert_to(&Type::Primitive(Primitive::Bool)),
        Value::Integral(1)
    );
    assert_eq!(
        Value::Integral(7).convert_to(&Type::Primitive(Primitive::Void)),
        Value::Unknown
    );
}

#[test]
fn composite_knowledge() {
    let known = Value::Composite(vec![Value::Integral(1), Value::Integral(2)]);
    let dependent = Value::Composite(vec![Value::Integral(1), Value::Dependent]);

    assert!(known.is_known());
    assert!(!known.is_dependent());
    assert!(!dependent.is_known());
    assert!(dependent.is_dependent());
    assert_eq!(known.to_string(), "{1, 2}");
}
