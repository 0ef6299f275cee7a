use indexmap::IndexMap;
use serde::Serialize;

use crate::{CaptureError, Convention, Record, Reflect, Value, to_value};

#[derive(Serialize)]
struct Person {
    first_name: &'static str,
    age: u32,
    nickname: Option<&'static str>,
}

#[derive(Serialize)]
struct Point(i32, i32);

#[derive(Serialize)]
struct Meters(f64);

#[derive(Serialize)]
struct Marker;

#[derive(Serialize)]
enum Shape {
    Empty,
    Circle(f64),
    Segment(i32, i32),
    Rect { width: u8, height: u8 },
}

fn record(value: &Value) -> &dyn Reflect {
    match value {
        Value::Object(object) => object.as_ref(),
        other => panic!("expected an object, got {other:?}"),
    }
}

#[test]
fn primitives() {
    assert_eq!(to_value(&true).unwrap(), Value::Bool(true));
    assert_eq!(to_value(&-7i8).unwrap(), Value::Integer(-7));
    assert_eq!(to_value(&2.5f64).unwrap(), Value::Float(2.5));
    assert_eq!(to_value(&'x').unwrap(), Value::String("x".into()));
    assert_eq!(to_value("hi").unwrap(), Value::String("hi".into()));
    assert_eq!(to_value(&()).unwrap(), Value::Nil);
    assert_eq!(to_value(&None::<i32>).unwrap(), Value::Nil);
    assert_eq!(to_value(&Some(3)).unwrap(), Value::Integer(3));
}

#[test]
fn unsigned_overflow_is_reported() {
    assert_eq!(to_value(&(i64::MAX as u64)).unwrap(), Value::Integer(i64::MAX));

    let err = to_value(&u64::MAX).unwrap_err();
    assert_eq!(err, CaptureError::IntegerOverflow(u64::MAX.to_string()));
    insta::assert_snapshot!(err, @"integer 18446744073709551615 does not fit in a 64-bit signed integer");
}

#[test]
fn sequences_and_tuples_become_arrays() {
    let expected = Value::Array(vec![1.into(), 2.into(), 3.into()]);
    assert_eq!(to_value(&vec![1, 2, 3]).unwrap(), expected);
    assert_eq!(to_value(&(1, 2, 3)).unwrap(), expected);
}

#[test]
fn maps_keep_insertion_order() {
    let mut map = IndexMap::new();
    map.insert("b", 1);
    map.insert("a", 2);

    let Value::Hash(hash) = to_value(&map).unwrap() else {
        panic!("expected a hash");
    };
    let keys: Vec<_> = hash.keys().cloned().collect();
    assert_eq!(keys, vec![Value::from("b"), Value::from("a")]);
}

#[test]
fn struct_becomes_named_record() {
    let value = to_value(&Person {
        first_name: "John",
        age: 42,
        nickname: None,
    })
    .unwrap();

    let object = record(&value);
    assert_eq!(object.class_name(), Some("Person"));
    assert_eq!(
        object.attribute_names(),
        Some(vec!["first_name".into(), "age".into(), "nickname".into()])
    );
    assert_eq!(object.positional_names(), None);
    assert_eq!(object.field("age"), Some(Value::Integer(42)));
    assert_eq!(object.field("nickname"), Some(Value::Nil));
}

#[test]
fn tuple_structs_become_positional_records() {
    let point = to_value(&Point(1, 2)).unwrap();
    let object = record(&point);
    assert_eq!(object.class_name(), Some("Point"));
    assert_eq!(object.positional_names(), Some(vec!["0".into(), "1".into()]));
    assert_eq!(object.field("1"), Some(Value::Integer(2)));

    let meters = to_value(&Meters(1.5)).unwrap();
    assert_eq!(record(&meters).field("0"), Some(Value::Float(1.5)));

    let marker = to_value(&Marker).unwrap();
    assert_eq!(record(&marker).positional_names(), Some(vec![]));
}

#[test]
fn enum_variants() {
    assert_eq!(to_value(&Shape::Empty).unwrap(), Value::symbol("Empty"));
    assert_eq!(
        to_value(&Shape::Circle(1.0)).unwrap(),
        Value::from_pairs([(Value::symbol("Circle"), Value::Float(1.0))])
    );
    assert_eq!(
        to_value(&Shape::Segment(1, 2)).unwrap(),
        Value::from_pairs([(Value::symbol("Segment"), vec![1, 2])])
    );

    let rect = to_value(&Shape::Rect {
        width: 3,
        height: 4,
    })
    .unwrap();
    let expected = Record::named("Shape::Rect")
        .with("width", 3u8)
        .with("height", 4u8)
        .into_value();
    assert_eq!(rect, expected);
}

#[test]
fn captured_record_equals_hand_built_one() {
    let captured = to_value(&Point(1, 2)).unwrap();
    let built = Record::positional("Point").with("0", 1).with("1", 2).into_value();
    assert_eq!(captured, built);

    let anonymous = Record::anonymous(Convention::Positional)
        .with("0", 1)
        .with("1", 2)
        .into_value();
    assert_ne!(captured, anonymous);
}
