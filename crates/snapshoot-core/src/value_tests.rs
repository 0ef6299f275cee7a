use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use chrono::{FixedOffset, NaiveDate, TimeZone};
use indexmap::IndexMap;

use crate::{Convention, Record, Reflect, Value};

fn hash_of(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn type_names() {
    assert_eq!(Value::Nil.type_name(), "NilClass");
    assert_eq!(Value::Bool(false).type_name(), "FalseClass");
    assert_eq!(Value::from(1.5).type_name(), "Float");
    assert_eq!(Value::symbol("a").type_name(), "Symbol");
    assert_eq!(Record::named("Person").into_value().type_name(), "Person");
    assert_eq!(
        Record::anonymous(Convention::Named).into_value().type_name(),
        "#<anonymous class>"
    );
}

#[test]
fn floats_compare_by_bits() {
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    assert_ne!(Value::Float(1.0), Value::Integer(1));
}

#[test]
fn hash_equality_ignores_order() {
    let a = Value::from_pairs([("x", 1), ("y", 2)]);
    let b = Value::from_pairs([("y", 2), ("x", 1)]);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn values_work_as_hash_keys() {
    let mut map = IndexMap::new();
    map.insert(Value::from(vec![1, 2]), "array");
    map.insert(Value::symbol("a"), "symbol");
    map.insert(Value::from("a"), "string");

    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&Value::symbol("a")), Some(&"symbol"));
    assert_eq!(map.get(&Value::from(vec![1, 2])), Some(&"array"));
}

#[test]
fn duplicate_keys_keep_first_position() {
    let Value::Hash(map) = Value::from_pairs([("a", 1), ("b", 2), ("a", 3)]) else {
        panic!("expected a hash");
    };
    let entries: Vec<_> = map.into_iter().collect();
    assert_eq!(
        entries,
        vec![(Value::from("a"), Value::from(3)), (Value::from("b"), Value::from(2))]
    );
}

#[test]
fn time_equality_includes_offset() {
    let utc = FixedOffset::east_opt(0).unwrap();
    let plus_one = FixedOffset::east_opt(3600).unwrap();
    let a = utc.with_ymd_and_hms(2021, 12, 25, 5, 0, 0).unwrap();
    let b = plus_one.with_ymd_and_hms(2021, 12, 25, 6, 0, 0).unwrap();

    assert_eq!(Value::Time(a), Value::Time(a));
    assert_ne!(Value::Time(a), Value::Time(b));
    assert_eq!(hash_of(&Value::Time(a)), hash_of(&Value::Time(b)));
}

#[test]
fn objects_compare_structurally() {
    let a = Record::named("Person").with("name", "Jo").into_value();
    let b = Record::named("Person").with("name", "Jo").into_value();
    let c = Record::named("Person").with("name", "Al").into_value();
    let d = Record::positional("Person").with("name", "Jo").into_value();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
    assert_ne!(a.object_id(), b.object_id());
    assert_eq!(a.object_id(), a.clone().object_id());
}

#[test]
fn conversions() {
    assert_eq!(Value::from(Some("x")), Value::from("x"));
    assert_eq!(Value::from(None::<i32>), Value::Nil);
    assert_eq!(Value::from(255u8), Value::Integer(255));
    assert_eq!(
        Value::from(NaiveDate::from_ymd_opt(1990, 6, 6).unwrap()).type_name(),
        "Date"
    );
}

#[derive(Debug)]
struct Node {
    label: i64,
    next: RefCell<Option<Value>>,
}

impl Reflect for Node {
    fn class_name(&self) -> Option<&str> {
        Some("Node")
    }

    fn attribute_names(&self) -> Option<Vec<String>> {
        Some(vec!["label".to_owned(), "next".to_owned()])
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "label" => Some(Value::from(self.label)),
            "next" => Some(self.next.borrow().clone().unwrap_or(Value::Nil)),
            _ => None,
        }
    }
}

fn looped(label: i64) -> (Rc<Node>, Value) {
    let node = Rc::new(Node {
        label,
        next: RefCell::new(None),
    });
    let value = Value::Object(node.clone());
    *node.next.borrow_mut() = Some(Value::from(vec![value.clone()]));
    (node, value)
}

#[test]
fn cyclic_objects_compare_without_overflow() {
    let (a_node, a) = looped(1);
    let (b_node, b) = looped(1);
    let (c_node, c) = looped(2);

    assert_eq!(a, b);
    assert_ne!(a, c);

    for node in [a_node, b_node, c_node] {
        node.next.take();
    }
}
