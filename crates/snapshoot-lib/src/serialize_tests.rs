use std::cell::RefCell;
use std::rc::Rc;

use chrono::{FixedOffset, NaiveDate, TimeZone};
use serde::Serialize;
use snapshoot_core::{Convention, Record, Reflect, Value, to_value};

use crate::Error;
use crate::inject::Injector;
use crate::literal::Literal;
use crate::serialize::{FnHandler, Handler, Registry, Serializer};

fn print(value: impl Into<Value>) -> String {
    Serializer::new(Registry::builtin())
        .serialize(&value.into())
        .unwrap()
        .to_string()
}

#[test]
fn scalars() {
    assert_eq!(print(42), "42");
    assert_eq!(print(-1.25), "-1.25");
    assert_eq!(print("hi"), r#""hi""#);
    assert_eq!(print(Value::symbol("ok")), ":ok");
    assert_eq!(print(true), "true");
    assert_eq!(print(Value::Nil), "nil");
    assert_eq!(print(f64::NAN), "Float::NAN");
    assert_eq!(print(f64::NEG_INFINITY), "-Float::INFINITY");
}

#[test]
fn collections() {
    let value = Value::from_pairs([
        (Value::symbol("ids"), Value::from(vec![1, 2])),
        (Value::from("name"), Value::from("Jo")),
    ]);

    insta::assert_snapshot!(print(value), @r#"{ ids: [1, 2], "name" => "Jo" }"#);
}

#[test]
fn dates_and_times() {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let offset = FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
    let time = offset.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    assert_eq!(print(date), "Date.new(2024, 2, 29)");
    assert_eq!(print(time), r#"Time.new(2024, 1, 2, 3, 4, 5, "-05:30")"#);
}

#[test]
fn named_fields_object() {
    let person = Record::named("People::Person")
        .with("name", "Jo")
        .with("age", 33);

    insta::assert_snapshot!(print(person), @r#"People::Person.new({ name: "Jo", age: 33 })"#);
}

#[test]
fn positional_fields_object() {
    let point = Record::positional("Point").with("x", 1).with("y", -2);

    assert_eq!(print(point), "Point.new(1, -2)");
    assert_eq!(print(Record::named("Empty")), "Empty.new");
}

#[derive(Serialize)]
struct Invoice {
    number: u32,
    lines: Vec<Line>,
}

#[derive(Serialize)]
struct Line(&'static str, i64);

#[test]
fn serde_captured_structs() {
    let invoice = Invoice {
        number: 7,
        lines: vec![Line("tea", 300)],
    };

    let value = to_value(&invoice).unwrap();

    insta::assert_snapshot!(print(value), @r#"Invoice.new({ number: 7, lines: [Line.new("tea", 300)] })"#);
}

#[test]
fn unsupported_value_lists_handlers() {
    let serializer = Serializer::new(Registry::builtin());
    let anonymous = Record::anonymous(Convention::Named).with("a", 1).into_value();

    let err = serializer.serialize(&anonymous).unwrap_err();

    insta::assert_snapshot!(err, @"cannot serialize #<anonymous class>: no handler among [Literal, Singleton, Array, Hash, Date, Time, NamedFields, PositionalFields]");
}

#[test]
fn unsupported_nested_value() {
    let serializer = Serializer::new(Registry::new());

    let err = serializer.serialize(&Value::from(1)).unwrap_err();

    assert!(matches!(
        err,
        Error::UnsupportedValue { ref type_name, ref handlers } if type_name == "Integer" && handlers.is_empty()
    ));
}

#[test]
fn custom_handler_takes_precedence() {
    let mut registry = Registry::builtin();
    registry.insert(
        0,
        FnHandler::new(
            "Money",
            |v| matches!(v, Value::Object(o) if o.class_name() == Some("Money")),
            |v, cx| {
                let Value::Object(o) = v else {
                    unreachable!()
                };
                let cents = cx.serialize(&o.field("cents").unwrap_or(Value::Nil))?;
                Ok(Literal::send(Literal::constant("Money"), "from_cents", vec![cents]))
            },
        ),
    );
    let money = Record::named("Money").with("cents", 150).into_value();

    let literal = Serializer::new(registry).serialize(&money).unwrap();

    assert_eq!(literal.to_string(), "Money.from_cents(150)");
}

#[test]
fn registry_names_keep_order() {
    let mut registry = Registry::new();
    assert!(registry.is_empty());
    registry.push(FnHandler::new("A", |_| false, |_, _| Ok(Literal::Nil)));
    registry.insert(0, FnHandler::new("B", |_| true, |_, _| Ok(Literal::True)));

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names(), ["B", "A"]);
    assert_eq!(registry.find(&Value::Nil).map(Handler::name), Some("B"));
}

#[test]
fn recursion_limit() {
    let mut value = Value::from(1);
    for _ in 0..10 {
        value = Value::from(vec![value]);
    }
    let serializer = Serializer::new(Registry::builtin()).with_recursion_limit(5);

    let err = serializer.serialize(&value).unwrap_err();

    assert!(matches!(err, Error::RecursionLimitExceeded { limit: 5 }));
    assert!(
        Serializer::new(Registry::builtin())
            .with_recursion_limit(11)
            .serialize(&value)
            .is_ok()
    );
}

/// Node whose `next` field can point back at itself.
#[derive(Debug)]
struct Node {
    next: RefCell<Option<Value>>,
}

impl Reflect for Node {
    fn class_name(&self) -> Option<&str> {
        Some("Node")
    }

    fn attribute_names(&self) -> Option<Vec<String>> {
        Some(vec!["next".to_owned()])
    }

    fn field(&self, name: &str) -> Option<Value> {
        (name == "next").then(|| self.next.borrow().clone().unwrap_or(Value::Nil))
    }
}

#[test]
fn cycles_are_rejected() {
    let node = Rc::new(Node {
        next: RefCell::new(None),
    });
    let value = Value::Object(node.clone());
    *node.next.borrow_mut() = Some(value.clone());

    let err = Serializer::new(Registry::builtin())
        .serialize(&value)
        .unwrap_err();

    assert!(matches!(err, Error::CyclicValue { ref type_name } if type_name == "Node"));
    node.next.borrow_mut().take();
}

#[test]
fn shared_values_are_not_cycles() {
    let shared = Record::positional("Point").with("x", 1).into_value();
    let value = Value::from(vec![shared.clone(), shared]);

    assert_eq!(print(value), "[Point.new(1), Point.new(1)]");
}

#[test]
fn printed_literals_read_back_unchanged() {
    let injector =
        Injector::new(snapshoot_langs::ruby(), "match_snapshot", Registry::builtin()).unwrap();
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let values = [
        Value::from(tokyo.with_ymd_and_hms(2021, 12, 25, 5, 0, 0).unwrap()),
        Value::from(NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()),
        Record::positional("Geo::Point").with("x", 1).with("y", -2.5).into_value(),
        Record::named("Tag")
            .with("class", "big")
            .with("full name", Value::symbol("a b"))
            .with("if", Value::Nil)
            .into_value(),
        Record::named("Empty").into_value(),
        Value::from(f64::NAN),
        Value::from(f64::INFINITY),
        Value::from(f64::NEG_INFINITY),
        Value::from(-0.5),
        Value::from_pairs([
            (Value::from("name"), Value::from(1)),
            (Value::from(2), Value::from(3)),
            (Value::symbol("if"), Value::from(4)),
            (Value::symbol("ok"), Value::from(5)),
        ]),
        Value::from(vec![
            Value::symbol("a b"),
            Value::symbol("foo="),
            Value::symbol("+"),
        ]),
        Value::from("tab\tquote\"hash#{x}"),
        Value::from(vec![
            Value::Array(Vec::new()),
            Value::Hash(Default::default()),
        ]),
    ];

    for value in &values {
        let printed = injector.literal_for(value);
        assert!(printed.is_ok(), "{value:?}: {printed:?}");
    }
}
