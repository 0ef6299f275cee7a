//! The runtime value a snapshot captures.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use indexmap::IndexMap;

use crate::Reflect;

/// Self-contained runtime value.
///
/// `Hash` uses `IndexMap` so keys stay unique and iteration follows insertion
/// order, which is the order the literal is written in.
#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Symbol(String),
    Array(Vec<Value>),
    Hash(IndexMap<Value, Value>),
    Date(NaiveDate),
    /// Timestamp with a fixed UTC offset.
    Time(DateTime<FixedOffset>),
    Object(Rc<dyn Reflect>),
}

impl Value {
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    /// Build a hash from key/value pairs. Later duplicates overwrite earlier
    /// values but keep the first key's position.
    pub fn from_pairs<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Hash(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn object(object: impl Reflect + 'static) -> Self {
        Value::Object(Rc::new(object))
    }

    /// Class name as the target language reports it. Used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Nil => "NilClass",
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Array(_) => "Array",
            Value::Hash(_) => "Hash",
            Value::Date(_) => "Date",
            Value::Time(_) => "Time",
            Value::Object(object) => object.class_name().unwrap_or("#<anonymous class>"),
        }
    }

    /// Identity of an object value, if this is one.
    pub fn object_id(&self) -> Option<usize> {
        match self {
            Value::Object(object) => Some(Rc::as_ptr(object) as *const () as usize),
            _ => None,
        }
    }
}

/// Object pairs currently being compared. Meeting a pair again means both
/// sides loop back the same way, so it compares equal.
type Comparing = Vec<(*const (), *const ())>;

fn values_eq(a: &Value, b: &Value, comparing: &mut Comparing) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| values_eq(x, y, comparing))
        }
        (Value::Hash(a), Value::Hash(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| {
                    b.get(key)
                        .is_some_and(|y| values_eq(x, y, comparing))
                })
        }
        (Value::Date(a), Value::Date(b)) => a == b,
        (Value::Time(a), Value::Time(b)) => a == b && a.offset() == b.offset(),
        (Value::Object(a), Value::Object(b)) => objects_eq(a, b, comparing),
        _ => false,
    }
}

fn objects_eq(a: &Rc<dyn Reflect>, b: &Rc<dyn Reflect>, comparing: &mut Comparing) -> bool {
    let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
    if pair.0 == pair.1 || comparing.contains(&pair) {
        return true;
    }
    if a.class_name() != b.class_name() {
        return false;
    }
    let named = a.attribute_names();
    let positional = a.positional_names();
    if named != b.attribute_names() || positional != b.positional_names() {
        return false;
    }
    comparing.push(pair);
    let equal = named
        .into_iter()
        .chain(positional)
        .flatten()
        .all(|name| match (a.field(&name), b.field(&name)) {
            (Some(x), Some(y)) => values_eq(&x, &y, comparing),
            (None, None) => true,
            _ => false,
        });
    comparing.pop();
    equal
}

/// Structural equality. Floats compare by bit pattern so `Value` can be a
/// hash key; objects compare by identity first, then class and fields.
/// Reference cycles terminate.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_eq(self, other, &mut Vec::new())
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Nil => {}
            Value::Bool(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) | Value::Symbol(s) => s.hash(state),
            Value::Array(items) => items.hash(state),
            // Map equality ignores order, so only the size is hashed.
            Value::Hash(map) => map.len().hash(state),
            Value::Date(date) => date.hash(state),
            Value::Time(time) => time.timestamp().hash(state),
            Value::Object(object) => object.class_name().hash(state),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(i: $ty) -> Self {
                    Value::Integer(i64::from(i))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Nil, Into::into)
    }
}

impl From<IndexMap<Value, Value>> for Value {
    fn from(map: IndexMap<Value, Value>) -> Self {
        Value::Hash(map)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(time: DateTime<FixedOffset>) -> Self {
        Value::Time(time)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(time: DateTime<Utc>) -> Self {
        Value::Time(time.into())
    }
}
