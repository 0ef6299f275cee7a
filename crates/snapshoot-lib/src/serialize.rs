//! Runtime values to literal trees.
//!
//! Serialization dispatches through an ordered [`Registry`] of handlers. The
//! first handler whose `supports` accepts a value converts it; handlers recurse
//! into nested values through the [`Context`].

use chrono::{Datelike, Timelike};
use snapshoot_core::{Reflect, Value};
use tracing::trace;

use crate::literal::{Literal, Pair};
use crate::{Error, Result};

/// Default nesting limit for serialized values.
pub const DEFAULT_RECURSION_LIMIT: usize = 1024;

/// Converts one kind of value into a literal.
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;
    fn supports(&self, value: &Value) -> bool;
    fn to_literal(&self, value: &Value, cx: &mut Context<'_>) -> Result<Literal>;
}

type Predicate = dyn Fn(&Value) -> bool + Send + Sync;
type Convert = dyn Fn(&Value, &mut Context<'_>) -> Result<Literal> + Send + Sync;

/// Handler built from a predicate and a conversion function.
pub struct FnHandler {
    name: String,
    supports: Box<Predicate>,
    convert: Box<Convert>,
}

impl FnHandler {
    pub fn new<P, C>(name: impl Into<String>, supports: P, convert: C) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
        C: Fn(&Value, &mut Context<'_>) -> Result<Literal> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            supports: Box::new(supports),
            convert: Box::new(convert),
        }
    }
}

impl Handler for FnHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, value: &Value) -> bool {
        (self.supports)(value)
    }

    fn to_literal(&self, value: &Value, cx: &mut Context<'_>) -> Result<Literal> {
        (self.convert)(value, cx)
    }
}

/// Ordered handler list. Earlier handlers win.
#[derive(Default)]
pub struct Registry {
    handlers: Vec<Box<dyn Handler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers for every value kind the core model has.
    ///
    /// Named-field objects are tried before positional ones, so a class
    /// exposing both conventions serializes with keyword arguments.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.push(FnHandler::new("Literal", is_scalar, scalar));
        registry.push(FnHandler::new("Singleton", is_singleton, singleton));
        registry.push(FnHandler::new(
            "Array",
            |v| matches!(v, Value::Array(_)),
            array,
        ));
        registry.push(FnHandler::new(
            "Hash",
            |v| matches!(v, Value::Hash(_)),
            hash,
        ));
        registry.push(FnHandler::new("Date", |v| matches!(v, Value::Date(_)), date));
        registry.push(FnHandler::new("Time", |v| matches!(v, Value::Time(_)), time));
        registry.push(FnHandler::new(
            "NamedFields",
            |v| named_class(v).is_some(),
            named_fields,
        ));
        registry.push(FnHandler::new(
            "PositionalFields",
            |v| positional_class(v).is_some(),
            positional_fields,
        ));
        registry
    }

    pub fn push(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Place a handler at `index`, ahead of everything after it.
    ///
    /// # Panics
    /// If `index > len`.
    pub fn insert(&mut self, index: usize, handler: impl Handler + 'static) {
        self.handlers.insert(index, Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers.iter().map(|h| h.name().to_owned()).collect()
    }

    pub fn find(&self, value: &Value) -> Option<&dyn Handler> {
        self.handlers
            .iter()
            .find(|h| h.supports(value))
            .map(|h| h.as_ref())
    }
}

pub struct Serializer {
    registry: Registry,
    recursion_limit: usize,
}

impl Serializer {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn serialize(&self, value: &Value) -> Result<Literal> {
        Context {
            serializer: self,
            depth: 0,
            path: Vec::new(),
        }
        .serialize(value)
    }
}

/// State of one serialization: nesting depth and the objects being visited.
pub struct Context<'a> {
    serializer: &'a Serializer,
    depth: usize,
    path: Vec<usize>,
}

impl Context<'_> {
    /// Serialize a nested value.
    pub fn serialize(&mut self, value: &Value) -> Result<Literal> {
        let serializer = self.serializer;
        let limit = serializer.recursion_limit;
        if self.depth >= limit {
            return Err(Error::RecursionLimitExceeded { limit });
        }

        let registry = &serializer.registry;
        let Some(handler) = registry.find(value) else {
            return Err(Error::UnsupportedValue {
                type_name: value.type_name().to_owned(),
                handlers: registry.names(),
            });
        };
        trace!(handler = handler.name(), value = value.type_name(), "serializing");

        let id = value.object_id();
        if let Some(id) = id {
            if self.path.contains(&id) {
                return Err(Error::CyclicValue {
                    type_name: value.type_name().to_owned(),
                });
            }
            self.path.push(id);
        }

        self.depth += 1;
        let literal = handler.to_literal(value, self);
        self.depth -= 1;
        if id.is_some() {
            self.path.pop();
        }
        literal
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Integer(_) | Value::Float(_) | Value::String(_) | Value::Symbol(_)
    )
}

fn scalar(value: &Value, _: &mut Context<'_>) -> Result<Literal> {
    Ok(match value {
        Value::Integer(i) => Literal::Integer(*i),
        Value::Float(x) if x.is_nan() => Literal::constant("Float::NAN"),
        Value::Float(x) if x.is_infinite() && *x > 0.0 => Literal::constant("Float::INFINITY"),
        Value::Float(x) if x.is_infinite() => {
            Literal::Neg(Box::new(Literal::constant("Float::INFINITY")))
        }
        Value::Float(x) => Literal::Float(*x),
        Value::String(s) => Literal::String(s.clone()),
        Value::Symbol(s) => Literal::Symbol(s.clone()),
        _ => return Err(mismatch("Literal", value)),
    })
}

fn is_singleton(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Nil)
}

fn singleton(value: &Value, _: &mut Context<'_>) -> Result<Literal> {
    Ok(match value {
        Value::Bool(true) => Literal::True,
        Value::Bool(false) => Literal::False,
        Value::Nil => Literal::Nil,
        _ => return Err(mismatch("Singleton", value)),
    })
}

fn array(value: &Value, cx: &mut Context<'_>) -> Result<Literal> {
    let Value::Array(items) = value else {
        return Err(mismatch("Array", value));
    };
    items
        .iter()
        .map(|item| cx.serialize(item))
        .collect::<Result<_>>()
        .map(Literal::Array)
}

fn hash(value: &Value, cx: &mut Context<'_>) -> Result<Literal> {
    let Value::Hash(entries) = value else {
        return Err(mismatch("Hash", value));
    };
    entries
        .iter()
        .map(|(key, value)| Ok(Pair::new(cx.serialize(key)?, cx.serialize(value)?)))
        .collect::<Result<_>>()
        .map(Literal::Hash)
}

fn date(value: &Value, _: &mut Context<'_>) -> Result<Literal> {
    let Value::Date(date) = value else {
        return Err(mismatch("Date", value));
    };
    let args = [date.year(), date.month() as i32, date.day() as i32]
        .into_iter()
        .map(|n| Literal::Integer(n.into()))
        .collect();
    Ok(Literal::send(Literal::constant("Date"), "new", args))
}

/// `Time.new(y, m, d, h, min, s, "+HH:MM")`. Sub-second precision is dropped.
fn time(value: &Value, _: &mut Context<'_>) -> Result<Literal> {
    let Value::Time(time) = value else {
        return Err(mismatch("Time", value));
    };
    let mut args: Vec<_> = [
        time.year(),
        time.month() as i32,
        time.day() as i32,
        time.hour() as i32,
        time.minute() as i32,
        time.second() as i32,
    ]
    .into_iter()
    .map(|n| Literal::Integer(n.into()))
    .collect();
    args.push(Literal::String(utc_offset(time.offset().local_minus_utc())));
    Ok(Literal::send(Literal::constant("Time"), "new", args))
}

fn utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

fn object(value: &Value) -> Option<&dyn Reflect> {
    match value {
        Value::Object(object) => Some(object.as_ref()),
        _ => None,
    }
}

/// Class name and attribute names of a named-field object.
fn named_class(value: &Value) -> Option<(&str, Vec<String>)> {
    let object = object(value)?;
    Some((object.class_name()?, object.attribute_names()?))
}

fn positional_class(value: &Value) -> Option<(&str, Vec<String>)> {
    let object = object(value)?;
    Some((object.class_name()?, object.positional_names()?))
}

fn field(value: &Value, name: &str) -> Value {
    object(value)
        .and_then(|object| object.field(name))
        .unwrap_or(Value::Nil)
}

/// `Class.new({ attr: value, ... })`, keys in declared attribute order.
fn named_fields(value: &Value, cx: &mut Context<'_>) -> Result<Literal> {
    let (class, names) = named_class(value).ok_or_else(|| mismatch("NamedFields", value))?;
    let pairs = names
        .iter()
        .map(|name| {
            let value = cx.serialize(&field(value, name))?;
            Ok(Pair::new(Literal::Symbol(name.clone()), value))
        })
        .collect::<Result<Vec<_>>>()?;
    let args = if pairs.is_empty() {
        Vec::new()
    } else {
        vec![Literal::Hash(pairs)]
    };
    Ok(Literal::send(Literal::constant(class), "new", args))
}

/// `Class.new(a, b, ...)`, one argument per declared field.
fn positional_fields(value: &Value, cx: &mut Context<'_>) -> Result<Literal> {
    let (class, names) =
        positional_class(value).ok_or_else(|| mismatch("PositionalFields", value))?;
    let args = names
        .iter()
        .map(|name| cx.serialize(&field(value, name)))
        .collect::<Result<_>>()?;
    Ok(Literal::send(Literal::constant(class), "new", args))
}

/// A handler was called with a value its predicate rejects.
fn mismatch(handler: &str, value: &Value) -> Error {
    Error::UnsupportedValue {
        type_name: value.type_name().to_owned(),
        handlers: vec![handler.to_owned()],
    }
}
