//! Object conventions.
//!
//! An object is serializable when its class exposes an ordered list of field
//! names together with a matching constructor:
//! - **Named fields**: keyword-style constructor, `Person.new(name: "Jo")`
//! - **Positional fields**: positional constructor, `Point.new(1, 2)`
//!
//! A class may expose both; the serializer's handler order decides which wins.

use std::fmt;
use std::rc::Rc;

use crate::Value;

/// Reflection contract for host objects.
///
/// Fields are read lazily through [`Reflect::field`], so object graphs may be
/// cyclic. The serializer tracks the objects on its current path to detect that.
pub trait Reflect: fmt::Debug {
    /// Fully qualified class name (`Billing::Invoice`). `None` for anonymous classes.
    fn class_name(&self) -> Option<&str>;

    /// Ordered attribute names for the named-field convention.
    fn attribute_names(&self) -> Option<Vec<String>> {
        None
    }

    /// Ordered field names for the positional-field convention.
    fn positional_names(&self) -> Option<Vec<String>> {
        None
    }

    /// Current value of a field. `None` if the object has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

/// Which constructor convention a [`Record`] follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Convention {
    Named,
    Positional,
}

/// Plain object with ordered fields.
///
/// This is what [`to_value`](crate::to_value) produces for structs, and the
/// easiest way for a host to describe an object without implementing [`Reflect`].
#[derive(Clone, Debug)]
pub struct Record {
    class: Option<String>,
    convention: Convention,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Object whose class uses a keyword-style constructor.
    pub fn named(class: impl Into<String>) -> Self {
        Self::new(Some(class.into()), Convention::Named)
    }

    /// Object whose class uses a positional constructor.
    pub fn positional(class: impl Into<String>) -> Self {
        Self::new(Some(class.into()), Convention::Positional)
    }

    /// Object of an anonymous class.
    pub fn anonymous(convention: Convention) -> Self {
        Self::new(None, convention)
    }

    fn new(class: Option<String>, convention: Convention) -> Self {
        Self {
            class,
            convention,
            fields: Vec::new(),
        }
    }

    /// Append a field. Fields keep insertion order.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(Rc::new(self))
    }

    fn names(&self) -> Vec<String> {
        self.fields.iter().map(|(name, _)| name.clone()).collect()
    }
}

impl Reflect for Record {
    fn class_name(&self) -> Option<&str> {
        self.class.as_deref()
    }

    fn attribute_names(&self) -> Option<Vec<String>> {
        (self.convention == Convention::Named).then(|| self.names())
    }

    fn positional_names(&self) -> Option<Vec<String>> {
        (self.convention == Convention::Positional).then(|| self.names())
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}
