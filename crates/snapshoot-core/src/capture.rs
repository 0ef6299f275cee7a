//! Capture any `Serialize` type as a [`Value`].
//!
//! Mapping from the serde data model:
//! - structs become named-field [`Record`]s, tuple and newtype structs positional ones
//! - unit variants become symbols, other variants a one-entry hash keyed by the variant
//! - struct variants become named-field records of class `Type::Variant`
//! - sequences, tuples and byte strings become arrays, maps become hashes

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser;

use crate::{Record, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("integer {0} does not fit in a 64-bit signed integer")]
    IntegerOverflow(String),

    #[error("{0}")]
    Custom(String),
}

impl ser::Error for CaptureError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        CaptureError::Custom(msg.to_string())
    }
}

/// Serialize `value` into the runtime value model.
pub fn to_value<T: ?Sized + Serialize>(value: &T) -> Result<Value, CaptureError> {
    value.serialize(ValueSerializer)
}

fn integer<T: TryInto<i64> + std::fmt::Display + Copy>(v: T) -> Result<Value, CaptureError> {
    v.try_into()
        .map(Value::Integer)
        .map_err(|_| CaptureError::IntegerOverflow(v.to_string()))
}

fn variant_key(variant: &str) -> Value {
    Value::symbol(variant)
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = CaptureError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = TupleStructBuilder;
    type SerializeTupleVariant = TupleVariantBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = StructBuilder;

    fn serialize_bool(self, v: bool) -> Result<Value, CaptureError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_i128(self, v: i128) -> Result<Value, CaptureError> {
        integer(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<Value, CaptureError> {
        integer(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Value, CaptureError> {
        integer(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_char(self, v: char) -> Result<Value, CaptureError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, CaptureError> {
        Ok(v.into())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, CaptureError> {
        Ok(Value::Array(v.iter().copied().map(Value::from).collect()))
    }

    fn serialize_none(self) -> Result<Value, CaptureError> {
        Ok(Value::Nil)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value, CaptureError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, CaptureError> {
        Ok(Value::Nil)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value, CaptureError> {
        Ok(Record::positional(name).into_value())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, CaptureError> {
        Ok(Value::symbol(variant))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, CaptureError> {
        let inner = value.serialize(ValueSerializer)?;
        Ok(Record::positional(name).with("0", inner).into_value())
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, CaptureError> {
        let inner = value.serialize(ValueSerializer)?;
        Ok(Value::from_pairs([(variant_key(variant), inner)]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, CaptureError> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, CaptureError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<TupleStructBuilder, CaptureError> {
        Ok(TupleStructBuilder {
            record: Record::positional(name),
        })
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<TupleVariantBuilder, CaptureError> {
        Ok(TupleVariantBuilder {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, CaptureError> {
        Ok(MapBuilder {
            entries: IndexMap::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<StructBuilder, CaptureError> {
        Ok(StructBuilder {
            record: Record::named(name),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<StructBuilder, CaptureError> {
        Ok(StructBuilder {
            record: Record::named(format!("{name}::{variant}")),
        })
    }
}

struct SeqBuilder {
    items: Vec<Value>,
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, CaptureError> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, CaptureError> {
        ser::SerializeSeq::end(self)
    }
}

struct TupleStructBuilder {
    record: Record,
}

impl ser::SerializeTupleStruct for TupleStructBuilder {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        let position = self.record.fields().len().to_string();
        self.record.push(position, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, CaptureError> {
        Ok(self.record.into_value())
    }
}

struct TupleVariantBuilder {
    variant: &'static str,
    items: Vec<Value>,
}

impl ser::SerializeTupleVariant for TupleVariantBuilder {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, CaptureError> {
        Ok(Value::from_pairs([(
            variant_key(self.variant),
            Value::Array(self.items),
        )]))
    }
}

struct MapBuilder {
    entries: IndexMap<Value, Value>,
    pending_key: Option<Value>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), CaptureError> {
        self.pending_key = Some(key.serialize(ValueSerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CaptureError> {
        let Some(key) = self.pending_key.take() else {
            return Err(CaptureError::Custom(
                "map value serialized before its key".to_owned(),
            ));
        };
        self.entries.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, CaptureError> {
        Ok(Value::Hash(self.entries))
    }
}

struct StructBuilder {
    record: Record,
}

impl StructBuilder {
    fn push<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), CaptureError> {
        self.record.push(key, value.serialize(ValueSerializer)?);
        Ok(())
    }
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CaptureError> {
        self.push(key, value)
    }

    fn end(self) -> Result<Value, CaptureError> {
        Ok(self.record.into_value())
    }
}

impl ser::SerializeStructVariant for StructBuilder {
    type Ok = Value;
    type Error = CaptureError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CaptureError> {
        self.push(key, value)
    }

    fn end(self) -> Result<Value, CaptureError> {
        Ok(self.record.into_value())
    }
}

