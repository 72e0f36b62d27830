//! Serializer turning a serde record into [`Arguments`].
//!
//! Only the top level is walked. Every field value is rendered through the
//! same [`ArgumentValue`] impls `Arguments::push` uses, so both paths agree on
//! the canonical form.

use super::{ArgumentValue, Arguments};
use crate::errors::{BoxError, ConversionError};
use serde::ser::{self, Impossible, Serialize};
use std::fmt;

/// Serializes a record into its argument map.
pub(super) struct RecordSerializer {
    pub(super) type_name: &'static str,
}

impl RecordSerializer {
    fn not_a_record(&self) -> ConversionError {
        ConversionError::NotARecord {
            type_name: self.type_name,
        }
    }
}

macro_rules! not_a_record {
    ($($method:ident($($arg:ty),*)),* $(,)?) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<Arguments, ConversionError> {
                Err(self.not_a_record())
            }
        )*
    };
}

impl ser::Serializer for RecordSerializer {
    type Ok = Arguments;
    type Error = ConversionError;

    type SerializeSeq = Impossible<Arguments, ConversionError>;
    type SerializeTuple = Impossible<Arguments, ConversionError>;
    type SerializeTupleStruct = Impossible<Arguments, ConversionError>;
    type SerializeTupleVariant = Impossible<Arguments, ConversionError>;
    type SerializeMap = RecordFields;
    type SerializeStruct = RecordFields;
    type SerializeStructVariant = Impossible<Arguments, ConversionError>;

    not_a_record!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
        serialize_unit_variant(&'static str, u32, &'static str),
    );

    fn serialize_none(self) -> Result<Arguments, ConversionError> {
        Ok(Arguments::new())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Arguments, ConversionError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Arguments, ConversionError> {
        Ok(Arguments::new())
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<Arguments, ConversionError> {
        Ok(Arguments::new())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<Arguments, ConversionError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<Arguments, ConversionError> {
        Err(self.not_a_record())
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, ConversionError> {
        Err(self.not_a_record())
    }

    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, ConversionError> {
        Err(self.not_a_record())
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, ConversionError> {
        Err(self.not_a_record())
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, ConversionError> {
        Err(self.not_a_record())
    }

    fn serialize_map(self, _: Option<usize>) -> Result<RecordFields, ConversionError> {
        Ok(RecordFields::default())
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<RecordFields, ConversionError> {
        Ok(RecordFields::default())
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, ConversionError> {
        Err(self.not_a_record())
    }
}

/// Collects the fields of a record or map.
#[derive(Default)]
pub(super) struct RecordFields {
    args: Arguments,
    pending_key: Option<String>,
}

impl RecordFields {
    fn push_field<T: Serialize + ?Sized>(
        &mut self,
        field: String,
        value: &T,
    ) -> Result<(), ConversionError> {
        match value.serialize(FieldSerializer) {
            Ok(value) => {
                self.args.insert(field, value);
                Ok(())
            }
            Err(FieldError(source)) => Err(ConversionError::Field {
                field,
                type_name: std::any::type_name::<T>().to_string(),
                source,
            }),
        }
    }
}

impl ser::SerializeStruct for RecordFields {
    type Ok = Arguments;
    type Error = ConversionError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ConversionError> {
        self.push_field(key.to_string(), value)
    }

    fn end(self) -> Result<Arguments, ConversionError> {
        Ok(self.args)
    }
}

impl ser::SerializeMap for RecordFields {
    type Ok = Arguments;
    type Error = ConversionError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), ConversionError> {
        match key.serialize(FieldSerializer) {
            Ok(Some(key)) => {
                self.pending_key = Some(key);
                Ok(())
            }
            _ => Err(ser::Error::custom("record field names must be strings")),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ConversionError> {
        let field = self
            .pending_key
            .take()
            .ok_or_else(|| <ConversionError as ser::Error>::custom("map value without a key"))?;
        self.push_field(field, value)
    }

    fn end(self) -> Result<Arguments, ConversionError> {
        Ok(self.args)
    }
}

impl ser::Error for ConversionError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ConversionError::Serialize(<serde_json::Error as ser::Error>::custom(msg))
    }
}

/// Why a single field had no canonical form.
#[derive(Debug)]
struct FieldError(BoxError);

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for FieldError {}

impl ser::Error for FieldError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        FieldError(msg.to_string().into())
    }
}

impl From<BoxError> for FieldError {
    fn from(error: BoxError) -> Self {
        FieldError(error)
    }
}

fn nested(kind: &str) -> FieldError {
    FieldError(format!("a nested {kind} has no canonical string form").into())
}

/// Renders one field value.
struct FieldSerializer;

macro_rules! scalar_field {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, value: $ty) -> Result<Option<String>, FieldError> {
                Ok(value.to_argument()?)
            }
        )*
    };
}

impl ser::Serializer for FieldSerializer {
    type Ok = Option<String>;
    type Error = FieldError;

    type SerializeSeq = Impossible<Option<String>, FieldError>;
    type SerializeTuple = Impossible<Option<String>, FieldError>;
    type SerializeTupleStruct = Impossible<Option<String>, FieldError>;
    type SerializeTupleVariant = Impossible<Option<String>, FieldError>;
    type SerializeMap = Impossible<Option<String>, FieldError>;
    type SerializeStruct = Impossible<Option<String>, FieldError>;
    type SerializeStructVariant = Impossible<Option<String>, FieldError>;

    scalar_field!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_i128(i128),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_u128(u128),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
    );

    fn serialize_bytes(self, _: &[u8]) -> Result<Option<String>, FieldError> {
        Err(nested("byte array"))
    }

    fn serialize_none(self) -> Result<Option<String>, FieldError> {
        Ok(None)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Option<String>, FieldError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Option<String>, FieldError> {
        Ok(None)
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<Option<String>, FieldError> {
        Ok(None)
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
    ) -> Result<Option<String>, FieldError> {
        Ok(Some(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<Option<String>, FieldError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<Option<String>, FieldError> {
        Err(nested("enum variant"))
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, FieldError> {
        Err(nested("sequence"))
    }

    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, FieldError> {
        Err(nested("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, FieldError> {
        Err(nested("tuple"))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleVariant, FieldError> {
        Err(nested("enum variant"))
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self::SerializeMap, FieldError> {
        Err(nested("map"))
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self::SerializeStruct, FieldError> {
        Err(nested("record"))
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeStructVariant, FieldError> {
        Err(nested("enum variant"))
    }
}
