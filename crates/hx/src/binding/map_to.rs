//! Maps string keyed, multi-valued input onto a `Deserialize` type.
//!
//! The destination describes its own shape through serde: a field is looked up by its serialized
//! name, so `#[serde(rename = "...")]` overrides the key and `#[serde(skip)]` leaves the field alone.
//! Only keys present in the input are handed to the destination, request structs should carry
//! `#[serde(default)]` so absent fields keep their zero value.
//!
//! Scalars take the first value of their key, an empty value yields the zero value of the field
//! instead of a parse error. Sequences take every value of their key. Multipart files are matched
//! by the same key rule and are only visible to [`FileHeader`] fields.

use crate::binding::{BindError, FileHeader, Files, Values};
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor};

/// Upper bound for distinct keys and for values of a single key
pub const MAX_FIELDS: usize = 1000;

/// Binds `values` and `files` into a new `T`.
///
/// Fails fast: the first field that can not be converted aborts binding with an error naming it.
pub fn map_to<T: DeserializeOwned>(values: &Values, files: &Files) -> Result<T, BindError> {
    if values.len() > MAX_FIELDS {
        return Err(BindError::TooManyFields);
    }
    T::deserialize(StructDeserializer { values, files })
}

/// Go style boolean parsing
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[derive(Clone, Copy)]
struct StructDeserializer<'a> {
    values: &'a Values,
    files: &'a Files,
}

impl<'a> StructDeserializer<'a> {
    fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key) || self.files.contains_key(key)
    }

    fn field(&self, key: &str) -> FieldDeserializer<'a> {
        FieldDeserializer {
            values: self.values.get_all(key),
            files: self.files.get(key).map_or(&[], Vec::as_slice),
            in_seq: false,
        }
    }
}

macro_rules! struct_required {
    ($($method:ident)*) => {
        $(
        fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, BindError> {
            Err(BindError::StructRequired)
        }
        )*
    };
}

impl<'de> de::Deserializer<'de> for StructDeserializer<'_> {
    type Error = BindError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_map(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let keys = self
            .values
            .keys()
            .chain(self.files.keys().map(String::as_str).filter(|key| !self.values.contains_key(key)))
            .collect::<Vec<_>>()
            .into_iter();
        visitor.visit_map(EntriesAccess { source: self, keys, current: None })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        let keys = fields.iter().copied().filter(|field| self.contains(field)).collect::<Vec<_>>().into_iter();
        visitor.visit_map(EntriesAccess { source: self, keys, current: None })
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, _visitor: V) -> Result<V::Value, BindError> {
        Err(BindError::StructRequired)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> Result<V::Value, BindError> {
        Err(BindError::StructRequired)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(BindError::StructRequired)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(BindError::StructRequired)
    }

    struct_required! {
        deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_f32 deserialize_f64
        deserialize_char deserialize_str deserialize_string deserialize_bytes deserialize_byte_buf
        deserialize_option deserialize_unit deserialize_seq deserialize_identifier
    }
}

struct EntriesAccess<'a> {
    source: StructDeserializer<'a>,
    keys: std::vec::IntoIter<&'a str>,
    current: Option<&'a str>,
}

impl<'de> MapAccess<'de> for EntriesAccess<'_> {
    type Error = BindError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, BindError> {
        let Some(key) = self.keys.next() else {
            return Ok(None);
        };
        self.current = Some(key);
        seed.deserialize(key.into_deserializer()).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, BindError> {
        let key = self.current.take().ok_or_else(|| BindError::Custom("value requested before its key".into()))?;
        seed.deserialize(self.source.field(key)).map_err(|err| BindError::field(key, err))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.keys.len())
    }
}

/// Deserializes the values (and files) of a single key
#[derive(Clone, Copy)]
struct FieldDeserializer<'a> {
    values: &'a [String],
    files: &'a [FileHeader],
    in_seq: bool,
}

impl<'a> FieldDeserializer<'a> {
    fn first(&self) -> &'a str {
        self.values.first().map_or("", String::as_str)
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $ty:ty, $visit:ident, $kind:literal;)*) => {
        $(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
            let value = self.first();
            if value.is_empty() {
                return visitor.$visit(<$ty>::default());
            }
            let parsed = value.parse::<$ty>().map_err(|err| BindError::parse($kind, value, err))?;
            visitor.$visit(parsed)
        }
        )*
    };
}

macro_rules! unsupported {
    ($($method:ident => $kind:literal;)*) => {
        $(
        fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, BindError> {
            Err(BindError::UnsupportedType { kind: $kind })
        }
        )*
    };
}

impl<'de> de::Deserializer<'de> for FieldDeserializer<'_> {
    type Error = BindError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if self.in_seq || self.values.len() <= 1 {
            visitor.visit_str(self.first())
        } else {
            self.deserialize_seq(visitor)
        }
    }

    deserialize_number! {
        deserialize_i8 => i8, visit_i8, "int";
        deserialize_i16 => i16, visit_i16, "int";
        deserialize_i32 => i32, visit_i32, "int";
        deserialize_i64 => i64, visit_i64, "int";
        deserialize_u8 => u8, visit_u8, "uint";
        deserialize_u16 => u16, visit_u16, "uint";
        deserialize_u32 => u32, visit_u32, "uint";
        deserialize_u64 => u64, visit_u64, "uint";
        deserialize_f32 => f32, visit_f32, "float";
        deserialize_f64 => f64, visit_f64, "float";
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        let value = self.first();
        if value.is_empty() {
            return visitor.visit_bool(false);
        }
        let parsed = parse_bool(value).ok_or_else(|| BindError::parse("bool", value, "invalid syntax"))?;
        visitor.visit_bool(parsed)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_str(self.first())
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_str(self.first())
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_str(self.first())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        if self.in_seq {
            return Err(BindError::UnsupportedType { kind: "nested slice" });
        }
        let files_only = self.values.is_empty() && !self.files.is_empty();
        let len = if files_only { self.files.len() } else { self.values.len() };
        if len > MAX_FIELDS {
            return Err(BindError::TooManyFields);
        }
        visitor.visit_seq(ElementsAccess { field: self, files_only, index: 0, len })
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        match self.files.first() {
            Some(file) if name == FileHeader::SERDE_NAME => visitor.visit_map(FileHeaderAccess::new(file)),
            _ => Err(BindError::UnsupportedType { kind: "struct" }),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, _visitor: V) -> Result<V::Value, BindError> {
        Err(BindError::UnsupportedType { kind: "unit" })
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, _visitor: V) -> Result<V::Value, BindError> {
        Err(BindError::UnsupportedType { kind: "tuple" })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(BindError::UnsupportedType { kind: "tuple" })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, BindError> {
        Err(BindError::UnsupportedType { kind: "enum" })
    }

    unsupported! {
        deserialize_char => "char";
        deserialize_bytes => "bytes";
        deserialize_byte_buf => "bytes";
        deserialize_unit => "unit";
        deserialize_map => "map";
    }
}

struct ElementsAccess<'a> {
    field: FieldDeserializer<'a>,
    files_only: bool,
    index: usize,
    len: usize,
}

impl<'de> SeqAccess<'de> for ElementsAccess<'_> {
    type Error = BindError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, BindError> {
        if self.index >= self.len {
            return Ok(None);
        }
        let index = self.index;
        self.index += 1;

        let element = if self.files_only {
            FieldDeserializer { values: &[], files: std::slice::from_ref(&self.field.files[index]), in_seq: true }
        } else {
            FieldDeserializer { values: std::slice::from_ref(&self.field.values[index]), files: &[], in_seq: true }
        };
        seed.deserialize(element).map(Some).map_err(|err| BindError::element(index, err))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len - self.index)
    }
}

struct FileHeaderAccess<'a> {
    file: &'a FileHeader,
    keys: std::vec::IntoIter<&'static str>,
    current: Option<&'static str>,
}

impl<'a> FileHeaderAccess<'a> {
    fn new(file: &'a FileHeader) -> Self {
        let mut keys = vec!["filename"];
        if file.content_type().is_some() {
            keys.push("content_type");
        }
        keys.push("data");
        Self { file, keys: keys.into_iter(), current: None }
    }
}

impl<'de> MapAccess<'de> for FileHeaderAccess<'_> {
    type Error = BindError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, BindError> {
        let Some(key) = self.keys.next() else {
            return Ok(None);
        };
        self.current = Some(key);
        seed.deserialize(key.into_deserializer()).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, BindError> {
        match self.current.take() {
            Some("filename") => seed.deserialize(self.file.filename().into_deserializer()),
            Some("content_type") => seed.deserialize(self.file.content_type().unwrap_or_default().into_deserializer()),
            Some("data") => seed.deserialize(de::value::BytesDeserializer::new(self.file.data())),
            _ => Err(BindError::Custom("value requested before its key".into())),
        }
    }
}
