//! Values crossing the store boundary.
//!
//! A [`Value`] is either a scalar, plain (not yet attached) composite data,
//! a handle to a wrapped node of a store, or frozen data that is stored as
//! is and never tracked.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::observable::{Array, Object};

/// Anything that can be read from or written to a store.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// A missing field or element.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),

    /// Plain array data. Wrapped into an [`Array`] when attached.
    List(Vec<Value>),

    /// Plain object data. Wrapped into an [`Object`] when attached.
    Map(IndexMap<String, Value>),

    /// A wrapped object node.
    Object(Object),

    /// A wrapped array node.
    Array(Array),

    /// Intentionally non-reactive data.
    Frozen(Rc<serde_json::Value>),
}

impl Value {
    /// Mark plain data as non-reactive: it will be stored unwrapped and
    /// reads inside it are never tracked.
    pub fn frozen(json: serde_json::Value) -> Self {
        Value::Frozen(Rc::new(json))
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Frozen(_) => "frozen",
        }
    }

    /// Whether attaching this value yields (or is) a wrapped node.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::Map(_) | Value::Object(_) | Value::Array(_)
        )
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The number, if it is integral and fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Read a field. Tracked when `self` is a wrapped object.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(object) => object.get(key),
            Value::Map(fields) => fields.get(key).cloned().unwrap_or_default(),
            Value::Frozen(json) => json.get(key).map(frozen_child).unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Read an element. Tracked when `self` is a wrapped array.
    pub fn at(&self, index: usize) -> Value {
        match self {
            Value::Array(array) => array.get(index),
            Value::List(items) => items.get(index).cloned().unwrap_or_default(),
            Value::Frozen(json) => json.get(index).map(frozen_child).unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Number of fields or elements, for composite values.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Object(object) => Some(object.len()),
            Value::Array(array) => Some(array.len()),
            Value::List(items) => Some(items.len()),
            Value::Map(fields) => Some(fields.len()),
            Value::Frozen(json) => match &**json {
                serde_json::Value::Array(items) => Some(items.len()),
                serde_json::Value::Object(fields) => Some(fields.len()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Untracked plain snapshot.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Undefined | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Value::String(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Object(object) => object.to_json(),
            Value::Array(array) => array.to_json(),
            Value::Frozen(json) => (**json).clone(),
        }
    }
}

fn frozen_child(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Value::frozen(json.clone()),
        scalar => Value::from(scalar.clone()),
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(f64, f32, i32, i64, u32, u64, usize);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}
