//! Evaluation-time values carried along edges

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque handle to a geometry kernel object
///
/// Cloning shares the underlying object. Two handles are equal only when
/// they point at the same object.
#[derive(Clone)]
pub struct ShapeHandle(Arc<dyn Any + Send + Sync>);

impl ShapeHandle {
    /// Wrap a kernel object
    pub fn new<T: Any + Send + Sync>(shape: T) -> Self {
        Self(Arc::new(shape))
    }

    /// Borrow the kernel object if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for ShapeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeHandle({:p})", Arc::as_ptr(&self.0))
    }
}

/// A value flowing between sockets
///
/// Lists nest arbitrarily and may be ragged. `Wrapped` protects a
/// list-valued leaf from being treated as nesting by the ragged operators.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Vector([f64; 3]),
    Text(String),
    /// Kernel objects are runtime-only and never persisted
    #[serde(skip)]
    Shape(ShapeHandle),
    List(Vec<Value>),
    Wrapped(Box<Value>),
}

impl Value {
    /// Short type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Vector(_) => "vector",
            Value::Text(_) => "text",
            Value::Shape(_) => "shape",
            Value::List(_) => "list",
            Value::Wrapped(_) => "wrapped",
        }
    }

    /// Numeric view; booleans read as 0 or 1
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Boolean view; numbers are true when non-zero
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<[f64; 3]> {
        match self {
            Value::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_shape(&self) -> Option<&ShapeHandle> {
        match self {
            Value::Shape(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Value::Vector(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<ShapeHandle> for Value {
    fn from(handle: ShapeHandle) -> Self {
        Value::Shape(handle)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}
