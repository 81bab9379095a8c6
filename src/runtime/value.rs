use std::fmt;
use std::rc::Rc;

use crate::runtime::{
    adt::{Adt, DataValue},
    native_function::NativeFunction,
    protocol::Protocol,
    record::Record,
    tag::Tag,
    task::Task,
};

/// Runtime value of the compiled language.
///
/// Heap-backed variants use `Rc` for cheap sharing; values are
/// semantically immutable after creation, so sharing is safe and the
/// value graph stays acyclic. `tag_of` is the single dispatch key used by
/// protocol lookup, ADT pattern matching, and contract diagnostics.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absence of value.
    Nil,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Boolean value.
    Boolean(bool),
    /// UTF-8 string value.
    String(Rc<str>),
    /// Timestamp, milliseconds since the epoch.
    Date(i64),
    /// Ordered collection of values.
    Array(Rc<Vec<Value>>),
    /// Host callable.
    Function(NativeFunction),
    /// First-class reference to a type identity. Lets compiled code
    /// register protocol implementations for host primitives.
    TypeMarker(Tag),
    /// Open structural record.
    Record(Record),
    /// ADT instance.
    Data(Rc<DataValue>),
    /// Deferred computation with guaranteed cleanup.
    Task(Rc<Task>),
    /// Protocol descriptor as a first-class value.
    Protocol(Protocol),
    /// ADT descriptor as a first-class value.
    Adt(Adt),
}

/// Resolves the dispatch tag for any runtime value.
///
/// ADT instances and descriptors answer their family tag, so passing an
/// ADT descriptor to `add_implementation` registers for that type. All
/// protocol descriptors share the one reserved `protocol` identity.
pub fn tag_of(value: &Value) -> Tag {
    match value {
        Value::Nil => Tag::Nil,
        Value::Integer(_) | Value::Float(_) => Tag::Number,
        Value::String(_) => Tag::Text,
        Value::Boolean(_) => Tag::Boolean,
        Value::Function(_) => Tag::Function,
        Value::Date(_) => Tag::Date,
        Value::Array(_) => Tag::Array,
        Value::TypeMarker(tag) => tag.clone(),
        Value::Record(_) => Tag::Record,
        Value::Data(data) => data.family_tag().clone(),
        Value::Task(_) => Tag::Task,
        Value::Protocol(_) => Tag::Protocol,
        Value::Adt(adt) => adt.tag(),
    }
}

impl Value {
    pub fn tag(&self) -> Tag {
        tag_of(self)
    }

    /// Returns whether this value is truthy.
    ///
    /// Only `Boolean(false)` and `Nil` are falsy; all other values are
    /// truthy. Contract predicates are judged by this rule.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Nil)
    }

    /// Converts a value to display-friendly text: strings are returned
    /// without quotes. Used by `print` and string conversion.
    pub fn to_display_text(&self) -> String {
        match self {
            Value::String(text) => text.to_string(),
            other => other.to_string(),
        }
    }

    /// Renders a value for contract diagnostics: numbers and text
    /// literally, booleans as literals, callables as a name tag,
    /// everything else via its descriptive form or its type tag.
    pub fn describe(&self) -> String {
        match self {
            Value::Nil => "<nil>".to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Boolean(v) => v.to_string(),
            Value::String(text) => text.to_string(),
            Value::Function(func) => format!("<function {}>", func.name()),
            Value::Data(data) => data.to_string(),
            Value::Protocol(protocol) => format!("<protocol {}>", protocol.name()),
            Value::Adt(adt) => format!("<adt {}>", adt.name()),
            Value::TypeMarker(tag) => tag.to_string(),
            other => other.tag().to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Date(ms) => write!(f, "<date {}>", ms),
            Value::Array(elements) => {
                let items: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::TypeMarker(tag) => write!(f, "{}", tag),
            Value::Record(_) => write!(f, "<record>"),
            Value::Data(data) => write!(f, "{}", data),
            Value::Task(_) => write!(f, "<task>"),
            Value::Protocol(protocol) => write!(f, "<protocol {}>", protocol.name()),
            Value::Adt(adt) => write!(f, "<adt {}>", adt.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::TypeMarker(a), Value::TypeMarker(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Task(a), Value::Task(b)) => Rc::ptr_eq(a, b),
            (Value::Protocol(a), Value::Protocol(b)) => a.tag() == b.tag(),
            (Value::Adt(a), Value::Adt(b)) => a.tag() == b.tag(),
            _ => false,
        }
    }
}
