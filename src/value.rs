use std::{collections::HashMap, rc::Rc};

use crate::{link::Link, stream::Stream};

/// A dynamically-shaped value inspected by sieve filters.
///
/// Besides the JSON shapes, a value can be a byte string, a record with
/// named fields, a deferred [`Link`] or a lazy [`Stream`].
///
/// # Examples
///
/// ```
/// use sieve_lang::Value;
/// use std::collections::HashMap;
///
/// // Scalar values
/// let null = Value::Null;
/// let boolean = Value::Boolean(true);
/// let integer = Value::Integer(42);
/// let float = Value::Float(3.14);
/// let string = Value::String("hello".to_string());
///
/// // Collections
/// let array = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
///
/// let mut obj = HashMap::new();
/// obj.insert("key".to_string(), Value::String("value".to_string()));
/// let object = Value::Object(obj);
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Null,

    Boolean(bool),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    Float(f64),

    /// UTF-8 string
    String(String),

    /// Raw byte string
    Bytes(Vec<u8>),

    /// Ordered sequence of values
    Array(Vec<Value>),

    /// Mapping with string keys; key order carries no meaning
    Object(HashMap<String, Value>),

    /// Host record with a fixed set of named fields
    Record(Record),

    /// Deferred reference, resolved on first inspection
    Link(Link),

    /// Lazily produced sequence, consumed at most once
    Stream(Stream),
}

impl Value {
    /// Human-readable name of the value's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Record(_) => "record",
            Value::Link(_) => "link",
            Value::Stream(_) => "stream",
        }
    }

    /// Numeric value widened to a float, for integers and floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Member lookup by name on objects and records.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            Value::Record(record) => record.get(key),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            // Links and streams are equal only to themselves.
            (Value::Link(a), Value::Link(b)) => a.ptr_eq(b),
            (Value::Stream(a), Value::Stream(b)) => a.ptr_eq(b),
            _ => false,
        }
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

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Link> for Value {
    fn from(link: Link) -> Self {
        Value::Link(link)
    }
}

impl From<Stream> for Value {
    fn from(stream: Stream) -> Self {
        Value::Stream(stream)
    }
}

/// Declaration of one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    /// Serialization name, also accepted by key lookups
    pub alias: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        FieldDef {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        FieldDef {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Name the field is serialized under.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Field layout shared by every record of one host type.
///
/// The lookup table maps both field names and aliases to field positions and
/// is built once, when the type is declared. An alias that collides with
/// another field's name shadows that name.
#[derive(Debug, PartialEq)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDef>,
    lookup: HashMap<String, usize>,
}

impl RecordType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = FieldDef>) -> Rc<Self> {
        let fields: Vec<FieldDef> = fields.into_iter().collect();
        let mut lookup = HashMap::with_capacity(fields.len() * 2);
        for (i, field) in fields.iter().enumerate() {
            lookup.insert(field.name.clone(), i);
        }
        for (i, field) in fields.iter().enumerate() {
            if let Some(alias) = &field.alias {
                lookup.insert(alias.clone(), i);
            }
        }
        Rc::new(RecordType {
            name: name.into(),
            fields,
            lookup,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_index(&self, key: &str) -> Option<usize> {
        self.lookup.get(key).copied()
    }
}

/// An instance of a [`RecordType`].
///
/// # Examples
///
/// ```
/// use sieve_lang::{FieldDef, Record, RecordType, Value};
///
/// let foo = RecordType::new("Foo", [FieldDef::aliased("Bar", "bar"), FieldDef::new("Baz")]);
/// let record = Record::new(foo, vec![Value::from("b"), Value::Integer(10)]);
///
/// assert_eq!(record.get("bar"), Some(&Value::from("b")));
/// assert_eq!(record.get("Bar"), Some(&Value::from("b")));
/// assert_eq!(record.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: Rc<RecordType>,
    values: Vec<Value>,
}

impl Record {
    /// Builds a record; missing trailing values are `Null`, extra ones are dropped.
    pub fn new(ty: Rc<RecordType>, mut values: Vec<Value>) -> Self {
        values.resize(ty.fields.len(), Value::Null);
        Record { ty, values }
    }

    pub fn record_type(&self) -> &RecordType {
        &self.ty
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.ty.field_index(key).and_then(|i| self.values.get(i))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fields as `(field, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDef, &Value)> {
        self.ty.fields.iter().zip(&self.values)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub(crate) fn map_values<F, E>(self, f: F) -> Result<Record, E>
    where
        F: FnMut(Value) -> Result<Value, E>,
    {
        let values = self.values.into_iter().map(f).collect::<Result<_, E>>()?;
        Ok(Record {
            ty: self.ty,
            values,
        })
    }
}
