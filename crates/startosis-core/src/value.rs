//! The dynamic value model shared by every Startosis builtin.
//!
//! Scalars and immutable containers are cheap to clone. Lists, sets and
//! dicts are shared mutable containers: cloning a [`Value`] that holds one
//! aliases the same storage, which is why plan steps snapshot their
//! arguments through the [`Copier`](crate::copy::Copier).

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Zero};

use crate::duration::ScriptDuration;
use crate::error::ValueError;
use crate::extension::Extension;
use crate::types::ValueKind;

/// Shared handle to a mutable list.
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Shared handle to a mutable dict.
pub type DictRef = Rc<RefCell<Dict>>;

/// Shared handle to a mutable set.
pub type SetRef = Rc<RefCell<Set>>;

/// A dynamic script value.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    String(Rc<str>),
    Bytes(Rc<[u8]>),
    Time(DateTime<Utc>),
    Duration(ScriptDuration),
    List(ListRef),
    Tuple(Rc<[Value]>),
    Set(SetRef),
    Dict(DictRef),
    Record(Rc<Record>),
    Extension(Rc<dyn Extension>),
}

impl Value {
    /// Create a list value.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Create a tuple value.
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::from(items))
    }

    /// Create a byte string value.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(Rc::from(data.into()))
    }

    /// Create a dict value.
    pub fn dict(dict: Dict) -> Self {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    /// Create a dict value from key/value pairs.
    pub fn dict_from<I>(pairs: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        Ok(Value::dict(Dict::from_pairs(pairs)?))
    }

    /// Create a set value.
    pub fn set(set: Set) -> Self {
        Value::Set(Rc::new(RefCell::new(set)))
    }

    /// Create a set value from its elements.
    pub fn set_from<I>(items: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = Value>,
    {
        Ok(Value::set(Set::from_items(items)?))
    }

    /// Create a record value.
    pub fn record(record: Record) -> Self {
        Value::Record(Rc::new(record))
    }

    /// Wrap a host-defined value.
    pub fn extension<E: Extension>(ext: E) -> Self {
        Value::Extension(Rc::new(ext))
    }

    /// The kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Time(_) => ValueKind::Time,
            Value::Duration(_) => ValueKind::Duration,
            Value::List(_) => ValueKind::List,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::Set(_) => ValueKind::Set,
            Value::Dict(_) => ValueKind::Dict,
            Value::Record(_) => ValueKind::Record,
            Value::Extension(_) => ValueKind::Extension,
        }
    }

    /// The type name shown in diagnostics. Extensions report their own name.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Extension(ext) => ext.type_name(),
            other => other.kind().type_name(),
        }
    }

    /// Returns true for the absent value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Truthiness following Starlark rules.
    pub fn truth(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => !i.is_zero(),
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::Time(_) => true,
            Value::Duration(d) => d.as_nanos() != 0,
            Value::List(l) => !l.borrow().is_empty(),
            Value::Tuple(t) => !t.is_empty(),
            Value::Set(s) => !s.borrow().is_empty(),
            Value::Dict(d) => !d.borrow().is_empty(),
            Value::Record(_) => true,
            Value::Extension(ext) => ext.truth(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&DictRef> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_extension(&self) -> Option<&Rc<dyn Extension>> {
        match self {
            Value::Extension(ext) => Some(ext),
            _ => None,
        }
    }

    /// Downcast an extension value to its concrete host type.
    pub fn downcast_ref<T: Extension>(&self) -> Option<&T> {
        self.as_extension()?.as_any().downcast_ref::<T>()
    }

    /// Returns true if both values are the same mutable container.
    pub fn shares_storage(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Extension(a), Value::Extension(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Look up a named attribute on a record or extension.
    pub fn attr(&self, name: &str) -> Result<Value, ValueError> {
        let found = match self {
            Value::Record(record) => record.get(name).cloned(),
            Value::Extension(ext) => ext.attr(name),
            _ => None,
        };
        found.ok_or_else(|| ValueError::NoSuchAttribute {
            type_name: self.type_name().to_string(),
            attr: name.to_string(),
        })
    }

    /// Compute the key used to store this value in a dict or set.
    pub fn hash_key(&self) -> Result<HashKey, ValueError> {
        let key = match self {
            Value::None => HashKey::None,
            Value::Bool(b) => HashKey::Bool(*b),
            Value::Int(i) => HashKey::Int(i.clone()),
            Value::Float(f) => float_key(*f),
            Value::String(s) => HashKey::String(s.clone()),
            Value::Bytes(b) => HashKey::Bytes(b.clone()),
            Value::Time(t) => HashKey::Time(*t),
            Value::Duration(d) => HashKey::Duration(*d),
            Value::Tuple(items) => HashKey::Tuple(
                items
                    .iter()
                    .map(Value::hash_key)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => {
                return Err(ValueError::Unhashable {
                    type_name: other.type_name().to_string(),
                })
            }
        };
        Ok(key)
    }
}

// Integral floats share keys with the equal int, as in Starlark.
fn float_key(f: f64) -> HashKey {
    if f.is_finite() && f.fract() == 0.0 {
        if let Some(i) = BigInt::from_f64(f) {
            return HashKey::Int(i);
        }
    }
    if f.is_nan() {
        return HashKey::Float(f64::NAN.to_bits());
    }
    HashKey::Float(f.to_bits())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Extension(a), Value::Extension(b)) => {
                Rc::ptr_eq(a, b) || (a.type_name() == b.type_name() && a.fields() == b.fields())
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Int(BigInt::from(value))
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<ScriptDuration> for Value {
    fn from(value: ScriptDuration) -> Self {
        Value::Duration(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Time(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::list(value)
    }
}

/// Identity of a hashable value inside a dict or set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    None,
    Bool(bool),
    Int(BigInt),
    /// Bit pattern of a non-integral float.
    Float(u64),
    String(Rc<str>),
    Bytes(Rc<[u8]>),
    Time(DateTime<Utc>),
    Duration(ScriptDuration),
    Tuple(Vec<HashKey>),
}

/// An insertion-ordered mapping with unique hashable keys.
#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: IndexMap<HashKey, (Value, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dict, later duplicates overwriting earlier ones.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut dict = Dict::new();
        for (key, value) in pairs {
            dict.insert(key, value)?;
        }
        Ok(dict)
    }

    /// Insert or overwrite an entry, returning the previous value.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<Option<Value>, ValueError> {
        let hash = key.hash_key()?;
        if let Some(entry) = self.entries.get_mut(&hash) {
            return Ok(Some(std::mem::replace(&mut entry.1, value)));
        }
        self.entries.insert(hash, (key, value));
        Ok(None)
    }

    pub fn get(&self, key: &Value) -> Result<Option<&Value>, ValueError> {
        let hash = key.hash_key()?;
        Ok(self.entries.get(&hash).map(|(_, v)| v))
    }

    /// Look up a string key.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .get(&HashKey::String(Rc::from(key)))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> + '_ {
        self.entries.values().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.values().map(|(k, _)| k)
    }
}

impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|(hash, (_, value))| {
                other
                    .entries
                    .get(hash)
                    .map_or(false, |(_, other_value)| value == other_value)
            })
    }
}

/// An insertion-ordered set of hashable values.
#[derive(Debug, Clone, Default)]
pub struct Set {
    items: IndexMap<HashKey, Value>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items<I>(items: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut set = Set::new();
        for item in items {
            set.insert(item)?;
        }
        Ok(set)
    }

    /// Add an element, returning false if it was already present.
    pub fn insert(&mut self, item: Value) -> Result<bool, ValueError> {
        let hash = item.hash_key()?;
        if self.items.contains_key(&hash) {
            return Ok(false);
        }
        self.items.insert(hash, item);
        Ok(true)
    }

    pub fn contains(&self, item: &Value) -> Result<bool, ValueError> {
        Ok(self.items.contains_key(&item.hash_key()?))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        self.items.values()
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.items.keys().all(|k| other.items.contains_key(k))
    }
}

/// A named, immutable bag of fields such as `struct(a=1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    constructor: Rc<str>,
    fields: Vec<(Rc<str>, Value)>,
}

impl Record {
    /// Create a record; field names must be unique.
    pub fn new<S: AsRef<str>>(
        constructor: &str,
        fields: impl IntoIterator<Item = (S, Value)>,
    ) -> Result<Self, ValueError> {
        let mut collected: Vec<(Rc<str>, Value)> = Vec::new();
        for (name, value) in fields {
            let name = name.as_ref();
            if collected.iter().any(|(existing, _)| &**existing == name) {
                return Err(ValueError::DuplicateField {
                    constructor: constructor.to_string(),
                    field: name.to_string(),
                });
            }
            collected.push((Rc::from(name), value));
        }
        Ok(Self {
            constructor: Rc::from(constructor),
            fields: collected,
        })
    }

    /// The name the record renders with.
    pub fn constructor(&self) -> &str {
        &self.constructor
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| &**field == name)
            .map(|(_, value)| value)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(name, value)| (&**name, value))
    }

    pub(crate) fn with_fields(&self, fields: Vec<(Rc<str>, Value)>) -> Self {
        Self {
            constructor: self.constructor.clone(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_aliases_lists() {
        let list = Value::list(vec![Value::from(1)]);
        let alias = list.clone();
        list.as_list().unwrap().borrow_mut().push(Value::from(2));
        assert_eq!(alias.as_list().unwrap().borrow().len(), 2);
        assert!(list.shares_storage(&alias));
    }

    #[test]
    fn test_dict_keeps_insertion_order_and_unique_keys() {
        let mut dict = Dict::new();
        dict.insert(Value::from("b"), Value::from(1)).unwrap();
        dict.insert(Value::from("a"), Value::from(2)).unwrap();
        let previous = dict.insert(Value::from("b"), Value::from(3)).unwrap();

        assert_eq!(previous, Some(Value::from(1)));
        assert_eq!(dict.len(), 2);
        let keys: Vec<_> = dict.keys().map(|k| k.as_str().unwrap().to_string()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(dict.get_str("b"), Some(&Value::from(3)));
    }

    #[test]
    fn test_unhashable_key_rejected() {
        let mut dict = Dict::new();
        let err = dict
            .insert(Value::list(vec![]), Value::None)
            .unwrap_err();
        assert_eq!(
            err,
            ValueError::Unhashable {
                type_name: "list".into()
            }
        );
    }

    #[test]
    fn test_integral_float_shares_int_key() {
        let mut set = Set::new();
        assert!(set.insert(Value::from(1)).unwrap());
        assert!(!set.insert(Value::from(1.0)).unwrap());
        assert!(set.insert(Value::from(1.5)).unwrap());
    }

    #[test]
    fn test_dict_equality_ignores_order() {
        let a = Value::dict_from([
            (Value::from("x"), Value::from(1)),
            (Value::from("y"), Value::from(2)),
        ])
        .unwrap();
        let b = Value::dict_from([
            (Value::from("y"), Value::from(2)),
            (Value::from("x"), Value::from(1)),
        ])
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_record_rejects_duplicate_fields() {
        let err = Record::new("struct", [("a", Value::None), ("a", Value::None)]).unwrap_err();
        assert!(matches!(err, ValueError::DuplicateField { .. }));
    }

    #[test]
    fn test_attr_lookup() {
        let record = Value::record(Record::new("struct", [("port", Value::from(80))]).unwrap());
        assert_eq!(record.attr("port").unwrap(), Value::from(80));
        assert!(record.attr("missing").is_err());
        assert!(Value::from(1).attr("port").is_err());
    }

    #[test]
    fn test_truth() {
        assert!(!Value::None.truth());
        assert!(!Value::from("").truth());
        assert!(Value::from(2).truth());
        assert!(!Value::list(vec![]).truth());
    }
}
