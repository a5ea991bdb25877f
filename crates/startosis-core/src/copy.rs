//! Deep copies of script values.
//!
//! Plan steps must not observe mutations the script makes after a builtin
//! returns, so every mutable container reachable from a value is rebuilt.
//! Immutable scalars are shared. Extensions copy themselves through
//! [`Extension::copy_with`](crate::extension::Extension::copy_with).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::warn;

use crate::value::{Dict, Set, Value};

/// A value the copier could not snapshot and returned as a shared reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyDiagnostic {
    /// Type name of the value left aliased.
    pub type_name: String,
}

/// Stateful deep copier.
///
/// Containers reached more than once in a single copy are rebuilt once, so
/// the snapshot keeps the aliasing shape of the source and cyclic lists do
/// not recurse forever.
#[derive(Debug, Default)]
pub struct Copier {
    rebuilt: HashMap<*const (), Value>,
    diagnostics: Vec<CopyDiagnostic>,
}

impl Copier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a value. Never fails; values that cannot be snapshotted are
    /// returned unchanged and recorded in [`Copier::diagnostics`].
    pub fn copy(&mut self, value: &Value) -> Value {
        match value {
            Value::None
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::String(_)
            | Value::Bytes(_)
            | Value::Time(_)
            | Value::Duration(_) => value.clone(),

            Value::List(list) => {
                let id = Rc::as_ptr(list) as *const ();
                if let Some(done) = self.rebuilt.get(&id) {
                    return done.clone();
                }
                let fresh = Rc::new(RefCell::new(Vec::new()));
                self.rebuilt.insert(id, Value::List(fresh.clone()));
                let items: Vec<Value> = list.borrow().iter().map(|v| self.copy(v)).collect();
                *fresh.borrow_mut() = items;
                Value::List(fresh)
            }

            Value::Tuple(items) => {
                let copied: Vec<Value> = items.iter().map(|v| self.copy(v)).collect();
                Value::Tuple(Rc::from(copied))
            }

            Value::Dict(dict) => {
                let id = Rc::as_ptr(dict) as *const ();
                if let Some(done) = self.rebuilt.get(&id) {
                    return done.clone();
                }
                let fresh = Rc::new(RefCell::new(Dict::new()));
                self.rebuilt.insert(id, Value::Dict(fresh.clone()));
                let pairs: Vec<(Value, Value)> = dict
                    .borrow()
                    .iter()
                    .map(|(k, v)| (self.copy(k), self.copy(v)))
                    .collect();
                let mut rebuilt = Dict::new();
                for (key, value) in pairs {
                    // Keys were hashable in the source, so their copies are too.
                    let _ = rebuilt.insert(key, value);
                }
                *fresh.borrow_mut() = rebuilt;
                Value::Dict(fresh)
            }

            Value::Set(set) => {
                let id = Rc::as_ptr(set) as *const ();
                if let Some(done) = self.rebuilt.get(&id) {
                    return done.clone();
                }
                let items: Vec<Value> = set.borrow().iter().map(|v| self.copy(v)).collect();
                let mut rebuilt = Set::new();
                for item in items {
                    let _ = rebuilt.insert(item);
                }
                let fresh = Value::Set(Rc::new(RefCell::new(rebuilt)));
                self.rebuilt.insert(id, fresh.clone());
                fresh
            }

            Value::Record(record) => {
                let fields = record
                    .fields()
                    .map(|(name, v)| (Rc::from(name), self.copy(v)))
                    .collect();
                Value::Record(Rc::new(record.with_fields(fields)))
            }

            Value::Extension(ext) => {
                let id = Rc::as_ptr(ext) as *const ();
                if let Some(done) = self.rebuilt.get(&id) {
                    return done.clone();
                }
                let copied = match ext.copy_with(self) {
                    Some(copied) => Value::Extension(copied),
                    None => {
                        warn!(
                            type_name = ext.type_name(),
                            "Value cannot be snapshotted; the plan keeps a shared reference"
                        );
                        self.diagnostics.push(CopyDiagnostic {
                            type_name: ext.type_name().to_string(),
                        });
                        value.clone()
                    }
                };
                self.rebuilt.insert(id, copied.clone());
                copied
            }
        }
    }

    /// Values left aliased by this copier so far.
    pub fn diagnostics(&self) -> &[CopyDiagnostic] {
        &self.diagnostics
    }

    /// Returns true if every value copied so far was fully snapshotted.
    pub fn is_sound(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Deep copy a single value.
pub fn deep_copy(value: &Value) -> Value {
    Copier::new().copy(value)
}
