//! Host-defined value kinds.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::copy::Copier;
use crate::value::Value;

/// A composite value defined outside the core value model.
///
/// Extensions behave like records with a fixed attribute schema. They take
/// part in copying through [`Extension::copy_with`] and are rendered as
/// `TypeName(attr=value, ...)` over [`Extension::fields`].
pub trait Extension: fmt::Debug + Any {
    /// The constructor name script authors use for this type.
    fn type_name(&self) -> &str;

    /// Every attribute the type declares, in declaration order.
    fn attr_names(&self) -> Vec<String>;

    /// Look up an attribute by name.
    fn attr(&self, name: &str) -> Option<Value>;

    /// The explicitly supplied attributes, in declaration order.
    fn fields(&self) -> Vec<(String, Value)>;

    /// Produce an independent snapshot of this value.
    ///
    /// Returning `None` means the type cannot be snapshotted; the copier
    /// then keeps the shared reference and records a diagnostic.
    fn copy_with(&self, copier: &mut Copier) -> Option<Rc<dyn Extension>> {
        let _ = copier;
        None
    }

    /// Truthiness of the value.
    fn truth(&self) -> bool {
        true
    }

    /// Downcasting support for typed extraction.
    fn as_any(&self) -> &dyn Any;
}
