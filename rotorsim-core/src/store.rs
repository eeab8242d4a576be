//! Contract with the external variable store.
//!
//! The store stands in for the protocol-exposed address space: remote
//! clients read and write it concurrently, the engine reads the vibration
//! back at the start of each tick and publishes its results at the end.
//! How the store serializes access internally is its own business.

use std::sync::Arc;

use crate::error::StoreError;
use crate::value::Value;

/// Key/value capability set the engine depends on.
pub trait VariableStore: Send + Sync {
    /// Reads the current value for `key`.
    ///
    /// `Ok(None)` means the key is not present; `Err` means the store could
    /// not be reached.
    fn read_value(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes `value` under `key`.
    fn write_value(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

impl<T: VariableStore + ?Sized> VariableStore for Arc<T> {
    fn read_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).read_value(key)
    }

    fn write_value(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).write_value(key, value)
    }
}

impl<T: VariableStore + ?Sized> VariableStore for &T {
    fn read_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).read_value(key)
    }

    fn write_value(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).write_value(key, value)
    }
}
