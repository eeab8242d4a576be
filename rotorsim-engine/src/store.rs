//! ## rotorsim-engine::store
//! **Reference variable store**
//!
//! A thread-safe map standing in for the protocol address space. Clients
//! write through [`InMemoryStore::set`]; the driver goes through the
//! [`VariableStore`] trait, where faults can be injected per key.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use rotorsim_core::{StoreError, Value, VariableStore};

#[derive(Debug, Default)]
struct Faults {
    offline: bool,
    reads: HashSet<String>,
    writes: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: RwLock<HashMap<String, Value>>,
    faults: RwLock<Faults>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client-side write. Bypasses injected faults.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.write().insert(key.into(), value.into());
    }

    /// Client-side read. Bypasses injected faults.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).copied()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }

    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values.read().clone()
    }

    /// Makes every trait read and write fail until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.faults.write().offline = offline;
    }

    pub fn fail_reads(&self, key: &str) {
        self.faults.write().reads.insert(key.to_string());
    }

    pub fn fail_writes(&self, key: &str) {
        self.faults.write().writes.insert(key.to_string());
    }

    pub fn clear_faults(&self) {
        *self.faults.write() = Faults::default();
    }
}

impl VariableStore for InMemoryStore {
    fn read_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        {
            let faults = self.faults.read();
            if faults.offline {
                return Err(StoreError::Unavailable("store offline".into()));
            }
            if faults.reads.contains(key) {
                return Err(StoreError::Unavailable(format!("read of {key} refused")));
            }
        }
        Ok(self.get(key))
    }

    fn write_value(&self, key: &str, value: Value) -> Result<(), StoreError> {
        {
            let faults = self.faults.read();
            if faults.offline {
                return Err(StoreError::Unavailable("store offline".into()));
            }
            if faults.writes.contains(key) {
                return Err(StoreError::Rejected {
                    key: key.to_string(),
                    reason: "write refused".into(),
                });
            }
        }
        self.set(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotorsim_core::keys;
    use std::sync::Arc;

    #[test]
    fn reads_back_writes() {
        let store = InMemoryStore::new();
        store.write_value(keys::VIBRATION, Value::Double(3.5)).unwrap();
        assert_eq!(
            store.read_value(keys::VIBRATION).unwrap(),
            Some(Value::Double(3.5))
        );
        assert_eq!(store.read_value(keys::PRESSURE).unwrap(), None);
    }

    #[test]
    fn injected_faults_only_hit_the_trait() {
        let store = InMemoryStore::new();
        store.set(keys::TEMPERATURE, 25.0);
        store.fail_reads(keys::TEMPERATURE);
        store.fail_writes(keys::PRESSURE);

        assert!(store.read_value(keys::TEMPERATURE).is_err());
        assert_eq!(store.get(keys::TEMPERATURE), Some(Value::Double(25.0)));
        assert!(matches!(
            store.write_value(keys::PRESSURE, Value::Double(1.0)),
            Err(StoreError::Rejected { .. })
        ));

        store.clear_faults();
        assert!(store.read_value(keys::TEMPERATURE).is_ok());
    }

    #[test]
    fn offline_store_refuses_everything() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        assert!(store.read_value(keys::ALARM).is_err());
        assert!(store.write_value(keys::ALARM, Value::Boolean(true)).is_err());
        store.set_offline(false);
        assert!(store.write_value(keys::ALARM, Value::Boolean(true)).is_ok());
    }

    #[test]
    fn concurrent_clients() {
        let store = Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for n in 0..100 {
                        store.set(format!("client.{i}"), n as f64);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.snapshot().len(), 4);
        assert_eq!(store.get("client.0"), Some(Value::Double(99.0)));
    }
}
