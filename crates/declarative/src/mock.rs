//! In-memory adapter that records every call, for tests

use crate::adapter::Adapter;
use crate::value::Options;
use anyhow::{Result, bail};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MemoryAdapter {
    values: Mutex<BTreeMap<String, Value>>,
    reads: AtomicUsize,
    /// Every attempted write, including failed ones
    writes: Mutex<Vec<(String, Value)>>,
    /// Remaining successful writes allowed per key before failing
    write_budget: Mutex<BTreeMap<String, usize>>,
    fail_reads: AtomicBool,
}

fn slot(key: &Value) -> String {
    key.as_str()
        .map(str::to_string)
        .unwrap_or_else(|| key.to_string())
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(values: &[(&str, Value)]) -> Self {
        let adapter = Self::new();
        for (key, value) in values {
            adapter.set(key, value.clone());
        }
        adapter
    }

    pub fn set(&self, key: &str, value: Value) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Value {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Fail every write to `key`
    pub fn fail_writes_to(&self, key: &str) {
        self.fail_writes_after(key, 0);
    }

    /// Allow `count` writes to `key`, then fail
    pub fn fail_writes_after(&self, key: &str, count: usize) {
        self.write_budget
            .lock()
            .unwrap()
            .insert(key.to_string(), count);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<(String, Value)> {
        self.writes.lock().unwrap().clone()
    }
}

impl Adapter for MemoryAdapter {
    fn read(&self, key: &Value, _options: &Options) -> Result<Value> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("read of {} failed", key);
        }
        Ok(self.value(&slot(key)))
    }

    fn write(&self, key: &Value, value: &Value, _options: &Options) -> Result<()> {
        let slot = slot(key);
        self.writes.lock().unwrap().push((slot.clone(), value.clone()));

        if let Some(budget) = self.write_budget.lock().unwrap().get_mut(&slot) {
            if *budget == 0 {
                bail!("write of {} failed", slot);
            }
            *budget -= 1;
        }

        let mut values = self.values.lock().unwrap();
        if value.is_null() {
            values.remove(&slot);
        } else {
            values.insert(slot, value.clone());
        }
        Ok(())
    }
}
