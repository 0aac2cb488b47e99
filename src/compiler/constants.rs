use std::collections::HashMap;
use std::hash::Hash;

use crate::vm::Value;

/// Constant indices are one operand byte.
pub const MAX_CONSTANTS: usize = 256;

#[derive(Debug)]
pub(crate) struct PoolFull;

/// Append-only constant pool with one interning table per literal type, so a
/// string `"5"`, integer `5` and float `5.0` each get their own slot.
#[derive(Debug, Default)]
pub(crate) struct ConstantPool {
    values: Vec<Value>,
    strings: HashMap<String, u8>,
    integers: HashMap<i64, u8>,
    // keyed by bit pattern: f64 is not Hash, and 0.0 / -0.0 stay distinct
    floats: HashMap<u64, u8>,
}

impl ConstantPool {
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn add_string(&mut self, s: &str) -> Result<u8, PoolFull> {
        if let Some(&index) = self.strings.get(s) {
            return Ok(index);
        }
        let index = push(&mut self.values, Value::String(s.to_string()))?;
        self.strings.insert(s.to_string(), index);
        Ok(index)
    }

    pub(crate) fn add_integer(&mut self, n: i64) -> Result<u8, PoolFull> {
        intern(&mut self.integers, &mut self.values, n, Value::Integer(n))
    }

    pub(crate) fn add_float(&mut self, n: f64) -> Result<u8, PoolFull> {
        intern(&mut self.floats, &mut self.values, n.to_bits(), Value::Float(n))
    }

    /// Moves the finished pool out, leaving an empty one behind.
    pub(crate) fn take(&mut self) -> Vec<Value> {
        let pool = std::mem::take(self);
        pool.values
    }
}

fn intern<K: Eq + Hash>(
    table: &mut HashMap<K, u8>,
    values: &mut Vec<Value>,
    key: K,
    value: Value,
) -> Result<u8, PoolFull> {
    if let Some(&index) = table.get(&key) {
        return Ok(index);
    }
    let index = push(values, value)?;
    table.insert(key, index);
    Ok(index)
}

fn push(values: &mut Vec<Value>, value: Value) -> Result<u8, PoolFull> {
    let index = u8::try_from(values.len()).map_err(|_| PoolFull)?;
    values.push(value);
    Ok(index)
}
