//! Symbol Table
//!
//! An open-addressing hash table keyed by [`Value`], using linear probing
//! and no tombstones.
//!
//! ## Layout
//!
//! ```text
//! keys: ┌─────┬─────┬─────┬─────┬─────┬─────┐
//!       │ nil │ k1  │ k2  │ nil │ k3  │ nil │   nil = empty slot
//!       └─────┴─────┴─────┴─────┴─────┴─────┘
//! vals: ┌─────┬─────┬─────┬─────┬─────┬─────┐
//!       │ nil │ v1  │ v2  │ nil │ v3  │ nil │
//!       └─────┴─────┴─────┴─────┴─────┴─────┘
//! ```
//!
//! - Probing starts at `hash(key) % capacity` and steps by one slot.
//! - The table doubles before an insert would start at load factor 0.5, so
//!   there is always an empty slot to stop a probe.
//! - Deleting a key clears its slot and re-inserts every entry in the rest
//!   of the cluster, so no later entry becomes unreachable.
//!
//! Keys may be any non-Nil value; Nil marks an empty slot.

use tracing::debug;

use crate::equal::equal;
use crate::hash::hash;
use crate::value::Value;

/// Default number of slots
pub const INITIAL_CAPACITY: usize = 256;

/// The table grows once `count / capacity` reaches this ratio
const LOAD_FACTOR: f64 = 0.5;

/// Linear-probing table mapping values to values
pub struct SymbolTable {
    keys: Vec<Value>,
    vals: Vec<Value>,
    count: usize,
}

impl SymbolTable {
    /// Create a table with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Create a table with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or odd.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity % 2 == 0,
            "symbol table capacity must be even and non-zero, got {}",
            capacity
        );
        SymbolTable {
            keys: vec![Value::NIL; capacity],
            vals: vec![Value::NIL; capacity],
            count: 0,
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Associate `value` with `key`, returning the previous value if the key
    /// was already present.
    ///
    /// # Panics
    ///
    /// Panics if `key` is Nil.
    pub fn set(&mut self, key: Value, value: Value) -> Option<Value> {
        if self.count as f64 / self.capacity() as f64 >= LOAD_FACTOR {
            self.resize(self.capacity() * 2);
        }

        let previous = place(&mut self.keys, &mut self.vals, key, value);
        if previous.is_none() {
            self.count += 1;
        }
        previous
    }

    /// Look up `key`.
    ///
    /// A key explicitly mapped to Nil yields `Some(&Value::NIL)`; an absent
    /// key yields `None`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match find_slot(&self.keys, key) {
            (i, true) => Some(&self.vals[i]),
            (_, false) => None,
        }
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        find_slot(&self.keys, key).1
    }

    /// Remove `key`, returning its value if it was present
    pub fn delete(&mut self, key: &Value) -> Option<Value> {
        let (mut i, found) = find_slot(&self.keys, key);
        if !found {
            return None;
        }

        let size = self.capacity();
        self.keys[i] = Value::NIL;
        let removed = std::mem::take(&mut self.vals[i]);

        // Re-insert the rest of the cluster so probes can still reach it
        i = (i + 1) % size;
        while !self.keys[i].is_nil() {
            let k = std::mem::take(&mut self.keys[i]);
            let v = std::mem::take(&mut self.vals[i]);
            place(&mut self.keys, &mut self.vals, k, v);
            i = (i + 1) % size;
        }

        self.count -= 1;
        Some(removed)
    }

    /// Grow to `capacity` slots and rehash every entry.
    ///
    /// # Panics
    ///
    /// Panics unless `capacity` is larger than the current capacity and even.
    pub fn resize(&mut self, capacity: usize) {
        assert!(
            capacity > self.capacity(),
            "symbol table can only grow ({} -> {})",
            self.capacity(),
            capacity
        );
        assert!(capacity % 2 == 0, "symbol table capacity must be even, got {}", capacity);

        debug!(
            from = self.capacity(),
            to = capacity,
            entries = self.count,
            "resizing symbol table"
        );

        let old_keys = std::mem::replace(&mut self.keys, vec![Value::NIL; capacity]);
        let old_vals = std::mem::replace(&mut self.vals, vec![Value::NIL; capacity]);

        for (k, v) in old_keys.into_iter().zip(old_vals) {
            if k.is_nil() {
                continue;
            }
            place(&mut self.keys, &mut self.vals, k, v);
        }
    }

    /// Iterate over `(key, value)` entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.keys
            .iter()
            .zip(self.vals.iter())
            .filter(|(k, _)| !k.is_nil())
    }

    /// Return the unique symbol registered under `name`, creating it on
    /// first use.
    ///
    /// Interned symbols are keyed by their name string, so two calls with the
    /// same bytes return identical (and therefore `equal`) symbols.
    pub fn intern(&mut self, name: &[u8]) -> Value {
        let key = Value::string(name);
        if let Some(symbol) = self.get(&key) {
            return symbol.clone();
        }
        let symbol = Value::symbol(key.clone());
        self.set(key, symbol.clone());
        symbol
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Probe for `key`, returning its slot and whether the key is present there.
/// When absent, the slot is the empty one where the key would go.
fn find_slot(keys: &[Value], key: &Value) -> (usize, bool) {
    assert!(!key.is_nil(), "symbol table keys must not be nil");

    let size = keys.len();
    let mut i = (hash(key) % size as u64) as usize;
    while !keys[i].is_nil() && !equal(key, &keys[i]) {
        i = (i + 1) % size;
    }
    (i, !keys[i].is_nil())
}

/// Store an entry without checking the load factor
fn place(keys: &mut [Value], vals: &mut [Value], key: Value, value: Value) -> Option<Value> {
    let (i, found) = find_slot(keys, &key);
    keys[i] = key;
    let previous = std::mem::replace(&mut vals[i], value);
    found.then_some(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_stats::heap_stats;

    #[test]
    fn test_set_and_get() {
        let mut table = SymbolTable::new();
        assert!(table.is_empty());

        table.set(Value::string(b"one"), Value::integer(1));
        table.set(Value::integer(2), Value::string(b"two"));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&Value::string(b"one")), Some(&Value::integer(1)));
        assert_eq!(table.get(&Value::integer(2)), Some(&Value::string(b"two")));
        assert_eq!(table.get(&Value::string(b"three")), None);
    }

    #[test]
    fn test_overwrite_keeps_count() {
        let mut table = SymbolTable::new();
        assert_eq!(table.set(Value::integer(5), Value::integer(50)), None);
        assert_eq!(
            table.set(Value::integer(5), Value::integer(55)),
            Some(Value::integer(50))
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&Value::integer(5)), Some(&Value::integer(55)));
    }

    #[test]
    fn test_nil_value_is_distinct_from_absent() {
        let mut table = SymbolTable::new();
        table.set(Value::integer(1), Value::NIL);
        assert_eq!(table.get(&Value::integer(1)), Some(&Value::NIL));
        assert!(table.contains_key(&Value::integer(1)));
        assert_eq!(table.get(&Value::integer(2)), None);
        assert!(!table.contains_key(&Value::integer(2)));
    }

    #[test]
    #[should_panic(expected = "must not be nil")]
    fn test_nil_key_panics() {
        let mut table = SymbolTable::new();
        table.set(Value::NIL, Value::integer(1));
    }

    #[test]
    fn test_grows_at_half_load() {
        let mut table = SymbolTable::with_capacity(8);
        for i in 0..4 {
            table.set(Value::integer(i), Value::integer(i * 10));
        }
        assert_eq!(table.capacity(), 8);

        // count/capacity = 4/8 reaches the load factor before this insert
        table.set(Value::integer(4), Value::integer(40));
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.len(), 5);

        for i in 0..5 {
            assert_eq!(table.get(&Value::integer(i)), Some(&Value::integer(i * 10)));
        }
    }

    #[test]
    fn test_many_entries() {
        let mut table = SymbolTable::with_capacity(2);
        for i in 0..2000 {
            table.set(Value::string(format!("key-{}", i).as_bytes()), Value::integer(i));
        }
        assert_eq!(table.len(), 2000);
        assert!(table.capacity() >= 4000);
        for i in 0..2000 {
            let key = Value::string(format!("key-{}", i).as_bytes());
            assert_eq!(table.get(&key), Some(&Value::integer(i)));
        }
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut table = SymbolTable::new();
        table.set(Value::integer(1), Value::integer(1));
        assert_eq!(table.delete(&Value::integer(2)), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_delete_middle_of_collision_chain() {
        // Integers hash to themselves: 3, 19 and 35 all start at slot 3 of 16
        let mut table = SymbolTable::with_capacity(16);
        let (a, b, c) = (Value::integer(3), Value::integer(19), Value::integer(35));
        table.set(a.clone(), Value::string(b"a"));
        table.set(b.clone(), Value::string(b"b"));
        table.set(c.clone(), Value::string(b"c"));

        assert_eq!(table.delete(&b), Some(Value::string(b"b")));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&b), None);
        assert_eq!(table.get(&a), Some(&Value::string(b"a")));
        assert_eq!(table.get(&c), Some(&Value::string(b"c")));
    }

    #[test]
    fn test_delete_repairs_wrapping_cluster() {
        // 7, 15 and 23 all start at slot 7 of 8; the cluster wraps to slot 0
        let mut table = SymbolTable::with_capacity(8);
        table.set(Value::integer(7), Value::integer(0));
        table.set(Value::integer(15), Value::integer(1));
        table.set(Value::integer(23), Value::integer(2));
        assert_eq!(table.capacity(), 8);

        assert_eq!(table.delete(&Value::integer(7)), Some(Value::integer(0)));
        assert_eq!(table.get(&Value::integer(15)), Some(&Value::integer(1)));
        assert_eq!(table.get(&Value::integer(23)), Some(&Value::integer(2)));
    }

    #[test]
    fn test_delete_then_reinsert() {
        let mut table = SymbolTable::with_capacity(4);
        table.set(Value::string(b"k"), Value::integer(1));
        table.delete(&Value::string(b"k"));
        assert!(table.is_empty());
        table.set(Value::string(b"k"), Value::integer(2));
        assert_eq!(table.get(&Value::string(b"k")), Some(&Value::integer(2)));
    }

    #[test]
    fn test_resize_keeps_entries() {
        let mut table = SymbolTable::with_capacity(4);
        table.set(Value::integer(1), Value::integer(10));
        table.resize(32);
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.get(&Value::integer(1)), Some(&Value::integer(10)));
    }

    #[test]
    #[should_panic(expected = "must be even")]
    fn test_resize_rejects_odd_capacity() {
        let mut table = SymbolTable::with_capacity(4);
        table.resize(7);
    }

    #[test]
    #[should_panic(expected = "can only grow")]
    fn test_resize_rejects_shrinking() {
        let mut table = SymbolTable::with_capacity(8);
        table.resize(4);
    }

    #[test]
    fn test_list_keys() {
        let mut table = SymbolTable::new();
        let key = || Value::list([Value::integer(1), Value::string(b"x")]);
        table.set(key(), Value::character('k' as u32));
        assert_eq!(table.get(&key()), Some(&Value::character('k' as u32)));
    }

    #[test]
    fn test_symbol_keys_are_identity() {
        let mut table = SymbolTable::new();
        let foo = Value::symbol_from_str("foo");
        table.set(foo.clone(), Value::integer(1));
        assert_eq!(table.get(&foo), Some(&Value::integer(1)));
        assert_eq!(table.get(&Value::symbol_from_str("foo")), None);
    }

    #[test]
    fn test_intern_returns_same_symbol() {
        let mut table = SymbolTable::new();
        let a = table.intern(b"lambda");
        let b = table.intern(b"lambda");
        let c = table.intern(b"other");
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(a, b);
        assert_eq!(a.symbol_name().string_bytes(), b"lambda");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_iter_visits_live_entries() {
        let mut table = SymbolTable::with_capacity(16);
        for i in 0..5 {
            table.set(Value::integer(i), Value::integer(i * i));
        }
        table.delete(&Value::integer(2));
        let mut keys: Vec<i64> = table.iter().map(|(k, _)| k.as_integer()).collect();
        keys.sort();
        assert_eq!(keys, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_dropping_table_releases_values() {
        let before = heap_stats().live;
        {
            let mut table = SymbolTable::with_capacity(4);
            for i in 0..50 {
                table.intern(format!("sym{}", i).as_bytes());
            }
        }
        assert_eq!(heap_stats().live, before);
    }
}
