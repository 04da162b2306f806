//! Open-addressing hash table with tombstone deletion and linear probing
//!, generic over the stored value so the same code
//! backs `globals`, every class's method table, and every instance's
//! field table — a direct port of clox's `table.c`.

use crate::object::StringRef;

const TABLE_MAX_LOAD: f64 = 0.75;

#[derive(Clone)]
enum Entry<V> {
    Empty,
    Tombstone,
    Occupied(StringRef, u32, V),
}

#[derive(Clone)]
pub struct Table<V> {
    entries: Vec<Entry<V>>,
    /// Occupied + tombstones. Tombstones count toward the load factor the
    /// same way clox's `count` does, so a table full of deletions still
    /// gets resized instead of probing forever.
    count: usize,
}

impl<V: Clone> Table<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, Entry::Occupied(..)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Walk the probe sequence for `hash`, stopping at the first slot that
    /// satisfies `matches` (or the first empty slot / earliest tombstone
    /// if none does). `matches` lets the string interner search by content
    /// before a `StringRef` even exists yet (clox's `findString`), while
    /// every other caller searches by `StringRef` identity.
    fn find_slot(entries: &[Entry<V>], hash: u32, matches: impl Fn(StringRef) -> bool) -> usize {
        let capacity = entries.len();
        let mut index = hash as usize % capacity;
        let mut tombstone: Option<usize> = None;
        loop {
            match &entries[index] {
                Entry::Empty => return tombstone.unwrap_or(index),
                Entry::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Entry::Occupied(key, entry_hash, _) => {
                    if *entry_hash == hash && matches(*key) {
                        return index;
                    }
                }
            }
            index = (index + 1) % capacity;
        }
    }

    fn grow(&mut self) {
        let new_capacity = if self.capacity() < 8 { 8 } else { self.capacity() * 2 };
        let mut new_entries: Vec<Entry<V>> = (0..new_capacity).map(|_| Entry::Empty).collect();
        let mut live = 0;
        for entry in std::mem::take(&mut self.entries) {
            if let Entry::Occupied(key, hash, value) = entry {
                let index = Self::find_slot(&new_entries, hash, |k| k == key);
                new_entries[index] = Entry::Occupied(key, hash, value);
                live += 1;
            }
        }
        self.entries = new_entries;
        self.count = live;
    }

    fn ensure_capacity(&mut self) {
        if self.capacity() == 0 || (self.count + 1) as f64 > self.capacity() as f64 * TABLE_MAX_LOAD {
            self.grow();
        }
    }

    /// Insert or overwrite. Returns `true` if this created a brand-new
    /// key, matching clox's `tableSet` return value (the VM uses it to
    /// tell a fresh global apart from reassigning one, since assignment
    /// to an undeclared global is a runtime error).
    pub fn set(&mut self, key: StringRef, hash: u32, value: V) -> bool {
        self.ensure_capacity();
        let index = Self::find_slot(&self.entries, hash, |k| k == key);
        let is_new = matches!(self.entries[index], Entry::Empty);
        if is_new {
            self.count += 1;
        }
        self.entries[index] = Entry::Occupied(key, hash, value);
        is_new
    }

    pub fn get(&self, key: StringRef, hash: u32) -> Option<&V> {
        if self.capacity() == 0 {
            return None;
        }
        match &self.entries[Self::find_slot(&self.entries, hash, |k| k == key)] {
            Entry::Occupied(_, _, value) => Some(value),
            _ => None,
        }
    }

    /// Tombstone a key rather than clearing its slot, so later probes that
    /// skipped past it on insertion still find what comes after it.
    pub fn delete(&mut self, key: StringRef, hash: u32) -> bool {
        if self.capacity() == 0 {
            return false;
        }
        let index = Self::find_slot(&self.entries, hash, |k| k == key);
        if matches!(self.entries[index], Entry::Occupied(..)) {
            self.entries[index] = Entry::Tombstone;
            true
        } else {
            false
        }
    }

    /// Copy every entry of `other` into `self`, used by `OP_INHERIT` to
    /// seed a subclass's method table from its superclass's.
    pub fn add_all(&mut self, other: &Table<V>) {
        for (key, hash, value) in other.occupied() {
            self.set(key, hash, value.clone());
        }
    }

    fn occupied(&self) -> impl Iterator<Item = (StringRef, u32, &V)> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Occupied(key, hash, value) => Some((*key, *hash, value)),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (StringRef, &V)> {
        self.occupied().map(|(key, _, value)| (key, value))
    }

}

impl<V: Clone> Default for Table<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u32) -> (StringRef, u32) {
        (StringRef(n), n * 2654435761)
    }

    #[test]
    fn set_then_get_roundtrips() {
        let mut table: Table<i32> = Table::new();
        let (k, h) = key(1);
        assert!(table.set(k, h, 42));
        assert_eq!(table.get(k, h), Some(&42));
    }

    #[test]
    fn set_existing_key_returns_false_and_overwrites() {
        let mut table: Table<i32> = Table::new();
        let (k, h) = key(1);
        table.set(k, h, 1);
        assert!(!table.set(k, h, 2));
        assert_eq!(table.get(k, h), Some(&2));
    }

    #[test]
    fn delete_then_get_returns_none_but_later_key_still_reachable() {
        let mut table: Table<i32> = Table::new();
        let (k1, h1) = key(1);
        let (k2, h2) = key(2);
        table.set(k1, h1, 1);
        table.set(k2, h2, 2);
        assert!(table.delete(k1, h1));
        assert_eq!(table.get(k1, h1), None);
        assert_eq!(table.get(k2, h2), Some(&2));
    }

    #[test]
    fn grows_past_load_factor_and_keeps_all_entries() {
        let mut table: Table<i32> = Table::new();
        for i in 0..100u32 {
            let (k, h) = key(i);
            table.set(k, h, i as i32);
        }
        assert_eq!(table.len(), 100);
        for i in 0..100u32 {
            let (k, h) = key(i);
            assert_eq!(table.get(k, h), Some(&(i as i32)));
        }
    }
}
