//! Dedup indexes for layer key and value tables.
//!
//! [`LayerBuilder`] tables are append-only and never dedup on their own;
//! these side structures map a key string or a value's serialized form to
//! its already-assigned table slot so repeated entries are stored once.
//! The backing container is pluggable through [`IndexMap`]: hash-based
//! (`FxHashMap`, any `HashMap`) or ordered (`BTreeMap`).

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use rustc_hash::FxHashMap;

use crate::builder::LayerBuilder;
use crate::codec::value::encode_value;
use crate::model::value::PropertyValue;

/// Abstract map capability backing a dedup index.
pub trait IndexMap<K>: Default {
    fn get(&self, key: &K) -> Option<u32>;
    fn insert(&mut self, key: K, index: u32);
}

impl<K: Eq + Hash, S: BuildHasher + Default> IndexMap<K> for HashMap<K, u32, S> {
    fn get(&self, key: &K) -> Option<u32> {
        HashMap::get(self, key).copied()
    }

    fn insert(&mut self, key: K, index: u32) {
        HashMap::insert(self, key, index);
    }
}

impl<K: Ord> IndexMap<K> for BTreeMap<K, u32> {
    fn get(&self, key: &K) -> Option<u32> {
        BTreeMap::get(self, key).copied()
    }

    fn insert(&mut self, key: K, index: u32) {
        BTreeMap::insert(self, key, index);
    }
}

/// Dedup index over a layer's value table, keyed by the serialized value.
///
/// Equal values encode to equal bytes, so the encoded body is a faithful
/// surrogate key for all seven variants. An index must not be shared
/// across layer builders: the slots it hands out only mean anything in
/// the table they were assigned from.
#[derive(Debug, Default)]
pub struct ValueIndex<M = FxHashMap<Vec<u8>, u32>> {
    map: M,
}

impl<M: IndexMap<Vec<u8>>> ValueIndex<M> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self { map: M::default() }
    }

    /// Returns the table slot for `value`, appending it to the layer's
    /// value table only if it has not been seen before.
    pub fn index(&mut self, layer: &mut LayerBuilder, value: &PropertyValue) -> u32 {
        let key = encode_value(value);
        if let Some(index) = self.map.get(&key) {
            return index;
        }
        let index = layer.add_encoded_value(key.clone());
        self.map.insert(key, index);
        index
    }
}

/// Dedup index over a layer's key table.
#[derive(Debug, Default)]
pub struct KeyIndex<M = FxHashMap<String, u32>> {
    map: M,
}

impl<M: IndexMap<String>> KeyIndex<M> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self { map: M::default() }
    }

    /// Returns the table slot for `key`, appending it to the layer's key
    /// table only if it has not been seen before.
    pub fn index(&mut self, layer: &mut LayerBuilder, key: &str) -> u32 {
        let owned = key.to_string();
        if let Some(index) = self.map.get(&owned) {
            return index;
        }
        let index = layer.add_key(key);
        self.map.insert(owned, index);
        index
    }
}
