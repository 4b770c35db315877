use std::fmt::{Debug, Formatter};

use fxhash::FxHashMap;

use crate::value::{Key, Value};

/// The payload of a DICT value: a lookup from `Key` to a `Value::Ref`
/// pointing at the entry's heap slot.
///
/// Entries are keyed by an `FxHashMap` rather than an order-preserving map
/// (matching the teacher's use of `fxhash` for name -> index lookups in
/// `schema/heaps.rs`). The ordering invariant the spec cares about — that
/// entries land on contiguous heap slots in insertion order, so a receiver
/// can read siblings via LOAD + offset — is a property of *when PUSH_DICT
/// appends to the heap*, not of how this map iterates, so an unordered map
/// is sufficient here.
#[derive(Clone, PartialEq, Default)]
pub struct Dict {
	entries: FxHashMap<Key, Value>,
}

impl Dict {
	pub fn new() -> Self {
		Self { entries: FxHashMap::default() }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, key: &Key) -> Option<&Value> {
		self.entries.get(key)
	}

	pub fn insert(&mut self, key: Key, value: Value) {
		self.entries.insert(key, value);
	}

	pub fn contains_key(&self, key: &Key) -> bool {
		self.entries.contains_key(key)
	}
}

impl Debug for Dict {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_map().entries(self.entries.iter()).finish()
	}
}
