use std::fmt::{Debug, Formatter};
use std::ops::Add;

use crate::value::Key;

/// A pointer into the heap, carrying enough provenance to materialise a
/// dictionary slot lazily when STORE writes through a key that did not
/// exist yet.
///
/// `base_ptr` / `target_name` identify the container entry this reference
/// *is* (if any); `target_ptr` is the heap index of the referent, or `None`
/// for a dangling reference produced by GET on a missing key.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Reference {
	pub base_ptr: Option<usize>,
	pub target_name: Option<Key>,
	pub target_ptr: Option<i64>,
}

impl Reference {
	pub fn rooted(target_ptr: usize) -> Self {
		Self { base_ptr: None, target_name: None, target_ptr: Some(target_ptr as i64) }
	}

	pub fn dangling(base_ptr: usize, target_name: Key) -> Self {
		Self { base_ptr: Some(base_ptr), target_name: Some(target_name), target_ptr: None }
	}

	pub fn is_dangling(&self) -> bool {
		self.target_ptr.is_none()
	}
}

impl Debug for Reference {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.base_ptr {
			None => write!(f, "&({:?})", self.target_ptr),
			Some(base) => write!(f, "&({base}@{:?}=>{:?})", self.target_name, self.target_ptr),
		}
	}
}

/// `r + k`: offsets the referent, preserving provenance. Used by LOAD's
/// inline offset and by field-offset math a compiler emits for member access.
impl Add<i64> for Reference {
	type Output = Reference;
	fn add(self, rhs: i64) -> Reference {
		Reference {
			base_ptr: self.base_ptr,
			target_name: self.target_name,
			target_ptr: self.target_ptr.map(|p| p + rhs),
		}
	}
}

/// `r1 + r2`: sums both `target_ptr`s. Compiler-only construct (§9); the VM
/// does not reject it, matching the reference implementation.
impl Add<Reference> for Reference {
	type Output = Reference;
	fn add(self, rhs: Reference) -> Reference {
		Reference {
			base_ptr: self.base_ptr,
			target_name: self.target_name,
			target_ptr: match (self.target_ptr, rhs.target_ptr) {
				(Some(a), Some(b)) => Some(a + b),
				_ => None,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rooted_has_no_base() {
		let r = Reference::rooted(7);
		assert_eq!(r.base_ptr, None);
		assert_eq!(r.target_name, None);
		assert_eq!(r.target_ptr, Some(7));
		assert!(!r.is_dangling());
	}

	#[test]
	fn dangling_has_no_target() {
		let r = Reference::dangling(3, Key::Str("x".into()));
		assert_eq!(r.base_ptr, Some(3));
		assert!(r.is_dangling());
	}

	#[test]
	fn add_offset_preserves_provenance() {
		let r = Reference { base_ptr: Some(1), target_name: Some(Key::Int(2)), target_ptr: Some(10) };
		let shifted = r + 5;
		assert_eq!(shifted.base_ptr, Some(1));
		assert_eq!(shifted.target_name, Some(Key::Int(2)));
		assert_eq!(shifted.target_ptr, Some(15));
	}

	#[test]
	fn add_dangling_offset_stays_dangling() {
		let r = Reference::dangling(1, Key::Str("y".into()));
		assert!((r + 5).is_dangling());
	}

	#[test]
	fn add_two_references_sums_target_ptrs() {
		let a = Reference::rooted(10);
		let b = Reference::rooted(20);
		assert_eq!((a + b).target_ptr, Some(30));
	}

	#[test]
	fn add_two_references_with_either_dangling_stays_dangling() {
		let a = Reference::rooted(10);
		let b = Reference::dangling(1, Key::Str("z".into()));
		assert!((a + b).is_dangling());
	}
}
