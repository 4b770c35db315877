use std::fmt::{Debug, Formatter};

/// A DICT key is either a string (object-style access) or an integer
/// (array-style access); PUSH_ARRAY always produces integer keys, PUSH_DICT
/// always produces whatever the compiler pushed as the key operand.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum Key {
	Str(String),
	Int(i64),
}

impl Key {
	pub const LENGTH: &'static str = "length";

	pub fn is_length(&self) -> bool {
		matches!(self, Key::Str(s) if s == Self::LENGTH)
	}
}

impl Debug for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Key::Str(s) => write!(f, "{s:?}"),
			Key::Int(i) => write!(f, "{i}"),
		}
	}
}

impl From<String> for Key {
	fn from(value: String) -> Self {
		Key::Str(value)
	}
}

impl From<i64> for Key {
	fn from(value: i64) -> Self {
		Key::Int(value)
	}
}
