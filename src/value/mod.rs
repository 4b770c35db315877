mod dict;
mod function;
mod key;
mod reference;

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

pub use dict::Dict;
pub use function::Function;
pub use key::Key;
pub use reference::Reference;

/// The tag half of a Value's `(Type, payload)` pair (§3.1). Kept as a
/// standalone enum (rather than folded into `Value::discriminant`) because
/// error messages need to name a Value's type without cloning its payload.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Type {
	Undef,
	Int,
	Float,
	Str,
	Ref,
	Fn,
	Dict,
	Native,
}

/// An opaque host callable: an ordered slice of unwrapped argument Values
/// in, side effects out, no return (§6.2). Cloning a `NativeFn` clones the
/// `Rc`, not the closure.
pub type NativeFn = Rc<dyn Fn(&[Value])>;

/// A tagged value. Every handler that produces a Value picks the variant
/// that matches the Type it is documented to produce (§4.6); nothing here
/// enforces that beyond the type system itself.
#[derive(Clone)]
pub enum Value {
	Undef,
	Int(i32),
	Float(f32),
	Str(String),
	Ref(Reference),
	Fn(Function),
	Dict(Dict),
	Native(NativeFn),
}

impl Value {
	pub fn type_of(&self) -> Type {
		match self {
			Value::Undef => Type::Undef,
			Value::Int(_) => Type::Int,
			Value::Float(_) => Type::Float,
			Value::Str(_) => Type::Str,
			Value::Ref(_) => Type::Ref,
			Value::Fn(_) => Type::Fn,
			Value::Dict(_) => Type::Dict,
			Value::Native(_) => Type::Native,
		}
	}

	/// Truthiness used by JUMPIF and AND/OR (§4.5, §4.6): nonzero numbers,
	/// nonempty strings, and any non-dangling reference are truthy.
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Undef => false,
			Value::Int(n) => *n != 0,
			Value::Float(f) => *f != 0.0,
			Value::Str(s) => !s.is_empty(),
			Value::Ref(r) => !r.is_dangling(),
			Value::Fn(_) | Value::Dict(_) | Value::Native(_) => true,
		}
	}

	pub fn as_reference(&self) -> Option<&Reference> {
		match self {
			Value::Ref(r) => Some(r),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Undef, Value::Undef) => true,
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Float(a), Value::Float(b)) => a == b,
			(Value::Str(a), Value::Str(b)) => a == b,
			(Value::Ref(a), Value::Ref(b)) => a == b,
			(Value::Fn(a), Value::Fn(b)) => a == b,
			(Value::Dict(a), Value::Dict(b)) => a == b,
			(Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl Debug for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Undef => write!(f, "UNDEF"),
			Value::Int(v) => write!(f, "INT {v}"),
			Value::Float(v) => write!(f, "FLOAT {v}"),
			Value::Str(v) => write!(f, "STR {v:?}"),
			Value::Ref(v) => write!(f, "REF {v:?}"),
			Value::Fn(v) => write!(f, "FN {v:?}"),
			Value::Dict(v) => write!(f, "DICT {v:?}"),
			Value::Native(_) => write!(f, "NATIVE <host fn>"),
		}
	}
}
