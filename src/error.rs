use std::fmt::{Display, Formatter};

use crate::value::Type;

/// Everything that can make the machine halt before the image is exhausted.
#[derive(Debug)]
pub enum VmError {
	/// A decoded opcode byte did not fall into any handler range.
	InvalidOpcode(u8),
	/// A handler needed more operands than the stack or a fixed frame slot held.
	Underflow(&'static str),
	/// An operand's `Type` could not be projected the way the opcode required.
	TypeMismatch { op: &'static str, found: Type },
	/// Division or modulo by zero.
	ArithmeticError(&'static str),
	/// A reference's `target_ptr`, or a raw heap index, fell outside the heap.
	OutOfRange { index: i64, heap_len: usize },
	/// The image ended in the middle of an opcode or an inline immediate.
	DecodeError(DecodeError),
}

#[derive(Debug)]
pub enum DecodeError {
	UnexpectedEof,
	InvalidUtf8,
}

impl From<std::io::Error> for VmError {
	fn from(value: std::io::Error) -> Self {
		match value.kind() {
			std::io::ErrorKind::UnexpectedEof => VmError::DecodeError(DecodeError::UnexpectedEof),
			_ => VmError::DecodeError(DecodeError::UnexpectedEof),
		}
	}
}

impl From<std::str::Utf8Error> for VmError {
	fn from(_: std::str::Utf8Error) -> Self {
		VmError::DecodeError(DecodeError::InvalidUtf8)
	}
}

impl Display for VmError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			VmError::InvalidOpcode(byte) => write!(f, "invalid opcode {byte:#04x}"),
			VmError::Underflow(op) => write!(f, "{op}: operand stack underflow"),
			VmError::TypeMismatch { op, found } => {
				write!(f, "{op}: operand of type {found:?} cannot be used here")
			},
			VmError::ArithmeticError(op) => write!(f, "{op}: division or modulo by zero"),
			VmError::OutOfRange { index, heap_len } => {
				write!(f, "heap index {index} out of range (heap has {heap_len} slots)")
			},
			VmError::DecodeError(DecodeError::UnexpectedEof) => {
				write!(f, "image ended mid-instruction")
			},
			VmError::DecodeError(DecodeError::InvalidUtf8) => {
				write!(f, "string immediate was not valid UTF-8")
			},
		}
	}
}

impl std::error::Error for VmError {}

pub type VmResult<T> = Result<T, VmError>;
