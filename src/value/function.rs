use crate::value::Value;

/// A first-class function: a bytecode entry point plus the lexical
/// environment PUSH_FN captured for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
	/// Bytecode offset of the function's entry point.
	pub start: usize,
	/// Values captured by PUSH_FN, replayed onto the operand stack on CALL.
	pub env_frames: Vec<Value>,
	/// Heap slots reserved for locals (including arguments and the receiver
	/// slot) on each invocation.
	pub frame_size: usize,
}
