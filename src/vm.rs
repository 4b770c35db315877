use crate::builtins::BuiltinNode;
use crate::error::VmError;
use crate::handlers;
use crate::heap::Heap;
use crate::opcode::{HandlerGroup, OpCode};
use crate::reader::ByteReader;
use crate::stack::OperandStack;
use crate::value::{Reference, Value};

/// The virtual machine (§2). Owns the bytecode image, the execution cursor,
/// the heap and the operand stack. `step`, `run` and `run_steps` are the
/// only entry points that advance execution; everything else is handler
/// plumbing they call into.
pub struct Vm<'image> {
	image: ByteReader<'image>,
	/// Human-readable instruction count, for debugging only (§3.6).
	ip: u64,
	heap: Heap,
	stack: OperandStack,
}

impl<'image> Vm<'image> {
	/// Constructs a VM over `image`, bootstrapping the heap with `builtins`
	/// as the root dictionary (§4.8). Heap slot 0 is always the root
	/// reference, pointing at slot 1, the root dictionary.
	pub fn new(image: &'image [u8], builtins: Vec<(&'static str, BuiltinNode)>) -> Self {
		let mut heap = Heap::new();
		heap.push(Value::Ref(Reference::rooted(1)));
		crate::builtins::install(&mut heap, builtins);

		Self { image: ByteReader::new(image), ip: 0, heap, stack: OperandStack::new() }
	}

	pub fn heap(&self) -> &Heap {
		&self.heap
	}

	pub fn stack(&self) -> &OperandStack {
		&self.stack
	}

	pub fn offset(&self) -> usize {
		self.image.position()
	}

	pub fn ip(&self) -> u64 {
		self.ip
	}

	pub fn is_halted(&self) -> bool {
		self.image.position() >= self.image.len()
	}

	/// Decodes and executes exactly one opcode.
	#[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(ip = self.ip, offset = self.image.position())))]
	pub fn step(&mut self) -> Result<(), VmError> {
		if self.is_halted() {
			return Ok(());
		}

		let byte = self.image.read_opcode_byte()?;
		let opcode = OpCode::decode(byte)?;

		#[cfg(feature = "tracing")]
		tracing::trace!(?opcode, "dispatch");

		self.ip += 1;

		match opcode.group() {
			HandlerGroup::Stack => handlers::stack_ops::handle(self, opcode)?,
			HandlerGroup::Memory => handlers::memory::handle(self, opcode)?,
			HandlerGroup::Control => handlers::control::handle(self, opcode)?,
			HandlerGroup::Arithmetic => handlers::arith::handle(self, opcode)?,
			HandlerGroup::Logic => handlers::logic::handle(self, opcode)?,
			HandlerGroup::Aggregate => handlers::aggregate::handle(self, opcode)?,
		}

		Ok(())
	}

	/// Runs until the program counter reaches the end of the image.
	pub fn run(&mut self) -> Result<(), VmError> {
		while !self.is_halted() {
			self.step()?;
		}
		Ok(())
	}

	/// Runs at most `n` opcodes.
	pub fn run_steps(&mut self, n: usize) -> Result<(), VmError> {
		for _ in 0..n {
			if self.is_halted() {
				break;
			}
			self.step()?;
		}
		Ok(())
	}

	pub(crate) fn image_mut(&mut self) -> &mut ByteReader<'image> {
		&mut self.image
	}

	pub(crate) fn heap_mut(&mut self) -> &mut Heap {
		&mut self.heap
	}

	pub(crate) fn stack_mut(&mut self) -> &mut OperandStack {
		&mut self.stack
	}

	pub(crate) fn set_offset(&mut self, offset: usize) {
		self.image.set_position(offset);
	}
}
