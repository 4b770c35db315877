use crate::error::VmError;
use crate::opcode::OpCode;
use crate::value::{Function, Value};
use crate::vm::Vm;

#[cfg_attr(feature = "tracing", tracing::instrument(skip(vm)))]
pub(crate) fn handle(vm: &mut Vm, opcode: OpCode) -> Result<(), VmError> {
	match opcode {
		OpCode::PushFloat => {
			let v = vm.image_mut().read_f32()?;
			vm.stack_mut().push(Value::Float(v));
		},
		OpCode::PushStr => {
			let v = vm.image_mut().read_str()?;
			vm.stack_mut().push(Value::Str(v));
		},
		OpCode::PushInt => {
			let v = vm.image_mut().read_u32()?;
			vm.stack_mut().push(Value::Int(v));
		},
		OpCode::PushFn => push_fn(vm)?,
		OpCode::Take => {
			let k = vm.image_mut().read_u32()? as usize;
			let v = vm.stack().peek_at(k, "TAKE")?.clone();
			vm.stack_mut().push(v);
		},
		OpCode::Swap => {
			let a = vm.image_mut().read_u32()? as usize;
			let b = vm.image_mut().read_u32()? as usize;
			vm.stack_mut().swap(a, b, "SWAP")?;
		},
		OpCode::Pop => {
			let n = vm.image_mut().read_u32()? as usize;
			let remaining = vm.stack().len().checked_sub(n).ok_or(VmError::Underflow("POP"))?;
			vm.stack_mut().truncate(remaining);
		},
		_ => unreachable!("{opcode:?} is not a stack op"),
	}
	Ok(())
}

/// PUSH_FN (§4.3): capture `fr_count` stack values starting `fr_offset+1`
/// below the top, pop the address on top, and push a Function wrapping both.
fn push_fn(vm: &mut Vm) -> Result<(), VmError> {
	let fr_count = vm.image_mut().read_u32()? as usize;
	let fr_offset = vm.image_mut().read_u32()? as usize;
	let fr_size = vm.image_mut().read_u32()? as usize;

	let env_frames = vm.stack().slice_from_top(fr_offset + 1, fr_count, "PUSH_FN")?.to_vec();
	let addr = vm.stack_mut().pop("PUSH_FN")?;

	let start = match addr {
		Value::Int(n) => n as usize,
		found => return Err(VmError::TypeMismatch { op: "PUSH_FN", found: found.type_of() }),
	};

	vm.stack_mut().push(Value::Fn(Function { start, env_frames, frame_size: fr_size }));
	Ok(())
}
