use crate::error::VmError;
use crate::opcode::OpCode;
use crate::value::{Reference, Type, Value};
use crate::vm::Vm;

#[cfg_attr(feature = "tracing", tracing::instrument(skip(vm)))]
pub(crate) fn handle(vm: &mut Vm, opcode: OpCode) -> Result<(), VmError> {
	match opcode {
		OpCode::Jump => jump(vm)?,
		OpCode::JumpIf => jump_if(vm)?,
		OpCode::Call => call(vm)?,
		_ => unreachable!("{opcode:?} is not a control op"),
	}
	Ok(())
}

fn target_offset(addr: &Value) -> Result<usize, VmError> {
	match addr {
		Value::Int(n) => Ok(*n as usize),
		found => Err(VmError::TypeMismatch { op: "JUMP", found: found.type_of() }),
	}
}

/// JUMP (§4.5): pop the target address, branch unconditionally.
fn jump(vm: &mut Vm) -> Result<(), VmError> {
	let addr = vm.stack_mut().pop("JUMP")?;
	let offset = target_offset(&addr)?;
	vm.set_offset(offset);
	Ok(())
}

/// JUMPIF (§4.5): pop the condition then the target address; branch iff the
/// condition is truthy.
fn jump_if(vm: &mut Vm) -> Result<(), VmError> {
	let addr = vm.stack_mut().pop("JUMPIF")?;
	let cond = vm.stack_mut().pop("JUMPIF")?;
	if cond.is_truthy() {
		let offset = target_offset(&addr)?;
		vm.set_offset(offset);
	}
	Ok(())
}

/// CALL (§4.5): pops callee, argument count, then the arguments themselves,
/// and dispatches into one of two calling conventions depending on whether
/// the callee is a host NATIVE or a scripted FN.
fn call(vm: &mut Vm) -> Result<(), VmError> {
	let fn_ref = vm.stack_mut().pop("CALL")?;

	// If the callee was fetched through a reference, its `base_ptr` names
	// the dictionary it came from; free functions (a bare FN/NATIVE Value on
	// the stack) have no such provenance.
	let callee_base_ptr = fn_ref.as_reference().and_then(|r| r.base_ptr);

	let callee = match &fn_ref {
		Value::Ref(r) => {
			let ptr = r.target_ptr.ok_or(VmError::TypeMismatch { op: "CALL", found: Type::Ref })?;
			vm.heap().get(ptr)?.clone()
		},
		other => other.clone(),
	};

	let n_args = match vm.stack_mut().pop("CALL")? {
		Value::Int(n) => n as usize,
		found => return Err(VmError::TypeMismatch { op: "CALL", found: found.type_of() }),
	};

	match callee {
		Value::Native(host_fn) => call_native(vm, &host_fn, n_args),
		Value::Fn(function) => call_scripted(vm, function, callee_base_ptr, n_args),
		found => Err(VmError::TypeMismatch { op: "CALL", found: found.type_of() }),
	}
}

/// Native calling convention: unwrap arguments in source order, invoke the
/// host callable, then pop the return address the caller's prologue pushed
/// and jump there, leaving an UNDEF result on the stack.
fn call_native(vm: &mut Vm, host_fn: &crate::value::NativeFn, n_args: usize) -> Result<(), VmError> {
	// Each pop prepends in the reference VM (`args.insert(0, ...)`); collecting
	// in pop order and reversing once is the same result.
	let mut args = Vec::with_capacity(n_args);
	for _ in 0..n_args {
		args.push(vm.stack_mut().pop("CALL")?);
	}
	args.reverse();

	host_fn(&args);

	let return_addr = vm.stack_mut().pop("CALL")?;
	let offset = target_offset(&return_addr)?;
	vm.set_offset(offset);

	vm.stack_mut().push(Value::Undef);
	Ok(())
}

/// Scripted calling convention (§4.5): allocate a frame of `frame_size`
/// UNDEF heap slots, bind the arguments into its first slots, bind the
/// receiver into the slot right after them, push a reference to the frame
/// as the call's result, replay the captured environment, and jump in.
fn call_scripted(vm: &mut Vm, function: crate::value::Function, callee_base_ptr: Option<usize>, n_args: usize) -> Result<(), VmError> {
	// Slot `a` receives the `a`-th argument popped (not reversed): this
	// mirrors the reference VM's `heap[-frame_size+a] = pop()` loop exactly.
	let mut args = Vec::with_capacity(n_args);
	for _ in 0..n_args {
		args.push(vm.stack_mut().pop("CALL")?);
	}

	let frame_start = vm.heap().len();
	for _ in 0..function.frame_size {
		vm.heap_mut().push(Value::Undef);
	}

	for (slot, arg) in args.into_iter().enumerate() {
		vm.heap_mut().set((frame_start + slot) as i64, arg)?;
	}

	let receiver = Reference { base_ptr: None, target_name: None, target_ptr: callee_base_ptr.map(|p| p as i64) };
	vm.heap_mut().set((frame_start + n_args) as i64, Value::Ref(receiver))?;

	vm.stack_mut().push(Value::Ref(Reference::rooted(frame_start)));
	vm.stack_mut().extend_from_slice(&function.env_frames);

	vm.set_offset(function.start);
	Ok(())
}
