use crate::error::VmError;
use crate::opcode::OpCode;
use crate::value::{Key, Reference, Value};
use crate::vm::Vm;

#[cfg_attr(feature = "tracing", tracing::instrument(skip(vm)))]
pub(crate) fn handle(vm: &mut Vm, opcode: OpCode) -> Result<(), VmError> {
	match opcode {
		OpCode::Load => load(vm)?,
		OpCode::Store => store(vm)?,
		_ => unreachable!("{opcode:?} is not a memory op"),
	}
	Ok(())
}

/// LOAD k (§4.4): dereference the top of stack (or treat it as a raw heap
/// index) plus `k`, replacing the top with the loaded Value.
fn load(vm: &mut Vm) -> Result<(), VmError> {
	let k = vm.image_mut().read_u32()? as i64;

	let index = match vm.stack().peek_top("LOAD")? {
		Value::Ref(r) => match r.target_ptr {
			Some(ptr) => ptr + k,
			None => return Err(VmError::TypeMismatch { op: "LOAD", found: crate::value::Type::Ref }),
		},
		Value::Int(n) => *n as i64 + k,
		found => return Err(VmError::TypeMismatch { op: "LOAD", found: found.type_of() }),
	};

	let value = vm.heap().get(index)?.clone();
	vm.stack_mut().set_top(value, "LOAD")?;
	Ok(())
}

/// STORE (§4.4): pop `addr` then `value`. A dangling reference materialises
/// a new heap cell and installs a REF entry in its container dict; a bound
/// reference simply overwrites its referent in place.
fn store(vm: &mut Vm) -> Result<(), VmError> {
	let addr = vm.stack_mut().pop("STORE")?;
	let value = vm.stack_mut().pop("STORE")?;

	let addr = match addr {
		Value::Ref(r) => r,
		found => return Err(VmError::TypeMismatch { op: "STORE", found: found.type_of() }),
	};

	match addr.target_ptr {
		None => {
			let base_ptr = addr.base_ptr.ok_or(VmError::TypeMismatch { op: "STORE", found: crate::value::Type::Ref })?;
			let target_name =
				addr.target_name.clone().ok_or(VmError::TypeMismatch { op: "STORE", found: crate::value::Type::Ref })?;

			let new_ptr = vm.heap_mut().push(value);

			let new_ref = Reference { base_ptr: Some(base_ptr), target_name: Some(target_name.clone()), target_ptr: Some(new_ptr as i64) };

			write_entry(vm, base_ptr, target_name, new_ref)?;
		},
		Some(ptr) => {
			vm.heap_mut().set(ptr, value)?;
		},
	}

	Ok(())
}

fn write_entry(vm: &mut Vm, base_ptr: usize, key: Key, reference: Reference) -> Result<(), VmError> {
	match vm.heap_mut().get_mut(base_ptr as i64)? {
		Value::Dict(dict) => {
			dict.insert(key, Value::Ref(reference));
			Ok(())
		},
		found => Err(VmError::TypeMismatch { op: "STORE", found: found.type_of() }),
	}
}
