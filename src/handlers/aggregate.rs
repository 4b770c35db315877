use crate::error::VmError;
use crate::opcode::OpCode;
use crate::value::{Dict, Key, Reference, Type, Value};
use crate::vm::Vm;

#[cfg_attr(feature = "tracing", tracing::instrument(skip(vm)))]
pub(crate) fn handle(vm: &mut Vm, opcode: OpCode) -> Result<(), VmError> {
	match opcode {
		OpCode::Get => get(vm)?,
		OpCode::PushDict => push_dict(vm)?,
		OpCode::PushArray => push_array(vm)?,
		_ => unreachable!("{opcode:?} is not an aggregate op"),
	}
	Ok(())
}

fn value_to_key(value: &Value) -> Result<Key, VmError> {
	match value {
		Value::Str(s) => Ok(Key::Str(s.clone())),
		Value::Int(n) => Ok(Key::Int(*n as i64)),
		found => Err(VmError::TypeMismatch { op: "GET", found: found.type_of() }),
	}
}

/// GET (§4.7): pop `key` then `d`; resolve `key` against the dictionary `d`
/// points at, producing a reference that is dangling if the key is absent
/// (materialised later by STORE) and otherwise aliases the entry's own
/// `target_ptr`. `"length"` is handled out-of-band: a fresh heap cell is
/// allocated to hold the entry count so LOAD can read it uniformly.
fn get(vm: &mut Vm) -> Result<(), VmError> {
	let key = vm.stack_mut().pop("GET")?;
	let d = vm.stack_mut().pop("GET")?;

	let key = value_to_key(&key)?;

	let container_ptr = match &d {
		Value::Ref(r) => r.target_ptr.ok_or(VmError::TypeMismatch { op: "GET", found: Type::Ref })?,
		found => return Err(VmError::TypeMismatch { op: "GET", found: found.type_of() }),
	};

	let dict = match vm.heap().get(container_ptr)? {
		Value::Dict(dict) => dict,
		found => return Err(VmError::TypeMismatch { op: "GET", found: found.type_of() }),
	};

	let base_ptr = container_ptr as usize;

	let target_ptr = if key.is_length() {
		let len = dict.len() as f32;
		Some(vm.heap_mut().push(Value::Float(len)) as i64)
	} else if let Some(existing) = dict.get(&key) {
		existing.as_reference().and_then(|r| r.target_ptr)
	} else {
		None
	};

	let reference = Reference { base_ptr: Some(base_ptr), target_name: Some(key), target_ptr };
	vm.stack_mut().push(Value::Ref(reference));
	Ok(())
}

/// PUSH_DICT len (§4.7): allocate an empty DICT on the heap, then for `len`
/// pairs (popped `value` then `key`), append `value` to the heap and bind
/// `dict[key]` to a reference to that new slot.
fn push_dict(vm: &mut Vm) -> Result<(), VmError> {
	let len = vm.image_mut().read_u32()? as usize;

	let dict_ptr = vm.heap_mut().push(Value::Dict(Dict::new()));

	for _ in 0..len {
		let value = vm.stack_mut().pop("PUSH_DICT")?;
		let key = vm.stack_mut().pop("PUSH_DICT")?;
		let key = value_to_key(&key)?;

		let slot = vm.heap_mut().push(value);
		let reference = Reference { base_ptr: Some(dict_ptr), target_name: Some(key.clone()), target_ptr: Some(slot as i64) };

		match vm.heap_mut().get_mut(dict_ptr as i64)? {
			Value::Dict(dict) => dict.insert(key, Value::Ref(reference)),
			_ => unreachable!("slot we just pushed is a DICT"),
		}
	}

	vm.stack_mut().push(Value::Ref(Reference::rooted(dict_ptr)));
	Ok(())
}

/// PUSH_ARRAY len (§4.7): identical to PUSH_DICT but keyed by integers. The
/// item popped on iteration `i` (0-based, counting from the top of stack) is
/// stored at key `len-1-i`, so the first item pushed by the compiler lands
/// at key 0 and the last lands at `len-1`.
fn push_array(vm: &mut Vm) -> Result<(), VmError> {
	let len = vm.image_mut().read_u32()? as usize;

	let dict_ptr = vm.heap_mut().push(Value::Dict(Dict::new()));

	for i in 0..len {
		let item = vm.stack_mut().pop("PUSH_ARRAY")?;
		let key = Key::Int((len - 1 - i) as i64);

		let slot = vm.heap_mut().push(item);
		let reference = Reference { base_ptr: Some(dict_ptr), target_name: Some(key.clone()), target_ptr: Some(slot as i64) };

		match vm.heap_mut().get_mut(dict_ptr as i64)? {
			Value::Dict(dict) => dict.insert(key, Value::Ref(reference)),
			_ => unreachable!("slot we just pushed is a DICT"),
		}
	}

	vm.stack_mut().push(Value::Ref(Reference::rooted(dict_ptr)));
	Ok(())
}
