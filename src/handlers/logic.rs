use crate::error::VmError;
use crate::opcode::OpCode;
use crate::value::Value;
use crate::vm::Vm;

#[cfg_attr(feature = "tracing", tracing::instrument(skip(vm)))]
pub(crate) fn handle(vm: &mut Vm, opcode: OpCode) -> Result<(), VmError> {
	match opcode {
		OpCode::Lt => compare(vm, |ord| ord.is_lt())?,
		OpCode::Gt => compare(vm, |ord| ord.is_gt())?,
		OpCode::Eq => equality(vm, |eq| eq)?,
		OpCode::Neq => equality(vm, |eq| !eq)?,
		OpCode::Leq => compare(vm, |ord| ord.is_le())?,
		OpCode::Geq => compare(vm, |ord| ord.is_ge())?,
		OpCode::And => short_circuit(vm, false)?,
		OpCode::Or => short_circuit(vm, true)?,
		OpCode::Not => not(vm)?,
		_ => unreachable!("{opcode:?} is not a logic op"),
	}
	Ok(())
}

/// Pops `b` then `a`, in the same order as arithmetic (§4.6).
fn pop_pair(vm: &mut Vm, op: &'static str) -> Result<(Value, Value), VmError> {
	let b = vm.stack_mut().pop(op)?;
	let a = vm.stack_mut().pop(op)?;
	Ok((a, b))
}

/// Orders two operands for LT/GT/LEQ/GEQ. Numbers compare numerically;
/// strings compare lexicographically by byte value, matching the reference
/// VM's `<`/`>`/`<=`/`>=` dispatch (`original_source/tools/vm.py`), which
/// falls through to the host language's native string ordering rather than
/// rejecting it.
fn order(a: &Value, b: &Value, op: &'static str) -> Result<std::cmp::Ordering, VmError> {
	match (a, b) {
		(Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
		(a, b) => {
			let (a, b) = match (a, b) {
				(Value::Int(a), Value::Int(b)) => (*a as f64, *b as f64),
				(Value::Float(a), Value::Float(b)) => (*a as f64, *b as f64),
				(Value::Int(a), Value::Float(b)) => (*a as f64, *b as f64),
				(Value::Float(a), Value::Int(b)) => (*a as f64, *b as f64),
				(found, _) => return Err(VmError::TypeMismatch { op, found: found.type_of() }),
			};
			a.partial_cmp(&b).ok_or(VmError::TypeMismatch { op, found: crate::value::Type::Float })
		},
	}
}

/// LT, GT, LEQ, GEQ: always produce a FLOAT (§4.6, §9) so later code can
/// arithmetically combine the result.
fn compare(vm: &mut Vm, accept: impl FnOnce(std::cmp::Ordering) -> bool) -> Result<(), VmError> {
	let (a, b) = pop_pair(vm, "compare")?;
	let ord = order(&a, &b, "compare")?;
	vm.stack_mut().push(Value::Float(if accept(ord) { 1.0 } else { 0.0 }));
	Ok(())
}

fn equality(vm: &mut Vm, accept: impl FnOnce(bool) -> bool) -> Result<(), VmError> {
	let (a, b) = pop_pair(vm, "equality")?;
	let eq = a == b;
	vm.stack_mut().push(Value::Float(if accept(eq) { 1.0 } else { 0.0 }));
	Ok(())
}

/// AND/OR (§4.6, §9): eagerly evaluated (both operands are already on the
/// stack by the time the opcode runs) but "short-circuit in value" — the
/// result is whichever operand decided the outcome, not a synthesized bool.
fn short_circuit(vm: &mut Vm, is_or: bool) -> Result<(), VmError> {
	let (a, b) = pop_pair(vm, "AND/OR")?;
	let result = if is_or {
		if a.is_truthy() { a } else { b }
	} else if !a.is_truthy() {
		a
	} else {
		b
	};
	vm.stack_mut().push(result);
	Ok(())
}

/// NOT (§4.6): replaces the top with the logical negation of its payload,
/// preserving its Type tag. Only defined for the two numeric types, since
/// "preserving the tag" of e.g. a STR or DICT while flipping its truthiness
/// has no sensible payload to hold the result.
fn not(vm: &mut Vm) -> Result<(), VmError> {
	let v = vm.stack_mut().pop("NOT")?;
	let negated = match v {
		Value::Int(n) => Value::Int((n == 0) as i32),
		Value::Float(f) => Value::Float(if f == 0.0 { 1.0 } else { 0.0 }),
		found => return Err(VmError::TypeMismatch { op: "NOT", found: found.type_of() }),
	};
	vm.stack_mut().push(negated);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn order_compares_strings_lexicographically() {
		assert_eq!(order(&Value::Str("a".into()), &Value::Str("b".into()), "compare").unwrap(), std::cmp::Ordering::Less);
	}

	#[test]
	fn order_rejects_mixed_str_and_int() {
		let err = order(&Value::Str("a".into()), &Value::Int(1), "compare").unwrap_err();
		assert!(matches!(err, VmError::TypeMismatch { op: "compare", .. }));
	}

	#[test]
	fn order_widens_int_and_float() {
		assert_eq!(order(&Value::Int(1), &Value::Float(1.5), "compare").unwrap(), std::cmp::Ordering::Less);
	}
}
