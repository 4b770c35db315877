use crate::error::VmError;
use crate::opcode::OpCode;
use crate::value::{Reference, Value};
use crate::vm::Vm;

#[cfg_attr(feature = "tracing", tracing::instrument(skip(vm)))]
pub(crate) fn handle(vm: &mut Vm, opcode: OpCode) -> Result<(), VmError> {
	match opcode {
		OpCode::Add => binary(vm, "ADD", add)?,
		OpCode::Sub => binary(vm, "SUB", |a, b| numeric(a, b, "SUB", i32::wrapping_sub, |x, y| x - y))?,
		OpCode::Mul => binary(vm, "MUL", |a, b| numeric(a, b, "MUL", i32::wrapping_mul, |x, y| x * y))?,
		OpCode::Div => binary(vm, "DIV", div)?,
		OpCode::Mod => binary(vm, "MOD", rem)?,
		OpCode::Neg => neg(vm)?,
		_ => unreachable!("{opcode:?} is not an arithmetic op"),
	}
	Ok(())
}

/// Pops `b` then `a`, applies `op(a, b)`, pushes the result. The spec numbers
/// stack effects `a, b ⇒ result`, so `a` is pushed first (deeper) and `b` is
/// popped first.
fn binary(vm: &mut Vm, op: &'static str, f: impl FnOnce(Value, Value) -> Result<Value, VmError>) -> Result<(), VmError> {
	let b = vm.stack_mut().pop(op)?;
	let a = vm.stack_mut().pop(op)?;
	let result = f(a, b)?;
	vm.stack_mut().push(result);
	Ok(())
}

fn numeric(
	a: Value,
	b: Value,
	op: &'static str,
	int_op: impl FnOnce(i32, i32) -> i32,
	float_op: impl FnOnce(f32, f32) -> f32,
) -> Result<Value, VmError> {
	match (a, b) {
		(Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(a, b))),
		(Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(a, b))),
		(Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_op(a as f32, b))),
		(Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_op(a, b as f32))),
		(a, _) => Err(VmError::TypeMismatch { op, found: a.type_of() }),
	}
}

/// ADD is the one operator that also concatenates strings and sums
/// reference offsets (§4.6, §9): int/float/string/reference result types are
/// all inferred from the operand kinds, mirroring the host-language
/// `+` dispatch the reference VM leans on.
fn add(a: Value, b: Value) -> Result<Value, VmError> {
	match (a, b) {
		(Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
		(Value::Ref(a), Value::Ref(b)) => Ok(Value::Ref(a + b)),
		(Value::Ref(a), Value::Int(b)) => Ok(Value::Ref(a + b as i64)),
		(a, b) => numeric(a, b, "ADD", |x, y| x.wrapping_add(y), |x, y| x + y),
	}
}

/// DIV/MOD both guard the zero divisor explicitly (§4.6); the int path then
/// uses `wrapping_div`/`wrapping_rem` so `i32::MIN / -1` (overflow in two's
/// complement division) wraps back to `i32::MIN`/`0` instead of panicking,
/// the same policy `add`/`sub`/`mul`/`neg` apply to their own overflow cases.
fn div(a: Value, b: Value) -> Result<Value, VmError> {
	match &b {
		Value::Int(0) => return Err(VmError::ArithmeticError("DIV")),
		Value::Float(f) if *f == 0.0 => return Err(VmError::ArithmeticError("DIV")),
		_ => {},
	}
	numeric(a, b, "DIV", i32::wrapping_div, |x, y| x / y)
}

fn rem(a: Value, b: Value) -> Result<Value, VmError> {
	match &b {
		Value::Int(0) => return Err(VmError::ArithmeticError("MOD")),
		Value::Float(f) if *f == 0.0 => return Err(VmError::ArithmeticError("MOD")),
		_ => {},
	}
	numeric(a, b, "MOD", i32::wrapping_rem, |x, y| x % y)
}

/// NEG (§4.6): negates the top operand, preserving its Type tag. `wrapping_neg`
/// matches the wrapping policy the other integer ops use, so `NEG` on
/// `i32::MIN` yields `i32::MIN` rather than panicking.
fn neg(vm: &mut Vm) -> Result<(), VmError> {
	let v = vm.stack_mut().pop("NEG")?;
	let negated = negate(v)?;
	vm.stack_mut().push(negated);
	Ok(())
}

fn negate(v: Value) -> Result<Value, VmError> {
	match v {
		Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
		Value::Float(f) => Ok(Value::Float(-f)),
		Value::Ref(r) => Ok(Value::Ref(Reference { base_ptr: r.base_ptr, target_name: r.target_name, target_ptr: r.target_ptr.map(|p| -p) })),
		found => Err(VmError::TypeMismatch { op: "NEG", found: found.type_of() }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn add_wraps_on_overflow() {
		assert_eq!(add(Value::Int(i32::MAX), Value::Int(1)).unwrap(), Value::Int(i32::MIN));
	}

	#[test]
	fn sub_wraps_on_overflow() {
		let result = numeric(Value::Int(i32::MIN), Value::Int(1), "SUB", i32::wrapping_sub, |x, y| x - y).unwrap();
		assert_eq!(result, Value::Int(i32::MAX));
	}

	#[test]
	fn mul_wraps_on_overflow() {
		let result = numeric(Value::Int(i32::MAX), Value::Int(2), "MUL", i32::wrapping_mul, |x, y| x * y).unwrap();
		assert_eq!(result, Value::Int(-2));
	}

	#[test]
	fn div_by_minus_one_wraps_instead_of_panicking() {
		assert_eq!(div(Value::Int(i32::MIN), Value::Int(-1)).unwrap(), Value::Int(i32::MIN));
	}

	#[test]
	fn rem_by_minus_one_wraps_instead_of_panicking() {
		assert_eq!(rem(Value::Int(i32::MIN), Value::Int(-1)).unwrap(), Value::Int(0));
	}

	#[test]
	fn div_by_zero_is_arithmetic_error() {
		assert!(matches!(div(Value::Int(10), Value::Int(0)), Err(VmError::ArithmeticError("DIV"))));
	}

	#[test]
	fn neg_min_wraps_instead_of_panicking() {
		assert_eq!(negate(Value::Int(i32::MIN)).unwrap(), Value::Int(i32::MIN));
	}

	#[test]
	fn add_concatenates_strings() {
		let result = add(Value::Str("foo".into()), Value::Str("bar".into())).unwrap();
		assert_eq!(result, Value::Str("foobar".into()));
	}
}
