mod common;

use common::ImageBuilder;
use stackvm::{Value, Vm};

fn run(image: Vec<u8>) -> Vm<'static> {
	let leaked: &'static [u8] = Box::leak(image.into_boxed_slice());
	let mut vm = Vm::new(leaked, Vec::new());
	vm.run().expect("program should run to completion");
	vm
}

/// S1: `PUSH_INT 2; PUSH_INT 3; ADD` ⇒ top is `INT 5`.
#[test]
fn s1_add() {
	let image = ImageBuilder::new().push_int(2).push_int(3).add().build();
	let vm = run(image);
	assert_eq!(vm.stack().peek_top("test").unwrap(), &Value::Int(5));
}

/// S2: `PUSH_INT 10; PUSH_INT 0; DIV` halts with an arithmetic error.
#[test]
fn s2_div_by_zero_is_arithmetic_error() {
	let image = ImageBuilder::new().push_int(10).push_int(0).div().build();
	let leaked: &'static [u8] = Box::leak(image.into_boxed_slice());
	let mut vm = Vm::new(leaked, Vec::new());
	let err = vm.run().unwrap_err();
	assert!(matches!(err, stackvm::VmError::ArithmeticError("DIV")));
}

/// S3: a one-entry dict built with PUSH_DICT, then read back via GET+LOAD.
#[test]
fn s3_push_dict_then_get_and_load() {
	let image = ImageBuilder::new()
		.push_str("x")
		.push_int(7)
		.push_dict(1)
		.push_str("x")
		.get()
		.load(0)
		.build();
	let vm = run(image);
	assert_eq!(vm.stack().peek_top("test").unwrap(), &Value::Int(7));
}

/// S4: GET a missing key, STORE through the dangling reference, GET again.
#[test]
fn s4_lazy_slot_materialisation() {
	let image = ImageBuilder::new()
		.push_dict(0) // empty dict
		.take(0) // copy consumed by the first GET
		.push_str("y")
		.get() // dangling ref to "y"
		.push_float(1.5)
		.swap(0, 1) // STORE wants value then addr popped in that order
		.store()
		.take(0) // copy consumed by the second GET; one is retained below
		.push_str("y")
		.get()
		.load(0)
		.build();
	let vm = run(image);
	assert_eq!(vm.stack().peek_top("test").unwrap(), &Value::Float(1.5));

	let Value::Ref(dict_ref) = vm.stack().peek_at(1, "test").unwrap() else {
		panic!("expected the retained dict reference");
	};
	let Value::Dict(dict) = vm.heap().get(dict_ref.target_ptr.unwrap()).unwrap() else {
		panic!("expected a DICT");
	};
	assert_eq!(dict.len(), 1);
}

/// S5: PUSH_ARRAY 3 with items 10, 20, 30 ⇒ key 0 is 10, key 2 is 30.
#[test]
fn s5_push_array_indexing() {
	let image = ImageBuilder::new()
		.push_int(10)
		.push_int(20)
		.push_int(30)
		.push_array(3)
		.take(0)
		.push_int(0)
		.get()
		.load(0)
		.take(1)
		.push_int(2)
		.get()
		.load(0)
		.build();
	let vm = run(image);
	assert_eq!(vm.stack().peek_top("test").unwrap(), &Value::Int(30));
	assert_eq!(vm.stack().peek_at(1, "test").unwrap(), &Value::Int(10));
}

/// S6: SWAP exchanges two logical stack depths.
#[test]
fn s6_swap() {
	let image = ImageBuilder::new().push_int(1).push_int(2).swap(0, 1).build();
	let vm = run(image);
	assert_eq!(vm.stack().peek_top("test").unwrap(), &Value::Int(1));
	assert_eq!(vm.stack().peek_at(1, "test").unwrap(), &Value::Int(2));
}

/// `PUSH_STR "a"; PUSH_STR "b"; LT` compares strings lexicographically
/// instead of rejecting them, matching the reference VM's native `<`.
#[test]
fn lt_compares_strings_lexicographically() {
	let image = ImageBuilder::new().push_str("a").push_str("b").lt().build();
	let vm = run(image);
	assert_eq!(vm.stack().peek_top("test").unwrap(), &Value::Float(1.0));
}

/// `NEG` on `i32::MIN` wraps back to `i32::MIN` instead of panicking.
#[test]
fn neg_min_int_does_not_panic() {
	let image = ImageBuilder::new().push_int(i32::MIN).neg().build();
	let vm = run(image);
	assert_eq!(vm.stack().peek_top("test").unwrap(), &Value::Int(i32::MIN));
}

/// `DIV`/`MOD` of `i32::MIN` by `-1` wrap instead of panicking, even though
/// the divisor isn't zero.
#[test]
fn div_and_mod_of_min_by_minus_one_do_not_panic() {
	let image = ImageBuilder::new().push_int(i32::MIN).push_int(-1).div().build();
	let vm = run(image);
	assert_eq!(vm.stack().peek_top("test").unwrap(), &Value::Int(i32::MIN));

	let image = ImageBuilder::new().push_int(i32::MIN).push_int(-1).rem().build();
	let vm = run(image);
	assert_eq!(vm.stack().peek_top("test").unwrap(), &Value::Int(0));
}

/// Property 2: heap length never decreases over an execution.
#[test]
fn monotonic_heap() {
	let image = ImageBuilder::new()
		.push_int(1)
		.push_int(2)
		.push_dict(0)
		.push_int(3)
		.push_array(1)
		.build();
	let leaked: &'static [u8] = Box::leak(image.into_boxed_slice());
	let mut vm = Vm::new(leaked, Vec::new());
	let mut last_len = vm.heap().len();
	loop {
		if vm.is_halted() {
			break;
		}
		vm.step().unwrap();
		let len = vm.heap().len();
		assert!(len >= last_len, "heap shrank from {last_len} to {len}");
		last_len = len;
	}
}

/// Property 1: running the same image twice produces identical final state.
#[test]
fn determinism() {
	let image = ImageBuilder::new()
		.push_int(4)
		.push_int(5)
		.mul()
		.push_str("k")
		.swap(0, 1)
		.push_dict(1)
		.build();

	let first = run(image.clone());
	let second = run(image);

	assert_eq!(first.heap().len(), second.heap().len());
	assert_eq!(first.stack().peek_top("test").unwrap(), second.stack().peek_top("test").unwrap());
}

/// Property 7 (structural): a scripted CALL with an empty callee body leaves
/// exactly one new value (the frame reference) on top of the stack.
#[test]
fn call_scripted_pushes_one_result_slot() {
	let mut builder = ImageBuilder::new();
	builder = builder.push_int(123); // a value already on the stack below the call
	let depth_before_call_setup = builder.len();
	let _ = depth_before_call_setup;

	// We need the callee's `start` to be an offset past the end of the
	// image; build the fixed-size prologue first and compute it from its
	// own length plus the bytes the prologue still needs to emit.
	// PUSH_INT <fn_start>: 1 + 4
	// PUSH_FN 0,0,1:       1 + 12
	// PUSH_INT 0 (n_args): 1 + 4
	// CALL:                1
	let prologue_len = (1 + 4) + (1 + 12) + (1 + 4) + 1;
	let fn_start = (builder.len() + prologue_len) as i32;

	let image = builder
		.push_int(fn_start)
		.push_fn(0, 0, 1)
		.push_int(0) // n_args
		.call()
		.build();

	assert_eq!(image.len(), fn_start as usize, "fn_start must land exactly past the image end");

	let leaked: &'static [u8] = Box::leak(image.into_boxed_slice());
	let mut vm = Vm::new(leaked, Vec::new());

	let depth_before = vm.stack().len();
	vm.run().unwrap();
	assert_eq!(vm.stack().len(), depth_before + 1);
	assert!(matches!(vm.stack().peek_top("test").unwrap(), Value::Ref(_)));
}
