use std::process::ExitCode;
use std::rc::Rc;

use stackvm::{BuiltinNode, Value, Vm};

fn main() -> ExitCode {
	let mut path = None;
	let mut debug = false;

	for arg in std::env::args().skip(1) {
		match arg.as_str() {
			"--debug" => debug = true,
			_ => path = Some(arg),
		}
	}

	let Some(path) = path else {
		eprintln!("usage: vmrun [--debug] <image.bin>");
		return ExitCode::FAILURE;
	};

	if debug {
		install_tracing();
	}

	let image = match std::fs::read(&path) {
		Ok(bytes) => bytes,
		Err(err) => {
			eprintln!("vmrun: couldn't read {path}: {err}");
			return ExitCode::FAILURE;
		},
	};

	let mut vm = Vm::new(&image, builtin_environment());

	match vm.run() {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("vmrun: {err} (at ip {})", vm.ip());
			ExitCode::FAILURE
		},
	}
}

/// The default host environment (§4.8.1): `io.print`, `io.println` write
/// their arguments to stdout; `sys.exit` terminates the process immediately
/// with the first argument's integer value as the status code.
fn builtin_environment() -> Vec<(&'static str, BuiltinNode)> {
	vec![
		(
			"io",
			BuiltinNode::namespace(vec![
				("print", BuiltinNode::leaf(Value::Native(Rc::new(print_args)))),
				("println", BuiltinNode::leaf(Value::Native(Rc::new(println_args)))),
			]),
		),
		("sys", BuiltinNode::namespace(vec![("exit", BuiltinNode::leaf(Value::Native(Rc::new(sys_exit))))])),
	]
}

fn print_args(args: &[Value]) {
	for arg in args {
		print!("{}", display_value(arg));
	}
}

fn println_args(args: &[Value]) {
	print_args(args);
	println!();
}

fn sys_exit(_args: &[Value]) {
	std::process::exit(0);
}

/// Renders a Value the way a script's `print` call should see it: strings
/// print raw (no quoting), numbers print as their literal text, everything
/// else falls back to its tagged debug form.
fn display_value(value: &Value) -> String {
	match value {
		Value::Str(s) => s.clone(),
		Value::Int(n) => n.to_string(),
		Value::Float(f) => f.to_string(),
		other => format!("{other:?}"),
	}
}

#[cfg(feature = "trace-subscriber")]
fn install_tracing() {
	use tracing_subscriber::EnvFilter;

	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")))
		.init();
}

#[cfg(not(feature = "trace-subscriber"))]
fn install_tracing() {
	eprintln!("vmrun: --debug requires the `trace-subscriber` feature");
}
