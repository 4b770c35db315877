use crate::heap::Heap;
use crate::value::{Reference, Value};

/// A host-provided tree of built-ins, handed to `Vm::new` and recursively
/// flattened onto the heap (§4.8). Leaves are host Values (typically
/// `Value::Native`); branches are nested namespaces.
pub enum BuiltinNode {
	Leaf(Value),
	Namespace(Vec<(&'static str, BuiltinNode)>),
}

impl BuiltinNode {
	pub fn namespace(entries: Vec<(&'static str, BuiltinNode)>) -> Self {
		BuiltinNode::Namespace(entries)
	}

	pub fn leaf(value: Value) -> Self {
		BuiltinNode::Leaf(value)
	}
}

/// Walks `root` onto `heap`, returning the heap index of the top-level
/// dictionary. Every child becomes a `REF` entry whose `base_ptr` is the
/// parent dictionary's own heap index, so programs can resolve a built-in by
/// chaining GET from heap slot 0.
pub(crate) fn install(heap: &mut Heap, root: Vec<(&'static str, BuiltinNode)>) -> usize {
	install_namespace(heap, root)
}

fn install_namespace(heap: &mut Heap, entries: Vec<(&'static str, BuiltinNode)>) -> usize {
	let dict_ptr = heap.push(Value::Dict(crate::value::Dict::new()));

	for (name, node) in entries {
		let target_ptr = match node {
			BuiltinNode::Leaf(value) => heap.push(value),
			BuiltinNode::Namespace(children) => install_namespace(heap, children),
		};

		let reference = Reference {
			base_ptr: Some(dict_ptr),
			target_name: Some(name.to_owned().into()),
			target_ptr: Some(target_ptr as i64),
		};

		let Value::Dict(dict) = heap.get_mut(dict_ptr as i64).expect("just pushed") else {
			unreachable!("slot we just pushed is a DICT");
		};
		dict.insert(name.to_owned().into(), Value::Ref(reference));
	}

	dict_ptr
}
