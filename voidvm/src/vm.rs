//! The virtual machine: class registry, instance allocation, static
//! initialization, native method binding (spec.md §4, §5).
//!
//! Grounded in `original_source/src/vm/VirtualMachine.cpp`'s
//! `defineClass`/`instantiate`/`initialize`/native-table bind-and-call
//! pair.

use crate::element::class::Class;
use crate::element::method::describe_params;
use crate::errors::VmError;
use crate::instance::Instance;
use crate::loader::{class_parser, program};
use crate::reference::Reference;
use crate::types::Type;
use crate::value::Value;
use fxhash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

type NativeFn = Rc<dyn Fn(&[Value]) -> Value>;

/// Binds native methods by `Class.method(Params)` descriptor, the same
/// key shape `UnsatisfiedLink` reports (spec.md §4.4, §7).
#[derive(Default)]
pub struct NativeTable {
	handlers: RefCell<FxHashMap<String, NativeFn>>,
}

impl NativeTable {
	fn key(owner: &str, method: &str, params: &[Type]) -> String {
		format!("{owner}.{method}({})", describe_params(params))
	}

	pub fn bind(&self, owner: &str, method: &str, params: &[Type], handler: NativeFn) {
		self.handlers.borrow_mut().insert(Self::key(owner, method, params), handler);
	}

	pub fn call(&self, owner: &str, method: &str, params: &[Type], args: &[Value]) -> Option<Value> {
		let handlers = self.handlers.borrow();
		let handler = handlers.get(&Self::key(owner, method, params))?;
		Some(handler(args))
	}
}

/// Owns every loaded [`Class`], the native method table, and the
/// monotonic instance-id counter (spec.md §3.6 "instance identity is
/// assigned once, never reused").
#[derive(Default)]
pub struct VirtualMachine {
	classes: RefCell<FxHashMap<String, Rc<Class>>>,
	natives: NativeTable,
	next_instance_id: Cell<u64>,
}

impl VirtualMachine {
	pub fn new() -> Self {
		VirtualMachine::default()
	}

	/// Loads every class found under `path` (spec.md §4.1) and registers
	/// them. Does not run static initialization — callers follow up with
	/// [`VirtualMachine::initialize`] (spec.md §4.8).
	#[tracing::instrument(skip(self))]
	pub fn load_bytecode(&self, path: &Path) -> Result<(), VmError> {
		let lines = program::load_lines(path)?;
		let classes = class_parser::parse_classes(&lines)?;
		for class in classes {
			self.define_class(class)?;
		}
		Ok(())
	}

	pub fn define_class(&self, class: Class) -> Result<(), VmError> {
		let mut classes = self.classes.borrow_mut();
		if classes.contains_key(&class.name) {
			return Err(VmError::ClassRedefine(class.name));
		}
		classes.insert(class.name.clone(), Rc::new(class));
		Ok(())
	}

	pub fn find_class(&self, name: &str) -> Option<Rc<Class>> {
		self.classes.borrow().get(name).cloned()
	}

	pub fn classes(&self) -> Vec<Rc<Class>> {
		self.classes.borrow().values().cloned().collect()
	}

	pub fn bind_native(&self, owner: &str, method: &str, params: &[Type], handler: NativeFn) {
		self.natives.bind(owner, method, params, handler);
	}

	pub fn call_native(&self, owner: &str, method: &str, params: &[Type], args: &[Value]) -> Option<Value> {
		self.natives.call(owner, method, params, args)
	}

	fn next_instance_id(&self) -> u64 {
		let id = self.next_instance_id.get();
		self.next_instance_id.set(id + 1);
		id
	}

	/// Allocates a new instance of `class`, recursively copying in every
	/// non-static field along the superclass chain, most-derived class
	/// first (spec.md §4.6). A field already present under that name
	/// from a more-derived class is left untouched — first definition
	/// wins, mirroring Rust's usual shadowing-the-other-way-round rule
	/// reversed for construction order.
	#[tracing::instrument(skip(self, class), fields(class = %class.name))]
	pub fn instantiate(&self, class: &Rc<Class>) -> Result<Reference<Instance>, VmError> {
		let mut instance = Instance::new(self.next_instance_id(), class.clone());
		self.copy_fields(class, &mut instance)?;
		Ok(Reference::new(instance))
	}

	fn copy_fields(&self, class: &Rc<Class>, instance: &mut Instance) -> Result<(), VmError> {
		for field in class.instance_fields() {
			if !instance.has_field(&field.name) {
				let value = field.invoke(self)?;
				instance.init_field_if_absent(&field.name, value);
			}
		}
		if class.superclass != "Object" {
			if let Some(superclass) = self.find_class(&class.superclass) {
				self.copy_fields(&superclass, instance)?;
			}
		}
		Ok(())
	}

	/// Evaluates every registered class's static fields and runs its
	/// `<cinit>` static constructor, if any (spec.md §4.8). Order across
	/// classes is registration order; within a class, field declaration
	/// order, matching `copy_fields`'s most-derived-first reasoning
	/// inverted (statics have no inheritance to resolve).
	#[tracing::instrument(skip(self))]
	pub fn initialize(&self) -> Result<(), VmError> {
		for class in self.classes() {
			for field in class.fields.iter().filter(|f| f.is_static()) {
				let value = field.invoke(self)?;
				class.set_static(&field.name, value);
			}
			if let Some(cinit) = class.static_constructor() {
				cinit.invoke(self, None, None, &class.name, Vec::new())?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::element::field::Field;
	use crate::element::executable::Executable;
	use crate::modifier::Modifier;

	fn zero_field(name: &str, ty: Type, is_static: bool) -> Rc<Field> {
		let modifiers = if is_static { Modifier::STATIC } else { Modifier::empty() };
		Rc::new(Field::new(name.to_string(), ty, Rc::new(Executable::empty(modifiers))))
	}

	#[test]
	fn instantiate_copies_superclass_fields_independently() {
		let vm = VirtualMachine::new();
		let base = Class::assemble("Base".into(), "Object".into(), Modifier::empty(), Vec::new(), Vec::new(), vec![zero_field("n", Type::Int, false)]);
		vm.define_class(base).unwrap();
		let base_ref = vm.find_class("Base").unwrap();
		let child = Class::assemble("Child".into(), "Base".into(), Modifier::empty(), Vec::new(), Vec::new(), Vec::new());
		vm.define_class(child).unwrap();
		let child_ref = vm.find_class("Child").unwrap();

		let a = vm.instantiate(&base_ref).unwrap();
		let b = vm.instantiate(&child_ref).unwrap();
		a.with_mut(|i| i.set_field("n", Value::Int(7)));
		assert!(matches!(b.with(|i| i.get_field("n")), Some(Value::Int(0))));
	}

	#[test]
	fn defining_the_same_class_twice_is_fatal() {
		let vm = VirtualMachine::new();
		vm.define_class(Class::new("C".into())).unwrap();
		let err = vm.define_class(Class::new("C".into())).unwrap_err();
		assert!(matches!(err, VmError::ClassRedefine(name) if name == "C"));
	}

	#[test]
	fn initialize_evaluates_static_fields_once() {
		let vm = VirtualMachine::new();
		let class = Class::assemble("C".into(), "Object".into(), Modifier::empty(), Vec::new(), Vec::new(), vec![zero_field("s", Type::Int, true)]);
		vm.define_class(class).unwrap();
		vm.initialize().unwrap();
		let c = vm.find_class("C").unwrap();
		assert!(matches!(c.get_static("s"), Value::Int(0)));
	}
}
