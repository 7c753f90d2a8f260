//! Field: an [`Executable`] whose body computes an initial value
//! (spec.md §3.8, §4.5).
//!
//! Grounded in `original_source/src/vm/element/Field.hpp`. Static vs.
//! instance semantics are decided by the caller (`Class::initialize`
//! writes the result to the class's static table; `Class::instantiate`
//! writes it into the new `Instance`'s field map) — the field itself
//! just runs its mini-program.

use crate::element::executable::Executable;
use crate::errors::VmError;
use crate::frame::Frame;
use crate::modifier::Modifier;
use crate::types::Type;
use crate::value::Value;
use crate::vm::VirtualMachine;
use std::rc::Rc;

#[derive(Debug)]
pub struct Field {
	pub name: String,
	pub ty: Type,
	pub executable: Rc<Executable>,
}

impl Field {
	pub fn new(name: String, ty: Type, executable: Rc<Executable>) -> Self {
		Field { name, ty, executable }
	}

	pub fn is_static(&self) -> bool {
		self.executable.modifiers.contains(Modifier::STATIC)
	}

	/// Runs the body as a mini-program with no caller and no receiver
	/// (spec.md §4.5). An empty body short-circuits to the type's
	/// zero/null value instead of creating a `Frame` (spec.md §4.6).
	pub fn invoke(&self, vm: &VirtualMachine) -> Result<Value, VmError> {
		if self.executable.instructions.is_empty() {
			return Ok(Value::zero_of(&self.ty));
		}
		let mut frame = Frame::new(self.name.clone(), self.executable.clone(), Vec::new());
		frame.run(vm)
	}
}
