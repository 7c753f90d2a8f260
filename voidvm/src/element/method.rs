//! Method: an [`Executable`] with a parameter/return signature and
//! `invoke` (spec.md §3.8, §4.4).
//!
//! Grounded in `original_source/src/vm/element/Method.cpp`, whose
//! `invoke` is an unimplemented stub in the source — this completes it
//! per the contract spelled out in its own doc comment ("Copy method
//! arguments form the caller stack to the current stack... Put the
//! return value back to the caller stack").

use crate::element::executable::Executable;
use crate::errors::VmError;
use crate::frame::Frame;
use crate::instance::Instance;
use crate::instruction::{pull_value, push_value, Dst, Src};
use crate::modifier::Modifier;
use crate::reference::Reference;
use crate::types::Type;
use crate::value::Value;
use crate::vm::VirtualMachine;
use std::rc::Rc;

#[derive(Debug)]
pub struct Method {
	pub name: String,
	pub params: Vec<Type>,
	pub return_type: Type,
	pub executable: Rc<Executable>,
}

impl Method {
	pub fn new(name: String, params: Vec<Type>, return_type: Type, executable: Rc<Executable>) -> Self {
		Method { name, params, return_type, executable }
	}

	pub fn is_static(&self) -> bool {
		self.executable.modifiers.contains(Modifier::STATIC)
	}

	pub fn is_native(&self) -> bool {
		self.executable.modifiers.contains(Modifier::NATIVE)
	}

	pub fn is_abstract(&self) -> bool {
		self.executable.modifiers.contains(Modifier::ABSTRACT)
	}

	/// spec.md §4.4. `caller_frame` is `None` only for the static
	/// constructor call driven by `Class::initialize` (spec.md §4.8),
	/// which has no caller stack to pull parameters from or push a
	/// result onto; `owner` is the declaring class's qualified name,
	/// used only for diagnostics.
	#[tracing::instrument(skip_all, fields(method = %self.name, owner))]
	pub fn invoke(
		&self,
		vm: &VirtualMachine,
		mut caller_frame: Option<&mut Frame>,
		receiver: Option<Reference<Instance>>,
		owner: &str,
		ancestor_trace: Vec<String>,
	) -> Result<Value, VmError> {
		if self.is_native() {
			let args: Vec<Value> = match caller_frame.as_deref_mut() {
				Some(cf) => self.params.iter().map(|ty| pull_value(cf, ty, &Src::Stack)).collect(),
				None => Vec::new(),
			};
			let value = vm.call_native(owner, &self.name, &self.params, &args).ok_or_else(|| {
				VmError::UnsatisfiedLink(owner.to_string(), self.name.clone(), describe_params(&self.params))
			})?;
			if let Some(cf) = caller_frame.as_deref_mut() {
				if !matches!(self.return_type, Type::Void) {
					push_value(cf, &self.return_type, &Dst::Stack, value.clone());
				}
			}
			return Ok(value);
		}

		if self.is_abstract() {
			if let Some(cf) = caller_frame.as_deref_mut() {
				for ty in &self.params {
					let _ = pull_value(cf, ty, &Src::Stack);
				}
			}
			let value = Value::zero_of(&self.return_type);
			if let Some(cf) = caller_frame.as_deref_mut() {
				if !matches!(self.return_type, Type::Void) {
					push_value(cf, &self.return_type, &Dst::Stack, value.clone());
				}
			}
			return Ok(value);
		}

		let mut frame = Frame::new(self.name.clone(), self.executable.clone(), ancestor_trace);
		let slot_offset: usize = if self.is_static() { 0 } else { 1 };
		if !self.is_static() {
			frame.storages.instance.set(0, receiver.unwrap_or_default());
		}
		if let Some(cf) = caller_frame.as_deref_mut() {
			for (i, ty) in self.params.iter().enumerate() {
				let value = pull_value(cf, ty, &Src::Stack);
				push_value(&mut frame, ty, &Dst::Local((slot_offset + i) as u32), value);
			}
		}

		let value = frame.run(vm)?;

		if let Some(cf) = caller_frame.as_deref_mut() {
			if !matches!(self.return_type, Type::Void) {
				push_value(cf, &self.return_type, &Dst::Stack, value.clone());
			}
		}

		Ok(value)
	}
}

pub fn describe_params(params: &[Type]) -> String {
	params.iter().map(Type::to_string).collect::<Vec<_>>().join(",")
}
