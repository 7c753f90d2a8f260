//! Per-invocation execution state (spec.md §3.5, §4.9).
//!
//! A `Frame` bundles one [`TypedStack`]/[`TypedStorage`] pair per
//! primitive family plus the instance family, a cursor, and enough of
//! the caller's trace to answer `stackTrace()` (spec.md, "Frame…
//! debug `name`") without needing an unsafe parent pointer: since
//! cross-frame data transfer only ever happens through the typed
//! return-value push in [`crate::element::method::Method::invoke`]
//! (spec.md §5), no instruction ever needs to reach back into the
//! caller's live `Frame`, so a flattened, owned trace of ancestor
//! names is enough.

use crate::element::executable::Executable;
use crate::errors::VmError;
use crate::instance::Instance;
use crate::instruction::Flow;
use crate::reference::Reference;
use crate::stack::TypedStack;
use crate::storage::TypedStorage;
use crate::value::{NumKind, NumValue, PrimKind, PrimValue, Value};
use crate::vm::VirtualMachine;
use derivative::Derivative;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Stacks {
	pub byte: TypedStack<i8>,
	pub short: TypedStack<i16>,
	pub int: TypedStack<i32>,
	pub long: TypedStack<i64>,
	pub float: TypedStack<f32>,
	pub double: TypedStack<f64>,
	pub bool_: TypedStack<bool>,
	pub char_: TypedStack<char>,
	pub instance: TypedStack<Reference<Instance>>,
}

impl Stacks {
	pub fn push_num(&mut self, kind: NumKind, value: NumValue) {
		match value {
			NumValue::Int(v) => self.int.push(v),
			NumValue::Long(v) => self.long.push(v),
			NumValue::Float(v) => self.float.push(v),
			NumValue::Double(v) => self.double.push(v),
		}
		debug_assert_eq!(kind, value.kind());
	}

	pub fn pull_num(&mut self, kind: NumKind) -> NumValue {
		match kind {
			NumKind::Int => NumValue::Int(self.int.pull()),
			NumKind::Long => NumValue::Long(self.long.pull()),
			NumKind::Float => NumValue::Float(self.float.pull()),
			NumKind::Double => NumValue::Double(self.double.pull()),
		}
	}

	pub fn peek_num(&self, kind: NumKind) -> NumValue {
		match kind {
			NumKind::Int => NumValue::Int(self.int.get()),
			NumKind::Long => NumValue::Long(self.long.get()),
			NumKind::Float => NumValue::Float(self.float.get()),
			NumKind::Double => NumValue::Double(self.double.get()),
		}
	}

	pub fn size_num(&self, kind: NumKind) -> u32 {
		match kind {
			NumKind::Int => self.int.size(),
			NumKind::Long => self.long.size(),
			NumKind::Float => self.float.size(),
			NumKind::Double => self.double.size(),
		}
	}

	pub fn clear_num(&mut self, kind: NumKind) {
		match kind {
			NumKind::Int => self.int.clear(),
			NumKind::Long => self.long.clear(),
			NumKind::Float => self.float.clear(),
			NumKind::Double => self.double.clear(),
		}
	}

	pub fn dump_num(&self, kind: NumKind) -> Vec<String> {
		match kind {
			NumKind::Int => self.int.iter().map(|v| v.to_string()).collect(),
			NumKind::Long => self.long.iter().map(|v| v.to_string()).collect(),
			NumKind::Float => self.float.iter().map(|v| v.to_string()).collect(),
			NumKind::Double => self.double.iter().map(|v| v.to_string()).collect(),
		}
	}

	pub fn dump_prim(&self, kind: PrimKind) -> Vec<String> {
		match kind {
			PrimKind::Byte => self.byte.iter().map(|v| v.to_string()).collect(),
			PrimKind::Short => self.short.iter().map(|v| v.to_string()).collect(),
			PrimKind::Bool => self.bool_.iter().map(|v| v.to_string()).collect(),
			PrimKind::Char => self.char_.iter().map(|v| v.to_string()).collect(),
		}
	}

	pub fn push_prim(&mut self, value: PrimValue) {
		match value {
			PrimValue::Byte(v) => self.byte.push(v),
			PrimValue::Short(v) => self.short.push(v),
			PrimValue::Bool(v) => self.bool_.push(v),
			PrimValue::Char(v) => self.char_.push(v),
		}
	}

	pub fn pull_prim(&mut self, kind: PrimKind) -> PrimValue {
		match kind {
			PrimKind::Byte => PrimValue::Byte(self.byte.pull()),
			PrimKind::Short => PrimValue::Short(self.short.pull()),
			PrimKind::Bool => PrimValue::Bool(self.bool_.pull()),
			PrimKind::Char => PrimValue::Char(self.char_.pull()),
		}
	}

	pub fn peek_prim(&self, kind: PrimKind) -> PrimValue {
		match kind {
			PrimKind::Byte => PrimValue::Byte(self.byte.get()),
			PrimKind::Short => PrimValue::Short(self.short.get()),
			PrimKind::Bool => PrimValue::Bool(self.bool_.get()),
			PrimKind::Char => PrimValue::Char(self.char_.get()),
		}
	}

	pub fn size_prim(&self, kind: PrimKind) -> u32 {
		match kind {
			PrimKind::Byte => self.byte.size(),
			PrimKind::Short => self.short.size(),
			PrimKind::Bool => self.bool_.size(),
			PrimKind::Char => self.char_.size(),
		}
	}

	pub fn clear_prim(&mut self, kind: PrimKind) {
		match kind {
			PrimKind::Byte => self.byte.clear(),
			PrimKind::Short => self.short.clear(),
			PrimKind::Bool => self.bool_.clear(),
			PrimKind::Char => self.char_.clear(),
		}
	}
}

#[derive(Debug, Default)]
pub struct Storages {
	pub byte: TypedStorage<i8>,
	pub short: TypedStorage<i16>,
	pub int: TypedStorage<i32>,
	pub long: TypedStorage<i64>,
	pub float: TypedStorage<f32>,
	pub double: TypedStorage<f64>,
	pub bool_: TypedStorage<bool>,
	pub char_: TypedStorage<char>,
	pub instance: TypedStorage<Reference<Instance>>,
}

impl Storages {
	pub fn get_num(&self, kind: NumKind, slot: u32) -> NumValue {
		match kind {
			NumKind::Int => NumValue::Int(self.int.get(slot)),
			NumKind::Long => NumValue::Long(self.long.get(slot)),
			NumKind::Float => NumValue::Float(self.float.get(slot)),
			NumKind::Double => NumValue::Double(self.double.get(slot)),
		}
	}

	pub fn set_num(&mut self, slot: u32, value: NumValue) {
		match value {
			NumValue::Int(v) => self.int.set(slot, v),
			NumValue::Long(v) => self.long.set(slot, v),
			NumValue::Float(v) => self.float.set(slot, v),
			NumValue::Double(v) => self.double.set(slot, v),
		}
	}

	pub fn ensure_num(&mut self, kind: NumKind, capacity: u32) {
		match kind {
			NumKind::Int => self.int.ensure(capacity),
			NumKind::Long => self.long.ensure(capacity),
			NumKind::Float => self.float.ensure(capacity),
			NumKind::Double => self.double.ensure(capacity),
		}
	}

	pub fn get_prim(&self, kind: PrimKind, slot: u32) -> PrimValue {
		match kind {
			PrimKind::Byte => PrimValue::Byte(self.byte.get(slot)),
			PrimKind::Short => PrimValue::Short(self.short.get(slot)),
			PrimKind::Bool => PrimValue::Bool(self.bool_.get(slot)),
			PrimKind::Char => PrimValue::Char(self.char_.get(slot)),
		}
	}

	pub fn set_prim(&mut self, slot: u32, value: PrimValue) {
		match value {
			PrimValue::Byte(v) => self.byte.set(slot, v),
			PrimValue::Short(v) => self.short.set(slot, v),
			PrimValue::Bool(v) => self.bool_.set(slot, v),
			PrimValue::Char(v) => self.char_.set(slot, v),
		}
	}

	pub fn ensure_prim(&mut self, kind: PrimKind, capacity: u32) {
		match kind {
			PrimKind::Byte => self.byte.ensure(capacity),
			PrimKind::Short => self.short.ensure(capacity),
			PrimKind::Bool => self.bool_.ensure(capacity),
			PrimKind::Char => self.char_.ensure(capacity),
		}
	}
}

/// Mirrors `original_source`'s `Stack`/`Storage` pairing one-to-one
/// with the owning `Executable`, plus the linear call trace used for
/// `-XVMDebug` frame dumps (spec.md §7).
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Frame {
	pub stacks: Stacks,
	pub storages: Storages,
	pub cursor: u32,
	pub length: u32,
	pub result: Option<Value>,
	#[derivative(Debug = "ignore")]
	pub executable: Rc<Executable>,
	pub offset: u32,
	pub name: String,
	ancestor_trace: Vec<String>,
}

impl Frame {
	pub fn new(name: impl Into<String>, executable: Rc<Executable>, ancestor_trace: Vec<String>) -> Self {
		let length = executable.instructions.len() as u32;
		Frame {
			stacks: Stacks::default(),
			storages: Storages::default(),
			cursor: 0,
			length,
			result: None,
			executable,
			offset: ancestor_trace.len() as u32,
			name: name.into(),
			ancestor_trace,
		}
	}

	/// The trace to hand to a callee `Frame` constructed from this one.
	pub fn child_trace(&self) -> Vec<String> {
		let mut trace = self.ancestor_trace.clone();
		trace.push(self.name.clone());
		trace
	}

	/// Innermost-first chain of frame names, for `-XVMDebug` dumps.
	pub fn stack_trace(&self) -> Vec<String> {
		let mut trace = vec![self.name.clone()];
		trace.extend(self.ancestor_trace.iter().rev().cloned());
		trace
	}

	pub fn terminated(&self) -> bool {
		self.result.is_some() || self.cursor >= self.length
	}

	/// Drives the cursor loop of spec.md §4.4 step 4/§4.9 "Frame
	/// execution": `instruction[cursor].execute(frame); cursor += 1`
	/// unless the instruction redirects the cursor (`Flow::Jump`) or
	/// terminates the frame (`Flow::Return`). Falling off the end of
	/// the instruction list is a `TerminatedVoid` (spec.md §4.9).
	pub fn run(&mut self, vm: &VirtualMachine) -> Result<Value, VmError> {
		let executable = self.executable.clone();
		while (self.cursor as usize) < executable.instructions.len() {
			let instruction = &executable.instructions[self.cursor as usize];
			match instruction.execute(vm, self) {
				Ok(Flow::Continue) => self.cursor += 1,
				Ok(Flow::Jump(target)) => self.cursor = target as u32,
				Ok(Flow::Return(value)) => {
					self.result = Some(value.clone());
					return Ok(value);
				}
				Err(err) => {
					if crate::diagnostics::debug_mode() {
						tracing::error!(
							frame_trace = ?self.stack_trace(),
							instruction = %instruction.debug(),
							%err,
							"fatal VM error"
						);
					}
					return Err(err);
				}
			}
		}
		Ok(Value::Void)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::element::executable::Executable;
	use crate::modifier::Modifier;

	#[test]
	fn offset_tracks_ancestor_depth() {
		let exe = Rc::new(Executable::empty(Modifier::empty()));
		let root = Frame::new("root", exe.clone(), Vec::new());
		assert_eq!(root.offset, 0);
		let child = Frame::new("child", exe, root.child_trace());
		assert_eq!(child.offset, 1);
		assert_eq!(child.stack_trace(), vec!["child".to_string(), "root".to_string()]);
	}

	#[test]
	fn int_and_float_families_are_independent() {
		let exe = Rc::new(Executable::empty(Modifier::empty()));
		let mut frame = Frame::new("f", exe, Vec::new());
		frame.stacks.int.push(1);
		frame.stacks.float.push(2.0);
		frame.stacks.int.pull();
		assert_eq!(frame.stacks.float.size(), 1);
		assert_eq!(frame.stacks.float.get(), 2.0);
	}
}
