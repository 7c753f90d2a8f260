//! Execution for label/jump/linker bookkeeping, text output, `return`,
//! and the supplemented field/static/invoke opcodes (spec.md §4.7,
//! SPEC_FULL.md §B).

use super::{pull_value, push_value, Flow, Instruction};
use crate::diagnostics::warn_policy;
use crate::errors::VmError;
use crate::frame::Frame;
use crate::value::Value;
use crate::vm::VirtualMachine;

pub fn execute_control(instruction: &Instruction, vm: &VirtualMachine, frame: &mut Frame) -> Result<Flow, VmError> {
	match instruction {
		Instruction::Label(_) | Instruction::Linker(..) => Ok(Flow::Continue),
		Instruction::Goto(target) => Ok(Flow::Jump(*target)),
		Instruction::Print(text) => {
			if !warn_policy().no_warns {
				print!("{text}");
			}
			Ok(Flow::Continue)
		}
		Instruction::Println(text) => {
			if !warn_policy().no_warns {
				println!("{text}");
			}
			Ok(Flow::Continue)
		}
		Instruction::Return => Ok(Flow::Return(Value::Void)),

		Instruction::InvokeStatic { class, method, params, ret } => {
			let class = vm.find_class(class).ok_or_else(|| VmError::NoSuchClass(class.clone()))?;
			let method = class
				.find_method(method, params)
				.cloned()
				.ok_or_else(|| VmError::NoSuchMethod(class.name.clone(), method.clone(), crate::element::method::describe_params(params)))?;
			debug_assert_eq!(&method.return_type, ret);
			let trace = frame.child_trace();
			method.invoke(vm, Some(frame), None, &class.name, trace)?;
			Ok(Flow::Continue)
		}

		Instruction::GetField { class, field, instance, dst } => {
			let class_name = class.clone();
			let receiver = super::pull_instance(frame, instance);
			let class = vm.find_class(&class_name).ok_or_else(|| VmError::NoSuchClass(class_name.clone()))?;
			let f = class.find_field(field).ok_or_else(|| VmError::NoSuchClass(format!("{class_name}.{field}")))?;
			let ty = f.ty.clone();
			let value = receiver.with(|i| i.get_field(field)).unwrap_or(Value::Void);
			push_value(frame, &ty, dst, value);
			Ok(Flow::Continue)
		}
		Instruction::SetField { class, field, instance, value } => {
			let class_name = class.clone();
			let receiver = super::pull_instance(frame, instance);
			let class = vm.find_class(&class_name).ok_or_else(|| VmError::NoSuchClass(class_name.clone()))?;
			let f = class.find_field(field).ok_or_else(|| VmError::NoSuchClass(format!("{class_name}.{field}")))?;
			let ty = f.ty.clone();
			let value = pull_value(frame, &ty, value);
			receiver.with_mut(|i| i.set_field(field, value));
			Ok(Flow::Continue)
		}
		Instruction::GetStatic { class, field, dst } => {
			let class = vm.find_class(class).ok_or_else(|| VmError::NoSuchClass(class.clone()))?;
			let f = class.find_field(field).ok_or_else(|| VmError::NoSuchClass(format!("{}.{field}", class.name)))?;
			let value = class.get_static(field);
			push_value(frame, &f.ty, dst, value);
			Ok(Flow::Continue)
		}
		Instruction::SetStatic { class, field, value } => {
			let class = vm.find_class(class).ok_or_else(|| VmError::NoSuchClass(class.clone()))?;
			let f = class.find_field(field).ok_or_else(|| VmError::NoSuchClass(format!("{}.{field}", class.name)))?;
			let value = pull_value(frame, &f.ty, value);
			class.set_static(field, value);
			Ok(Flow::Continue)
		}

		_ => unreachable!("non-control instruction routed to execute_control"),
	}
}
