//! Execution for the arithmetic-capable (`Num`) and storage-only
//! (`Prim`) instruction families (spec.md §4.7).

use super::{pull_num, pull_prim, push_num, push_prim, ArithOp, CmpOp, Flow, Instruction};
use crate::diagnostics::warn_policy;
use crate::errors::VmError;
use crate::frame::Frame;
use crate::types::Type;
use crate::value::{NumKind, NumValue, PrimKind, PrimValue};

fn type_of(kind: NumKind) -> Type {
	match kind {
		NumKind::Int => Type::Int,
		NumKind::Long => Type::Long,
		NumKind::Float => Type::Float,
		NumKind::Double => Type::Double,
	}
}

/// Family name for the `"[log] <name> stack dump (N)"` header
/// (spec.md §4.7 `dumpstack`; ground truth
/// `original_source/src/vm/parser/instructions/Doubles.cpp`'s
/// `DoubleDumpStack::execute`).
fn num_family_name(kind: NumKind) -> &'static str {
	match kind {
		NumKind::Int => "int",
		NumKind::Long => "long",
		NumKind::Float => "float",
		NumKind::Double => "double",
	}
}

fn prim_family_name(kind: PrimKind) -> &'static str {
	match kind {
		PrimKind::Byte => "byte",
		PrimKind::Short => "short",
		PrimKind::Bool => "bool",
		PrimKind::Char => "char",
	}
}

/// Applies a binary arithmetic op. `div`/`mod` by zero is fatal for
/// `Int`/`Long` (spec.md §7 `DivideByZero`); for `Float`/`Double` it
/// follows IEEE 754 (`inf`/`nan`), matching the source's plain `/`/`%`.
fn apply_arith(kind: NumKind, op: ArithOp, a: NumValue, b: NumValue) -> Result<NumValue, VmError> {
	macro_rules! int_like {
		($a:expr, $b:expr, $ctor:path) => {
			match op {
				ArithOp::Add => $ctor($a.wrapping_add($b)),
				ArithOp::Sub => $ctor($a.wrapping_sub($b)),
				ArithOp::Mul => $ctor($a.wrapping_mul($b)),
				ArithOp::Div => {
					if $b == 0 {
						return Err(VmError::DivideByZero(type_of(kind)));
					}
					$ctor($a.wrapping_div($b))
				}
				ArithOp::Mod => {
					if $b == 0 {
						return Err(VmError::DivideByZero(type_of(kind)));
					}
					$ctor($a.wrapping_rem($b))
				}
				ArithOp::Inc | ArithOp::Decr | ArithOp::Neg => unreachable!("unary op in apply_arith"),
			}
		};
	}
	macro_rules! float_like {
		($a:expr, $b:expr, $ctor:path) => {
			match op {
				ArithOp::Add => $ctor($a + $b),
				ArithOp::Sub => $ctor($a - $b),
				ArithOp::Mul => $ctor($a * $b),
				ArithOp::Div => $ctor($a / $b),
				ArithOp::Mod => $ctor($a % $b),
				ArithOp::Inc | ArithOp::Decr | ArithOp::Neg => unreachable!("unary op in apply_arith"),
			}
		};
	}
	Ok(match (a, b) {
		(NumValue::Int(a), NumValue::Int(b)) => int_like!(a, b, NumValue::Int),
		(NumValue::Long(a), NumValue::Long(b)) => int_like!(a, b, NumValue::Long),
		(NumValue::Float(a), NumValue::Float(b)) => float_like!(a, b, NumValue::Float),
		(NumValue::Double(a), NumValue::Double(b)) => float_like!(a, b, NumValue::Double),
		_ => NumValue::zero(kind),
	})
}

fn apply_unary(op: ArithOp, a: NumValue) -> NumValue {
	match (op, a) {
		(ArithOp::Inc, NumValue::Int(v)) => NumValue::Int(v.wrapping_add(1)),
		(ArithOp::Inc, NumValue::Long(v)) => NumValue::Long(v.wrapping_add(1)),
		(ArithOp::Inc, NumValue::Float(v)) => NumValue::Float(v + 1.0),
		(ArithOp::Inc, NumValue::Double(v)) => NumValue::Double(v + 1.0),
		(ArithOp::Decr, NumValue::Int(v)) => NumValue::Int(v.wrapping_sub(1)),
		(ArithOp::Decr, NumValue::Long(v)) => NumValue::Long(v.wrapping_sub(1)),
		(ArithOp::Decr, NumValue::Float(v)) => NumValue::Float(v - 1.0),
		(ArithOp::Decr, NumValue::Double(v)) => NumValue::Double(v - 1.0),
		(ArithOp::Neg, NumValue::Int(v)) => NumValue::Int(v.wrapping_neg()),
		(ArithOp::Neg, NumValue::Long(v)) => NumValue::Long(v.wrapping_neg()),
		(ArithOp::Neg, NumValue::Float(v)) => NumValue::Float(-v),
		(ArithOp::Neg, NumValue::Double(v)) => NumValue::Double(-v),
		_ => a,
	}
}

fn apply_cmp(cmp: CmpOp, a: NumValue, b: NumValue) -> bool {
	fn cmp_of<T: PartialOrd>(cmp: CmpOp, a: T, b: T) -> bool {
		match cmp {
			CmpOp::Eq => a == b,
			CmpOp::Ne => a != b,
			CmpOp::Gt => a > b,
			CmpOp::Ge => a >= b,
			CmpOp::Lt => a < b,
			CmpOp::Le => a <= b,
		}
	}
	match (a, b) {
		(NumValue::Int(a), NumValue::Int(b)) => cmp_of(cmp, a, b),
		(NumValue::Long(a), NumValue::Long(b)) => cmp_of(cmp, a, b),
		(NumValue::Float(a), NumValue::Float(b)) => cmp_of(cmp, a, b),
		(NumValue::Double(a), NumValue::Double(b)) => cmp_of(cmp, a, b),
		_ => false,
	}
}

pub fn execute_num(instruction: &Instruction, frame: &mut Frame) -> Result<Flow, VmError> {
	match instruction {
		Instruction::NumPush(kind, value) => {
			frame.stacks.push_num(*kind, *value);
			Ok(Flow::Continue)
		}
		Instruction::NumLoad(kind, slot) => {
			let v = frame.storages.get_num(*kind, *slot);
			frame.stacks.push_num(*kind, v);
			Ok(Flow::Continue)
		}
		Instruction::NumStore(kind, slot, keep) => {
			let v = frame.stacks.peek_num(*kind);
			if !keep {
				frame.stacks.pull_num(*kind);
			}
			frame.storages.set_num(*slot, v);
			Ok(Flow::Continue)
		}
		Instruction::NumSet(_kind, slot, value) => {
			frame.storages.set_num(*slot, *value);
			Ok(Flow::Continue)
		}
		Instruction::NumEnsure(kind, capacity) => {
			frame.storages.ensure_num(*kind, *capacity);
			Ok(Flow::Continue)
		}
		Instruction::NumArith(kind, op, a, b, dst) => {
			let a = pull_num(frame, *kind, a);
			let b = pull_num(frame, *kind, b);
			let result = apply_arith(*kind, *op, a, b)?;
			push_num(frame, *kind, dst, result);
			Ok(Flow::Continue)
		}
		Instruction::NumUnary(kind, op, a, dst) => {
			let a = pull_num(frame, *kind, a);
			let result = apply_unary(*op, a);
			push_num(frame, *kind, dst, result);
			Ok(Flow::Continue)
		}
		Instruction::NumReturn(kind, src) => {
			let v = pull_num(frame, *kind, src);
			Ok(Flow::Return(v.into_value()))
		}
		Instruction::NumDebug(kind, newline, keep) => {
			let v = if *keep { frame.stacks.peek_num(*kind) } else { frame.stacks.pull_num(*kind) };
			if !warn_policy().no_warns {
				if *newline {
					println!("{v:?}");
				} else {
					print!("{v:?}");
				}
			}
			Ok(Flow::Continue)
		}
		Instruction::NumStackSize(kind) => {
			let size = frame.stacks.size_num(*kind);
			frame.stacks.push_num(NumKind::Int, NumValue::Int(size as i32));
			Ok(Flow::Continue)
		}
		Instruction::NumDumpStack(kind) => {
			let entries = frame.stacks.dump_num(*kind);
			println!("[log] {} stack dump ({})", num_family_name(*kind), entries.len());
			for (i, value) in entries.iter().enumerate() {
				println!("- {value} [{i}]");
			}
			Ok(Flow::Continue)
		}
		Instruction::NumClearStack(kind) => {
			frame.stacks.clear_num(*kind);
			Ok(Flow::Continue)
		}
		Instruction::NumPop(kind) => {
			frame.stacks.pull_num(*kind);
			Ok(Flow::Continue)
		}
		Instruction::NumDup(kind, n) => {
			let v = frame.stacks.peek_num(*kind);
			for _ in 0..*n {
				frame.stacks.push_num(*kind, v);
			}
			Ok(Flow::Continue)
		}
		Instruction::NumIf(kind, cmp, a, b, target) => {
			let a = pull_num(frame, *kind, a);
			let b = pull_num(frame, *kind, b);
			if apply_cmp(*cmp, a, b) {
				Ok(Flow::Jump(*target))
			} else {
				Ok(Flow::Continue)
			}
		}
		_ => unreachable!("non-Num instruction routed to execute_num"),
	}
}

pub fn execute_prim(instruction: &Instruction, frame: &mut Frame) -> Flow {
	match instruction {
		Instruction::PrimPush(_, value) => {
			frame.stacks.push_prim(*value);
			Flow::Continue
		}
		Instruction::PrimLoad(kind, slot) => {
			let v = frame.storages.get_prim(*kind, *slot);
			frame.stacks.push_prim(v);
			Flow::Continue
		}
		Instruction::PrimStore(kind, slot, keep) => {
			let v = frame.stacks.peek_prim(*kind);
			if !keep {
				frame.stacks.pull_prim(*kind);
			}
			frame.storages.set_prim(*slot, v);
			Flow::Continue
		}
		Instruction::PrimSet(_kind, slot, value) => {
			frame.storages.set_prim(*slot, *value);
			Flow::Continue
		}
		Instruction::PrimEnsure(kind, capacity) => {
			frame.storages.ensure_prim(*kind, *capacity);
			Flow::Continue
		}
		Instruction::PrimReturn(kind, src) => {
			let v = pull_prim(frame, *kind, src);
			Flow::Return(v.into_value())
		}
		Instruction::PrimDebug(kind, newline, keep) => {
			let v = if *keep { frame.stacks.peek_prim(*kind) } else { frame.stacks.pull_prim(*kind) };
			if !warn_policy().no_warns {
				if *newline {
					println!("{v:?}");
				} else {
					print!("{v:?}");
				}
			}
			Flow::Continue
		}
		Instruction::PrimStackSize(kind) => {
			let size = frame.stacks.size_prim(*kind);
			frame.stacks.push_num(NumKind::Int, NumValue::Int(size as i32));
			Flow::Continue
		}
		Instruction::PrimDumpStack(kind) => {
			let entries = frame.stacks.dump_prim(*kind);
			println!("[log] {} stack dump ({})", prim_family_name(*kind), entries.len());
			for (i, value) in entries.iter().enumerate() {
				println!("- {value} [{i}]");
			}
			Flow::Continue
		}
		Instruction::PrimClearStack(kind) => {
			frame.stacks.clear_prim(*kind);
			Flow::Continue
		}
		Instruction::PrimPop(kind) => {
			frame.stacks.pull_prim(*kind);
			Flow::Continue
		}
		Instruction::PrimDup(kind, n) => {
			let v = frame.stacks.peek_prim(*kind);
			for _ in 0..*n {
				frame.stacks.push_prim(v);
			}
			Flow::Continue
		}
		_ => unreachable!("non-Prim instruction routed to execute_prim"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::element::executable::Executable;
	use crate::instruction::{Dst, Src};
	use crate::modifier::Modifier;
	use std::rc::Rc;

	fn frame() -> Frame {
		Frame::new("t", Rc::new(Executable::empty(Modifier::empty())), Vec::new())
	}

	#[test]
	fn int_division_by_zero_is_fatal() {
		let err = apply_arith(NumKind::Int, ArithOp::Div, NumValue::Int(1), NumValue::Int(0));
		assert!(matches!(err, Err(VmError::DivideByZero(Type::Int))));
	}

	#[test]
	fn float_division_by_zero_is_not_fatal() {
		let v = apply_arith(NumKind::Float, ArithOp::Div, NumValue::Float(1.0), NumValue::Float(0.0)).unwrap();
		assert!(matches!(v, NumValue::Float(f) if f.is_infinite()));
	}

	#[test]
	fn arith_pulls_from_stack_and_pushes_result() {
		let mut f = frame();
		let instr = Instruction::NumArith(NumKind::Int, ArithOp::Add, Src::Const(crate::value::Value::Int(2)), Src::Const(crate::value::Value::Int(3)), Dst::Stack);
		execute_num(&instr, &mut f).unwrap();
		assert_eq!(f.stacks.int.pull(), 5);
	}
}
