//! Textual bytecode line parser (spec.md §4.2 instruction pass, §6.2
//! opcode spelling table, SPEC_FULL.md §B for the supplemented
//! descriptor syntax of `invokestatic`/`getfield`/`setfield`/
//! `getstatic`/`setstatic`).
//!
//! Grounded in `original_source/src/vm/parser/Instruction.cpp`'s
//! per-opcode `fromLine` factories, collapsed here into one dispatch
//! keyed by the opcode's family-prefix letter since the per-family
//! operand grammar is identical (spec.md §4.7).

use super::{ArithOp, CmpOp, Dst, Instruction, Src};
use crate::diagnostics::warn_unrecognized_instruction;
use crate::reference::Reference;
use crate::types::Type;
use crate::value::{NumKind, NumValue, PrimKind, PrimValue, Value};
use fxhash::FxHashMap;
use std::cell::RefCell;
use std::str::SplitWhitespace;

fn resolve_slot(name: &str, linkers: &FxHashMap<String, u32>) -> u32 {
	linkers.get(name).copied().unwrap_or_else(|| name.parse().unwrap_or(0))
}

/// Resolves a `goto`/`ifX -jump` label the same way [`resolve_slot`]
/// resolves a linker name: a declared label wins, otherwise the token
/// is taken as a literal instruction index (lets [`Instruction::debug`]
/// round-trip a jump target without inventing a fake label).
fn resolve_section(label: &str, sections: &FxHashMap<String, usize>) -> usize {
	sections.get(label).copied().unwrap_or_else(|| label.parse().unwrap_or(0))
}

fn parse_num_literal(kind: NumKind, token: &str) -> NumValue {
	match kind {
		NumKind::Int => NumValue::Int(token.parse().unwrap_or(0)),
		NumKind::Long => NumValue::Long(token.parse().unwrap_or(0)),
		NumKind::Float => NumValue::Float(token.parse().unwrap_or(0.0)),
		NumKind::Double => NumValue::Double(token.parse().unwrap_or(0.0)),
	}
}

fn parse_prim_literal(kind: PrimKind, token: &str) -> PrimValue {
	match kind {
		PrimKind::Byte => PrimValue::Byte(token.parse().unwrap_or(0)),
		PrimKind::Short => PrimValue::Short(token.parse().unwrap_or(0)),
		PrimKind::Bool => PrimValue::Bool(token == "true"),
		PrimKind::Char => PrimValue::Char(token.chars().next().unwrap_or('\0')),
	}
}

fn parse_generic_const(token: &str) -> Value {
	if let Ok(i) = token.parse::<i32>() {
		return Value::Int(i);
	}
	if let Ok(f) = token.parse::<f64>() {
		return Value::Double(f);
	}
	match token {
		"true" => Value::Bool(true),
		"false" => Value::Bool(false),
		_ => token.chars().next().map(Value::Char).unwrap_or(Value::Void),
	}
}

fn parse_src(tokens: &mut SplitWhitespace, linkers: &FxHashMap<String, u32>, parse_const: impl Fn(&str) -> Value) -> Src {
	match tokens.next() {
		Some("-stack") => Src::Stack,
		Some("-local") => Src::Local(resolve_slot(tokens.next().unwrap_or_default(), linkers)),
		Some("-const") => Src::Const(parse_const(tokens.next().unwrap_or_default())),
		_ => Src::Stack,
	}
}

fn parse_result_dst(tokens: &mut SplitWhitespace, linkers: &FxHashMap<String, u32>) -> Dst {
	let rest: Vec<&str> = tokens.collect();
	let mut it = rest.into_iter();
	while let Some(tok) = it.next() {
		if tok == "-r" {
			if let Some(name) = it.next() {
				return Dst::Local(resolve_slot(name, linkers));
			}
		}
	}
	Dst::Stack
}

fn parse_flag(tokens: SplitWhitespace, flags: &[&str]) -> bool {
	let rest: Vec<&str> = tokens.collect();
	flags.iter().any(|f| rest.contains(f))
}

fn extract_quoted(line: &str) -> String {
	let start = match line.find('"') {
		Some(i) => i + 1,
		None => return String::new(),
	};
	let rest = &line[start..];
	match rest.rfind('"') {
		Some(end) => rest[..end].to_string(),
		None => rest.to_string(),
	}
}

fn parse_cmp(token: &str) -> Option<CmpOp> {
	Some(match token {
		"eq" | "==" => CmpOp::Eq,
		"ne" | "!=" => CmpOp::Ne,
		"gt" | ">" => CmpOp::Gt,
		"ge" | ">=" => CmpOp::Ge,
		"lt" | "<" => CmpOp::Lt,
		"le" | "<=" => CmpOp::Le,
		_ => return None,
	})
}

fn parse_field_ref(token: &str) -> (String, String) {
	match token.rsplit_once('.') {
		Some((class, field)) => (class.to_string(), field.to_string()),
		None => (String::new(), token.to_string()),
	}
}

fn parse_invoke_static(line: &str) -> Instruction {
	let mut tokens = line.split_whitespace();
	tokens.next();
	let class = tokens.next().unwrap_or_default().to_string();
	let method = tokens.next().unwrap_or_default().to_string();
	let params_tok = tokens.next().unwrap_or_default().trim_start_matches('(').trim_end_matches(')').to_string();
	let params = Type::parse_list(&params_tok).unwrap_or_default();
	let ret = tokens.next().and_then(Type::parse).unwrap_or(Type::Void);
	Instruction::InvokeStatic { class, method, params, ret }
}

fn parse_field_op(opcode: &str, tokens: &mut SplitWhitespace, linkers: &FxHashMap<String, u32>) -> Instruction {
	let (class, field) = parse_field_ref(tokens.next().unwrap_or_default());
	match opcode {
		"getfield" => {
			let instance = parse_src(tokens, linkers, |_| Value::Instance(Reference::null()));
			let dst = parse_result_dst(tokens, linkers);
			Instruction::GetField { class, field, instance, dst }
		}
		"setfield" => {
			let instance = parse_src(tokens, linkers, |_| Value::Instance(Reference::null()));
			let value = parse_src(tokens, linkers, parse_generic_const);
			Instruction::SetField { class, field, instance, value }
		}
		"getstatic" => {
			let dst = parse_result_dst(tokens, linkers);
			Instruction::GetStatic { class, field, dst }
		}
		"setstatic" => {
			let value = parse_src(tokens, linkers, parse_generic_const);
			Instruction::SetStatic { class, field, value }
		}
		_ => unreachable!(),
	}
}

fn parse_num_opcode(kind: NumKind, suffix: &str, tokens: &mut SplitWhitespace, linkers: &FxHashMap<String, u32>) -> Option<Instruction> {
	Some(match suffix {
		"push" => Instruction::NumPush(kind, parse_num_literal(kind, tokens.next().unwrap_or_default())),
		"load" => Instruction::NumLoad(kind, resolve_slot(tokens.next().unwrap_or_default(), linkers)),
		"store" => {
			let slot = resolve_slot(tokens.next().unwrap_or_default(), linkers);
			let rest: Vec<&str> = tokens.collect();
			Instruction::NumStore(kind, slot, rest.contains(&"-k") || rest.contains(&"-keepstack"))
		}
		"set" => {
			let slot = resolve_slot(tokens.next().unwrap_or_default(), linkers);
			let value = parse_num_literal(kind, tokens.next().unwrap_or_default());
			Instruction::NumSet(kind, slot, value)
		}
		"ensure" => Instruction::NumEnsure(kind, tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0)),
		"add" | "sub" | "mul" | "div" | "mod" => {
			let op = match suffix {
				"add" => ArithOp::Add,
				"sub" => ArithOp::Sub,
				"mul" => ArithOp::Mul,
				"div" => ArithOp::Div,
				_ => ArithOp::Mod,
			};
			let a = parse_src(tokens, linkers, |t| parse_num_literal(kind, t).into_value());
			let b = parse_src(tokens, linkers, |t| parse_num_literal(kind, t).into_value());
			let dst = parse_result_dst(tokens, linkers);
			Instruction::NumArith(kind, op, a, b, dst)
		}
		"inc" | "decr" | "neg" => {
			let op = match suffix {
				"inc" => ArithOp::Inc,
				"decr" => ArithOp::Decr,
				_ => ArithOp::Neg,
			};
			let a = parse_src(tokens, linkers, |t| parse_num_literal(kind, t).into_value());
			let dst = parse_result_dst(tokens, linkers);
			Instruction::NumUnary(kind, op, a, dst)
		}
		"return" => Instruction::NumReturn(kind, parse_src(tokens, linkers, |t| parse_num_literal(kind, t).into_value())),
		"debug" => {
			let rest: Vec<&str> = tokens.collect();
			Instruction::NumDebug(kind, rest.contains(&"-newline"), rest.contains(&"-keepstack"))
		}
		"stacksize" => Instruction::NumStackSize(kind),
		"dumpstack" => Instruction::NumDumpStack(kind),
		"clearstack" => Instruction::NumClearStack(kind),
		"pop" => Instruction::NumPop(kind),
		"dup" => Instruction::NumDup(kind, tokens.next().and_then(|t| t.parse().ok()).unwrap_or(1)),
		_ => return None,
	})
}

fn parse_prim_opcode(kind: PrimKind, suffix: &str, tokens: &mut SplitWhitespace, linkers: &FxHashMap<String, u32>) -> Option<Instruction> {
	Some(match suffix {
		"push" => Instruction::PrimPush(kind, parse_prim_literal(kind, tokens.next().unwrap_or_default())),
		"load" => Instruction::PrimLoad(kind, resolve_slot(tokens.next().unwrap_or_default(), linkers)),
		"store" => {
			let slot = resolve_slot(tokens.next().unwrap_or_default(), linkers);
			let rest: Vec<&str> = tokens.collect();
			Instruction::PrimStore(kind, slot, rest.contains(&"-k") || rest.contains(&"-keepstack"))
		}
		"set" => {
			let slot = resolve_slot(tokens.next().unwrap_or_default(), linkers);
			let value = parse_prim_literal(kind, tokens.next().unwrap_or_default());
			Instruction::PrimSet(kind, slot, value)
		}
		"ensure" => Instruction::PrimEnsure(kind, tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0)),
		"return" => Instruction::PrimReturn(kind, parse_src(tokens, linkers, |t| parse_prim_literal(kind, t).into_value())),
		"debug" => {
			let rest: Vec<&str> = tokens.collect();
			Instruction::PrimDebug(kind, rest.contains(&"-newline"), rest.contains(&"-keepstack"))
		}
		"stacksize" => Instruction::PrimStackSize(kind),
		"dumpstack" => Instruction::PrimDumpStack(kind),
		"clearstack" => Instruction::PrimClearStack(kind),
		"pop" => Instruction::PrimPop(kind),
		"dup" => Instruction::PrimDup(kind, tokens.next().and_then(|t| t.parse().ok()).unwrap_or(1)),
		_ => return None,
	})
}

/// Parses one already-trimmed, non-empty, non-comment bytecode line.
/// `sections` maps label name to instruction index (for `goto`/`ifX`);
/// `linkers` maps linker name to storage slot (spec.md §3.9, §4.2).
/// An opcode this function doesn't recognize becomes
/// [`Instruction::Empty`] rather than a parse failure (spec.md §4.7).
pub fn parse_line(line: &str, sections: &FxHashMap<String, usize>, linkers: &FxHashMap<String, u32>) -> Instruction {
	let line = line.trim();
	if line.is_empty() {
		return Instruction::Empty(String::new());
	}
	if let Some(name) = line.strip_prefix(':') {
		return Instruction::Label(name.trim().to_string());
	}
	if let Some(rest) = line.strip_prefix("#link") {
		let name = rest.split_whitespace().next().unwrap_or_default().to_string();
		let slot = resolve_slot(&name, linkers);
		return Instruction::Linker(name, slot);
	}

	let mut tokens = line.split_whitespace();
	let opcode = tokens.next().unwrap_or_default();

	match opcode {
		"print" => return Instruction::Print(extract_quoted(line)),
		"println" => return Instruction::Println(extract_quoted(line)),
		"nullptr" => return Instruction::NullPtr,
		"agetaddr" => return Instruction::AGetAddr,
		"asetaddr" => return Instruction::ASetAddr,
		"vreturn" => return Instruction::Return,
		"goto" => {
			let label = tokens.next().unwrap_or_default();
			return Instruction::Goto(resolve_section(label, sections));
		}
		"new" => {
			let class_name = tokens.next().unwrap_or_default().to_string();
			let dst = parse_result_dst(&mut tokens, linkers);
			return Instruction::New { class_name, dst, resolved: RefCell::new(None) };
		}
		"aload" => {
			return Instruction::ALoad(resolve_slot(tokens.next().unwrap_or_default(), linkers));
		}
		"astore" => {
			let slot = resolve_slot(tokens.next().unwrap_or_default(), linkers);
			return Instruction::AStore(slot, parse_flag(tokens, &["-k", "-keepstack"]));
		}
		"adebug" => {
			let rest: Vec<&str> = tokens.collect();
			return Instruction::ADebug(rest.contains(&"-newline"), rest.contains(&"-keepstack"));
		}
		"delete" => {
			let src = parse_src(&mut tokens, linkers, |_| Value::Instance(Reference::null()));
			return Instruction::Delete(src);
		}
		"areturn" => {
			let src = parse_src(&mut tokens, linkers, |_| Value::Instance(Reference::null()));
			return Instruction::AReturn(src);
		}
		"getfield" | "setfield" | "getstatic" | "setstatic" => {
			return parse_field_op(opcode, &mut tokens, linkers);
		}
		_ if opcode.starts_with("invokestatic") => return parse_invoke_static(line),
		_ => {}
	}

	if opcode.len() > 2 && &opcode[..2] == "if" {
		if let Some(kind) = opcode.as_bytes().get(2).and_then(|b| NumKind::from_prefix(*b as char)) {
			if let Some(cmp) = parse_cmp(&opcode[3..]) {
				let a = parse_src(&mut tokens, linkers, |t| parse_num_literal(kind, t).into_value());
				let b = parse_src(&mut tokens, linkers, |t| parse_num_literal(kind, t).into_value());
				let mut target = 0usize;
				while let Some(tok) = tokens.next() {
					if tok == "-jump" {
						target = tokens.next().map(|l| resolve_section(l, sections)).unwrap_or(0);
						break;
					}
				}
				return Instruction::NumIf(kind, cmp, a, b, target);
			}
		}
	}

	if let Some(first) = opcode.chars().next() {
		let suffix = &opcode[1..];
		if let Some(kind) = NumKind::from_prefix(first) {
			if let Some(instr) = parse_num_opcode(kind, suffix, &mut tokens, linkers) {
				return instr;
			}
		}
		if let Some(kind) = PrimKind::from_prefix(first) {
			if let Some(instr) = parse_prim_opcode(kind, suffix, &mut tokens, linkers) {
				return instr;
			}
		}
	}

	warn_unrecognized_instruction(line);
	Instruction::Empty(line.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn empty_maps() -> (FxHashMap<String, usize>, FxHashMap<String, u32>) {
		(FxHashMap::default(), FxHashMap::default())
	}

	#[test]
	fn parses_ipush() {
		let (sections, linkers) = empty_maps();
		let instr = parse_line("ipush 5", &sections, &linkers);
		assert!(matches!(instr, Instruction::NumPush(NumKind::Int, NumValue::Int(5))));
	}

	#[test]
	fn parses_named_local_via_linker() {
		let mut linkers = FxHashMap::default();
		linkers.insert("x".to_string(), 3);
		let sections = FxHashMap::default();
		let instr = parse_line("istore x", &sections, &linkers);
		assert!(matches!(instr, Instruction::NumStore(NumKind::Int, 3, false)));
	}

	#[test]
	fn unknown_linker_name_yields_slot_zero() {
		let (sections, linkers) = empty_maps();
		let instr = parse_line("istore nope", &sections, &linkers);
		assert!(matches!(instr, Instruction::NumStore(NumKind::Int, 0, false)));
	}

	#[test]
	fn parses_mapped_and_symbolic_if() {
		let (sections, linkers) = empty_maps();
		let a = parse_line("ifieq -const 1 -const 1 -jump done", &sections, &linkers);
		let b = parse_line("ifi== -const 1 -const 1 -jump done", &sections, &linkers);
		assert!(matches!(a, Instruction::NumIf(NumKind::Int, CmpOp::Eq, ..)));
		assert!(matches!(b, Instruction::NumIf(NumKind::Int, CmpOp::Eq, ..)));
	}

	#[test]
	fn unrecognized_opcode_becomes_empty() {
		let (sections, linkers) = empty_maps();
		let instr = parse_line("frobnicate", &sections, &linkers);
		assert!(matches!(instr, Instruction::Empty(_)));
	}

	#[test]
	fn parses_print_with_embedded_spaces() {
		let (sections, linkers) = empty_maps();
		let instr = parse_line(r#"println "hello world""#, &sections, &linkers);
		assert!(matches!(instr, Instruction::Println(ref s) if s == "hello world"));
	}

	#[test]
	fn parses_invokestatic_descriptor() {
		let (sections, linkers) = empty_maps();
		let instr = parse_line("invokestatic Math.add (I,I) I", &sections, &linkers);
		match instr {
			Instruction::InvokeStatic { class, method, params, ret } => {
				assert_eq!(class, "Math");
				assert_eq!(method, "add");
				assert_eq!(params, vec![Type::Int, Type::Int]);
				assert_eq!(ret, Type::Int);
			}
			_ => panic!("expected InvokeStatic"),
		}
	}

	#[test]
	fn parses_dotted_field_reference() {
		let (sections, linkers) = empty_maps();
		let instr = parse_line("getstatic Outer.Inner.count", &sections, &linkers);
		match instr {
			Instruction::GetStatic { class, field, .. } => {
				assert_eq!(class, "Outer.Inner");
				assert_eq!(field, "count");
			}
			_ => panic!("expected GetStatic"),
		}
	}
}
