//! `Executable`: the base of [`crate::element::method::Method`] and
//! [`crate::element::field::Field`] (spec.md §3.8, §4.3).
//!
//! Grounded in `original_source/src/vm/element/Executable.cpp`'s
//! two-pass `build`: a symbol pass over the raw lines registers labels
//! and `#link` aliases, then an instruction pass turns every line into
//! an [`Instruction`] record, resolving operand names against the
//! tables the symbol pass just built.

use crate::diagnostics::{warn_linker_redefine, warn_linker_value_collision, warn_section_redefine};
use crate::instruction::{self, Instruction};
use crate::modifier::Modifier;
use fxhash::FxHashMap;

#[derive(Debug, Default)]
pub struct Executable {
	pub instructions: Vec<Instruction>,
	pub sections: FxHashMap<String, usize>,
	pub linkers: FxHashMap<String, u32>,
	pub modifiers: Modifier,
}

impl Executable {
	/// A bodyless executable, for tests and for `Class::instantiate`'s
	/// default-valued fields.
	pub fn empty(modifiers: Modifier) -> Self {
		Executable { instructions: Vec::new(), sections: FxHashMap::default(), linkers: FxHashMap::default(), modifiers }
	}

	#[tracing::instrument(skip(lines))]
	pub fn build(lines: &[String], modifiers: Modifier) -> Executable {
		let mut sections = FxHashMap::default();
		let mut linkers = FxHashMap::default();
		let mut slot_owners: FxHashMap<u32, String> = FxHashMap::default();

		// Symbol pass (spec.md §4.3).
		for (index, raw) in lines.iter().enumerate() {
			let line = raw.trim();
			if let Some(name) = line.strip_prefix(':') {
				if sections.insert(name.to_string(), index).is_some() {
					warn_section_redefine(name);
				}
				continue;
			}
			if let Some(rest) = line.strip_prefix("#link") {
				let mut tokens = rest.split_whitespace();
				let (Some(name), Some(slot)) = (tokens.next(), tokens.next()) else { continue };
				let Ok(slot) = slot.parse::<u32>() else { continue };
				if linkers.insert(name.to_string(), slot).is_some() {
					warn_linker_redefine(name);
				}
				if let Some(owner) = slot_owners.insert(slot, name.to_string()) {
					if owner != name {
						warn_linker_value_collision(name, slot);
					}
				}
			}
		}

		// Instruction pass.
		let instructions =
			lines.iter().map(|raw| instruction::parse::parse_line(raw.trim(), &sections, &linkers)).collect();

		Executable { instructions, sections, linkers, modifiers }
	}

	/// Cross-class resolution pass (spec.md §4.3): gives every
	/// instruction in this body a chance to eagerly bind a class
	/// reference (`new`) now that the whole program is loaded.
	pub fn initialize(&self, vm: &crate::vm::VirtualMachine) {
		for instruction in &self.instructions {
			instruction.initialize(vm);
		}
	}
}
