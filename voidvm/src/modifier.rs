//! Access modifier bitmask (spec.md §3.10).
//!
//! Grounded in the teacher's `TypeAttributes`/`AssemblyFlags`
//! bitflags pattern (`examples/MaximumOverflow-cilium/cilium/src/raw/heaps/table.rs`).
//! Only `static`, `native` and `abstract` change VM behaviour in this
//! spec; the rest are parsed and stored inertly (spec.md §5).

use voidvm_derive::FromRepr;

bitflags::bitflags! {
	#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
	pub struct Modifier: u32 {
		const PUBLIC        = 1 << 0;
		const PRIVATE       = 1 << 1;
		const PROTECTED     = 1 << 2;
		const STATIC        = 1 << 3;
		const FINAL         = 1 << 4;
		const SYNCHRONIZED  = 1 << 5;
		const VOLATILE      = 1 << 6;
		const TRANSIENT     = 1 << 7;
		const NATIVE        = 1 << 8;
		const UNSAFE        = 1 << 9;
		const ABSTRACT      = 1 << 10;
		const INTERFACE     = 1 << 11;
		const ANNOTATION    = 1 << 12;
		const ENUM          = 1 << 13;
		const STRUCT        = 1 << 14;
		const TUPLE_STRUCT  = 1 << 15;
		const WEAK          = 1 << 16;
		const STRONG        = 1 << 17;
		const DEFAULT       = 1 << 18;
		const ASYNC         = 1 << 19;
	}
}

/// One flag per [`Modifier`] bit, in bit-index order, purely to drive
/// `from_repr`-based pretty-printing (`ClassDebug`/`cmod` round trip).
#[derive(Debug, Copy, Clone, Eq, PartialEq, FromRepr)]
#[repr(u32)]
pub enum ModifierFlag {
	Public = 0,
	Private = 1,
	Protected = 2,
	Static = 3,
	Final = 4,
	Synchronized = 5,
	Volatile = 6,
	Transient = 7,
	Native = 8,
	Unsafe = 9,
	Abstract = 10,
	Interface = 11,
	Annotation = 12,
	Enum = 13,
	Struct = 14,
	TupleStruct = 15,
	Weak = 16,
	Strong = 17,
	Default = 18,
	Async = 19,
}

impl ModifierFlag {
	pub fn name(self) -> &'static str {
		match self {
			ModifierFlag::Public => "public",
			ModifierFlag::Private => "private",
			ModifierFlag::Protected => "protected",
			ModifierFlag::Static => "static",
			ModifierFlag::Final => "final",
			ModifierFlag::Synchronized => "synchronized",
			ModifierFlag::Volatile => "volatile",
			ModifierFlag::Transient => "transient",
			ModifierFlag::Native => "native",
			ModifierFlag::Unsafe => "unsafe",
			ModifierFlag::Abstract => "abstract",
			ModifierFlag::Interface => "interface",
			ModifierFlag::Annotation => "annotation",
			ModifierFlag::Enum => "enum",
			ModifierFlag::Struct => "struct",
			ModifierFlag::TupleStruct => "tuple_struct",
			ModifierFlag::Weak => "weak",
			ModifierFlag::Strong => "strong",
			ModifierFlag::Default => "default",
			ModifierFlag::Async => "async",
		}
	}

	pub fn parse(name: &str) -> Option<ModifierFlag> {
		Some(match name {
			"public" => ModifierFlag::Public,
			"private" => ModifierFlag::Private,
			"protected" => ModifierFlag::Protected,
			"static" => ModifierFlag::Static,
			"final" => ModifierFlag::Final,
			"synchronized" => ModifierFlag::Synchronized,
			"volatile" => ModifierFlag::Volatile,
			"transient" => ModifierFlag::Transient,
			"native" => ModifierFlag::Native,
			"unsafe" => ModifierFlag::Unsafe,
			"abstract" => ModifierFlag::Abstract,
			"interface" => ModifierFlag::Interface,
			"annotation" => ModifierFlag::Annotation,
			"enum" => ModifierFlag::Enum,
			"struct" => ModifierFlag::Struct,
			"tuple_struct" => ModifierFlag::TupleStruct,
			"weak" => ModifierFlag::Weak,
			"strong" => ModifierFlag::Strong,
			"default" => ModifierFlag::Default,
			"async" => ModifierFlag::Async,
			_ => return None,
		})
	}

	pub fn bit(self) -> Modifier {
		Modifier::from_bits_truncate(1 << (self as u32))
	}
}

/// Parses a whitespace-separated list of modifier names (as they
/// appear after `cmod`/`mmod`/`fmod`) into a [`Modifier`] bitmask.
/// Unrecognised names are ignored.
pub fn parse_modifiers(names: &str) -> Modifier {
	let mut mods = Modifier::empty();
	for name in names.split_whitespace() {
		if let Some(flag) = ModifierFlag::parse(name) {
			mods |= flag.bit();
		}
	}
	mods
}

/// Enumerates the set-bit indices of a bitmask, oldest-first, for
/// debug pretty-printing (mirrors the teacher's `enumerate_set_bits`).
pub fn enumerate_set_bits(mods: Modifier) -> impl Iterator<Item = u32> {
	let bits = mods.bits();
	(0..32).filter(move |i| bits & (1 << i) != 0)
}

pub fn debug_string(mods: Modifier) -> String {
	enumerate_set_bits(mods)
		.filter_map(ModifierFlag::from_repr)
		.map(ModifierFlag::name)
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_multiple_modifiers() {
		let mods = parse_modifiers("public static final");
		assert!(mods.contains(Modifier::PUBLIC));
		assert!(mods.contains(Modifier::STATIC));
		assert!(mods.contains(Modifier::FINAL));
		assert!(!mods.contains(Modifier::PRIVATE));
	}

	#[test]
	fn unknown_modifier_names_are_ignored() {
		let mods = parse_modifiers("public bogus");
		assert_eq!(mods, Modifier::PUBLIC);
	}

	#[test]
	fn debug_string_round_trips_names() {
		let mods = parse_modifiers("static native");
		let s = debug_string(mods);
		assert!(s.contains("static"));
		assert!(s.contains("native"));
	}
}
