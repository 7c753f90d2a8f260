//! Warning policy gate for the non-fatal diagnostics of spec.md §7
//! (`DuplicateSection`, `DuplicateLinker`, `DuplicateLinkerValue`,
//! `UnrecognizedInstruction`).
//!
//! The CLI flags that gate them (`-XNoWarns`, `-XNoSectionWarns`,
//! `-XNoLinkerWarns`, `-XNoDupLinkerWarns`) are set once at launch and
//! read from every loader/parser call site afterwards; threading a
//! `WarnPolicy` argument through every `Executable::build` and
//! `Class::build` call would pollute signatures that are otherwise only
//! about bytecode, so the policy lives in a process-wide `OnceLock`
//! instead (the same shape as the source's process-wide
//! `__instanceCounter`, spec.md §9 "Global mutable state").

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default)]
pub struct WarnPolicy {
	pub no_warns: bool,
	pub no_section_warns: bool,
	pub no_linker_warns: bool,
	pub no_dup_linker_warns: bool,
}

static POLICY: OnceLock<WarnPolicy> = OnceLock::new();

/// Installs the policy derived from CLI flags. Only the first call
/// takes effect, which is fine: the launcher calls this exactly once
/// before any bytecode is loaded.
pub fn init_warn_policy(policy: WarnPolicy) {
	let _ = POLICY.set(policy);
}

pub fn warn_policy() -> WarnPolicy {
	POLICY.get().copied().unwrap_or_default()
}

/// `-XVMDebug` (spec.md §7 "In debug mode ... dumps the current frame
/// stack trace ... and the current instruction being executed").
/// Same process-wide `OnceLock` shape as [`WarnPolicy`]: the launcher
/// installs it once from `LaunchConfig::debug` before any frame runs,
/// and [`crate::frame::Frame::run`] reads it at the point a fatal
/// error unwinds past the frame, since that's the last place the
/// frame is still in scope.
static DEBUG_MODE: OnceLock<bool> = OnceLock::new();

pub fn init_debug_mode(enabled: bool) {
	let _ = DEBUG_MODE.set(enabled);
}

pub fn debug_mode() -> bool {
	DEBUG_MODE.get().copied().unwrap_or(false)
}

/// `DuplicateSection` (spec.md §3.8, §7): the same label bound twice in
/// one `Executable`. Non-fatal, last binding wins.
pub fn warn_section_redefine(name: &str) {
	let p = warn_policy();
	if !p.no_warns && !p.no_section_warns {
		tracing::warn!(section = name, "DuplicateSection: label redefined, last binding wins");
	}
}

/// `DuplicateLinker` (spec.md §3.8, §7): the same `#link` name bound twice.
pub fn warn_linker_redefine(name: &str) {
	let p = warn_policy();
	if !p.no_warns && !p.no_linker_warns {
		tracing::warn!(linker = name, "DuplicateLinker: variable name redefined");
	}
}

/// `DuplicateLinkerValue` (spec.md §3.8, §7): two `#link` names sharing
/// the same storage slot. Non-fatal (spec.md §8 scenario 6).
pub fn warn_linker_value_collision(name: &str, slot: u32) {
	let p = warn_policy();
	if !p.no_warns && !p.no_linker_warns && !p.no_dup_linker_warns {
		tracing::warn!(linker = name, slot, "DuplicateLinkerValue: storage slot already aliased");
	}
}

/// `UnrecognizedInstruction` (spec.md §4.7, §7): an opcode the parser
/// doesn't know, downgraded to a no-op `Instruction::Empty`.
pub fn warn_unrecognized_instruction(raw: &str) {
	let p = warn_policy();
	if !p.no_warns {
		tracing::warn!(line = raw, "UnrecognizedInstruction: opcode not recognised");
	}
}
