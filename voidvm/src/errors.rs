//! Fatal error taxonomy (spec.md §7).
//!
//! Every variant formats to the `<Kind>: <detail>` line the spec
//! requires on the diagnostic stream; the launcher is the only place
//! that prints one and maps it to a non-zero exit code. Warnings
//! (`DuplicateSection`, `DuplicateLinker`, `DuplicateLinkerValue`,
//! `UnrecognizedInstruction`) are not part of this enum — they are
//! non-fatal by definition and go through [`crate::diagnostics`] instead.

use crate::types::Type;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VmError {
	#[error("NoSuchApplication: {0}")]
	NoSuchApplication(String),

	#[error("ClassRedefine: class '{0}' is already defined")]
	ClassRedefine(String),

	#[error("MethodRedefine: method {0}({1}) is already defined")]
	MethodRedefine(String, String),

	#[error("FieldRedefine: field '{0}' is already defined for class '{1}'")]
	FieldRedefine(String, String),

	#[error("NoSuchClass: class '{0}' could not be resolved")]
	NoSuchClass(String),

	#[error("NoSuchMethod: no method {0}.{1}({2}) found")]
	NoSuchMethod(String, String, String),

	#[error("UnsatisfiedLink: native method {0}.{1}({2}) has no bound handler")]
	UnsatisfiedLink(String, String, String),

	#[error("DivideByZero: division or modulo by zero in a {0:?} operation")]
	DivideByZero(Type),
}
