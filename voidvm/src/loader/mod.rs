//! Bytecode loading: turning a path on disk into a registered set of
//! classes (spec.md §4.1, §4.2).

pub mod class_parser;
pub mod program;
