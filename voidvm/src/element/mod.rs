//! Program element model: classes, their methods and fields, and the
//! `Executable` body shared by the latter two (spec.md §3.7, §3.8).

pub mod class;
pub mod executable;
pub mod field;
pub mod method;
