//! Program loader (spec.md §4.1): turns a path (file or directory)
//! into one ordered line buffer. Directory walk order is alphabetical
//! by path, which is what `rust_search` yields by default — this is
//! the concrete ordering spec.md §6.2 leaves unspecified ("concatenated
//! in directory-walk order").
//!
//! Grounded in the teacher's `structured/resolver.rs`
//! `DefaultAssemblyResolver::gather_paths`, which walks a search
//! directory with the same crate for the same reason: collect a flat
//! file list before doing anything with the contents.

use crate::errors::VmError;
use rust_search::SearchBuilder;
use std::path::{Path, PathBuf};

#[tracing::instrument]
pub fn load_lines(path: &Path) -> Result<Vec<String>, VmError> {
	if !path.exists() {
		return Err(VmError::NoSuchApplication(path.display().to_string()));
	}

	let mut files = gather_files(path);
	files.sort();

	let mut lines = Vec::new();
	for file in files {
		let content = std::fs::read_to_string(&file).map_err(|_| VmError::NoSuchApplication(file.display().to_string()))?;
		lines.extend(content.lines().map(str::to_string));
	}
	Ok(lines)
}

fn gather_files(path: &Path) -> Vec<PathBuf> {
	if path.is_file() {
		return vec![path.to_path_buf()];
	}
	SearchBuilder::default()
		.location(path)
		.search_input("")
		.depth(usize::MAX)
		.build()
		.map(PathBuf::from)
		.filter(|p| p.is_file())
		.collect()
}
