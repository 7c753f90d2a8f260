//! Owning/weak handle to heap data (spec.md §3.2).
//!
//! The source models this with a raw owning pointer and an explicit
//! `purge`. There is no garbage collector in scope (spec.md §1
//! Non-goals), so the natural Rust shape keeps that same explicit,
//! manual-release discipline rather than reaching for real `Weak`
//! semantics: a [`Reference<T>`] is a shared cell that every holder
//! can see go empty the moment *any* holder purges it.

use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// An owning or weak handle to heap data, with `exists`/`weak`/`strong`
/// state. `T` is almost always [`crate::instance::Instance`], but the
/// type is generic per spec.md §3.2 (it also backs boxed reference
/// cells of primitives).
///
/// `Debug`/`Clone` are implemented by hand rather than derived: a
/// derive would tie them to `T: Debug + Clone`, but sharing the cell
/// (not the payload) is all a reference ever needs to do, and `T` here
/// is `Instance`, whose own `Debug` would otherwise have to go back
/// through `Value` and `Reference<Instance>` to close the loop.
pub struct Reference<T> {
	cell: Rc<RefCell<Option<T>>>,
	weak: bool,
	strong: bool,
}

impl<T> Clone for Reference<T> {
	fn clone(&self) -> Self {
		Reference { cell: self.cell.clone(), weak: self.weak, strong: self.strong }
	}
}

impl<T> Debug for Reference<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Reference")
			.field("exists", &self.exists())
			.field("weak", &self.weak)
			.field("strong", &self.strong)
			.field("address", &format_args!("{:#x}", self.address()))
			.finish()
	}
}

impl<T> Reference<T> {
	/// Wraps a freshly allocated value in a new, non-null reference.
	pub fn new(value: T) -> Self {
		Reference {
			cell: Rc::new(RefCell::new(Some(value))),
			weak: false,
			strong: false,
		}
	}

	/// A reference with no backing data (`nullptr`, spec.md §4.7).
	pub fn null() -> Self {
		Reference {
			cell: Rc::new(RefCell::new(None)),
			weak: false,
			strong: false,
		}
	}

	pub fn exists(&self) -> bool {
		self.cell.borrow().is_some()
	}

	pub fn is_weak(&self) -> bool {
		self.weak
	}

	pub fn is_strong(&self) -> bool {
		self.strong
	}

	pub fn mark_weak(&mut self) {
		self.weak = true;
	}

	pub fn mark_strong(&mut self) {
		self.strong = true;
	}

	/// Sets `exists = false` and releases the held data. Idempotent:
	/// purging an already-purged (or null) reference is a no-op.
	pub fn purge(&self) {
		self.cell.borrow_mut().take();
	}

	/// Conditionally purges the previous value before replacing it.
	pub fn set(&self, new: T, delete_prev: bool) {
		if delete_prev {
			self.purge();
		}
		*self.cell.borrow_mut() = Some(new);
	}

	/// An opaque address-like identifier for debug printing
	/// (`agetaddr`, spec.md §4.7). Two references sharing the same
	/// backing cell compare equal under this identifier; a null
	/// reference's identifier is always zero.
	pub fn address(&self) -> u64 {
		if !self.exists() {
			return 0;
		}
		Rc::as_ptr(&self.cell) as u64
	}

	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
		self.cell.borrow().as_ref().map(f)
	}

	pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
		self.cell.borrow_mut().as_mut().map(f)
	}
}

impl<T: Clone> Reference<T> {
	pub fn get(&self) -> Option<T> {
		self.cell.borrow().clone()
	}
}

impl<T> Default for Reference<T> {
	fn default() -> Self {
		Self::null()
	}
}

impl<T> PartialEq for Reference<T> {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.cell, &other.cell)
	}
}

impl<T> Eq for Reference<T> {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn purge_is_idempotent_and_null_like() {
		let r: Reference<i32> = Reference::new(42);
		assert!(r.exists());
		r.purge();
		assert!(!r.exists());
		r.purge();
		assert!(!r.exists());
	}

	#[test]
	fn null_never_exists() {
		let r: Reference<i32> = Reference::null();
		assert!(!r.exists());
		assert_eq!(r.address(), 0);
	}

	#[test]
	fn purge_through_any_clone_is_visible_to_all() {
		let a: Reference<i32> = Reference::new(7);
		let b = a.clone();
		a.purge();
		assert!(!b.exists());
	}

	#[test]
	fn set_conditionally_purges() {
		let r = Reference::new(1);
		r.set(2, true);
		assert_eq!(r.get(), Some(2));
	}
}
