//! Class container: methods, fields, nesting, static value table
//! (spec.md §3.7, §4.8).
//!
//! Grounded in `original_source/src/vm/element/Class.cpp`'s
//! `getMethod`/`getField`/`initialize`.

use crate::element::field::Field;
use crate::element::method::Method;
use crate::modifier::Modifier;
use crate::types::Type;
use crate::value::Value;
use fxhash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
pub struct Class {
	pub name: String,
	pub superclass: String,
	pub modifiers: Modifier,
	pub interfaces: Vec<String>,
	pub methods: Vec<Rc<Method>>,
	pub fields: Vec<Rc<Field>>,
	statics: RefCell<FxHashMap<String, Value>>,
}

impl Class {
	pub fn new(name: String) -> Self {
		Class {
			name,
			superclass: "Object".to_string(),
			modifiers: Modifier::empty(),
			interfaces: Vec::new(),
			methods: Vec::new(),
			fields: Vec::new(),
			statics: RefCell::new(FxHashMap::default()),
		}
	}

	/// Assembles a class from the pieces the framing-directive parser
	/// collects (spec.md §4.2): `name` is already fully qualified
	/// (`Parent.Inner`/`Parent$Inner` for nested classes, §3.7).
	pub fn assemble(
		name: String,
		superclass: String,
		modifiers: Modifier,
		interfaces: Vec<String>,
		methods: Vec<Rc<Method>>,
		fields: Vec<Rc<Field>>,
	) -> Self {
		Class { name, superclass, modifiers, interfaces, methods, fields, statics: RefCell::new(FxHashMap::default()) }
	}

	pub fn class_type(&self) -> Type {
		Type::Class(self.name.clone())
	}

	/// `Parent.Inner` for a `static` inner class, `Parent$Inner`
	/// otherwise (spec.md §3.7, §4.2).
	pub fn nested_name(parent: &str, inner: &str, inner_modifiers: Modifier) -> String {
		let separator = if inner_modifiers.contains(Modifier::STATIC) { '.' } else { '$' };
		format!("{parent}{separator}{inner}")
	}

	pub fn find_method(&self, name: &str, params: &[Type]) -> Option<&Rc<Method>> {
		self.methods.iter().find(|m| m.name == name && m.params.as_slice() == params)
	}

	pub fn find_field(&self, name: &str) -> Option<&Rc<Field>> {
		self.fields.iter().find(|f| f.name == name)
	}

	/// Non-static fields only, declaration order, for `new`'s recursive
	/// superclass walk (spec.md §4.6).
	pub fn instance_fields(&self) -> impl Iterator<Item = &Rc<Field>> {
		self.fields.iter().filter(|f| !f.is_static())
	}

	pub fn static_constructor(&self) -> Option<&Rc<Method>> {
		self.find_method("<cinit>", &[])
	}

	pub fn get_static(&self, name: &str) -> Value {
		self.statics.borrow().get(name).cloned().unwrap_or(Value::Void)
	}

	pub fn set_static(&self, name: &str, value: Value) {
		self.statics.borrow_mut().insert(name.to_string(), value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nested_name_uses_dot_for_static_inner_classes() {
		assert_eq!(Class::nested_name("Outer", "Inner", Modifier::STATIC), "Outer.Inner");
		assert_eq!(Class::nested_name("Outer", "Inner", Modifier::empty()), "Outer$Inner");
	}

	#[test]
	fn statics_round_trip_through_interior_mutability() {
		let class = Class::new("C".into());
		assert!(matches!(class.get_static("s"), Value::Void));
		class.set_static("s", Value::Int(42));
		assert!(matches!(class.get_static("s"), Value::Int(42)));
	}
}
