//! Runtime object: class pointer, field map, identity id (spec.md §3.6).
//!
//! Grounded in `original_source/src/vm/runtime/Instance.hpp`. Fields
//! are copied recursively along the superclass chain at construction
//! time (`new`, spec.md §4.6); only the first definition of a given
//! field name per instance wins.

use crate::element::class::Class;
use crate::types::Type;
use crate::value::Value;
use fxhash::FxHashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Instance {
	pub instance_id: u64,
	pub class: Rc<Class>,
	fields: FxHashMap<String, Value>,
}

impl Instance {
	pub fn new(instance_id: u64, class: Rc<Class>) -> Self {
		Instance { instance_id, class, fields: FxHashMap::default() }
	}

	pub fn class_type(&self) -> Type {
		Type::Class(self.class.name.clone())
	}

	pub fn has_field(&self, name: &str) -> bool {
		self.fields.contains_key(name)
	}

	pub fn get_field(&self, name: &str) -> Value {
		self.fields.get(name).cloned().unwrap_or(Value::Void)
	}

	pub fn set_field(&mut self, name: &str, value: Value) {
		self.fields.insert(name.to_string(), value);
	}

	/// Only inserts if the field name hasn't already been copied from
	/// a more-derived class in the superclass walk (spec.md §4.6,
	/// §8 "Instance field immutability of class defaults").
	pub fn init_field_if_absent(&mut self, name: &str, value: Value) {
		self.fields.entry(name.to_string()).or_insert(value);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::element::class::Class;

	#[test]
	fn field_independence_between_instances() {
		let class = Rc::new(Class::new("C".into()));
		let mut a = Instance::new(1, class.clone());
		let mut b = Instance::new(2, class);
		a.init_field_if_absent("n", Value::Int(0));
		b.init_field_if_absent("n", Value::Int(0));
		a.set_field("n", Value::Int(1));
		assert!(matches!(a.get_field("n"), Value::Int(1)));
		assert!(matches!(b.get_field("n"), Value::Int(0)));
	}

	#[test]
	fn first_definition_wins_on_init() {
		let class = Rc::new(Class::new("C".into()));
		let mut a = Instance::new(1, class);
		a.init_field_if_absent("n", Value::Int(5));
		a.init_field_if_absent("n", Value::Int(99));
		assert!(matches!(a.get_field("n"), Value::Int(5)));
	}
}
