//! Class/method/field framing-directive parser (spec.md §4.2, §4.9
//! "Class-body parser").
//!
//! Grounded in `original_source`'s `VirtualMachine::loadBytecode`: a
//! depth-counted state machine over `cdef/cmod/cext/cimpl/cbegin/cend`,
//! `mdef/mmod/mreturn/mparam/mbegin/mend`, `fdef/fmod/ftype/fbegin/fend`.
//! Nested classes recurse and are flattened into the same output list
//! (spec.md §3.7: "flat registry, no tree").

use crate::element::class::Class;
use crate::element::executable::Executable;
use crate::element::field::Field;
use crate::element::method::{describe_params, Method};
use crate::errors::VmError;
use crate::modifier::{parse_modifiers, Modifier};
use crate::types::Type;
use std::rc::Rc;

struct Cursor<'a> {
	lines: &'a [String],
	pos: usize,
}

impl<'a> Cursor<'a> {
	fn peek(&self) -> Option<&'a str> {
		self.lines.get(self.pos).map(String::as_str)
	}

	fn advance(&mut self) -> Option<&'a str> {
		let line = self.peek();
		if line.is_some() {
			self.pos += 1;
		}
		line
	}
}

fn first_token(line: &str) -> &str {
	line.trim().split_whitespace().next().unwrap_or("")
}

fn rest_of(line: &str) -> &str {
	let trimmed = line.trim();
	match trimmed.split_once(char::is_whitespace) {
		Some((_, rest)) => rest.trim(),
		None => "",
	}
}

/// Parses the whole program's line buffer into a flat list of classes,
/// nested classes included. Grounded in `original_source`'s
/// `loadBytecode`.
#[tracing::instrument(skip(lines))]
pub fn parse_classes(lines: &[String]) -> Result<Vec<Class>, VmError> {
	let mut cursor = Cursor { lines, pos: 0 };
	let mut classes = Vec::new();
	while let Some(line) = cursor.peek() {
		if first_token(line) == "cdef" {
			parse_class(&mut cursor, None, &mut classes)?;
		} else {
			cursor.advance();
		}
	}
	Ok(classes)
}

fn parse_class(cursor: &mut Cursor, parent: Option<&str>, out: &mut Vec<Class>) -> Result<(), VmError> {
	let header = cursor.advance().unwrap_or("");
	let local_name = rest_of(header).to_string();

	let mut superclass = "Object".to_string();
	let mut modifiers = Modifier::empty();
	let mut interfaces = Vec::new();

	while let Some(line) = cursor.peek() {
		match first_token(line) {
			"cext" => {
				superclass = rest_of(line).to_string();
				cursor.advance();
			}
			"cmod" => {
				modifiers = parse_modifiers(rest_of(line));
				cursor.advance();
			}
			"cimpl" => {
				interfaces.push(rest_of(line).to_string());
				cursor.advance();
			}
			"cbegin" => {
				cursor.advance();
				break;
			}
			_ => {
				cursor.advance();
			}
		}
	}

	let qualified_name = match parent {
		Some(parent) => Class::nested_name(parent, &local_name, modifiers),
		None => local_name,
	};

	let mut methods: Vec<Rc<Method>> = Vec::new();
	let mut fields: Vec<Rc<Field>> = Vec::new();
	let mut depth = 1u32;

	while depth > 0 {
		let Some(line) = cursor.peek() else { break };
		match first_token(line) {
			"cdef" => parse_class(cursor, Some(&qualified_name), out)?,
			"cbegin" => {
				depth += 1;
				cursor.advance();
			}
			"cend" => {
				depth -= 1;
				cursor.advance();
			}
			"mdef" => {
				let method = parse_method(cursor)?;
				if methods.iter().any(|m| m.name == method.name && m.params == method.params) {
					return Err(VmError::MethodRedefine(method.name.clone(), describe_params(&method.params)));
				}
				methods.push(Rc::new(method));
			}
			"fdef" => {
				let field = parse_field(cursor)?;
				if fields.iter().any(|f| f.name == field.name) {
					return Err(VmError::FieldRedefine(field.name.clone(), qualified_name.clone()));
				}
				fields.push(Rc::new(field));
			}
			_ => {
				cursor.advance();
			}
		}
	}

	out.push(Class::assemble(qualified_name, superclass, modifiers, interfaces, methods, fields));
	Ok(())
}

fn parse_method(cursor: &mut Cursor) -> Result<Method, VmError> {
	let header = cursor.advance().unwrap_or("");
	let name = rest_of(header).to_string();

	let mut modifiers = Modifier::empty();
	let mut return_type = Type::Void;
	let mut params = Vec::new();

	while let Some(line) = cursor.peek() {
		match first_token(line) {
			"mmod" => {
				modifiers = parse_modifiers(rest_of(line));
				cursor.advance();
			}
			"mreturn" => {
				return_type = Type::parse(rest_of(line)).unwrap_or(Type::Void);
				cursor.advance();
			}
			"mparam" => {
				if let Some(ty) = Type::parse(rest_of(line)) {
					params.push(ty);
				}
				cursor.advance();
			}
			"mbegin" => {
				cursor.advance();
				break;
			}
			_ => {
				cursor.advance();
			}
		}
	}

	let body = collect_body(cursor, "mbegin", "mend");
	let executable = Rc::new(Executable::build(&body, modifiers));
	Ok(Method::new(name, params, return_type, executable))
}

fn parse_field(cursor: &mut Cursor) -> Result<Field, VmError> {
	let header = cursor.advance().unwrap_or("");
	let name = rest_of(header).to_string();

	let mut modifiers = Modifier::empty();
	let mut ty = Type::Void;

	while let Some(line) = cursor.peek() {
		match first_token(line) {
			"fmod" => {
				modifiers = parse_modifiers(rest_of(line));
				cursor.advance();
			}
			"ftype" => {
				ty = Type::parse(rest_of(line)).unwrap_or(Type::Void);
				cursor.advance();
			}
			"fbegin" => {
				cursor.advance();
				break;
			}
			_ => {
				cursor.advance();
			}
		}
	}

	let body = collect_body(cursor, "fbegin", "fend");
	let executable = Rc::new(Executable::build(&body, modifiers));
	Ok(Field::new(name, ty, executable))
}

/// Collects lines up to (and consuming) the matching close token at
/// depth zero, honoring re-opened frames of the same kind.
fn collect_body(cursor: &mut Cursor, open: &str, close: &str) -> Vec<String> {
	let mut body = Vec::new();
	let mut depth = 1u32;
	while depth > 0 {
		let Some(line) = cursor.advance() else { break };
		match first_token(line) {
			t if t == open => depth += 1,
			t if t == close => {
				depth -= 1;
				if depth == 0 {
					break;
				}
			}
			_ => body.push(line.to_string()),
		}
	}
	body
}

#[cfg(test)]
mod tests {
	use super::*;

	fn lines(text: &str) -> Vec<String> {
		text.lines().map(str::to_string).collect()
	}

	#[test]
	fn parses_a_simple_class_with_one_method() {
		let src = lines(
			"cdef Calc\ncbegin\nmdef add\nmreturn I\nmparam I\nmparam I\nmbegin\niadd -stack -stack -r sum\nireturn -stack\nmend\ncend\n",
		);
		let classes = parse_classes(&src).unwrap();
		assert_eq!(classes.len(), 1);
		assert_eq!(classes[0].name, "Calc");
		assert_eq!(classes[0].methods.len(), 1);
		assert_eq!(classes[0].methods[0].params, vec![Type::Int, Type::Int]);
	}

	#[test]
	fn nested_static_class_gets_dotted_name() {
		let src = lines("cdef Outer\ncbegin\ncdef Inner\ncmod static\ncbegin\ncend\ncend\n");
		let classes = parse_classes(&src).unwrap();
		assert_eq!(classes.len(), 2);
		assert!(classes.iter().any(|c| c.name == "Outer"));
		assert!(classes.iter().any(|c| c.name == "Outer.Inner"));
	}

	#[test]
	fn duplicate_field_name_is_fatal() {
		let src = lines("cdef C\ncbegin\nfdef n\nftype I\nfbegin\nfend\nfdef n\nftype I\nfbegin\nfend\ncend\n");
		let err = parse_classes(&src).unwrap_err();
		assert!(matches!(err, VmError::FieldRedefine(..)));
	}
}
