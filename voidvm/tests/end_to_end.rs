//! End-to-end scenarios (spec.md §8), each built as a small bytecode
//! program, loaded through a real `VirtualMachine`, and asserted on the
//! returned `Value`.

use voidvm::element::class::Class;
use voidvm::loader::class_parser;
use voidvm::value::Value;
use voidvm::vm::VirtualMachine;

fn load(src: &str) -> VirtualMachine {
	let lines: Vec<String> = src.lines().map(str::to_string).collect();
	let classes = class_parser::parse_classes(&lines).expect("program should parse");
	let vm = VirtualMachine::new();
	for class in classes {
		vm.define_class(class).expect("no redefinitions in these fixtures");
    }
	vm
}

fn call(vm: &VirtualMachine, class: &Class, method: &str) -> Value {
	let m = class.find_method(method, &[]).expect("method should exist");
	m.invoke(vm, None, None, &class.name, Vec::new()).expect("invocation should not fail")
}

#[test]
fn arithmetic_roundup_returns_fifty() {
	let vm = load(
		"cdef Arith\n\
		 cbegin\n\
		 mdef compute\n\
		 mreturn I\n\
		 mbegin\n\
		 ipush 2\n\
		 ipush 3\n\
		 iadd\n\
		 ipush 10\n\
		 imul\n\
		 ireturn -stack\n\
		 mend\n\
		 cend\n",
	);
	let class = vm.find_class("Arith").unwrap();
	assert!(matches!(call(&vm, &class, "compute"), Value::Int(50)));
}

#[test]
fn local_variables_via_linker_returns_eight() {
	let vm = load(
		"cdef Locals\n\
		 cbegin\n\
		 mdef compute\n\
		 mreturn I\n\
		 mbegin\n\
		 #link x 0\n\
		 ipush 7\n\
		 istore x\n\
		 iload x\n\
		 ipush 1\n\
		 iadd\n\
		 ireturn -stack\n\
		 mend\n\
		 cend\n",
	);
	let class = vm.find_class("Locals").unwrap();
	assert!(matches!(call(&vm, &class, "compute"), Value::Int(8)));
}

#[test]
fn conditional_branch_takes_the_equal_path() {
	let vm = load(
		"cdef Branch\n\
		 cbegin\n\
		 mdef compute\n\
		 mreturn I\n\
		 mbegin\n\
		 ipush 5\n\
		 ipush 5\n\
		 ifi== -stack -stack -jump eq\n\
		 ipush 0\n\
		 ireturn -stack\n\
		 :eq\n\
		 ipush 1\n\
		 ireturn -stack\n\
		 mend\n\
		 cend\n",
	);
	let class = vm.find_class("Branch").unwrap();
	assert!(matches!(call(&vm, &class, "compute"), Value::Int(1)));
}

#[test]
fn static_field_is_initialized_before_first_use() {
	let vm = load(
		"cdef C\n\
		 cbegin\n\
		 fdef s\n\
		 ftype I\n\
		 fmod static\n\
		 fbegin\n\
		 ipush 42\n\
		 ireturn -stack\n\
		 fend\n\
		 mdef m\n\
		 mreturn I\n\
		 mmod static\n\
		 mbegin\n\
		 getstatic C.s\n\
		 ireturn -stack\n\
		 mend\n\
		 cend\n",
	);
	vm.initialize().expect("static init should not fail");
	let class = vm.find_class("C").unwrap();
	assert!(matches!(call(&vm, &class, "m"), Value::Int(42)));
}

#[test]
fn instance_fields_are_independent_per_object() {
	let vm = load(
		"cdef C\n\
		 cbegin\n\
		 fdef n\n\
		 ftype I\n\
		 fbegin\n\
		 ipush 0\n\
		 ireturn -stack\n\
		 fend\n\
		 mdef readBN\n\
		 mreturn I\n\
		 mmod static\n\
		 mbegin\n\
		 #link a 0\n\
		 #link b 1\n\
		 #link bn 0\n\
		 new C -r a\n\
		 new C -r b\n\
		 aload a\n\
		 setfield C.n -stack -const 1\n\
		 aload b\n\
		 getfield C.n -stack -r bn\n\
		 iload bn\n\
		 ireturn -stack\n\
		 mend\n\
		 cend\n",
	);
	let class = vm.find_class("C").unwrap();
	assert!(matches!(call(&vm, &class, "readBN"), Value::Int(0)));
}

#[test]
fn duplicate_linker_value_warns_but_still_succeeds() {
	let vm = load(
		"cdef Dup\n\
		 cbegin\n\
		 mdef m\n\
		 mreturn I\n\
		 mbegin\n\
		 #link x 0\n\
		 #link y 0\n\
		 ipush 9\n\
		 istore x\n\
		 iload y\n\
		 ireturn -stack\n\
		 mend\n\
		 cend\n",
	);
	let class = vm.find_class("Dup").unwrap();
	assert!(matches!(call(&vm, &class, "m"), Value::Int(9)));
}
