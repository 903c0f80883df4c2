use std::cell::RefCell;
use std::rc::Rc;

use jslite::error::{LookupError, RuntimeError};
use jslite::{run_with_output, Environment, Object, ObjectType};
use pretty_assertions::assert_eq;

fn run(source: &str) -> (Object, Rc<RefCell<Environment>>, String) {
    let output: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let (result, env) = run_with_output(source, output.clone());
    let printed = String::from_utf8(output.borrow().clone()).unwrap();
    (result, env, printed)
}

#[test]
fn test_scenario() {
    let (result, env, printed) = run("var x=50; var y=100; var z=x+y; println(z);");

    assert_eq!(result, Object::Null);
    assert_eq!(printed, "150\n");
    assert_eq!(env.borrow().get_number("z"), Ok(150));

    let names: Vec<_> = env
        .borrow()
        .bindings()
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    assert_eq!(names, vec!["x=50", "y=100", "z=150"]);
}

#[test]
fn test_division_truncates() {
    let pairs: [(i64, i64); 6] = [(7, 2), (-7, 2), (7, -2), (100, 7), (0, 5), (-100, -7)];
    for (a, b) in pairs {
        let (_, env, _) = run(&format!("var r = {} / {};", a, b));
        assert_eq!(env.borrow().get_number("r"), Ok(a.wrapping_div(b)), "{} / {}", a, b);
    }
}

#[test]
fn test_string_operators() {
    for op in ["+", "-", "*", "/"] {
        let (result, _, _) = run(&format!("\"a\" {} \"b\"", op));
        assert_eq!(result, Object::from("ab"));
    }
}

#[test]
fn test_type_mismatch_continues() {
    let (result, env, printed) = run("var bad = 1 + \"x\"; var good = 2; println(good);");

    assert_eq!(result, Object::Null);
    assert_eq!(printed, "2\n");
    assert_eq!(
        env.borrow().get_typed("bad", ObjectType::Number),
        Err(LookupError::Undefined(String::from("bad")))
    );

    let (result, _, _) = run("1 + \"x\"");
    assert!(result.is_error());
    assert_eq!(
        result,
        Object::Error(RuntimeError::TypeMismatch {
            left: ObjectType::Number,
            operator: String::from("+"),
            right: ObjectType::String,
        })
    );
}

#[test]
fn test_array_bounds() {
    for n in 0..4 {
        let elements: Vec<String> = (0..n).map(|i| i.to_string()).collect();
        let literal = format!("[{}]", elements.join(", "));

        let (result, _, _) = run(&format!("{}[{}]", literal, n));
        assert_eq!(result, Object::Null);
        let (result, _, _) = run(&format!("{}[-1]", literal));
        assert_eq!(result, Object::Null);
    }
}

#[test]
fn test_closure_outlives_frame() {
    let (_, env, _) = run("fn make(){ var x = 1; fn(){ x } } var f = make(); var got = f();");
    assert_eq!(env.borrow().get_number("got"), Ok(1));
    assert!(matches!(
        env.borrow().get_typed("f", ObjectType::Function),
        Ok(Object::Function(_))
    ));
}

#[test]
fn test_hash_indexing() {
    let (result, _, _) = run("{\"k\": 1}[\"k\"]");
    assert_eq!(result, Object::from(1));
    let (result, _, _) = run("{\"k\": 1}[\"missing\"]");
    assert_eq!(result, Object::Null);

    let (_, env, _) = run("var h = {\"k\": 1, 2: true};");
    match env.borrow().get_typed("h", ObjectType::Hash) {
        Ok(Object::Hash(hash)) => {
            let keys: Vec<_> = hash.borrow().iter().map(|pair| pair.key.to_string()).collect();
            assert_eq!(keys, vec!["k", "2"]);
        }
        other => panic!("expected a hash, got {:?}", other),
    };
}

#[test]
fn test_typed_lookup() {
    let (_, env, _) = run("var s = \"text\"; var b = true;");
    let env = env.borrow();

    assert_eq!(env.get_string("s"), Ok(String::from("text")));
    assert_eq!(env.get_bool("b"), Ok(true));
    assert_eq!(
        env.get_bool("s"),
        Err(LookupError::WrongType {
            name: String::from("s"),
            expected: ObjectType::Boolean,
            found: ObjectType::String,
        })
    );
}

#[test]
fn test_parse_errors_skip_statement() {
    let (_, env, printed) = run("var = 1; var kept = 2; println(kept)");
    assert_eq!(printed, "2\n");
    assert_eq!(env.borrow().get_number("kept"), Ok(2));
}

#[test]
fn test_member_reads_in_expressions() {
    let (_, env, printed) = run("var p = {\"age\": 36}; println(p.age); var a = p.age + 1;");
    assert_eq!(printed, "36\n");
    assert_eq!(env.borrow().get_number("a"), Ok(37));
}

#[test]
fn test_self_referencing_array_prints() {
    let (result, _, printed) = run("var a = [1, 2]; a[1] = a; println(a); a[0]");
    assert_eq!(printed, "[1, [...]]\n");
    assert_eq!(result, Object::from(1));
}
