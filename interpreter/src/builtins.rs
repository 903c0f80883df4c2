use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use ahash::AHashMap;

use crate::callable::{BoxedFunction, Builtin};
use crate::error::RuntimeError;
use crate::object::Object;

/// Host functions by name. Built once per interpreter; `println` writes to the interpreter's
/// output rather than to a process-wide handle.
pub(crate) struct Builtins {
    table: AHashMap<&'static str, Rc<Builtin>>,
}

impl Builtins {
    pub(crate) fn new(stdout: Rc<RefCell<dyn Write>>) -> Self {
        let mut builtins = Builtins {
            table: AHashMap::new(),
        };

        // Arity is checked by the caller, so `args` always has exactly `arity` elements here
        builtins.register(
            "println",
            1,
            Box::new(move |args: &[Object]| {
                writeln!(stdout.borrow_mut(), "{}", args[0])
                    .map_err(|err| RuntimeError::Output(err.to_string()))?;
                Ok(Object::Null)
            }),
        );

        // Length in bytes of the UTF-8 text
        builtins.register(
            "len",
            1,
            Box::new(|args: &[Object]| match &args[0] {
                Object::Str(val) => Ok(Object::Number(val.len() as i64)),
                other => Err(RuntimeError::ArgumentNotSupported {
                    name: String::from("len"),
                    got: other.ty(),
                }),
            }),
        );

        builtins
    }

    fn register(&mut self, name: &'static str, arity: usize, func: BoxedFunction) {
        self.table
            .insert(name, Rc::new(Builtin::new(func, name, arity)));
    }

    pub(crate) fn get(&self, name: &str) -> Option<Object> {
        self.table
            .get(name)
            .map(|builtin| Object::Builtin(Rc::clone(builtin)))
    }
}
