use std::cell::RefCell;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use crate::ast::FunctionLiteral;
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::object::Object;

pub(crate) trait Callable {
    fn name(&self) -> &str;
    fn arity(&self) -> usize;
    fn execute(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: &[Object],
    ) -> Result<Object, RuntimeError>;
}

pub(crate) type BoxedFunction = Box<dyn Fn(&[Object]) -> Result<Object, RuntimeError>>;

/// Host function exposed to scripts under a fixed name.
pub struct Builtin {
    func: BoxedFunction,
    name: &'static str,
    arity: usize,
}

impl Builtin {
    pub(crate) fn new(func: BoxedFunction, name: &'static str, arity: usize) -> Self {
        Builtin { func, name, arity }
    }
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<builtin {}/{}>", self.name, self.arity)
    }
}

impl Callable for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn execute(self: Rc<Self>, _: &mut Interpreter, args: &[Object]) -> Result<Object, RuntimeError> {
        (self.func)(args)
    }
}

/// A function literal paired with the environment it was evaluated in.
pub struct Function {
    literal: Rc<FunctionLiteral>,
    closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub(crate) fn new(literal: Rc<FunctionLiteral>, closure: Rc<RefCell<Environment>>) -> Self {
        Function { literal, closure }
    }
}

// The closure is left out: a named function sits in its own closure, so printing it would
// never terminate.
impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.literal.name())
            .field("arity", &self.literal.params.len())
            .finish()
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.literal)
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        self.literal.name().unwrap_or("anonymous function")
    }

    fn arity(&self) -> usize {
        self.literal.params.len()
    }

    #[tracing::instrument(level = "trace", skip_all, fields(name = self.name()))]
    fn execute(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: &[Object],
    ) -> Result<Object, RuntimeError> {
        let mut env = Environment::with(Rc::clone(&self.closure));
        for (param, arg) in self.literal.params.iter().zip(args) {
            env.define(&param.lexeme, arg.clone());
        }

        let res =
            interpreter.execute_block_with_env(&self.literal.body, Rc::new(RefCell::new(env)))?;
        match res {
            Object::ReturnValue(value) => Ok(*value),
            other => Ok(other),
        }
    }
}
