use std::cell::RefCell;
use std::io;
use std::io::Write;
use std::rc::Rc;
use std::sync::Once;

pub mod ast;
mod builtins;
mod callable;
pub mod diagnostic;
mod env;
pub mod error;
mod hash;
mod interpreter;
pub mod limits;
mod object;
mod parser;

pub use callable::{Builtin, Function};
pub use env::Environment;
pub use hash::{HashKey, HashObject, HashPair, Hashable};
pub use interpreter::Interpreter;
pub use object::{Object, ObjectType};
pub use parser::Parser;

static TRACING_INIT: Once = Once::new();

/// Installs a `tracing` subscriber filtered by `RUST_LOG`. Does nothing when `RUST_LOG` is unset
/// and only ever runs once per process.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Parses and evaluates `source`, printing to the process's stdout. Returns the value of the
/// last statement executed together with the top-level scope.
pub fn run(source: &str) -> (Object, Rc<RefCell<Environment>>) {
    run_with_output(source, Rc::new(RefCell::new(io::stdout())))
}

/// Like `run`, with `println` writing to `stdout` instead.
pub fn run_with_output(
    source: &str,
    stdout: Rc<RefCell<dyn Write>>,
) -> (Object, Rc<RefCell<Environment>>) {
    let program = Parser::new(source).parse_program();
    let mut interpreter = Interpreter::new(stdout);
    let result = interpreter.interpret(&program);
    (result, interpreter.globals())
}
