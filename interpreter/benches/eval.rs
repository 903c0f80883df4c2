use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use criterion::{criterion_group, criterion_main, Criterion};
use jslite::{Interpreter, Parser};

fn benchmark(c: &mut Criterion) {
    let src = include_str!("../../tests/collections.jsl");
    let program = Parser::new(src).parse_program();

    c.bench_function("eval collections", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::new(Rc::new(RefCell::new(io::sink())));
            interpreter.interpret(&program)
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
