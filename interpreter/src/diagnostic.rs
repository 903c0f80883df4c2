use tracing::warn;

/// Snapshot taken when the parser keeps failing to start an expression. `source` is the full
/// input being parsed, `line` and `col` point at the token that failed last.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub source: String,
    pub line: usize,
    pub col: usize,
    pub failures: usize,
}

pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Default sink, reports through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        warn!(
            line = diagnostic.line,
            col = diagnostic.col,
            failures = diagnostic.failures,
            source_len = diagnostic.source.len(),
            "parser keeps failing to find an expression"
        );
    }
}
