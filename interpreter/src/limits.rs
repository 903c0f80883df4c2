/// Consecutive "no prefix parse function" failures before the diagnostic sink is notified.
pub const PARSE_MAX_PREFIX_FAILURES: usize = 10;

/// Nesting limit for interpreted function calls.
pub const INTERP_MAX_CALL_DEPTH: usize = 128;
