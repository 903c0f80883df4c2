use jslite_core::{Token, Type};
use thiserror::Error;

use crate::object::ObjectType;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    #[error("[line {line}:{col}] expected {expected}, found {found} '{lexeme}'")]
    UnexpectedToken {
        expected: Type,
        found: Type,
        lexeme: String,
        line: usize,
        col: usize,
    },

    #[error("[line {line}:{col}] no prefix parse function for {found} '{lexeme}'")]
    NoPrefixParser {
        found: Type,
        lexeme: String,
        line: usize,
        col: usize,
    },

    #[error("[line {line}:{col}] could not parse {lexeme:?} as a 64-bit integer")]
    InvalidNumber {
        lexeme: String,
        line: usize,
        col: usize,
    },
}

impl ParseError {
    // line and col are copied out of the token because thiserror doesn't support field access,
    // e.g {token.line}, in error strings
    pub(crate) fn unexpected(expected: Type, token: &Token) -> Self {
        ParseError::UnexpectedToken {
            expected,
            found: token.ty,
            lexeme: token.lexeme.clone(),
            line: token.line,
            col: token.col,
        }
    }

    pub(crate) fn no_prefix(token: &Token) -> Self {
        ParseError::NoPrefixParser {
            found: token.ty,
            lexeme: token.lexeme.clone(),
            line: token.line,
            col: token.col,
        }
    }

    pub(crate) fn invalid_number(token: &Token) -> Self {
        ParseError::InvalidNumber {
            lexeme: token.lexeme.clone(),
            line: token.line,
            col: token.col,
        }
    }
}

/// Failure of an evaluation. These travel as values: a failed top-level statement is turned
/// into `Object::Error` and the program moves on to the next statement.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum RuntimeError {
    #[error("identifier {0:?} not found")]
    IdentifierNotFound(String),

    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: ObjectType,
        operator: String,
        right: ObjectType,
    },

    #[error("unknown operator: {left} {operator} {right}")]
    UnknownOperator {
        left: ObjectType,
        operator: String,
        right: ObjectType,
    },

    #[error("unknown operator: {operator}{operand}")]
    UnknownPrefixOperator {
        operator: String,
        operand: ObjectType,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("not a function: {0}")]
    NotAFunction(ObjectType),

    #[error("wrong number of arguments to {name}: expected {expected}, got {got}")]
    WrongArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("argument to {name} not supported, got {got}")]
    ArgumentNotSupported { name: String, got: ObjectType },

    #[error("unusable as hash key: {0}")]
    UnusableHashKey(ObjectType),

    #[error("index operator not supported: {collection}[{index}]")]
    IndexNotSupported {
        collection: ObjectType,
        index: ObjectType,
    },

    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("member access not supported on {0}")]
    MemberNotSupported(ObjectType),

    #[error("invalid member name: {0}")]
    InvalidMember(String),

    #[error("invalid assignment target: {0}")]
    InvalidAssignmentTarget(String),

    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),

    #[error("failed to write output: {0}")]
    Output(String),
}

/// Failure of a typed lookup in an `Environment`.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum LookupError {
    #[error("{0:?} is not defined")]
    Undefined(String),

    #[error("{name:?} is a {found}, not a {expected}")]
    WrongType {
        name: String,
        expected: ObjectType,
        found: ObjectType,
    },
}
