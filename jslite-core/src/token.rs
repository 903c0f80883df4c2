use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Equal,
    SemiColon,
    Dot,
    Comma,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    Identifier,
    String,
    Number,

    Var,
    Fn,
    Null,
    True,
    False,
    Return,

    LineComment,
    BlockComment,

    Illegal,
    Eof,
}

impl Type {
    pub fn is_comment(&self) -> bool {
        matches!(self, Type::LineComment | Type::BlockComment)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            Type::Equal => "'='",
            Type::SemiColon => "';'",
            Type::Dot => "'.'",
            Type::Comma => "','",
            Type::Colon => "':'",
            Type::Plus => "'+'",
            Type::Minus => "'-'",
            Type::Star => "'*'",
            Type::Slash => "'/'",
            Type::LeftParen => "'('",
            Type::RightParen => "')'",
            Type::LeftBracket => "'['",
            Type::RightBracket => "']'",
            Type::LeftBrace => "'{'",
            Type::RightBrace => "'}'",
            Type::Identifier => "identifier",
            Type::String => "string",
            Type::Number => "number",
            Type::Var => "'var'",
            Type::Fn => "'fn'",
            Type::Null => "'null'",
            Type::True => "'true'",
            Type::False => "'false'",
            Type::Return => "'return'",
            Type::LineComment => "line comment",
            Type::BlockComment => "block comment",
            Type::Illegal => "illegal character",
            Type::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// A lexical unit. `lexeme` is the literal text of the token: the digits of a number, the
/// contents of a string without its delimiters, the text of a comment without its markers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub ty: Type,
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(ty: Type, lexeme: String, line: usize, col: usize) -> Self {
        Token {
            ty,
            lexeme,
            line,
            col,
        }
    }

    pub fn eof(line: usize, col: usize) -> Self {
        Token::new(Type::Eof, String::new(), line, col)
    }
}
