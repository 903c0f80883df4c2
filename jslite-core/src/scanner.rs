use std::iter::Peekable;
use std::str::Chars;

use phf::{phf_map, Map};
use tracing::warn;

use crate::token::{Token, Type};

pub struct Scanner;

impl Scanner {
    const KEYWORDS: Map<&'static str, Type> = phf_map! {
        "var" => Type::Var,
        "fn" => Type::Fn,
        "null" => Type::Null,
        "true" => Type::True,
        "false" => Type::False,
        "return" => Type::Return,
    };

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Scanner
    }

    pub fn scan_tokens<'a>(&self, src: &'a str) -> TokenStream<'a> {
        TokenStream::new(src)
    }

    pub fn keyword(text: &str) -> Option<Type> {
        Self::KEYWORDS.get(text).copied()
    }
}

/// Pull-based lexer over a source string. `next_token` can be called any number of times;
/// once the input is exhausted it keeps returning `Eof` tokens.
pub struct TokenStream<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    col: usize,

    // Position of the first character of the token being scanned
    start_line: usize,
    start_col: usize,

    // Set once the eof token has been handed out by the iterator.
    eof: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(src: &'a str) -> Self {
        TokenStream {
            chars: src.chars().peekable(),
            line: 1,
            col: 1,
            start_line: 1,
            start_col: 1,
            eof: false,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start_line = self.line;
        self.start_col = self.col;

        let c = match self.advance() {
            Some(c) => c,
            None => return Token::eof(self.line, self.col),
        };

        match c {
            '=' => self.make_token(Type::Equal, "="),
            ';' => self.make_token(Type::SemiColon, ";"),
            '.' => self.make_token(Type::Dot, "."),
            ',' => self.make_token(Type::Comma, ","),
            ':' => self.make_token(Type::Colon, ":"),
            '+' => self.make_token(Type::Plus, "+"),
            '-' => self.make_token(Type::Minus, "-"),
            '*' => self.make_token(Type::Star, "*"),
            '(' => self.make_token(Type::LeftParen, "("),
            ')' => self.make_token(Type::RightParen, ")"),
            '[' => self.make_token(Type::LeftBracket, "["),
            ']' => self.make_token(Type::RightBracket, "]"),
            '{' => self.make_token(Type::LeftBrace, "{"),
            '}' => self.make_token(Type::RightBrace, "}"),

            '/' => match self.peek() {
                Some('/') => {
                    self.advance();
                    self.line_comment()
                }
                Some('*') => {
                    self.advance();
                    self.block_comment()
                }
                _ => self.make_token(Type::Slash, "/"),
            },

            '"' | '\'' => self.string(c),

            c if c.is_ascii_digit() => self.number(c),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(c),

            c => self.make_token(Type::Illegal, &c.to_string()),
        }
    }

    fn line_comment(&mut self) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        self.make_token(Type::LineComment, &text)
    }

    // Runs until the first `*/`. Nesting is not supported.
    fn block_comment(&mut self) -> Token {
        let mut text = String::new();
        loop {
            match self.advance() {
                None => {
                    warn!(
                        line = self.start_line,
                        col = self.start_col,
                        "unterminated block comment runs to end of input"
                    );
                    break;
                }
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    break;
                }
                Some(c) => text.push(c),
            }
        }
        self.make_token(Type::BlockComment, &text)
    }

    // The contents are kept verbatim, an escaped delimiter included: `\"` only prevents the
    // string from ending, it is not decoded.
    fn string(&mut self, quote: char) -> Token {
        let mut text = String::new();
        loop {
            match self.advance() {
                None => {
                    warn!(
                        line = self.start_line,
                        col = self.start_col,
                        "unterminated string runs to end of input"
                    );
                    break;
                }
                Some('\\') if self.peek() == Some(quote) => {
                    text.push('\\');
                    text.push(quote);
                    self.advance();
                }
                Some(c) if c == quote => break,
                Some(c) => text.push(c),
            }
        }
        self.make_token(Type::String, &text)
    }

    fn number(&mut self, first: char) -> Token {
        let text = self.accumulate(first, |c| c.is_ascii_digit());
        self.make_token(Type::Number, &text)
    }

    fn identifier(&mut self, first: char) -> Token {
        let text = self.accumulate(first, |c| c.is_ascii_alphanumeric() || c == '_');
        match Scanner::keyword(&text) {
            Some(keyword) => self.make_token(keyword, &text),
            None => self.make_token(Type::Identifier, &text),
        }
    }

    fn accumulate(&mut self, first: char, valid: impl Fn(char) -> bool) -> String {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if !valid(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\n') = self.peek() {
            self.advance();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn make_token(&self, ty: Type, lexeme: &str) -> Token {
        Token::new(ty, String::from(lexeme), self.start_line, self.start_col)
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof {
            return None;
        }

        let token = self.next_token();
        if token.ty == Type::Eof {
            self.eof = true;
        }
        Some(token)
    }
}
