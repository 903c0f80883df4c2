use std::mem;

use jslite_core::{Scanner, Token, TokenStream, Type};
use tracing::{debug, warn};

use crate::ast::{Expr, Precedence, Program, Stmt};
use crate::diagnostic::{Diagnostic, DiagnosticSink, LogSink};
use crate::error::ParseError;
use crate::limits::PARSE_MAX_PREFIX_FAILURES;

type ExprResult = Result<Expr, ParseError>;
type StmtResult = Result<Stmt, ParseError>;

type PrefixFn<'a> = fn(&mut Parser<'a>) -> ExprResult;
type InfixFn<'a> = fn(&mut Parser<'a>, Expr) -> ExprResult;

struct ParseRule<'a> {
    prefix: Option<PrefixFn<'a>>,
    infix: Option<InfixFn<'a>>,
    precedence: Precedence,
}

impl<'a> ParseRule<'a> {
    fn new(prefix: Option<PrefixFn<'a>>, infix: Option<InfixFn<'a>>) -> Self {
        ParseRule {
            prefix,
            infix,
            precedence: Precedence::Lowest,
        }
    }

    fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }
}

/// Pratt parser over two tokens of lookahead. Every parse function starts with `current` on the
/// first token of its construct and leaves `current` on the last one.
pub struct Parser<'a> {
    source: &'a str,
    tokens: TokenStream<'a>,
    current: Token,
    next: Token,
    errors: Vec<ParseError>,
    // `{` minus `}` seen since the current top-level statement started
    open_braces: usize,
    prefix_failures: usize,
    sink: Box<dyn DiagnosticSink>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser::with_sink(source, Box::new(LogSink))
    }

    pub fn with_sink(source: &'a str, sink: Box<dyn DiagnosticSink>) -> Self {
        let mut parser = Parser {
            source,
            tokens: Scanner::new().scan_tokens(source),
            current: Token::eof(1, 1),
            next: Token::eof(1, 1),
            errors: Vec::new(),
            open_braces: 0,
            prefix_failures: 0,
            sink,
        };

        // prime `current` and `next`
        parser.next = parser.pump();
        parser.next_token();
        parser
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Parses until end of input. A malformed statement is recorded in `errors()` and left out
    /// of the program; parsing resumes after it.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while self.current.ty != Type::Eof {
            match self.parse_statement() {
                Ok(Some(stmt)) => statements.push(stmt),
                Ok(None) => {}
                Err(err) => {
                    warn!(%err, "dropping statement");
                    self.errors.push(err);
                    self.synchronize();
                }
            }

            self.open_braces = 0;
            self.next_token();
        }

        Program { statements }
    }

    fn rule(ty: Type) -> ParseRule<'a> {
        match ty {
            Type::Identifier => ParseRule::new(Some(Self::identifier), None),
            Type::Number => ParseRule::new(Some(Self::number), None),
            Type::String => ParseRule::new(Some(Self::string), None),
            Type::True | Type::False => ParseRule::new(Some(Self::boolean), None),
            Type::Null => ParseRule::new(Some(Self::null), None),
            Type::Fn => ParseRule::new(Some(Self::function), None),
            Type::LeftBracket => ParseRule::new(Some(Self::array), Some(Self::index))
                .with_precedence(Precedence::Index),
            Type::LeftBrace => ParseRule::new(Some(Self::hash), None),
            Type::LeftParen => ParseRule::new(Some(Self::grouping), Some(Self::call))
                .with_precedence(Precedence::Call),
            Type::Minus => ParseRule::new(Some(Self::prefix), Some(Self::infix))
                .with_precedence(Precedence::Sum),
            Type::Plus => ParseRule::new(None, Some(Self::infix)).with_precedence(Precedence::Sum),
            Type::Star | Type::Slash => {
                ParseRule::new(None, Some(Self::infix)).with_precedence(Precedence::Product)
            }
            Type::Dot => {
                ParseRule::new(None, Some(Self::member)).with_precedence(Precedence::Index)
            }
            // Only reached through the trailing fold of an expression statement
            Type::Equal => ParseRule::new(None, Some(Self::infix)),
            _ => ParseRule::new(None, None),
        }
    }

    fn parse_statement(&mut self) -> Result<Option<Stmt>, ParseError> {
        let stmt = match self.current.ty {
            // empty statement
            Type::SemiColon => return Ok(None),
            Type::Var => self.var_declaration()?,
            Type::Return => self.return_statement()?,
            Type::LeftBrace
                if !matches!(
                    self.next.ty,
                    Type::String | Type::Number | Type::RightBrace
                ) =>
            {
                Stmt::Block {
                    statements: self.block()?,
                }
            }
            _ => self.expression_statement()?,
        };
        Ok(Some(stmt))
    }

    fn var_declaration(&mut self) -> StmtResult {
        self.expect_peek(Type::Identifier)?;
        let name = self.current.clone();
        self.expect_peek(Type::Equal)?;
        self.next_token();

        let init = self.expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Ok(Stmt::Var { name, init })
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.current.clone();
        let value = if matches!(self.next.ty, Type::SemiColon | Type::RightBrace | Type::Eof) {
            None
        } else {
            self.next_token();
            Some(self.expression(Precedence::Lowest)?)
        };

        self.skip_semicolon();
        Ok(Stmt::Return { keyword, value })
    }

    // `current` is on `{`, ends on the matching `}`
    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        self.next_token();

        while self.current.ty != Type::RightBrace {
            if self.current.ty == Type::Eof {
                return Err(ParseError::unexpected(Type::RightBrace, &self.current));
            }
            if let Some(stmt) = self.parse_statement()? {
                statements.push(stmt);
            }
            self.next_token();
        }

        Ok(statements)
    }

    // Assignment is folded onto the finished expression
    fn expression_statement(&mut self) -> StmtResult {
        let mut expression = self.expression(Precedence::Lowest)?;

        if self.next.ty == Type::Equal {
            self.next_token();
            expression = self.infix(expression)?;
        }

        self.skip_semicolon();
        Ok(Stmt::Expression { expression })
    }

    fn expression(&mut self, precedence: Precedence) -> ExprResult {
        let prefix = match Self::rule(self.current.ty).prefix {
            Some(prefix) => prefix,
            None => return Err(self.no_prefix()),
        };
        self.prefix_failures = 0;

        let mut left = prefix(self)?;
        while self.next.ty != Type::SemiColon && precedence < Precedence::of(self.next.ty) {
            let infix = match Self::rule(self.next.ty).infix {
                Some(infix) => infix,
                None => return Ok(left),
            };
            self.next_token();
            left = infix(self, left)?;
        }

        Ok(left)
    }

    fn identifier(&mut self) -> ExprResult {
        Ok(Expr::identifier(self.current.clone()))
    }

    fn number(&mut self) -> ExprResult {
        match self.current.lexeme.parse::<i64>() {
            Ok(value) => Ok(Expr::Number { value }),
            Err(_) => Err(ParseError::invalid_number(&self.current)),
        }
    }

    fn string(&mut self) -> ExprResult {
        Ok(Expr::Str {
            value: self.current.lexeme.clone(),
        })
    }

    fn boolean(&mut self) -> ExprResult {
        Ok(Expr::Boolean {
            value: self.current.ty == Type::True,
        })
    }

    fn null(&mut self) -> ExprResult {
        Ok(Expr::Null)
    }

    fn grouping(&mut self) -> ExprResult {
        self.next_token();
        let expr = self.expression(Precedence::Lowest)?;
        self.expect_peek(Type::RightParen)?;
        Ok(expr)
    }

    fn prefix(&mut self) -> ExprResult {
        let operator = self.current.clone();
        self.next_token();
        let right = self.expression(Precedence::Prefix)?;
        Ok(Expr::prefix(operator, right))
    }

    fn infix(&mut self, left: Expr) -> ExprResult {
        let operator = self.current.clone();
        let precedence = Self::rule(operator.ty).precedence;
        self.next_token();
        let right = self.expression(precedence)?;
        Ok(Expr::infix(left, operator, right))
    }

    // `.` takes exactly one identifier, the key of the hash entry
    fn member(&mut self, collection: Expr) -> ExprResult {
        let operator = self.current.clone();
        self.expect_peek(Type::Identifier)?;
        let name = Expr::identifier(self.current.clone());
        Ok(Expr::infix(collection, operator, name))
    }

    fn array(&mut self) -> ExprResult {
        let elements = self.expression_list(Type::RightBracket)?;
        Ok(Expr::Array { elements })
    }

    // `{` key `:` value (`,` key `:` value)* `,`? `}`
    fn hash(&mut self) -> ExprResult {
        let mut pairs = Vec::new();

        while self.next.ty != Type::RightBrace {
            self.next_token();
            let key = self.expression(Precedence::Lowest)?;
            self.expect_peek(Type::Colon)?;
            self.next_token();
            let value = self.expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if self.next.ty != Type::RightBrace {
                self.expect_peek(Type::Comma)?;
            }
        }

        self.expect_peek(Type::RightBrace)?;
        Ok(Expr::Hash { pairs })
    }

    fn index(&mut self, collection: Expr) -> ExprResult {
        let bracket = self.current.clone();
        self.next_token();
        let index = self.expression(Precedence::Lowest)?;
        self.expect_peek(Type::RightBracket)?;
        Ok(Expr::index(collection, bracket, index))
    }

    fn call(&mut self, callee: Expr) -> ExprResult {
        let paren = self.current.clone();
        let args = self.expression_list(Type::RightParen)?;
        Ok(Expr::call(callee, paren, args))
    }

    // `fn` name? `(` params `)` `{` body `}`
    fn function(&mut self) -> ExprResult {
        let name = if self.next.ty == Type::Identifier {
            self.next_token();
            Some(self.current.clone())
        } else {
            None
        };

        self.expect_peek(Type::LeftParen)?;
        let mut params = Vec::new();
        if self.next.ty == Type::RightParen {
            self.next_token();
        } else {
            loop {
                self.expect_peek(Type::Identifier)?;
                params.push(self.current.clone());
                if self.next.ty == Type::Comma {
                    self.next_token();
                } else {
                    break;
                }
            }
            self.expect_peek(Type::RightParen)?;
        }

        self.expect_peek(Type::LeftBrace)?;
        let body = self.block()?;
        Ok(Expr::function(name, params, body))
    }

    // `current` is on the opening delimiter, ends on `end`
    fn expression_list(&mut self, end: Type) -> Result<Vec<Expr>, ParseError> {
        let mut list = Vec::new();
        if self.next.ty == end {
            self.next_token();
            return Ok(list);
        }

        self.next_token();
        list.push(self.expression(Precedence::Lowest)?);
        while self.next.ty == Type::Comma {
            self.next_token();
            self.next_token();
            list.push(self.expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(list)
    }

    fn no_prefix(&mut self) -> ParseError {
        self.prefix_failures += 1;
        debug!(
            token = %self.current.ty,
            line = self.current.line,
            col = self.current.col,
            "no prefix parse function"
        );

        if self.prefix_failures == PARSE_MAX_PREFIX_FAILURES {
            self.sink.report(&Diagnostic {
                source: String::from(self.source),
                line: self.current.line,
                col: self.current.col,
                failures: self.prefix_failures,
            });
        }

        ParseError::no_prefix(&self.current)
    }

    // Skips to the last token of the malformed statement: a `;` or `}` at the statement's own
    // brace depth, or the token before a `var`, `fn` or `return` that starts a new one.
    fn synchronize(&mut self) {
        loop {
            match self.current.ty {
                Type::Eof => return,
                Type::SemiColon | Type::RightBrace if self.open_braces == 0 => return,
                _ => {}
            }

            if self.open_braces == 0
                && matches!(self.next.ty, Type::Var | Type::Fn | Type::Return)
            {
                return;
            }
            self.next_token();
        }
    }

    fn expect_peek(&mut self, ty: Type) -> Result<(), ParseError> {
        if self.next.ty == ty {
            self.next_token();
            Ok(())
        } else {
            Err(ParseError::unexpected(ty, &self.next))
        }
    }

    fn skip_semicolon(&mut self) {
        if self.next.ty == Type::SemiColon {
            self.next_token();
        }
    }

    fn next_token(&mut self) {
        let token = self.pump();
        self.current = mem::replace(&mut self.next, token);

        match self.current.ty {
            Type::LeftBrace => self.open_braces += 1,
            Type::RightBrace => self.open_braces = self.open_braces.saturating_sub(1),
            _ => {}
        }
    }

    // Comments never reach the grammar
    fn pump(&mut self) -> Token {
        loop {
            let token = self.tokens.next_token();
            if !token.ty.is_comment() {
                return token;
            }
        }
    }
}
