use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use jslite_core::{Token, Type};

use crate::error::RuntimeError;

/// Binding power of an operator, lowest first. Derived ordering is what the parser compares.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

impl Precedence {
    /// Precedence of `ty` when it appears in operator position. Tokens that cannot continue an
    /// expression, `=` included, bind at `Lowest`.
    pub fn of(ty: Type) -> Precedence {
        match ty {
            Type::Plus | Type::Minus => Precedence::Sum,
            Type::Star | Type::Slash => Precedence::Product,
            Type::LeftParen => Precedence::Call,
            Type::LeftBracket | Type::Dot => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Var { name: Token, init: Expr },
    Expression { expression: Expr },
    Block { statements: Vec<Stmt> },
    Return { keyword: Token, value: Option<Expr> },
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Identifier {
        name: Token,
    },
    Number {
        value: i64,
    },
    Str {
        value: String,
    },
    Boolean {
        value: bool,
    },
    Null,
    Array {
        elements: Vec<Expr>,
    },
    // Pairs stay in source order
    Hash {
        pairs: Vec<(Expr, Expr)>,
    },
    Prefix {
        operator: Token,
        right: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Index {
        collection: Box<Expr>,
        bracket: Token,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        paren: Token,
        args: Vec<Expr>,
    },
    Function(Rc<FunctionLiteral>),
}

/// Function objects keep the literal alive through the `Rc`, the body is never copied.
#[derive(Debug, PartialEq)]
pub struct FunctionLiteral {
    pub name: Option<Token>,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

impl FunctionLiteral {
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|name| name.lexeme.as_str())
    }
}

pub(crate) trait ExprVisitor {
    type Item;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Item, RuntimeError> {
        match expr {
            Expr::Identifier { name } => self.visit_identifier(name),
            Expr::Number { value } => self.visit_number(*value),
            Expr::Str { value } => self.visit_string(value),
            Expr::Boolean { value } => self.visit_boolean(*value),
            Expr::Null => self.visit_null(),
            Expr::Array { elements } => self.visit_array(elements),
            Expr::Hash { pairs } => self.visit_hash(pairs),
            Expr::Prefix { operator, right } => self.visit_prefix(operator, right),
            Expr::Infix {
                left,
                operator,
                right,
            } => self.visit_infix(left, operator, right),
            Expr::Index {
                collection,
                bracket,
                index,
            } => self.visit_index(collection, bracket, index),
            Expr::Call {
                callee,
                paren,
                args,
            } => self.visit_call(callee, paren, args),
            Expr::Function(literal) => self.visit_function(literal),
        }
    }

    fn visit_identifier(&mut self, name: &Token) -> Result<Self::Item, RuntimeError>;
    fn visit_number(&mut self, value: i64) -> Result<Self::Item, RuntimeError>;
    fn visit_string(&mut self, value: &str) -> Result<Self::Item, RuntimeError>;
    fn visit_boolean(&mut self, value: bool) -> Result<Self::Item, RuntimeError>;
    fn visit_null(&mut self) -> Result<Self::Item, RuntimeError>;
    fn visit_array(&mut self, elements: &[Expr]) -> Result<Self::Item, RuntimeError>;
    fn visit_hash(&mut self, pairs: &[(Expr, Expr)]) -> Result<Self::Item, RuntimeError>;
    fn visit_prefix(&mut self, operator: &Token, right: &Expr)
        -> Result<Self::Item, RuntimeError>;
    fn visit_infix(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Self::Item, RuntimeError>;
    fn visit_index(
        &mut self,
        collection: &Expr,
        bracket: &Token,
        index: &Expr,
    ) -> Result<Self::Item, RuntimeError>;
    fn visit_call(
        &mut self,
        callee: &Expr,
        paren: &Token,
        args: &[Expr],
    ) -> Result<Self::Item, RuntimeError>;
    fn visit_function(
        &mut self,
        literal: &Rc<FunctionLiteral>,
    ) -> Result<Self::Item, RuntimeError>;
}

pub(crate) trait StmtVisitor {
    type Item;

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Self::Item, RuntimeError> {
        match stmt {
            Stmt::Var { name, init } => self.visit_var(name, init),
            Stmt::Expression { expression } => self.visit_expression(expression),
            Stmt::Block { statements } => self.visit_block(statements),
            Stmt::Return { keyword, value } => self.visit_return(keyword, value.as_ref()),
        }
    }

    fn visit_var(&mut self, name: &Token, init: &Expr) -> Result<Self::Item, RuntimeError>;
    fn visit_expression(&mut self, expression: &Expr) -> Result<Self::Item, RuntimeError>;
    fn visit_block(&mut self, statements: &[Stmt]) -> Result<Self::Item, RuntimeError>;
    fn visit_return(
        &mut self,
        keyword: &Token,
        value: Option<&Expr>,
    ) -> Result<Self::Item, RuntimeError>;
}

// Creator methods, mostly used by the parser tests to spell out expected trees.
impl Expr {
    pub(crate) fn identifier(name: Token) -> Self {
        Expr::Identifier { name }
    }

    pub(crate) fn infix(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn prefix(operator: Token, right: Expr) -> Self {
        Expr::Prefix {
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn index(collection: Expr, bracket: Token, index: Expr) -> Self {
        Expr::Index {
            collection: Box::new(collection),
            bracket,
            index: Box::new(index),
        }
    }

    pub(crate) fn call(callee: Expr, paren: Token, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            paren,
            args,
        }
    }

    pub(crate) fn function(name: Option<Token>, params: Vec<Token>, body: Vec<Stmt>) -> Self {
        Expr::Function(Rc::new(FunctionLiteral { name, params, body }))
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.statements, "; ")
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Var { name, init } => write!(f, "var {} = {}", name.lexeme, init),
            Stmt::Expression { expression } => write!(f, "{}", expression),
            Stmt::Block { statements } => write_block(f, statements),
            Stmt::Return { value: None, .. } => write!(f, "return"),
            Stmt::Return {
                value: Some(value), ..
            } => write!(f, "return {}", value),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier { name } => write!(f, "{}", name.lexeme),
            Expr::Number { value } => write!(f, "{}", value),
            Expr::Str { value } => write!(f, "\"{}\"", value),
            Expr::Boolean { value } => write!(f, "{}", value),
            Expr::Null => write!(f, "null"),
            Expr::Array { elements } => {
                write!(f, "[")?;
                write_joined(f, elements, ", ")?;
                write!(f, "]")
            }
            Expr::Hash { pairs } => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Expr::Prefix { operator, right } => write!(f, "({}{})", operator.lexeme, right),
            Expr::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator.lexeme, right),
            Expr::Index {
                collection, index, ..
            } => write!(f, "({}[{}])", collection, index),
            Expr::Call { callee, args, .. } => {
                write!(f, "{}(", callee)?;
                write_joined(f, args, ", ")?;
                write!(f, ")")
            }
            Expr::Function(literal) => write!(f, "{}", literal),
        }
    }
}

impl Display for FunctionLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "fn {}(", name)?,
            None => write!(f, "fn(")?,
        }
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.lexeme)?;
        }
        write!(f, ") ")?;
        write_block(f, &self.body)
    }
}

fn write_block(f: &mut Formatter<'_>, statements: &[Stmt]) -> fmt::Result {
    if statements.is_empty() {
        return write!(f, "{{}}");
    }
    write!(f, "{{ ")?;
    write_joined(f, statements, "; ")?;
    write!(f, " }}")
}

fn write_joined<T: Display>(f: &mut Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
