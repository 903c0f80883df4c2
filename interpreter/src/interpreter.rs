use std::cell::RefCell;
use std::io::Write;
use std::mem;
use std::rc::Rc;

use jslite_core::{Token, Type};
use tracing::error;

use crate::ast::{Expr, ExprVisitor, FunctionLiteral, Program, Stmt, StmtVisitor};
use crate::builtins::Builtins;
use crate::callable::{Callable, Function};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::hash::HashObject;
use crate::limits::INTERP_MAX_CALL_DEPTH;
use crate::object::{Object, ObjectType};

type EvalResult = Result<Object, RuntimeError>;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    env: Rc<RefCell<Environment>>,
    builtins: Builtins,
    depth: usize,
}

impl Interpreter {
    pub fn new(stdout: Rc<RefCell<dyn Write>>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        Interpreter {
            env: Rc::clone(&globals),
            globals,
            builtins: Builtins::new(stdout),
            depth: 0,
        }
    }

    /// The top-level scope. Bindings made by `interpret` stay here across calls.
    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        Rc::clone(&self.globals)
    }

    /// Runs every statement and returns the value of the last one executed. A failing statement
    /// is logged and becomes `Object::Error`, then execution continues with the next one. A
    /// top-level `return` stops the program with its value.
    pub fn interpret(&mut self, program: &Program) -> Object {
        let mut last = Object::Null;
        for stmt in &program.statements {
            match self.visit_stmt(stmt) {
                Ok(Object::ReturnValue(value)) => return *value,
                Ok(value) => last = value,
                Err(err) => {
                    error!(%err, statement = %stmt, "runtime error");
                    last = Object::Error(err);
                }
            }
        }
        last
    }

    pub(crate) fn execute_block_with_env(
        &mut self,
        stmts: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> EvalResult {
        let current = mem::replace(&mut self.env, env);
        let res = self.execute_statements(stmts);
        self.env = current;
        res
    }

    // Stops at the first `ReturnValue` and hands it up still wrapped
    fn execute_statements(&mut self, stmts: &[Stmt]) -> EvalResult {
        let mut result = Object::Null;
        for stmt in stmts {
            result = self.visit_stmt(stmt)?;
            if let Object::ReturnValue(_) = result {
                break;
            }
        }
        Ok(result)
    }

    fn call(&mut self, callable: Rc<dyn Callable>, args: &[Object]) -> EvalResult {
        if callable.arity() != args.len() {
            return Err(RuntimeError::WrongArgumentCount {
                name: String::from(callable.name()),
                expected: callable.arity(),
                got: args.len(),
            });
        }
        if self.depth >= INTERP_MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepthExceeded(INTERP_MAX_CALL_DEPTH));
        }

        self.depth += 1;
        let res = callable.execute(self, args);
        self.depth -= 1;
        res
    }

    // `target = value`, where target is a name, an index expression or a member access
    fn assign(&mut self, target: &Expr, value: &Expr) -> EvalResult {
        match target {
            Expr::Identifier { name } => {
                let value = self.visit_expr(value)?;
                self.env
                    .borrow_mut()
                    .assign(&name.lexeme, value.clone())
                    .map_err(|_| RuntimeError::IdentifierNotFound(name.lexeme.clone()))?;
                Ok(value)
            }
            Expr::Index {
                collection, index, ..
            } => {
                let collection = self.visit_expr(collection)?;
                let index = self.visit_expr(index)?;
                let value = self.visit_expr(value)?;
                store(&collection, index, value.clone())?;
                Ok(value)
            }
            Expr::Infix {
                left,
                operator,
                right,
            } if operator.ty == Type::Dot => {
                let collection = self.visit_expr(left)?;
                let key = member_key(right)?;
                let value = self.visit_expr(value)?;
                match &collection {
                    Object::Hash(hash) => hash.borrow_mut().insert(key, value.clone())?,
                    other => return Err(RuntimeError::MemberNotSupported(other.ty())),
                }
                Ok(value)
            }
            other => Err(RuntimeError::InvalidAssignmentTarget(other.to_string())),
        }
    }

    // `collection.name` reads the entry keyed by the string "name"
    fn member(&mut self, collection: &Expr, name: &Expr) -> EvalResult {
        let collection = self.visit_expr(collection)?;
        let key = member_key(name)?;
        match &collection {
            Object::Hash(hash) => {
                let value = hash.borrow().get(&key)?.cloned();
                Ok(value.unwrap_or(Object::Null))
            }
            other => Err(RuntimeError::MemberNotSupported(other.ty())),
        }
    }
}

fn binary(operator: &Token, left: Object, right: Object) -> EvalResult {
    match (&left, &right) {
        // Any operator joins two strings
        (Object::Str(left), Object::Str(right)) => {
            Ok(Object::from(format!("{}{}", left, right)))
        }
        (Object::Number(left), Object::Number(right)) => {
            arithmetic(operator, *left, *right)
        }
        _ if left.ty() != right.ty() => Err(RuntimeError::TypeMismatch {
            left: left.ty(),
            operator: operator.lexeme.clone(),
            right: right.ty(),
        }),
        _ => Err(RuntimeError::UnknownOperator {
            left: left.ty(),
            operator: operator.lexeme.clone(),
            right: right.ty(),
        }),
    }
}

fn arithmetic(operator: &Token, left: i64, right: i64) -> EvalResult {
    let value = match operator.ty {
        Type::Plus => left.wrapping_add(right),
        Type::Minus => left.wrapping_sub(right),
        Type::Star => left.wrapping_mul(right),
        Type::Slash if right == 0 => return Err(RuntimeError::DivisionByZero),
        Type::Slash => left.wrapping_div(right),
        _ => {
            return Err(RuntimeError::UnknownOperator {
                left: ObjectType::Number,
                operator: operator.lexeme.clone(),
                right: ObjectType::Number,
            })
        }
    };
    Ok(Object::Number(value))
}

fn member_key(name: &Expr) -> EvalResult {
    match name {
        Expr::Identifier { name } => Ok(Object::from(name.lexeme.as_str())),
        other => Err(RuntimeError::InvalidMember(other.to_string())),
    }
}

fn store(collection: &Object, index: Object, value: Object) -> Result<(), RuntimeError> {
    match (collection, &index) {
        (Object::Array(elements), Object::Number(i)) => {
            let mut elements = elements.borrow_mut();
            let len = elements.len();
            match usize::try_from(*i).ok().and_then(|i| elements.get_mut(i)) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(RuntimeError::IndexOutOfRange { index: *i, len }),
            }
        }
        (Object::Hash(hash), _) => hash.borrow_mut().insert(index.clone(), value),
        _ => Err(RuntimeError::IndexNotSupported {
            collection: collection.ty(),
            index: index.ty(),
        }),
    }
}

impl ExprVisitor for Interpreter {
    type Item = Object;

    fn visit_identifier(&mut self, name: &Token) -> EvalResult {
        if let Some(val) = self.env.borrow().get(&name.lexeme) {
            return Ok(val);
        }
        self.builtins
            .get(&name.lexeme)
            .ok_or_else(|| RuntimeError::IdentifierNotFound(name.lexeme.clone()))
    }

    fn visit_number(&mut self, value: i64) -> EvalResult {
        Ok(Object::Number(value))
    }

    fn visit_string(&mut self, value: &str) -> EvalResult {
        Ok(Object::from(value))
    }

    fn visit_boolean(&mut self, value: bool) -> EvalResult {
        Ok(Object::Boolean(value))
    }

    fn visit_null(&mut self) -> EvalResult {
        Ok(Object::Null)
    }

    fn visit_array(&mut self, elements: &[Expr]) -> EvalResult {
        let mut evaluated = Vec::with_capacity(elements.len());
        for element in elements {
            evaluated.push(self.visit_expr(element)?);
        }
        Ok(Object::array(evaluated))
    }

    fn visit_hash(&mut self, pairs: &[(Expr, Expr)]) -> EvalResult {
        let mut hash = HashObject::new();
        for (key, value) in pairs {
            let key = self.visit_expr(key)?;
            key.hash_key()?;
            let value = self.visit_expr(value)?;
            hash.insert(key, value)?;
        }
        Ok(Object::hash(hash))
    }

    fn visit_prefix(&mut self, operator: &Token, right: &Expr) -> EvalResult {
        match (operator.ty, self.visit_expr(right)?) {
            (Type::Minus, Object::Number(val)) => Ok(Object::Number(val.wrapping_neg())),
            (_, other) => Err(RuntimeError::UnknownPrefixOperator {
                operator: operator.lexeme.clone(),
                operand: other.ty(),
            }),
        }
    }

    fn visit_infix(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult {
        match operator.ty {
            Type::Equal => self.assign(left, right),
            Type::Dot => self.member(left, right),
            _ => {
                let left = self.visit_expr(left)?;
                let right = self.visit_expr(right)?;
                binary(operator, left, right)
            }
        }
    }

    fn visit_index(&mut self, collection: &Expr, _: &Token, index: &Expr) -> EvalResult {
        let collection = self.visit_expr(collection)?;
        let index = self.visit_expr(index)?;

        match (&collection, &index) {
            (Object::Array(elements), Object::Number(i)) => Ok(usize::try_from(*i)
                .ok()
                .and_then(|i| elements.borrow().get(i).cloned())
                .unwrap_or(Object::Null)),
            (Object::Hash(hash), _) => {
                let value = hash.borrow().get(&index)?.cloned();
                Ok(value.unwrap_or(Object::Null))
            }
            _ => Err(RuntimeError::IndexNotSupported {
                collection: collection.ty(),
                index: index.ty(),
            }),
        }
    }

    fn visit_call(&mut self, callee: &Expr, _: &Token, args: &[Expr]) -> EvalResult {
        let callee = self.visit_expr(callee)?;
        let mut evaluated_args = Vec::with_capacity(args.len());
        for arg in args {
            evaluated_args.push(self.visit_expr(arg)?);
        }

        let callable: Rc<dyn Callable> = match callee {
            Object::Function(function) => function,
            Object::Builtin(builtin) => builtin,
            other => return Err(RuntimeError::NotAFunction(other.ty())),
        };
        self.call(callable, &evaluated_args)
    }

    fn visit_function(&mut self, literal: &Rc<FunctionLiteral>) -> EvalResult {
        let function = Object::Function(Rc::new(Function::new(
            Rc::clone(literal),
            Rc::clone(&self.env),
        )));

        if let Some(name) = literal.name() {
            self.env.borrow_mut().define(name, function.clone());
        }
        Ok(function)
    }
}

impl StmtVisitor for Interpreter {
    type Item = Object;

    fn visit_var(&mut self, name: &Token, init: &Expr) -> EvalResult {
        let value = self.visit_expr(init)?;
        self.env.borrow_mut().define(&name.lexeme, value);
        Ok(Object::Null)
    }

    fn visit_expression(&mut self, expression: &Expr) -> EvalResult {
        self.visit_expr(expression)
    }

    // Blocks share the enclosing scope, only calls open a new one
    fn visit_block(&mut self, statements: &[Stmt]) -> EvalResult {
        self.execute_statements(statements)
    }

    fn visit_return(&mut self, _: &Token, value: Option<&Expr>) -> EvalResult {
        let value = match value {
            Some(value) => self.visit_expr(value)?,
            None => Object::Null,
        };
        Ok(Object::ReturnValue(Box::new(value)))
    }
}
