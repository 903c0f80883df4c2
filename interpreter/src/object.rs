use std::cell::RefCell;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::thread::LocalKey;

use crate::callable::{Builtin, Function};
use crate::error::RuntimeError;
use crate::hash::{HashKey, HashObject, Hashable};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Hash,
    Function,
    Builtin,
    ReturnValue,
    Error,
}

impl Display for ObjectType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Null => "NULL",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::Number => "NUMBER",
            ObjectType::String => "STRING",
            ObjectType::Array => "ARRAY",
            ObjectType::Hash => "HASH",
            ObjectType::Function => "FUNCTION",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::ReturnValue => "RETURN_VALUE",
            ObjectType::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// A runtime value. Cloning is cheap: strings, containers and callables are reference counted,
/// and arrays and hashes are shared, so a write through one handle is seen through all others.
#[derive(Debug, Clone)]
pub enum Object {
    Null,
    Boolean(bool),
    Number(i64),
    Str(Rc<String>),
    Array(Rc<RefCell<Vec<Object>>>),
    Hash(Rc<RefCell<HashObject>>),
    Function(Rc<Function>),
    Builtin(Rc<Builtin>),
    // Only ever seen inside the interpreter while a `return` unwinds to its call site.
    ReturnValue(Box<Object>),
    Error(RuntimeError),
}

impl Object {
    pub fn ty(&self) -> ObjectType {
        match self {
            Object::Null => ObjectType::Null,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::Number(_) => ObjectType::Number,
            Object::Str(_) => ObjectType::String,
            Object::Array(_) => ObjectType::Array,
            Object::Hash(_) => ObjectType::Hash,
            Object::Function(_) => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::ReturnValue(_) => ObjectType::ReturnValue,
            Object::Error(_) => ObjectType::Error,
        }
    }

    pub fn array(elements: Vec<Object>) -> Self {
        Object::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn hash(hash: HashObject) -> Self {
        Object::Hash(Rc::new(RefCell::new(hash)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// Derives the key this object is stored under in a hash. Only numbers, booleans and
    /// strings are hashable.
    pub fn hash_key(&self) -> Result<HashKey, RuntimeError> {
        match self {
            Object::Number(val) => Ok(val.hash_key()),
            Object::Boolean(val) => Ok(val.hash_key()),
            Object::Str(val) => Ok(val.as_str().hash_key()),
            other => Err(RuntimeError::UnusableHashKey(other.ty())),
        }
    }
}

type Visiting = RefCell<Vec<(usize, usize)>>;

thread_local! {
    static DISPLAYING: Visiting = RefCell::new(Vec::new());
    static COMPARING: Visiting = RefCell::new(Vec::new());
}

// Marks a container (or a pair of containers being compared) as on the current call stack
// until dropped. Arrays and hashes can hold themselves, so re-entry means a cycle.
struct Visit {
    visiting: &'static LocalKey<Visiting>,
    id: (usize, usize),
}

impl Visit {
    fn enter(visiting: &'static LocalKey<Visiting>, id: (usize, usize)) -> Option<Visit> {
        visiting.with(|set| {
            let mut set = set.borrow_mut();
            if set.contains(&id) {
                None
            } else {
                set.push(id);
                Some(Visit { visiting, id })
            }
        })
    }
}

impl Drop for Visit {
    fn drop(&mut self) {
        self.visiting.with(|set| set.borrow_mut().retain(|id| *id != self.id));
    }
}

fn addr<T>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as usize
}

impl PartialEq for Object {
    // A pair already under comparison further up the stack is taken as equal, which makes
    // cyclic containers compare by structure instead of recursing forever.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Boolean(lhs), Object::Boolean(rhs)) => lhs == rhs,
            (Object::Number(lhs), Object::Number(rhs)) => lhs == rhs,
            (Object::Str(lhs), Object::Str(rhs)) => lhs == rhs,
            (Object::Array(lhs), Object::Array(rhs)) => {
                Rc::ptr_eq(lhs, rhs)
                    || match Visit::enter(&COMPARING, (addr(lhs), addr(rhs))) {
                        Some(_visit) => *lhs.borrow() == *rhs.borrow(),
                        None => true,
                    }
            }
            (Object::Hash(lhs), Object::Hash(rhs)) => {
                Rc::ptr_eq(lhs, rhs)
                    || match Visit::enter(&COMPARING, (addr(lhs), addr(rhs))) {
                        Some(_visit) => *lhs.borrow() == *rhs.borrow(),
                        None => true,
                    }
            }
            (Object::Function(lhs), Object::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Object::Builtin(lhs), Object::Builtin(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Object::ReturnValue(lhs), Object::ReturnValue(rhs)) => lhs == rhs,
            (Object::Error(lhs), Object::Error(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Number(value)
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Object::Str(Rc::new(value))
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::Str(Rc::new(String::from(value)))
    }
}

impl From<RuntimeError> for Object {
    fn from(value: RuntimeError) -> Self {
        Object::Error(value)
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => write!(f, "null"),
            Object::Boolean(val) => write!(f, "{}", val),
            Object::Number(val) => write!(f, "{}", val),
            Object::Str(val) => write!(f, "{}", val),
            Object::Array(elements) => match Visit::enter(&DISPLAYING, (addr(elements), 0)) {
                Some(_visit) => {
                    write!(f, "[")?;
                    for (i, element) in elements.borrow().iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", element)?;
                    }
                    write!(f, "]")
                }
                None => write!(f, "[...]"),
            },
            Object::Hash(hash) => match Visit::enter(&DISPLAYING, (addr(hash), 0)) {
                Some(_visit) => write!(f, "{}", hash.borrow()),
                None => write!(f, "{{...}}"),
            },
            Object::Function(function) => write!(f, "{}", function),
            Object::Builtin(_) => write!(f, "builtin function"),
            Object::ReturnValue(val) => write!(f, "{}", val),
            Object::Error(err) => write!(f, "ERROR: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::hash::HashObject;
    use crate::object::{Object, ObjectType};

    #[test]
    fn test_display() {
        let mut hash = HashObject::new();
        hash.insert(Object::from("a"), Object::from(1)).unwrap();
        hash.insert(Object::from(2), Object::from("two")).unwrap();

        let tests = [
            (Object::Null, "null"),
            (Object::from(true), "true"),
            (Object::from(-42), "-42"),
            (Object::from("hello"), "hello"),
            (
                Object::array(vec![Object::from(1), Object::from("x"), Object::Null]),
                "[1, x, null]",
            ),
            (Object::hash(hash), "{a: 1, 2: two}"),
            (Object::ReturnValue(Box::new(Object::from(7))), "7"),
            (
                Object::Error(RuntimeError::DivisionByZero),
                "ERROR: division by zero",
            ),
        ];

        for (object, expected) in tests {
            assert_eq!(object.to_string(), expected);
        }
    }

    #[test]
    fn test_arrays_are_shared() {
        let array = Object::array(vec![Object::from(1)]);
        let alias = array.clone();
        if let Object::Array(elements) = &alias {
            elements.borrow_mut().push(Object::from(2));
        }
        assert_eq!(array.to_string(), "[1, 2]");
    }

    #[test]
    fn test_self_referencing_containers() {
        let array = Object::array(vec![Object::from(1)]);
        if let Object::Array(elements) = &array {
            elements.borrow_mut().push(array.clone());
        }
        assert_eq!(array.to_string(), "[1, [...]]");

        let mut hash = HashObject::new();
        hash.insert(Object::from("n"), Object::from(1)).unwrap();
        let hash = Object::hash(hash);
        if let Object::Hash(inner) = &hash {
            inner
                .borrow_mut()
                .insert(Object::from("me"), hash.clone())
                .unwrap();
        }
        assert_eq!(hash.to_string(), "{n: 1, me: {...}}");

        let other = Object::array(vec![Object::from(1)]);
        if let Object::Array(elements) = &other {
            elements.borrow_mut().push(other.clone());
        }
        assert_eq!(array, other);
        assert_ne!(array, Object::array(vec![Object::from(1), Object::from(2)]));
    }

    #[test]
    fn test_unhashable() {
        assert_eq!(
            Object::array(Vec::new()).hash_key(),
            Err(RuntimeError::UnusableHashKey(ObjectType::Array))
        );
        assert_eq!(
            Object::Null.hash_key(),
            Err(RuntimeError::UnusableHashKey(ObjectType::Null))
        );
    }
}
