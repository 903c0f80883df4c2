use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::LookupError;
use crate::object::{Object, ObjectType};

/// One scope frame. Frames form a chain through `enclosing`; a function object shares the frame
/// it was defined in, which keeps that frame alive for as long as the function is reachable.
#[derive(Debug, Default)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: AHashMap<String, Object>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct UndefinedVariable;

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn with(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            enclosing: Some(enclosing),
            values: AHashMap::new(),
        }
    }

    /// Binds in this frame only. An existing local binding is overwritten, an outer one is
    /// shadowed.
    pub fn define(&mut self, key: &str, value: Object) {
        self.values.insert(String::from(key), value);
    }

    pub fn get(&self, key: &str) -> Option<Object> {
        if let Some(val) = self.values.get(key) {
            Some(val.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.as_ref().borrow().get(key)
        } else {
            None
        }
    }

    pub(crate) fn assign(&mut self, key: &str, value: Object) -> Result<(), UndefinedVariable> {
        if let Some(val) = self.values.get_mut(key) {
            *val = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.as_ref().borrow_mut().assign(key, value)
        } else {
            Err(UndefinedVariable)
        }
    }

    /// Bindings of this frame, sorted by name. Enclosing frames are not included.
    pub fn bindings(&self) -> Vec<(String, Object)> {
        let mut bindings: Vec<_> = self
            .values
            .iter()
            .map(|(name, val)| (name.clone(), val.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    pub fn get_typed(&self, key: &str, expected: ObjectType) -> Result<Object, LookupError> {
        let val = self
            .get(key)
            .ok_or_else(|| LookupError::Undefined(String::from(key)))?;
        if val.ty() == expected {
            Ok(val)
        } else {
            Err(LookupError::WrongType {
                name: String::from(key),
                expected,
                found: val.ty(),
            })
        }
    }

    pub fn get_number(&self, key: &str) -> Result<i64, LookupError> {
        match self.get_typed(key, ObjectType::Number)? {
            Object::Number(val) => Ok(val),
            other => Err(self.wrong_type(key, ObjectType::Number, &other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, LookupError> {
        match self.get_typed(key, ObjectType::Boolean)? {
            Object::Boolean(val) => Ok(val),
            other => Err(self.wrong_type(key, ObjectType::Boolean, &other)),
        }
    }

    pub fn get_string(&self, key: &str) -> Result<String, LookupError> {
        match self.get_typed(key, ObjectType::String)? {
            Object::Str(val) => Ok(String::from(val.as_str())),
            other => Err(self.wrong_type(key, ObjectType::String, &other)),
        }
    }

    fn wrong_type(&self, key: &str, expected: ObjectType, found: &Object) -> LookupError {
        LookupError::WrongType {
            name: String::from(key),
            expected,
            found: found.ty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::env::{Environment, UndefinedVariable};
    use crate::error::LookupError;
    use crate::object::{Object, ObjectType};

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("foo", Object::from("bar"));
        env.define("baz", Object::from(false));

        assert_eq!(env.get("foo"), Some(Object::from("bar")));
        assert_eq!(env.get("baz"), Some(Object::from(false)));

        env.define("foo", Object::from(1));
        assert_eq!(env.get("foo"), Some(Object::from(1)));
    }

    #[test]
    fn test_assign_undefined() {
        let mut env = Environment::new();
        assert_eq!(Err(UndefinedVariable), env.assign("foo", Object::from("bar")));
        assert_eq!(None, env.get("foo"));
    }

    #[test]
    fn test_multi_level() {
        let env1 = Rc::new(RefCell::new(Environment::new()));
        env1.borrow_mut().define("foo", Object::from("bar"));
        env1.borrow_mut().define("qux", Object::from(1));

        {
            let mut env2 = Environment::with(env1.clone());
            env2.define("foo", Object::from("foofoo"));
            assert_eq!(env2.get("foo"), Some(Object::from("foofoo")));
            assert_eq!(env2.get("qux"), Some(Object::from(1)));
            env2.assign("qux", Object::from(false)).unwrap();
        }

        assert_eq!(env1.borrow().get("foo"), Some(Object::from("bar")));
        assert_eq!(env1.borrow().get("qux"), Some(Object::from(false)));
    }

    #[test]
    fn test_bindings_sorted() {
        let mut env = Environment::new();
        env.define("z", Object::from(3));
        env.define("a", Object::from(1));
        env.define("m", Object::from(2));

        let names: Vec<_> = env.bindings().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_typed_accessors() {
        let mut env = Environment::new();
        env.define("n", Object::from(150));
        env.define("b", Object::from(true));
        env.define("s", Object::from("hi"));

        assert_eq!(env.get_number("n"), Ok(150));
        assert_eq!(env.get_bool("b"), Ok(true));
        assert_eq!(env.get_string("s"), Ok(String::from("hi")));
        assert_eq!(
            env.get_number("s"),
            Err(LookupError::WrongType {
                name: String::from("s"),
                expected: ObjectType::Number,
                found: ObjectType::String,
            })
        );
        assert_eq!(
            env.get_typed("missing", ObjectType::Null),
            Err(LookupError::Undefined(String::from("missing")))
        );
    }
}
