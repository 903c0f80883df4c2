use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use ahash::AHashMap;

use crate::error::RuntimeError;
use crate::object::{Object, ObjectType};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Exact identity of a hashable object: its kind plus a 64-bit value. Numbers and booleans use
/// their own bits so distinct values never share a key; strings use FNV-1a.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub ty: ObjectType,
    pub value: u64,
}

pub trait Hashable {
    fn hash_key(&self) -> HashKey;
}

impl Hashable for i64 {
    fn hash_key(&self) -> HashKey {
        HashKey {
            ty: ObjectType::Number,
            value: *self as u64,
        }
    }
}

impl Hashable for bool {
    fn hash_key(&self) -> HashKey {
        HashKey {
            ty: ObjectType::Boolean,
            value: u64::from(*self),
        }
    }
}

impl Hashable for str {
    fn hash_key(&self) -> HashKey {
        HashKey {
            ty: ObjectType::String,
            value: fnv1a(self.as_bytes()),
        }
    }
}

pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

// Index entry that hashes by the precomputed key but compares the key objects too, so two
// strings whose FNV digests collide still land in separate slots.
#[derive(Debug, Clone)]
struct Slot {
    key: HashKey,
    object: Object,
}

impl Hash for Slot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.object == other.object
    }
}

impl Eq for Slot {}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

/// Runtime hash. Pairs iterate in insertion order; overwriting a key keeps its position.
#[derive(Debug, Clone, Default)]
pub struct HashObject {
    pairs: Vec<HashPair>,
    index: AHashMap<Slot, usize>,
}

impl HashObject {
    pub fn new() -> Self {
        HashObject::default()
    }

    pub fn insert(&mut self, key: Object, value: Object) -> Result<(), RuntimeError> {
        let slot = Slot {
            key: key.hash_key()?,
            object: key.clone(),
        };

        match self.index.get(&slot) {
            Some(&pos) => self.pairs[pos].value = value,
            None => {
                self.index.insert(slot, self.pairs.len());
                self.pairs.push(HashPair { key, value });
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &Object) -> Result<Option<&Object>, RuntimeError> {
        let slot = Slot {
            key: key.hash_key()?,
            object: key.clone(),
        };
        Ok(self.index.get(&slot).map(|&pos| &self.pairs[pos].value))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HashPair> {
        self.pairs.iter()
    }
}

// Equal when both hold the same key/value pairs, regardless of insertion order.
impl PartialEq for HashObject {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.pairs.iter().all(|pair| {
                matches!(other.get(&pair.key), Ok(Some(value)) if *value == pair.value)
            })
    }
}

impl Display for HashObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, pair) in self.pairs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", pair.key, pair.value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use crate::error::RuntimeError;
    use crate::hash::{fnv1a, HashObject, Hashable};
    use crate::object::{Object, ObjectType};

    #[test]
    fn test_fnv1a() {
        assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_keys_are_exact() {
        assert_eq!(Object::from("name").hash_key(), Object::from("name").hash_key());
        assert_ne!(Object::from("name").hash_key(), Object::from("eman").hash_key());
        assert_ne!(1i64.hash_key(), 2i64.hash_key());
        assert_ne!(1i64.hash_key(), true.hash_key());
        assert_eq!(false.hash_key().value, 0);
        assert_eq!(true.hash_key().value, 1);
        assert_eq!((-1i64).hash_key().value, u64::MAX);
        assert_eq!("x".hash_key().ty, ObjectType::String);
    }

    #[test]
    fn test_insert_and_get() {
        let mut hash = HashObject::new();
        hash.insert(Object::from("k"), Object::from(1)).unwrap();
        hash.insert(Object::from(1), Object::from("one")).unwrap();
        hash.insert(Object::from(true), Object::Null).unwrap();

        assert_eq!(hash.len(), 3);
        assert_eq!(hash.get(&Object::from("k")).unwrap(), Some(&Object::from(1)));
        assert_eq!(hash.get(&Object::from(1)).unwrap(), Some(&Object::from("one")));
        assert_eq!(hash.get(&Object::from(true)).unwrap(), Some(&Object::Null));
        assert_eq!(hash.get(&Object::from("missing")).unwrap(), None);
        assert_eq!(hash.get(&Object::from(false)).unwrap(), None);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut hash = HashObject::new();
        hash.insert(Object::from("a"), Object::from(1)).unwrap();
        hash.insert(Object::from("b"), Object::from(2)).unwrap();
        hash.insert(Object::from("a"), Object::from(3)).unwrap();

        assert_eq!(hash.len(), 2);
        assert_eq!(hash.to_string(), "{a: 3, b: 2}");
    }

    #[test]
    fn test_unusable_key() {
        let mut hash = HashObject::new();
        assert_eq!(
            hash.insert(Object::array(vec![]), Object::from(1)),
            Err(RuntimeError::UnusableHashKey(ObjectType::Array))
        );
        assert!(hash.is_empty());
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut lhs = HashObject::new();
        lhs.insert(Object::from("a"), Object::from(1)).unwrap();
        lhs.insert(Object::from("b"), Object::from(2)).unwrap();

        let mut rhs = HashObject::new();
        rhs.insert(Object::from("b"), Object::from(2)).unwrap();
        rhs.insert(Object::from("a"), Object::from(1)).unwrap();

        assert_eq!(lhs, rhs);
        rhs.insert(Object::from("a"), Object::from(5)).unwrap();
        assert_ne!(lhs, rhs);
    }
}
