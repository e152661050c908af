use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const INTEGER_TYPES: &[&str] = &["int128", "uint256", "int256"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseType {
    pub name: String,
    pub is_literal: bool,
}

impl BaseType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_literal: false,
        }
    }

    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_literal: true,
        }
    }

    pub fn is_integer(&self) -> bool {
        INTEGER_TYPES.contains(&self.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteArrayKind {
    Bytes,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Base(BaseType),
    ByteArray {
        kind: ByteArrayKind,
        maxlen: usize,
        is_literal: bool,
    },
    List {
        subtype: Box<Type>,
        count: usize,
    },
    Struct {
        name: String,
        members: IndexMap<String, Type>,
    },
    Tuple {
        members: Vec<Type>,
    },
    Contract {
        name: String,
    },
}

impl Type {
    pub fn base(name: impl Into<String>) -> Self {
        Type::Base(BaseType::new(name))
    }

    pub fn literal(name: impl Into<String>) -> Self {
        Type::Base(BaseType::literal(name))
    }

    pub fn bytes(maxlen: usize) -> Self {
        Type::ByteArray {
            kind: ByteArrayKind::Bytes,
            maxlen,
            is_literal: false,
        }
    }

    pub fn string(maxlen: usize) -> Self {
        Type::ByteArray {
            kind: ByteArrayKind::String,
            maxlen,
            is_literal: false,
        }
    }

    pub fn list(subtype: Type, count: usize) -> Self {
        Type::List {
            subtype: Box::new(subtype),
            count,
        }
    }

    pub fn as_base(&self) -> Option<&BaseType> {
        match self {
            Type::Base(b) => Some(b),
            _ => None,
        }
    }

    pub fn base_name(&self) -> Option<&str> {
        self.as_base().map(|b| b.name.as_str())
    }

    pub fn is_base(&self, name: &str) -> bool {
        self.base_name() == Some(name)
    }

    pub fn is_literal(&self) -> bool {
        match self {
            Type::Base(b) => b.is_literal,
            Type::ByteArray { is_literal, .. } => *is_literal,
            _ => false,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.as_base().map_or(false, BaseType::is_integer)
    }

    pub fn is_list_like(&self) -> bool {
        matches!(self, Type::List { .. })
    }

    pub fn is_byte_array(&self) -> bool {
        matches!(self, Type::ByteArray { .. })
    }

    pub fn byte_array_maxlen(&self) -> Option<usize> {
        match self {
            Type::ByteArray { maxlen, .. } => Some(*maxlen),
            _ => None,
        }
    }

    /// Byte arrays of the same family (`bytes` vs `string`), regardless of length.
    pub fn eq_base(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::ByteArray { kind: a, .. }, Type::ByteArray { kind: b, .. }) => a == b,
            _ => false,
        }
    }

    /// Structural equality that ignores the literal flag on base types and byte arrays.
    pub fn same_as(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Base(a), Type::Base(b)) => a.name == b.name,
            (
                Type::ByteArray {
                    kind: k1,
                    maxlen: m1,
                    ..
                },
                Type::ByteArray {
                    kind: k2,
                    maxlen: m2,
                    ..
                },
            ) => k1 == k2 && m1 == m2,
            (
                Type::List {
                    subtype: s1,
                    count: c1,
                },
                Type::List {
                    subtype: s2,
                    count: c2,
                },
            ) => c1 == c2 && s1.same_as(s2),
            (Type::Struct { name: n1, members: m1 }, Type::Struct { name: n2, members: m2 }) => {
                n1 == n2
                    && m1.len() == m2.len()
                    && m1
                        .iter()
                        .zip(m2.iter())
                        .all(|((k1, t1), (k2, t2))| k1 == k2 && t1.same_as(t2))
            }
            (Type::Tuple { members: m1 }, Type::Tuple { members: m2 }) => {
                m1.len() == m2.len() && m1.iter().zip(m2).all(|(a, b)| a.same_as(b))
            }
            (Type::Contract { name: a }, Type::Contract { name: b }) => a == b,
            _ => false,
        }
    }

    /// Whether both types are the same kind of type (base, list, struct, ...).
    pub fn same_category(&self, other: &Type) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Size of a value of this type in 32-byte words.
    pub fn size_in_words(&self) -> usize {
        match self {
            Type::Base(_) | Type::Contract { .. } => 1,
            Type::ByteArray { maxlen, .. } => (maxlen + 31) / 32 + 1,
            Type::List { subtype, count } => subtype.size_in_words() * count,
            Type::Struct { members, .. } => members.values().map(Type::size_in_words).sum(),
            Type::Tuple { members } => members.iter().map(Type::size_in_words).sum(),
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size_in_words() * 32
    }

    pub fn with_literal(&self, is_literal: bool) -> Type {
        match self {
            Type::Base(b) => Type::Base(BaseType {
                name: b.name.clone(),
                is_literal,
            }),
            Type::ByteArray { kind, maxlen, .. } => Type::ByteArray {
                kind: *kind,
                maxlen: *maxlen,
                is_literal,
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Base(b) => write!(f, "{}", b.name),
            Type::ByteArray {
                kind: ByteArrayKind::Bytes,
                maxlen,
                ..
            } => write!(f, "bytes[{}]", maxlen),
            Type::ByteArray {
                kind: ByteArrayKind::String,
                maxlen,
                ..
            } => write!(f, "string[{}]", maxlen),
            Type::List { subtype, count } => write!(f, "{}[{}]", subtype, count),
            Type::Struct { name, .. } => write!(f, "struct {}", name),
            Type::Tuple { members } => {
                let inner = members
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({})", inner)
            }
            Type::Contract { name } => write!(f, "contract {}", name),
        }
    }
}
