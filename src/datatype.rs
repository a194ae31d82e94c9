// used for persistence
use rusqlite::types::{FromSqlResult, ToSql, ToSqlOutput, ValueRef};

// used to print out readable forms of a literal
use std::fmt;
// used to indicate that literals need to be hashable
use std::hash::{Hash, Hasher};

use std::cmp::Ordering;

/// The range of a data property, named the way the grounding text names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralType {
    Str,
    Int,
    Float,
}
impl LiteralType {
    pub fn name(&self) -> &'static str {
        match self {
            LiteralType::Str => "string",
            LiteralType::Int => "int",
            LiteralType::Float => "float",
        }
    }
    pub fn from_name(name: &str) -> LiteralType {
        match name {
            "int" => LiteralType::Int,
            "float" => LiteralType::Float,
            _ => LiteralType::Str,
        }
    }
}

/// A literal value appearing as the object of a statement.
///
/// Rendering through `Display` gives the display-safe scalar string that
/// result rows carry, so `to_string()` is the one canonical text form.
#[derive(Debug, Clone)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Literal {
    pub fn literal_type(&self) -> LiteralType {
        match self {
            Literal::Str(_) => LiteralType::Str,
            Literal::Int(_) => LiteralType::Int,
            Literal::Float(_) => LiteralType::Float,
        }
    }
    /// Numeric view used by comparison filters and ordering.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Str(_) => None,
            Literal::Int(i) => Some(*i as f64),
            Literal::Float(f) => Some(*f),
        }
    }
    /// Ordering across the numeric types; strings only order against strings.
    pub fn compare(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Literal::Str(a), Literal::Str(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.as_number()?;
                let b = other.as_number()?;
                a.partial_cmp(&b)
            }
        }
    }
    /// Restore a literal from its persisted (type tag, value) pair.
    pub fn from_sql(tag: &str, value: ValueRef<'_>) -> FromSqlResult<Literal> {
        Ok(match tag {
            "int" => Literal::Int(value.as_i64()?),
            "float" => Literal::Float(value.as_f64()?),
            _ => Literal::Str(String::from(value.as_str()?)),
        })
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Str(a), Literal::Str(b)) => a == b,
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}
impl Eq for Literal {}
impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Literal::Str(s) => s.hash(state),
            Literal::Int(i) => i.hash(state),
            Literal::Float(f) => f.to_bits().hash(state),
        }
    }
}
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "{}", s),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
        }
    }
}
impl ToSql for Literal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Literal::Str(s) => ToSqlOutput::from(s.as_str()),
            Literal::Int(i) => ToSqlOutput::from(*i),
            Literal::Float(f) => ToSqlOutput::from(*f),
        })
    }
}
impl From<&str> for Literal {
    fn from(s: &str) -> Self { Literal::Str(s.to_owned()) }
}
impl From<String> for Literal {
    fn from(s: String) -> Self { Literal::Str(s) }
}
impl From<i64> for Literal {
    fn from(i: i64) -> Self { Literal::Int(i) }
}
impl From<f64> for Literal {
    fn from(f: f64) -> Self { Literal::Float(f) }
}
