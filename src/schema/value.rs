use serde::{Deserialize, Serialize};
use std::fmt;

/// A value exchanged with the script runtime: variable contents and
/// bridge hook arguments/results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Void,
}

impl ScriptValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ScriptValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by conditional script content.
    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Bool(b) => *b,
            ScriptValue::Int(i) => *i != 0,
            ScriptValue::Float(f) => *f != 0.0,
            ScriptValue::Str(s) => !s.is_empty(),
            ScriptValue::Void => false,
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Bool(b) => write!(f, "{}", b),
            ScriptValue::Int(i) => write!(f, "{}", i),
            ScriptValue::Float(v) => write!(f, "{}", v),
            ScriptValue::Str(s) => write!(f, "{}", s),
            ScriptValue::Void => Ok(()),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<i64> for ScriptValue {
    fn from(i: i64) -> Self {
        ScriptValue::Int(i)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::Str(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(ScriptValue::Bool(true).is_truthy());
        assert!(!ScriptValue::Int(0).is_truthy());
        assert!(ScriptValue::Str("x".to_string()).is_truthy());
        assert!(!ScriptValue::Void.is_truthy());
    }

    #[test]
    fn accessors_reject_other_variants() {
        assert_eq!(ScriptValue::Int(3).as_int(), Some(3));
        assert_eq!(ScriptValue::Int(3).as_str(), None);
        assert_eq!(ScriptValue::from("key01").as_str(), Some("key01"));
    }

    #[test]
    fn parses_from_ron() {
        let v: Vec<ScriptValue> = ron::from_str(r#"[Bool(true), Int(2), Str("coin")]"#).unwrap();
        assert_eq!(v[1], ScriptValue::Int(2));
    }
}
