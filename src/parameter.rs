//! Open configuration values.
//!
//! Every configuration object carries a handful of typed, well-known fields
//! plus an open attribute dictionary. The dictionary holds [`Parameter`]
//! values, which serialize as plain YAML/JSON scalars, sequences and maps so
//! the native runner sees the same shape it would get from a script.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Insertion-ordered attribute dictionary
pub type Parameters = IndexMap<String, Parameter>;

/// A single configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Parameter>),
    Table(Parameters),
}

impl Parameter {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Parameter::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Parameter::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers are widened so callers don't have to care how a number was written
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Parameter::Float(x) => Some(*x),
            Parameter::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Parameter::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Parameter]> {
        match self {
            Parameter::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Parameters> {
        match self {
            Parameter::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Recursively copy this value, dropping every table entry whose key is
    /// listed in `skip`. Lists recurse element-wise, scalars are returned as-is.
    pub fn extract(&self, skip: &[&str]) -> Parameter {
        match self {
            Parameter::List(items) => {
                Parameter::List(items.iter().map(|p| p.extract(skip)).collect())
            }
            Parameter::Table(table) => Parameter::Table(
                table
                    .iter()
                    .filter(|(k, _)| !skip.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.extract(skip)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            Parameter::Bool(b) => write!(f, "{}", b),
            Parameter::Int(i) => write!(f, "{}", i),
            Parameter::Float(x) => write!(f, "{:?}", x),
            Parameter::String(s) if nested => write!(f, "'{}'", s),
            Parameter::String(s) => write!(f, "{}", s),
            Parameter::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.render(f, true)?;
                }
                write!(f, "]")
            }
            Parameter::Table(table) => {
                write!(f, "{{")?;
                for (i, (k, v)) in table.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}': ", k)?;
                    v.render(f, true)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, false)
    }
}

impl From<bool> for Parameter {
    fn from(value: bool) -> Self {
        Parameter::Bool(value)
    }
}

impl From<i64> for Parameter {
    fn from(value: i64) -> Self {
        Parameter::Int(value)
    }
}

impl From<i32> for Parameter {
    fn from(value: i32) -> Self {
        Parameter::Int(value.into())
    }
}

impl From<u32> for Parameter {
    fn from(value: u32) -> Self {
        Parameter::Int(value.into())
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Float(value)
    }
}

impl From<&str> for Parameter {
    fn from(value: &str) -> Self {
        Parameter::String(value.to_string())
    }
}

impl From<String> for Parameter {
    fn from(value: String) -> Self {
        Parameter::String(value)
    }
}

impl<T: Into<Parameter>> From<Vec<T>> for Parameter {
    fn from(value: Vec<T>) -> Self {
        Parameter::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<Parameters> for Parameter {
    fn from(value: Parameters) -> Self {
        Parameter::Table(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_skips_keys_at_every_level() {
        let mut inner = Parameters::new();
        inner.insert("keep".to_string(), 1.into());
        inner.insert("histograms".to_string(), Parameter::List(vec![]));

        let mut outer = Parameters::new();
        outer.insert("libraries".to_string(), vec!["libA.so"].into());
        outer.insert("sequence".to_string(), Parameter::List(vec![inner.into()]));

        let dumped = Parameter::Table(outer).extract(&["histograms", "libraries"]);
        let table = dumped.as_table().unwrap();
        assert!(!table.contains_key("libraries"));
        let seq = table["sequence"].as_list().unwrap();
        let first = seq[0].as_table().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first["keep"], Parameter::Int(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Parameter::from("plain").to_string(), "plain");
        assert_eq!(Parameter::from(2.0).to_string(), "2.0");
        assert_eq!(Parameter::from(vec!["a", "b"]).to_string(), "['a', 'b']");
        assert_eq!(Parameter::from(vec![true, false]).to_string(), "[true, false]");
    }

    #[test]
    fn test_untagged_yaml_values() {
        let yaml = r#"
threshold: 1.5
count: 3
name: "ecal"
flags: [true, false]
nested:
  depth: 2
"#;
        let params: Parameters = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(params["threshold"], Parameter::Float(1.5));
        assert_eq!(params["count"], Parameter::Int(3));
        assert_eq!(params["name"].as_str(), Some("ecal"));
        assert_eq!(params["flags"].as_list().unwrap().len(), 2);
        assert_eq!(params["nested"].as_table().unwrap()["depth"], Parameter::Int(2));
        // declaration order survives parsing
        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["threshold", "count", "name", "flags", "nested"]);
    }
}
