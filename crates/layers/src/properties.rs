use std::collections::BTreeMap;

/// Loosely typed property value attached to geometries, features and layers.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric array, or `None` if any element is not a number.
    pub fn as_numbers(&self) -> Option<Vec<f64>> {
        match self {
            PropertyValue::Array(items) => items.iter().map(PropertyValue::as_f64).collect(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Number(f64::from(v))
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(v: Vec<T>) -> Self {
        PropertyValue::Array(v.into_iter().map(Into::into).collect())
    }
}

/// String-keyed property bag with deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: BTreeMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Present and not null.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.values.remove(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropertyValue::as_f64)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Properties, PropertyValue};

    #[test]
    fn typed_accessors_reject_other_kinds() {
        let p = Properties::new()
            .with("height", 12.5)
            .with("mode", "clampToGround")
            .with("curve", vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(p.number("height"), Some(12.5));
        assert_eq!(p.number("mode"), None);
        assert_eq!(p.string("mode"), Some("clampToGround"));
        assert_eq!(
            p.get("curve").and_then(PropertyValue::as_numbers),
            Some(vec![1.0, 2.0, 3.0, 4.0])
        );
    }

    #[test]
    fn null_counts_as_absent() {
        let mut p = Properties::new();
        p.set("x", PropertyValue::Null);
        assert!(!p.has("x"));
        assert!(!p.has("y"));
        p.set("x", true);
        assert!(p.has("x"));
    }

    #[test]
    fn mixed_arrays_are_not_numeric() {
        let v = PropertyValue::Array(vec![PropertyValue::Number(1.0), "a".into()]);
        assert_eq!(v.as_numbers(), None);
    }
}
