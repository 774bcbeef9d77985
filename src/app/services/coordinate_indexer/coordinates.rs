//! Distinct coordinate values with O(1) lookup

use crate::app::models::Value;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Hashable identity of a coordinate value.
///
/// Text compares exactly. Numbers compare by exact value: `-0.0` and `0.0`
/// are the same coordinate and all NaNs are one coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoordinateKey {
    Text(String),
    Number(u64),
    Instant(NaiveDateTime),
}

impl CoordinateKey {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Text(text) => Self::Text(text.clone()),
            Value::Number(number) => Self::Number(canonical_bits(*number)),
            Value::DateTime(timestamp) => Self::Instant(*timestamp),
        }
    }
}

fn canonical_bits(number: f64) -> u64 {
    if number.is_nan() {
        f64::NAN.to_bits()
    } else if number == 0.0 {
        0.0f64.to_bits()
    } else {
        number.to_bits()
    }
}

/// Ordered set of one dimension's values; position is the coordinate index
#[derive(Debug, Clone, Default)]
pub struct CoordinateSet {
    values: Vec<Value>,
    index: HashMap<CoordinateKey, usize>,
}

impl CoordinateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `value`, appending it if it has not been seen
    pub fn insert(&mut self, value: Value) -> usize {
        let key = CoordinateKey::of(&value);
        if let Some(&position) = self.index.get(&key) {
            return position;
        }

        let position = self.values.len();
        self.index.insert(key, position);
        self.values.push(value);
        position
    }

    /// Index of an already discovered value
    pub fn position(&self, value: &Value) -> Option<usize> {
        self.index.get(&CoordinateKey::of(value)).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order() {
        let mut set = CoordinateSet::new();
        assert_eq!(set.insert(Value::Number(30.0)), 0);
        assert_eq!(set.insert(Value::Number(10.0)), 1);
        assert_eq!(set.insert(Value::Number(30.0)), 0);
        assert_eq!(set.len(), 2);
        assert_eq!(set.values(), &[Value::Number(30.0), Value::Number(10.0)]);
    }

    #[test]
    fn test_nan_and_signed_zero_identity() {
        let mut set = CoordinateSet::new();
        set.insert(Value::Number(f64::NAN));
        set.insert(Value::Number(0.0));

        assert_eq!(set.position(&Value::Number(-f64::NAN)), Some(0));
        assert_eq!(set.position(&Value::Number(-0.0)), Some(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_text_is_exact() {
        let mut set = CoordinateSet::new();
        set.insert(Value::Text("Layer1".to_string()));
        assert_eq!(set.position(&Value::Text("layer1".to_string())), None);
        assert_eq!(set.position(&Value::Text("Layer1".to_string())), Some(0));
    }
}
