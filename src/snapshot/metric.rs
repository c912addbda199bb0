//! Tri-state metric values
//!
//! A collector either produced a value or could not. `Unavailable` is its own
//! state and never stands in for zero or `false`; rules must match on it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A collected value, or an explicit marker that it could not be collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric<T> {
    /// The collector produced a value
    Available(T),
    /// The collector could not produce a value
    Unavailable,
}

impl<T> Metric<T> {
    /// Returns true if a value was collected
    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available(_))
    }

    /// Returns true if the value could not be collected
    pub fn is_unavailable(&self) -> bool {
        !self.is_available()
    }

    /// Borrow the inner value
    pub fn as_ref(&self) -> Metric<&T> {
        match self {
            Metric::Available(v) => Metric::Available(v),
            Metric::Unavailable => Metric::Unavailable,
        }
    }

    /// Get the value if available
    pub fn get(&self) -> Option<&T> {
        match self {
            Metric::Available(v) => Some(v),
            Metric::Unavailable => None,
        }
    }

    /// Convert into an `Option`
    pub fn into_option(self) -> Option<T> {
        match self {
            Metric::Available(v) => Some(v),
            Metric::Unavailable => None,
        }
    }

    /// Map the available value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Metric<U> {
        match self {
            Metric::Available(v) => Metric::Available(f(v)),
            Metric::Unavailable => Metric::Unavailable,
        }
    }

    /// Use `other` when this metric is unavailable
    pub fn or(self, other: Metric<T>) -> Metric<T> {
        match self {
            Metric::Available(_) => self,
            Metric::Unavailable => other,
        }
    }
}

impl<T: Copy> Metric<T> {
    /// Copy the value out if available
    pub fn value(&self) -> Option<T> {
        match self {
            Metric::Available(v) => Some(*v),
            Metric::Unavailable => None,
        }
    }
}

impl<T: fmt::Display> Metric<T> {
    /// Display the value, or `placeholder` when unavailable
    pub fn display_or(&self, placeholder: &str) -> String {
        match self {
            Metric::Available(v) => v.to_string(),
            Metric::Unavailable => placeholder.to_string(),
        }
    }
}

impl<T> Default for Metric<T> {
    fn default() -> Self {
        Metric::Unavailable
    }
}

impl<T> From<Option<T>> for Metric<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Metric::Available(v),
            None => Metric::Unavailable,
        }
    }
}

// Serialized as the bare value, or `null` when unavailable.
impl<T: Serialize> Serialize for Metric<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Available(v) => serializer.serialize_some(v),
            Metric::Unavailable => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Metric<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Metric::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_not_zero() {
        let zero: Metric<u32> = Metric::Available(0);
        let missing: Metric<u32> = Metric::Unavailable;
        assert_ne!(zero, missing);
        assert_eq!(zero.value(), Some(0));
        assert_eq!(missing.value(), None);
    }

    #[test]
    fn test_json_null_is_unavailable() {
        let parsed: Metric<bool> = serde_json::from_str("null").unwrap();
        assert!(parsed.is_unavailable());

        let parsed: Metric<bool> = serde_json::from_str("false").unwrap();
        assert_eq!(parsed, Metric::Available(false));
    }

    #[test]
    fn test_serializes_as_bare_value() {
        assert_eq!(serde_json::to_string(&Metric::Available(8u32)).unwrap(), "8");
        assert_eq!(serde_json::to_string(&Metric::<u32>::Unavailable).unwrap(), "null");
    }

    #[test]
    fn test_or_fallback() {
        let primary: Metric<u32> = Metric::Unavailable;
        assert_eq!(primary.or(Metric::Available(4)), Metric::Available(4));
        assert_eq!(Metric::Available(2).or(Metric::Available(4)), Metric::Available(2));
    }
}
