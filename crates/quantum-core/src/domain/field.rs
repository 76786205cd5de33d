use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A normalized record value that a vendor may not have supplied.
///
/// Serializes as the bare value or `null`; displays as `N/A` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field<T> {
    Value(T),
    Unavailable,
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unavailable
    }
}

impl<T> Field<T> {
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unavailable => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unavailable => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Value(value) => Field::Value(f(value)),
            Self::Unavailable => Field::Unavailable,
        }
    }

    pub fn unwrap_or(self, fallback: T) -> T {
        self.into_option().unwrap_or(fallback)
    }

    /// Render with a custom formatter, falling back to `N/A`.
    pub fn render(&self, f: impl FnOnce(&T) -> String) -> String {
        self.value().map_or_else(|| String::from("N/A"), f)
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unavailable, Self::Value)
    }
}

impl<T: Display> Display for Field<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => value.fmt(f),
            Self::Unavailable => f.write_str("N/A"),
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.value().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_renders_as_na() {
        let field: Field<f64> = Field::Unavailable;
        assert_eq!(field.to_string(), "N/A");
        assert_eq!(Field::Value(12.5).to_string(), "12.5");
    }

    #[test]
    fn serializes_as_value_or_null() {
        let present = serde_json::to_string(&Field::Value("Apple Inc.")).expect("serialize");
        let absent = serde_json::to_string(&Field::<String>::Unavailable).expect("serialize");
        assert_eq!(present, "\"Apple Inc.\"");
        assert_eq!(absent, "null");
    }

    #[test]
    fn deserializes_null_as_unavailable() {
        let parsed: Field<f64> = serde_json::from_str("null").expect("deserialize");
        assert_eq!(parsed, Field::Unavailable);
    }
}
