use serde::{Deserialize, Deserializer};

/// A single field of a partial update
///
/// A field that is absent from the payload, or explicitly `null`, is `Unset` and
/// leaves the stored value alone. Any other value, including an empty string, is
/// `Set` and overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Unset,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unset
    }
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Patch::Set(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Set(value) => Some(value),
            Patch::Unset => None,
        }
    }

    /// Keeps the value only when it satisfies `predicate`
    pub fn filter(self, predicate: impl FnOnce(&T) -> bool) -> Self {
        match self {
            Patch::Set(value) if predicate(&value) => Patch::Set(value),
            _ => Patch::Unset,
        }
    }

    /// Overwrites `target` when the field was provided
    pub fn apply_to(self, target: &mut T) {
        if let Patch::Set(value) = self {
            *target = value;
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Patch::Unset, Patch::Set)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}
