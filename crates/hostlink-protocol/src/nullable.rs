//! Lenient field decoding.

use serde::{Deserialize, Deserializer};

/// Decodes an explicit JSON `null` as the type's default, the same as an
/// absent field.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
