//! Typed request and response models for the MythX API.
//!
//! Every model converts to and from a structured `serde_json::Value` and
//! validates itself on both directions. JSON conversion is layered on top of
//! the structured form.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use validator::Validate;

use crate::errors::{MythXError, MythXResult};

pub mod request;
pub mod response;

/// Validates `model` and serializes it into its structured form.
pub(crate) fn to_structured_value<T>(model: &T) -> MythXResult<Value>
where
    T: Serialize + Validate,
{
    model.validate()?;
    serde_json::to_value(model).map_err(|e| MythXError::validation(e.to_string()))
}

/// Deserializes a structured value into `T` and validates the result.
///
/// Shape errors from serde (missing keys, wrong types, unknown enum values)
/// are reported as validation failures naming the offending key.
pub(crate) fn from_structured_value<T>(value: &Value) -> MythXResult<T>
where
    T: DeserializeOwned + Validate,
{
    let model = T::deserialize(value).map_err(|e| MythXError::validation(e.to_string()))?;
    model.validate()?;
    Ok(model)
}

/// Parses raw body text into a structured value.
pub(crate) fn parse_json(raw: &str) -> MythXResult<Value> {
    serde_json::from_str(raw).map_err(|e| MythXError::decode(format!("Invalid JSON: {}", e)))
}

/// Implements the ordered-container surface for a model wrapping a `Vec`:
/// `len`, `is_empty`, `get`, `set`, `iter`, indexing and iteration.
macro_rules! impl_ordered_container {
    ($model:ty, $field:ident, $item:ty) => {
        impl $model {
            /// Number of elements.
            pub fn len(&self) -> usize {
                self.$field.len()
            }

            pub fn is_empty(&self) -> bool {
                self.$field.is_empty()
            }

            pub fn get(&self, index: usize) -> Option<&$item> {
                self.$field.get(index)
            }

            /// Replaces the element at `index`, returning the previous one.
            /// Returns `None` and leaves the container untouched when `index`
            /// is out of bounds.
            pub fn set(&mut self, index: usize, item: $item) -> Option<$item> {
                self.$field
                    .get_mut(index)
                    .map(|slot| std::mem::replace(slot, item))
            }

            /// Iterates in order. Use `.rev()` for reverse iteration.
            pub fn iter(&self) -> std::slice::Iter<'_, $item> {
                self.$field.iter()
            }
        }

        impl std::ops::Index<usize> for $model {
            type Output = $item;

            fn index(&self, index: usize) -> &Self::Output {
                &self.$field[index]
            }
        }

        impl std::ops::IndexMut<usize> for $model {
            fn index_mut(&mut self, index: usize) -> &mut Self::Output {
                &mut self.$field[index]
            }
        }

        impl<'a> IntoIterator for &'a $model {
            type Item = &'a $item;
            type IntoIter = std::slice::Iter<'a, $item>;

            fn into_iter(self) -> Self::IntoIter {
                self.$field.iter()
            }
        }

        impl IntoIterator for $model {
            type Item = $item;
            type IntoIter = std::vec::IntoIter<$item>;

            fn into_iter(self) -> Self::IntoIter {
                self.$field.into_iter()
            }
        }
    };
}

pub(crate) use impl_ordered_container;
