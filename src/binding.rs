//! Route-parameter binding.
//!
//! A path segment like `42` in `/users/{user}` is turned into a [`Bound`]
//! value before middleware runs. Every bound value can be queried by dotted
//! path; values that stand for a stored record also carry an [`Entity`].

use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;

/// Column holding a record's creation time unless the entity says otherwise.
pub const CREATED_AT: &str = "created_at";

/// Resolves a raw path segment into a [`Bound`] value. `None` means the
/// resource does not exist and the request is answered with `404`.
pub type Binder = Arc<dyn Fn(&str) -> Option<Bound> + Send + Sync + 'static>;

/// Identity of a persisted record.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    model: String,
    key: Value,
    created_at_column: String,
}

impl Entity {
    pub fn new(model: impl Into<String>, key: impl Into<Value>) -> Self {
        Self { model: model.into(), key: key.into(), created_at_column: CREATED_AT.to_owned() }
    }

    /// Overrides the creation timestamp column (default `created_at`).
    pub fn created_at_column(mut self, column: impl Into<String>) -> Self {
        self.created_at_column = column.into();
        self
    }

    pub fn model(&self) -> &str { &self.model }
    pub fn key(&self) -> &Value { &self.key }
    pub fn created_at(&self) -> &str { &self.created_at_column }
}

/// The value bound to a route parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Bound {
    attributes: Value,
    entity: Option<Entity>,
}

impl Bound {
    /// A plain structured value with no record identity.
    pub fn value(attributes: impl Into<Value>) -> Self {
        Self { attributes: attributes.into(), entity: None }
    }

    /// A persisted record and its attributes.
    pub fn entity(entity: Entity, attributes: impl Into<Value>) -> Self {
        Self { attributes: attributes.into(), entity: Some(entity) }
    }

    pub fn attributes(&self) -> &Value { &self.attributes }
    pub fn as_entity(&self) -> Option<&Entity> { self.entity.as_ref() }

    /// Looks up a dotted path (`profile.expires_at`, `slots.0.ends_at`).
    ///
    /// An empty path returns the whole value.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.attributes);
        }
        path.split('.').try_fold(&self.attributes, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Name of the attribute holding the creation time.
    pub fn created_at_column(&self) -> &str {
        self.entity.as_ref().map_or(CREATED_AT, Entity::created_at)
    }

    /// The error reported when this value is treated as gone.
    pub fn not_found(&self) -> Error {
        match &self.entity {
            Some(entity) => Error::ModelNotFound {
                model: entity.model.clone(),
                key: match &entity.key {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            },
            None => Error::NotFound,
        }
    }
}

/// Unbound parameters are exposed as the raw path segment.
impl From<&str> for Bound {
    fn from(segment: &str) -> Self {
        Self::value(segment)
    }
}
