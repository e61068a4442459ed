//! Output schema contract sent alongside a structured generation request.
//!
//! The schema only constrains shape. Invariants that tie fields together are
//! checked after parsing by [`StructuredOutput::validate`].

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Response schema in the OpenAPI subset understood by the generation API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Schema {
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Integer {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Array {
        items: Box<Schema>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_items: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_items: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Object {
        properties: BTreeMap<String, Schema>,
        required: Vec<String>,
        property_ordering: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Schema {
    pub fn string(description: &str) -> Self {
        Schema::String {
            description: Some(description.to_string()),
        }
    }

    pub fn integer(description: &str) -> Self {
        Schema::Integer {
            description: Some(description.to_string()),
        }
    }

    pub fn array(items: Schema, description: &str) -> Self {
        Schema::Array {
            items: Box::new(items),
            description: Some(description.to_string()),
            min_items: None,
            max_items: None,
        }
    }

    /// An object whose fields are all required, in the given order.
    pub fn object(description: &str, fields: Vec<(&str, Schema)>) -> Self {
        let property_ordering: Vec<String> = fields.iter().map(|(k, _)| k.to_string()).collect();
        Schema::Object {
            properties: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            required: property_ordering.clone(),
            property_ordering,
            description: Some(description.to_string()),
        }
    }

    /// Add a field that may be omitted. No-op on non-object schemas.
    pub fn with_optional(mut self, name: &str, schema: Schema) -> Self {
        if let Schema::Object {
            properties,
            property_ordering,
            ..
        } = &mut self
        {
            properties.insert(name.to_string(), schema);
            property_ordering.push(name.to_string());
        }
        self
    }

    /// Pin the length of an array schema. No-op on non-array schemas.
    pub fn with_item_count(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        if let Schema::Array {
            min_items,
            max_items,
            ..
        } = &mut self
        {
            *min_items = min;
            *max_items = max;
        }
        self
    }

    /// Nesting depth, counting each object and array level.
    pub fn depth(&self) -> usize {
        match self {
            Schema::String { .. } | Schema::Integer { .. } => 0,
            Schema::Array { items, .. } => 1 + items.depth(),
            Schema::Object { properties, .. } => {
                1 + properties.values().map(Schema::depth).max().unwrap_or(0)
            }
        }
    }
}

/// A result shape the generation capability can be asked to produce.
pub trait StructuredOutput: DeserializeOwned + Send + Sized {
    /// Human-readable name used in error messages and logs.
    const NAME: &'static str;

    fn schema() -> Schema;

    /// Check cross-field invariants after parsing, normalising where safe.
    fn validate(self) -> Result<Self> {
        Ok(self)
    }
}

/// Parse model output text into `T` and run its validator.
///
/// Text that does not fit the declared shape is reported as
/// [`Error::EmptyResult`], since a different input may well succeed.
pub fn parse_structured<T: StructuredOutput>(text: &str) -> Result<T> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(Error::EmptyResult(format!("no {} returned", T::NAME)));
    }

    let parsed: T = serde_json::from_str(body).map_err(|e| {
        tracing::warn!("Structured output did not match {}: {}", T::NAME, e);
        Error::EmptyResult(format!("response did not match the {} shape: {}", T::NAME, e))
    })?;

    parsed.validate()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
