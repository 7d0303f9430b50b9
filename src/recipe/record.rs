use crate::recipe::FlattenError;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// One flattened recipe, ready to be persisted
///
/// The identifier and canonical share URL are pulled out of the content when
/// the record is built; the content itself is kept exactly as flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRecord {
    id: String,
    share_url: String,
    content: Map<String, Value>,
}

impl RecipeRecord {
    /// Builds a record from a cleaned recipe node
    ///
    /// `path` locates the node inside the page tree and is only used for
    /// error reporting.
    pub fn from_content(content: Map<String, Value>, path: &str) -> Result<Self, FlattenError> {
        let id = match content.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(FlattenError::MissingField {
                    path: path.to_string(),
                    field: "id",
                })
            }
        };

        let share_url = content
            .get("share")
            .and_then(|share| share.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| FlattenError::MissingField {
                path: path.to_string(),
                field: "share.url",
            })?
            .to_string();

        Ok(Self {
            id,
            share_url,
            content,
        })
    }

    /// Stable identifier of the recipe
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical share URL, the key used for crawl deduplication
    pub fn share_url(&self) -> &str {
        &self.share_url
    }

    pub fn content(&self) -> &Map<String, Value> {
        &self.content
    }

    /// Serializes the record as human-readable JSON with a trailing newline
    ///
    /// Keys come out in sorted order, so equal records always produce
    /// byte-identical output.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        let mut text = serde_json::to_string_pretty(&self.content)?;
        text.push('\n');
        Ok(text)
    }
}

impl Serialize for RecipeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.content.serialize(serializer)
    }
}
