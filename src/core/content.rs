//! Content Schema Registry.
//!
//! Sections carry a closed set of content variants. Each variant has a fixed
//! collection shape; payloads arrive as raw JSON from the calling layer and
//! are normalized here before anything touches the database. Normalization:
//! required collection fields must be arrays of the right element shape,
//! unknown fields are dropped, absent fields default to empty sequences.
//! Element-level string fields (`url`, `title`, `caption`) are type-checked
//! but not format-checked — URL well-formedness is out of scope.
//!
//! Adding a variant means adding a `SectionKind`/`SectionContent` arm; the
//! compiler then points at the two dispatch sites in `ContentRegistry`.

use crate::core::error::BiopageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Closed variant tag for section content. Stored as the `kind` column,
/// rendered per-variant by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    TextList,
    Links,
    Gallery,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::TextList => "text_list",
            SectionKind::Links => "links",
            SectionKind::Gallery => "gallery",
        }
    }

    pub fn parse(s: &str) -> Result<Self, BiopageError> {
        match s {
            "text_list" => Ok(SectionKind::TextList),
            "links" => Ok(SectionKind::Links),
            "gallery" => Ok(SectionKind::Gallery),
            other => Err(BiopageError::invalid_content(
                "type",
                format!("unknown section type `{}`", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Normalized section content. Serializes to the stored/public JSON shape
/// (`{"items": [...]}` etc.); construction goes through
/// [`ContentRegistry::validate`], never through blind deserialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionContent {
    TextList { items: Vec<String> },
    Links { links: Vec<LinkEntry> },
    Gallery { images: Vec<GalleryImage> },
}

impl SectionContent {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionContent::TextList { .. } => SectionKind::TextList,
            SectionContent::Links { .. } => SectionKind::Links,
            SectionContent::Gallery { .. } => SectionKind::Gallery,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Validator/normalizer for the closed variant set. Stateless; injected into
/// the section store so the dispatch table lives in exactly one place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentRegistry;

impl ContentRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Validate and normalize a raw payload for the given variant.
    /// `null` is treated as an empty object so every collection field takes
    /// its empty-sequence default.
    pub fn validate(
        &self,
        kind: SectionKind,
        raw: &JsonValue,
    ) -> Result<SectionContent, BiopageError> {
        let empty = Map::new();
        let obj = match raw {
            JsonValue::Object(map) => map,
            JsonValue::Null => &empty,
            _ => {
                return Err(BiopageError::invalid_content(
                    "content",
                    "expected a JSON object",
                ))
            }
        };
        match kind {
            SectionKind::TextList => validate_text_list(obj),
            SectionKind::Links => validate_links(obj),
            SectionKind::Gallery => validate_gallery(obj),
        }
    }

    /// Seed content for a section created without an explicit payload.
    pub fn default_content(&self, kind: SectionKind) -> SectionContent {
        match kind {
            SectionKind::TextList => SectionContent::TextList {
                items: vec!["First item".to_string(), "Second item".to_string()],
            },
            SectionKind::Links => SectionContent::Links {
                links: vec![LinkEntry {
                    title: "My Link".to_string(),
                    url: "https://example.com".to_string(),
                    icon: None,
                }],
            },
            SectionKind::Gallery => SectionContent::Gallery { images: Vec::new() },
        }
    }
}

fn field_array<'a>(
    obj: &'a Map<String, JsonValue>,
    field: &str,
) -> Result<Vec<&'a JsonValue>, BiopageError> {
    match obj.get(field) {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => Ok(items.iter().collect()),
        Some(_) => Err(BiopageError::invalid_content(field, "expected an array")),
    }
}

fn required_string(
    obj: &Map<String, JsonValue>,
    path: &str,
    field: &str,
) -> Result<String, BiopageError> {
    match obj.get(field) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(BiopageError::invalid_content(
            format!("{}.{}", path, field),
            "expected a string",
        )),
        None => Err(BiopageError::invalid_content(
            format!("{}.{}", path, field),
            "missing required field",
        )),
    }
}

fn optional_string(
    obj: &Map<String, JsonValue>,
    path: &str,
    field: &str,
) -> Result<Option<String>, BiopageError> {
    match obj.get(field) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(BiopageError::invalid_content(
            format!("{}.{}", path, field),
            "expected a string",
        )),
    }
}

fn element_object<'a>(
    value: &'a JsonValue,
    path: &str,
) -> Result<&'a Map<String, JsonValue>, BiopageError> {
    value
        .as_object()
        .ok_or_else(|| BiopageError::invalid_content(path, "expected an object"))
}

fn validate_text_list(obj: &Map<String, JsonValue>) -> Result<SectionContent, BiopageError> {
    let mut items = Vec::new();
    for (i, value) in field_array(obj, "items")?.into_iter().enumerate() {
        match value {
            JsonValue::String(s) => items.push(s.clone()),
            _ => {
                return Err(BiopageError::invalid_content(
                    format!("items[{}]", i),
                    "expected a string",
                ))
            }
        }
    }
    Ok(SectionContent::TextList { items })
}

fn validate_links(obj: &Map<String, JsonValue>) -> Result<SectionContent, BiopageError> {
    let mut links = Vec::new();
    for (i, value) in field_array(obj, "links")?.into_iter().enumerate() {
        let path = format!("links[{}]", i);
        let entry = element_object(value, &path)?;
        links.push(LinkEntry {
            title: required_string(entry, &path, "title")?,
            url: required_string(entry, &path, "url")?,
            icon: optional_string(entry, &path, "icon")?,
        });
    }
    Ok(SectionContent::Links { links })
}

fn validate_gallery(obj: &Map<String, JsonValue>) -> Result<SectionContent, BiopageError> {
    let mut images = Vec::new();
    for (i, value) in field_array(obj, "images")?.into_iter().enumerate() {
        let path = format!("images[{}]", i);
        let entry = element_object(value, &path)?;
        images.push(GalleryImage {
            url: required_string(entry, &path, "url")?,
            caption: optional_string(entry, &path, "caption")?,
        });
    }
    Ok(SectionContent::Gallery { images })
}
