use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::checklist::{self, ChecklistKey, KeyError};
use crate::markup;
use crate::navigation::TOC_ANCHOR_ID;

const SAMPLE_BOOK: &str = include_str!("../assets/sample_book.yaml");

#[derive(Debug, Error)]
pub enum BookError {
    #[error("failed to read book file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON book data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML book data: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported book format '{0}', expected .json, .yaml or .yml")]
    UnsupportedFormat(String),
    #[error("book has no chapters")]
    NoChapters,
    #[error("duplicate anchor id '{0}'")]
    DuplicateId(String),
    #[error("anchor id '{0}' is reserved")]
    ReservedId(String),
    #[error("invalid checklist id: {0}")]
    ChecklistId(#[from] KeyError),
    #[error("duplicate checklist id '{0}'")]
    DuplicateChecklistId(String),
    #[error("checklist storage key '{0}' is used by more than one item")]
    DuplicateChecklistKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    #[serde(default, alias = "subTitle")]
    pub subtitle: String,
    pub chapters: Vec<Chapter>,
    pub appendix: Chapter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default, alias = "subTitle", skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, alias = "content")]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub items: Vec<Item>,
    /// Body stays collapsed until the reader expands it.
    #[serde(default)]
    pub accordion: bool,
    /// Overrides the derived checklist key for every checklist in this section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Prose,
    Checklist,
}

/// One card of content.
///
/// Bare strings in book files are classified once at load time; authors can
/// force a kind with `{ prose: ... }` or `{ checklist: ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "RawItem")]
pub enum Item {
    Prose(String),
    Checklist(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItem {
    Text(String),
    Tagged(TaggedItem),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum TaggedItem {
    Prose(String),
    Checklist(String),
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        match raw {
            RawItem::Text(text) => Item::from_text(text),
            RawItem::Tagged(TaggedItem::Prose(text)) => Item::Prose(text),
            RawItem::Tagged(TaggedItem::Checklist(text)) => Item::Checklist(text),
        }
    }
}

impl Item {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if markup::is_checklist_text(&text) {
            Item::Checklist(text)
        } else {
            Item::Prose(text)
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Item::Prose(text) | Item::Checklist(text) => text,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Prose(_) => ItemKind::Prose,
            Item::Checklist(_) => ItemKind::Checklist,
        }
    }
}

impl Section {
    /// Identifier used for checklist keys when the section has no explicit id.
    pub fn storage_id(&self, chapter_id: &str, section_index: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{chapter_id}#{section_index}"),
        }
    }
}

impl Book {
    pub fn sample() -> Result<Self, BookError> {
        Self::from_yaml_str(SAMPLE_BOOK)
    }

    pub fn from_json_str(content: &str) -> Result<Self, BookError> {
        let book: Self = serde_json::from_str(content)?;
        book.validate()?;
        Ok(book)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, BookError> {
        let book: Self = serde_yaml::from_str(content)?;
        book.validate()?;
        Ok(book)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, BookError> {
        let content = fs::read_to_string(path).map_err(|source| BookError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Self::from_json_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            other => Err(BookError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Chapters followed by the appendix, in document order.
    pub fn all_chapters(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter().chain(std::iter::once(&self.appendix))
    }

    pub fn first_chapter_id(&self) -> &str {
        self.chapters
            .first()
            .map_or(self.appendix.id.as_str(), |chapter| chapter.id.as_str())
    }

    fn validate(&self) -> Result<(), BookError> {
        if self.chapters.is_empty() {
            return Err(BookError::NoChapters);
        }
        let mut seen = HashSet::new();
        let mut checklist_ids = HashSet::new();
        let mut storage_keys = HashSet::new();
        for chapter in self.all_chapters() {
            check_anchor_id(&chapter.id, &mut seen)?;
            for (section_index, section) in chapter.sections.iter().enumerate() {
                if let Some(id) = &section.id {
                    check_anchor_id(id, &mut seen)?;
                }
                if let Some(id) = &section.checklist_id {
                    checklist::validate_custom_id(id)?;
                    if !checklist_ids.insert(id.as_str()) {
                        return Err(BookError::DuplicateChecklistId(id.clone()));
                    }
                }
                for item_index in 0..section.items.len() {
                    let key = ChecklistKey::for_item(&chapter.id, section_index, section, item_index)
                        .storage_key();
                    if !storage_keys.insert(key.clone()) {
                        return Err(BookError::DuplicateChecklistKey(key));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Content ids may not shadow the table of contents anchor or the
/// `<chapterId>#<index>` ids generated for sections without one.
fn check_anchor_id<'a>(id: &'a str, seen: &mut HashSet<&'a str>) -> Result<(), BookError> {
    if id == TOC_ANCHOR_ID || id.contains(checklist::ITEM_SEPARATOR) {
        return Err(BookError::ReservedId(id.to_string()));
    }
    if !seen.insert(id) {
        return Err(BookError::DuplicateId(id.to_string()));
    }
    Ok(())
}
