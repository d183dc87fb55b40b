//! Per-item checklist toggle state.
//!
//! State is keyed by [`ChecklistKey`] and maps a line index (position in the
//! item text split on `\n`) to a checked flag. A key's state is loaded from
//! storage the first time it is touched, and every toggle writes the whole map
//! for that key back out.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::book::Section;
use crate::storage::KeyValueStore;

pub const KEY_PREFIX: &str = "checklist-";
/// Separates a section-level checklist id from the item index it is
/// suffixed with. Custom ids may not contain it.
pub const ITEM_SEPARATOR: char = '#';

pub type ChecklistState = BTreeMap<usize, bool>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("checklist id must not be empty")]
    Empty,
    #[error("checklist id '{0}' uses the reserved 'checklist-' prefix")]
    ReservedPrefix(String),
    #[error("checklist id '{0}' contains the reserved '#' character")]
    ReservedChar(String),
}

/// Storage scope of one checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChecklistKey {
    Section {
        section_id: String,
        item_index: usize,
    },
    Custom(String),
}

impl ChecklistKey {
    pub fn section(section_id: impl Into<String>, item_index: usize) -> Self {
        ChecklistKey::Section {
            section_id: section_id.into(),
            item_index,
        }
    }

    /// Caller-supplied key. Ids with the derived-key prefix are refused so a
    /// custom key can never alias a section key in storage, and `#` is
    /// reserved for the item suffix added by [`ChecklistKey::for_item`].
    pub fn custom(id: impl Into<String>) -> Result<Self, KeyError> {
        let id = id.into();
        validate_custom_id(&id)?;
        Ok(ChecklistKey::Custom(id))
    }

    /// Key for item `item_index` of a section. A section-level `checklist_id`
    /// names its first item directly and suffixes the rest as `<id>#<index>`.
    pub fn for_item(
        chapter_id: &str,
        section_index: usize,
        section: &Section,
        item_index: usize,
    ) -> Self {
        if let Some(id) = &section.checklist_id {
            match validate_custom_id(id) {
                Ok(()) if item_index == 0 => return ChecklistKey::Custom(id.clone()),
                Ok(()) => {
                    return ChecklistKey::Custom(format!("{id}{ITEM_SEPARATOR}{item_index}"));
                }
                Err(e) => log::warn!("Ignoring checklist id on '{}': {}", section.title, e),
            }
        }
        Self::section(section.storage_id(chapter_id, section_index), item_index)
    }

    pub fn storage_key(&self) -> String {
        match self {
            ChecklistKey::Section {
                section_id,
                item_index,
            } => format!("{KEY_PREFIX}{section_id}-{item_index}"),
            ChecklistKey::Custom(id) => id.clone(),
        }
    }
}

pub fn validate_custom_id(id: &str) -> Result<(), KeyError> {
    if id.is_empty() {
        return Err(KeyError::Empty);
    }
    if id.starts_with(KEY_PREFIX) {
        return Err(KeyError::ReservedPrefix(id.to_string()));
    }
    if id.contains(ITEM_SEPARATOR) {
        return Err(KeyError::ReservedChar(id.to_string()));
    }
    Ok(())
}

impl fmt::Display for ChecklistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub checked: usize,
    pub total: usize,
    pub percent: u8,
}

impl Progress {
    pub fn new(checked: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            let checked = checked.min(total);
            // Round half up
            ((checked * 200 + total) / (total * 2)) as u8
        };
        Self {
            checked,
            total,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.checked >= self.total
    }
}

#[derive(Debug, Default)]
pub struct ChecklistStore {
    states: HashMap<ChecklistKey, ChecklistState>,
    checkable: HashMap<ChecklistKey, Vec<usize>>,
}

impl ChecklistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state for `key`, reading it from storage on first use.
    pub fn load(&mut self, storage: &dyn KeyValueStore, key: &ChecklistKey) -> &ChecklistState {
        self.states
            .entry(key.clone())
            .or_insert_with(|| read_state(storage, key))
    }

    /// Registers the lines of `key` that count toward progress and loads its state.
    pub fn attach(
        &mut self,
        storage: &dyn KeyValueStore,
        key: &ChecklistKey,
        checkable_lines: Vec<usize>,
    ) {
        self.load(storage, key);
        self.checkable.insert(key.clone(), checkable_lines);
    }

    pub fn is_attached(&self, key: &ChecklistKey) -> bool {
        self.checkable.contains_key(key)
    }

    pub fn is_checked(&self, key: &ChecklistKey, line_index: usize) -> bool {
        self.states
            .get(key)
            .and_then(|state| state.get(&line_index))
            .copied()
            .unwrap_or(false)
    }

    /// Flips one line and writes the key's full state through to storage.
    /// Returns the new checked value.
    pub fn toggle(
        &mut self,
        storage: &mut dyn KeyValueStore,
        key: &ChecklistKey,
        line_index: usize,
    ) -> bool {
        let state = self
            .states
            .entry(key.clone())
            .or_insert_with(|| read_state(&*storage, key));
        let flag = state.entry(line_index).or_insert(false);
        *flag = !*flag;
        let checked = *flag;

        match serde_json::to_string(state) {
            Ok(serialized) => {
                if let Err(e) = storage.set(&key.storage_key(), serialized) {
                    log::error!("Failed to persist checklist {key}: {e}");
                }
            }
            Err(e) => log::error!("Failed to serialize checklist {key}: {e}"),
        }

        log::debug!("Checklist {key} line {line_index} -> {checked}");
        checked
    }

    pub fn progress(&self, key: &ChecklistKey) -> Progress {
        let Some(lines) = self.checkable.get(key) else {
            return Progress::default();
        };
        let checked = lines
            .iter()
            .filter(|line| self.is_checked(key, **line))
            .count();
        Progress::new(checked, lines.len())
    }

    /// Progress summed over every attached checklist.
    pub fn overall_progress(&self) -> Progress {
        let (checked, total) = self.checkable.keys().fold((0, 0), |(checked, total), key| {
            let progress = self.progress(key);
            (checked + progress.checked, total + progress.total)
        });
        Progress::new(checked, total)
    }
}

fn read_state(storage: &dyn KeyValueStore, key: &ChecklistKey) -> ChecklistState {
    let Some(raw) = storage.get(&key.storage_key()) else {
        return ChecklistState::new();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!("Discarding unreadable checklist state for {key}: {e}");
        ChecklistState::new()
    })
}
