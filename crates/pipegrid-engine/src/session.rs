//! Cell editor interaction, modelled as an explicit state machine.
//!
//! ```text
//! Closed ──open──▶ CellSelected ◀──toggle──▶ CategoryExpanded
//!                    ▲     ▲                      │ begin_field (quick-add)
//!                    │     └──── commit/cancel ── FieldEditing
//!                    │                               ▲
//!                    └──────── edit_existing ────────┘
//! ```
//!
//! The quick-add template is add-only: a field that already holds a truthy
//! value cannot be picked from it. Existing values are changed through
//! [`EditSession::edit_existing`] only when the caller asks for it
//! explicitly; the stock editor offers delete and re-add instead.

use pipegrid_types::{CellIndex, CellRecord, CellValue, FieldCatalog, field_label};
use serde::Serialize;
use std::fmt;

/// Field being entered, with its not-yet-committed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingField {
    pub name: String,
    pub draft: CellValue,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditState {
    #[default]
    Closed,
    CellSelected {
        index: CellIndex,
    },
    CategoryExpanded {
        index: CellIndex,
        category: String,
    },
    FieldEditing {
        index: CellIndex,
        field: PendingField,
    },
}

/// Why a transition was refused. Refusals never change the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRejected {
    /// No cell is open.
    NotOpen,
    /// The action needs a field in progress and there is none.
    NotEditing,
    /// A field is being entered; commit or cancel it first.
    FieldInProgress(String),
    /// The category is not part of the pipeline's template.
    UnknownCategory(String),
    /// Quick-add needs an expanded category.
    NoCategoryExpanded,
    /// The field is not offered by the expanded category.
    NotInCategory { field: String, category: String },
    /// Quick-add is add-only and this field already holds a value.
    AlreadyPopulated(String),
    /// Nothing to edit: the cell has no such field.
    MissingField(String),
}

impl fmt::Display for EditRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditRejected::NotOpen => write!(f, "no cell is open"),
            EditRejected::NotEditing => write!(f, "no field is being edited"),
            EditRejected::FieldInProgress(field) => {
                write!(f, "field '{}' is still being edited", field)
            }
            EditRejected::UnknownCategory(category) => {
                write!(f, "unknown category '{}'", category)
            }
            EditRejected::NoCategoryExpanded => write!(f, "no category is expanded"),
            EditRejected::NotInCategory { field, category } => {
                write!(f, "field '{}' is not offered by '{}'", field, category)
            }
            EditRejected::AlreadyPopulated(field) => {
                write!(f, "field '{}' already holds a value", field)
            }
            EditRejected::MissingField(field) => write!(f, "cell has no field '{}'", field),
        }
    }
}

impl std::error::Error for EditRejected {}

/// Entry of the quick-add list of the expanded category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickAddOption {
    pub field: String,
    pub label: String,
    /// False when the field already holds a truthy value.
    pub enabled: bool,
}

/// A finished field entry, ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCommit {
    pub index: CellIndex,
    pub name: String,
    pub value: CellValue,
}

/// Ephemeral editor state of one timeline. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSession {
    state: EditState,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, EditState::Closed)
    }

    pub fn selected_index(&self) -> Option<CellIndex> {
        match &self.state {
            EditState::Closed => None,
            EditState::CellSelected { index }
            | EditState::CategoryExpanded { index, .. }
            | EditState::FieldEditing { index, .. } => Some(*index),
        }
    }

    pub fn expanded_category(&self) -> Option<&str> {
        match &self.state {
            EditState::CategoryExpanded { category, .. } => Some(category),
            _ => None,
        }
    }

    pub fn pending_field(&self) -> Option<&PendingField> {
        match &self.state {
            EditState::FieldEditing { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Open the editor on `index`, dropping whatever was in progress.
    pub fn open(&mut self, index: CellIndex) {
        self.state = EditState::CellSelected { index };
    }

    /// Close the editor. Nothing is saved.
    pub fn close(&mut self) {
        self.state = EditState::Closed;
    }

    /// Expand `category`, or collapse it when it is already the expanded one.
    /// Only one category is ever expanded.
    pub fn toggle_category(
        &mut self,
        catalog: &FieldCatalog,
        category: &str,
    ) -> Result<(), EditRejected> {
        let index = match &self.state {
            EditState::Closed => return Err(EditRejected::NotOpen),
            EditState::FieldEditing { field, .. } => {
                return Err(EditRejected::FieldInProgress(field.name.clone()));
            }
            EditState::CategoryExpanded {
                index,
                category: open,
            } if open == category => {
                self.state = EditState::CellSelected { index: *index };
                return Ok(());
            }
            EditState::CellSelected { index } | EditState::CategoryExpanded { index, .. } => {
                *index
            }
        };

        if catalog.category(category).is_none() {
            return Err(EditRejected::UnknownCategory(category.to_string()));
        }
        self.state = EditState::CategoryExpanded {
            index,
            category: category.to_string(),
        };
        Ok(())
    }

    /// Pick `field` from the expanded category's quick-add list.
    pub fn begin_field(
        &mut self,
        catalog: &FieldCatalog,
        record: Option<&CellRecord>,
        field: &str,
    ) -> Result<(), EditRejected> {
        let (index, category) = match &self.state {
            EditState::Closed => return Err(EditRejected::NotOpen),
            EditState::FieldEditing { field, .. } => {
                return Err(EditRejected::FieldInProgress(field.name.clone()));
            }
            EditState::CellSelected { .. } => return Err(EditRejected::NoCategoryExpanded),
            EditState::CategoryExpanded { index, category } => (*index, category),
        };

        let offered = catalog
            .category(category)
            .is_some_and(|c| c.contains(field));
        if !offered {
            return Err(EditRejected::NotInCategory {
                field: field.to_string(),
                category: category.clone(),
            });
        }
        if record.is_some_and(|r| r.is_truthy(field)) {
            return Err(EditRejected::AlreadyPopulated(field.to_string()));
        }

        let draft = record
            .and_then(|r| r.get(field))
            .cloned()
            .unwrap_or_else(|| CellValue::text(""));
        self.state = EditState::FieldEditing {
            index,
            field: PendingField {
                name: field.to_string(),
                draft,
            },
        };
        Ok(())
    }

    /// Start editing a field the cell already has, bypassing the add-only rule.
    pub fn edit_existing(
        &mut self,
        record: Option<&CellRecord>,
        field: &str,
    ) -> Result<(), EditRejected> {
        let index = match &self.state {
            EditState::Closed => return Err(EditRejected::NotOpen),
            EditState::FieldEditing { field, .. } => {
                return Err(EditRejected::FieldInProgress(field.name.clone()));
            }
            EditState::CellSelected { index } | EditState::CategoryExpanded { index, .. } => {
                *index
            }
        };

        let current = record
            .and_then(|r| r.get(field))
            .ok_or_else(|| EditRejected::MissingField(field.to_string()))?;
        self.state = EditState::FieldEditing {
            index,
            field: PendingField {
                name: field.to_string(),
                draft: current.clone(),
            },
        };
        Ok(())
    }

    pub fn set_draft(&mut self, value: impl Into<CellValue>) -> Result<(), EditRejected> {
        match &mut self.state {
            EditState::FieldEditing { field, .. } => {
                field.draft = value.into();
                Ok(())
            }
            _ => Err(EditRejected::NotEditing),
        }
    }

    /// Finish the pending field and go back to the cell view.
    pub fn take_commit(&mut self) -> Result<FieldCommit, EditRejected> {
        match std::mem::take(&mut self.state) {
            EditState::FieldEditing { index, field } => {
                self.state = EditState::CellSelected { index };
                Ok(FieldCommit {
                    index,
                    name: field.name,
                    value: field.draft,
                })
            }
            other => {
                self.state = other;
                Err(EditRejected::NotEditing)
            }
        }
    }

    /// Drop the pending field without writing anything.
    pub fn cancel(&mut self) -> Result<(), EditRejected> {
        match &self.state {
            EditState::FieldEditing { index, .. } => {
                self.state = EditState::CellSelected { index: *index };
                Ok(())
            }
            _ => Err(EditRejected::NotEditing),
        }
    }

    /// After a direct write, any pending entry is finished.
    pub(crate) fn settle(&mut self) {
        if let Some(index) = self.selected_index()
            && self.pending_field().is_some()
        {
            self.state = EditState::CellSelected { index };
        }
    }

    /// Quick-add list of the expanded category; empty when none is expanded.
    pub fn quick_add_options(
        &self,
        catalog: &FieldCatalog,
        record: Option<&CellRecord>,
    ) -> Vec<QuickAddOption> {
        let Some(category) = self.expanded_category().and_then(|name| catalog.category(name))
        else {
            return Vec::new();
        };

        category
            .fields
            .iter()
            .map(|field| QuickAddOption {
                field: field.clone(),
                label: field_label(field),
                enabled: !record.is_some_and(|r| r.is_truthy(field)),
            })
            .collect()
    }
}
