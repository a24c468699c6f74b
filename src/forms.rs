//! Typed form records for the interpreter view.
//!
//! Each form is updated one field at a time as the user types and is only
//! validated when it crosses into an operation (search or submission).

use serde::{Deserialize, Serialize};

use crate::passage::{PassageId, SearchCriteria, SearchScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    SiteId,
    Scope,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    /// Raw text as typed; parsed leniently on search
    pub site_id: String,
    pub scope: SearchScope,
}

impl SearchForm {
    /// Apply a single field change. Unknown scope values leave the scope unchanged.
    pub fn update(&mut self, field: SearchField, value: &str) {
        match field {
            SearchField::SiteId => self.site_id = value.to_string(),
            SearchField::Scope => {
                if let Some(scope) = SearchScope::parse(value) {
                    self.scope = scope;
                }
            }
        }
    }

    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria::parse(&self.site_id, self.scope)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationField {
    InterpreterId,
    VideoUrl,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationForm {
    pub interpreter_id: String,
    pub video_url: String,
    /// Mirrors the selected passage; never used as the target of a submission
    pub passage_id: Option<PassageId>,
}

impl TranslationForm {
    pub fn new(interpreter_id: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            interpreter_id: interpreter_id.into(),
            video_url: video_url.into(),
            passage_id: None,
        }
    }

    pub fn update(&mut self, field: TranslationField, value: &str) {
        match field {
            TranslationField::InterpreterId => self.interpreter_id = value.to_string(),
            TranslationField::VideoUrl => self.video_url = value.to_string(),
        }
    }

    /// Take the user-entered fields from `other`; the passage id stays owned by the controller.
    pub fn merge(&mut self, other: TranslationForm) {
        self.interpreter_id = other.interpreter_id;
        self.video_url = other.video_url;
    }

    /// Reset after a successful submission: the interpreter id is kept for the next passage.
    pub fn clear_for_next(&mut self, next_passage: Option<PassageId>) {
        self.video_url.clear();
        self.passage_id = next_passage;
    }
}
