use async_trait::async_trait;

use crate::models::RefKind;

/// Outcome of asking the user for a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickResult {
    /// Empty string picks the working tree.
    Picked(String),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerOptions {
    pub include_branches: bool,
    pub include_tags: bool,
    pub allow_working_tree: bool,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            include_branches: true,
            include_tags: true,
            allow_working_tree: true,
        }
    }
}

#[async_trait]
pub trait RefPicker: Send + Sync {
    /// `None` when the picker was dismissed without an answer.
    async fn show(&self, title: &str, placeholder: &str, options: PickerOptions) -> Option<PickResult>;
}

/// A picker whose answer was already given, e.g. in an API request body.
/// Answers the options exclude count as a cancelled pick.
pub struct RequestedRef {
    reference: Option<String>,
    kind: Option<RefKind>,
}

impl RequestedRef {
    /// `None` is a dismissed picker.
    pub fn new(reference: Option<String>) -> Self {
        Self { reference, kind: None }
    }

    pub fn with_kind(mut self, kind: Option<RefKind>) -> Self {
        self.kind = kind;
        self
    }

    fn allowed(&self, reference: &str, options: PickerOptions) -> bool {
        if reference.is_empty() {
            return options.allow_working_tree;
        }
        match self.kind {
            Some(RefKind::Branch | RefKind::Remote) => options.include_branches,
            Some(RefKind::Tag) => options.include_tags,
            None => true,
        }
    }
}

#[async_trait]
impl RefPicker for RequestedRef {
    async fn show(&self, title: &str, _placeholder: &str, options: PickerOptions) -> Option<PickResult> {
        let picked = match &self.reference {
            None => PickResult::Cancelled,
            Some(r) if !self.allowed(r, options) => PickResult::Cancelled,
            Some(r) => PickResult::Picked(r.clone()),
        };
        tracing::debug!("{}: {:?}", title, picked);
        Some(picked)
    }
}
