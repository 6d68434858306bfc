//! # List Presets
//!
//! Filter builders for the standard explorer lists. Empty selections are
//! left out of the resulting [`FilterSet`], so "any pallet" means no
//! `callModule` key at all.

use serde::{Deserialize, Serialize};
use shared_types::entities::{EntityKind, FilterSet};

/// Filter key for the signed flag of extrinsics.
pub const SIGNED: &str = "signed";
/// Filter key for the extrinsic pallet.
pub const CALL_MODULE: &str = "callModule";
/// Filter key for the extrinsic call name.
pub const CALL_NAME: &str = "callName";
/// Filter key for the event pallet.
pub const EVENT_MODULE: &str = "eventModule";
/// Filter key for the event name.
pub const EVENT_NAME: &str = "eventName";

fn selected(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Extrinsic list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFilter {
    signed: Option<u8>,
    pallet: Option<String>,
    call_name: Option<String>,
}

impl CallFilter {
    /// Inherents: unsigned extrinsics.
    #[must_use]
    pub fn inherents() -> Self {
        Self {
            signed: Some(0),
            ..Self::default()
        }
    }

    /// Signed extrinsics only.
    #[must_use]
    pub fn signed_extrinsics() -> Self {
        Self {
            signed: Some(1),
            ..Self::default()
        }
    }

    /// Builder-style pallet selection.
    #[must_use]
    pub fn with_pallet(mut self, pallet: impl Into<String>) -> Self {
        self.set_pallet(Some(pallet.into()));
        self
    }

    /// Builder-style call selection.
    #[must_use]
    pub fn with_call_name(mut self, call_name: impl Into<String>) -> Self {
        self.set_call_name(Some(call_name.into()));
        self
    }

    /// Select a pallet. A call name only makes sense within its pallet, so
    /// it is reset.
    pub fn set_pallet(&mut self, pallet: Option<String>) {
        self.pallet = selected(pallet);
        self.call_name = None;
    }

    /// Select a call within the current pallet.
    pub fn set_call_name(&mut self, call_name: Option<String>) {
        self.call_name = selected(call_name);
    }

    /// Drop the pallet and call selection, keeping the signed constraint.
    pub fn reset(&mut self) {
        self.pallet = None;
        self.call_name = None;
    }

    /// Selected pallet.
    #[must_use]
    pub fn pallet(&self) -> Option<&str> {
        self.pallet.as_deref()
    }

    /// Selected call.
    #[must_use]
    pub fn call_name(&self) -> Option<&str> {
        self.call_name.as_deref()
    }

    /// Entity kind these filters apply to.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        EntityKind::Extrinsic
    }

    /// Query filters.
    #[must_use]
    pub fn to_filters(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        if let Some(signed) = self.signed {
            filters.insert(SIGNED, signed);
        }
        if let Some(pallet) = &self.pallet {
            filters.insert(CALL_MODULE, pallet.as_str());
        }
        if let Some(call_name) = &self.call_name {
            filters.insert(CALL_NAME, call_name.as_str());
        }
        filters
    }
}

impl From<&CallFilter> for FilterSet {
    fn from(value: &CallFilter) -> Self {
        value.to_filters()
    }
}

/// Event list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    pallet: Option<String>,
    event_name: Option<String>,
}

impl EventFilter {
    /// Every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Builder-style pallet selection.
    #[must_use]
    pub fn with_pallet(mut self, pallet: impl Into<String>) -> Self {
        self.set_pallet(Some(pallet.into()));
        self
    }

    /// Builder-style event selection.
    #[must_use]
    pub fn with_event_name(mut self, event_name: impl Into<String>) -> Self {
        self.set_event_name(Some(event_name.into()));
        self
    }

    /// Select a pallet; resets the event name.
    pub fn set_pallet(&mut self, pallet: Option<String>) {
        self.pallet = selected(pallet);
        self.event_name = None;
    }

    /// Select an event within the current pallet.
    pub fn set_event_name(&mut self, event_name: Option<String>) {
        self.event_name = selected(event_name);
    }

    /// Selected pallet.
    #[must_use]
    pub fn pallet(&self) -> Option<&str> {
        self.pallet.as_deref()
    }

    /// Selected event.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        self.event_name.as_deref()
    }

    /// Entity kind these filters apply to.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        EntityKind::Event
    }

    /// Query filters.
    #[must_use]
    pub fn to_filters(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        if let Some(pallet) = &self.pallet {
            filters.insert(EVENT_MODULE, pallet.as_str());
        }
        if let Some(event_name) = &self.event_name {
            filters.insert(EVENT_NAME, event_name.as_str());
        }
        filters
    }
}

impl From<&EventFilter> for FilterSet {
    fn from(value: &EventFilter) -> Self {
        value.to_filters()
    }
}
