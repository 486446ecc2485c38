//! PayloadBoard - shared annotation state
//!
//! Holds the current value of each declared widget. The external caller
//! (UI) mutates values between captures; the group tick loop reads a
//! snapshot at every tick. State is lock-guarded and passed by
//! reference into the group, never ambient.

use std::collections::BTreeMap;
use std::sync::RwLock;

use contracts::{PayloadSnapshot, PayloadValue, RigError, WidgetSpec};

/// Validated widget schema plus current values.
pub struct PayloadBoard {
    widgets: Vec<WidgetSpec>,
    values: RwLock<BTreeMap<String, PayloadValue>>,
}

impl PayloadBoard {
    /// Build from widget declarations, enforcing label uniqueness and
    /// per-widget constraint sanity.
    pub fn new(widgets: Vec<WidgetSpec>) -> Result<Self, RigError> {
        let mut seen = std::collections::HashSet::new();
        for widget in &widgets {
            widget.validate()?;
            if !seen.insert(widget.label().to_string()) {
                return Err(RigError::config_validation(
                    format!("payload[{}]", widget.label()),
                    "duplicate widget label",
                ));
            }
        }
        Ok(Self {
            widgets,
            values: RwLock::new(BTreeMap::new()),
        })
    }

    /// Declared widgets.
    pub fn widgets(&self) -> &[WidgetSpec] {
        &self.widgets
    }

    /// Set one widget's current value.
    ///
    /// # Errors
    /// Unknown label, kind mismatch, or a value outside the declared
    /// constraints.
    pub fn set(&self, label: &str, value: PayloadValue) -> Result<(), RigError> {
        let widget = self
            .widgets
            .iter()
            .find(|w| w.label() == label)
            .ok_or_else(|| {
                RigError::payload_validation(label, "no widget with this label is declared")
            })?;

        widget.accepts(&value)?;

        let mut values = self.values.write().expect("payload lock poisoned");
        values.insert(label.to_string(), value);
        Ok(())
    }

    /// Point-in-time snapshot of every widget. Never fails; widgets
    /// never explicitly set carry their declared default.
    pub fn snapshot(&self) -> PayloadSnapshot {
        let values = self.values.read().expect("payload lock poisoned");
        let mut snapshot = BTreeMap::new();
        for widget in &self.widgets {
            let value = values
                .get(widget.label())
                .cloned()
                .unwrap_or_else(|| widget.default_value());
            snapshot.insert(widget.label().to_string(), value);
        }
        PayloadSnapshot(snapshot)
    }
}
