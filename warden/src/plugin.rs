//! Optional console extensions (billing, auth).
//!
//! A missing plugin or a role without the capability it needs makes the feature
//! unavailable; it is never an error.

use std::fmt;
use std::sync::Arc;

use crate::types::{AgentRole, CapabilityName};

/// An optional console feature supplied at construction time.
pub trait ConsolePlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Capability a role must hold to use the plugin. `None` means any role.
    fn required_capability(&self) -> Option<CapabilityName> {
        None
    }

    /// One-line summary shown next to the feature.
    fn describe(&self) -> String {
        self.name().to_string()
    }
}

/// Whether a plugin feature can be shown to the current role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    NotAvailable { reason: String },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

#[derive(Clone, Default)]
pub enum PluginSlot {
    Installed(Arc<dyn ConsolePlugin>),
    #[default]
    Absent,
}

impl fmt::Debug for PluginSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSlot::Installed(p) => f.debug_tuple("Installed").field(&p.name()).finish(),
            PluginSlot::Absent => f.write_str("Absent"),
        }
    }
}

impl PluginSlot {
    pub fn installed(plugin: impl ConsolePlugin + 'static) -> Self {
        PluginSlot::Installed(Arc::new(plugin))
    }

    pub fn plugin(&self) -> Option<&Arc<dyn ConsolePlugin>> {
        match self {
            PluginSlot::Installed(p) => Some(p),
            PluginSlot::Absent => None,
        }
    }

    /// `role` is the role the console acts as; `None` when no role is selected, which only
    /// satisfies plugins without a required capability.
    pub fn availability(&self, role: Option<&AgentRole>) -> Availability {
        let plugin = match self {
            PluginSlot::Installed(p) => p,
            PluginSlot::Absent => {
                return Availability::NotAvailable {
                    reason: "not installed".to_string(),
                }
            }
        };
        match (plugin.required_capability(), role) {
            (None, _) => Availability::Available,
            (Some(cap), Some(r)) if r.permits(cap) => Availability::Available,
            (Some(cap), Some(r)) => Availability::NotAvailable {
                reason: format!("{} requires {} (role {} lacks it)", plugin.name(), cap, r.name),
            },
            (Some(cap), None) => Availability::NotAvailable {
                reason: format!("{} requires {}", plugin.name(), cap),
            },
        }
    }
}

/// Plugin slots known to the console.
#[derive(Clone, Debug, Default)]
pub struct Plugins {
    pub billing: PluginSlot,
    pub auth: PluginSlot,
}

impl Plugins {
    pub fn with_billing(mut self, plugin: impl ConsolePlugin + 'static) -> Self {
        self.billing = PluginSlot::installed(plugin);
        self
    }

    pub fn with_auth(mut self, plugin: impl ConsolePlugin + 'static) -> Self {
        self.auth = PluginSlot::installed(plugin);
        self
    }
}
