//! Realm Configuration

use serde::Deserialize;

/// Realm configuration options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RealmConfig {
    /// Document URL
    pub url: String,

    /// Run the initial upgrade sweep at construction instead of waiting for
    /// the document to become ready
    pub eager: bool,

    /// Defer attached/detached callbacks to the next delivery tick so a burst
    /// of inserts and removals collapses to its net effect
    pub throttle_attached: bool,

    /// What the host platform provides
    pub capabilities: HostCapabilities,
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            eager: false,
            throttle_attached: true,
            capabilities: HostCapabilities::default(),
        }
    }
}

/// Host platform primitives, detected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostCapabilities {
    /// A run-after-this-turn callback facility exists
    pub immediate_callbacks: bool,
    /// Zero-delay timers fire promptly (no coalescing)
    pub reliable_timers: bool,
    /// Behaviour can be spliced onto an existing instance in one step
    pub prototype_reassignment: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            immediate_callbacks: false,
            reliable_timers: true,
            prototype_reassignment: true,
        }
    }
}
