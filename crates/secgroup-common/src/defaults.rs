//! Default configuration values shared between the engine and its front ends

/// Cloud provider whose accounts and catalogs are consulted
pub const DEFAULT_PROVIDER: &str = "aws";

/// Protocol of a freshly added ingress rule
pub const DEFAULT_RULE_PROTOCOL: &str = "tcp";

/// Port range of a freshly added ingress rule
pub const DEFAULT_RULE_PORT: u16 = 7001;

/// Capacity of the draft event broadcast channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Wizard step that holds the ingress rules
pub const INGRESS_STEP: &str = "Ingress";

// Serde default functions for struct field defaults

/// Returns the default provider
pub fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

/// Returns the default event channel capacity
pub fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}
