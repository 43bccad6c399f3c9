//! Pure resolution stages of the draft cascade
//!
//! - [`availability`]: VPCs present in every requested region
//! - [`security_groups`]: group names existing/available under the chosen VPC
//! - [`enforce`]: ingress rules pruned against the available names
//!
//! None of these perform I/O; they operate on caller-supplied snapshots.

pub mod availability;
pub mod enforce;
pub mod security_groups;

pub use availability::{LogicalVpcIndex, resolve};
pub use enforce::{Enforcement, RuleScope, enforce};
pub use security_groups::{IndexQuery, index};
