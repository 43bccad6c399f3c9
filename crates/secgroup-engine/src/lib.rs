//! secgroup-engine - Dependent-field resolution for security-group drafts
//!
//! The engine keeps a security-group draft consistent while its account,
//! regions and VPC are edited:
//!
//! - [`resolve`]: pure stages (VPC availability, group index, rule enforcement)
//! - [`controller`]: the session controller running cascades over them
//! - [`reference`]: collaborator traits and a file-backed implementation
//! - [`config`]: session and settings file loading

pub mod config;
pub mod controller;
pub mod error;
pub mod reference;
pub mod resolve;

pub use controller::{
    CascadeStatus, DetailsTarget, DraftController, DraftEvent, RefreshOutcome, SessionState,
};
pub use error::DraftError;
