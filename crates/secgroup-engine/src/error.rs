//! Draft engine errors
//!
//! Lookup failures are data-integrity faults and always surface to the caller.
//! Rule removals are not errors and never appear here.

use secgroup_common::VpcId;
use thiserror::Error;

/// Errors produced while resolving or submitting a draft
#[derive(Debug, Error)]
pub enum DraftError {
    /// The selected VPC id is not present in the VPC catalog
    #[error("VPC '{vpc_id}' not found in the VPC catalog")]
    UnknownVpc { vpc_id: VpcId },

    /// The selected logical VPC has no record in one of the requested regions
    #[error("No VPC labeled '{label}' for account '{account}' in region '{region}'")]
    VpcLookup {
        account: String,
        region: String,
        label: String,
    },

    /// Name does not match the pattern for the draft's networking mode
    #[error("Name '{name}' does not match pattern {pattern}")]
    InvalidName { name: String, pattern: &'static str },

    /// A collaborator (cache, directory, task monitor) failed
    #[error(transparent)]
    Fetch(#[from] anyhow::Error),
}

impl DraftError {
    /// Check if this is a catalog integrity fault
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            DraftError::UnknownVpc { .. } | DraftError::VpcLookup { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DraftError::VpcLookup {
            account: "prod".to_string(),
            region: "us-west-2".to_string(),
            label: "main".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No VPC labeled 'main' for account 'prod' in region 'us-west-2'"
        );
        assert!(err.is_lookup());

        let err = DraftError::UnknownVpc {
            vpc_id: "vpc-9".into(),
        };
        assert_eq!(err.to_string(), "VPC 'vpc-9' not found in the VPC catalog");
    }

    #[test]
    fn test_fetch_is_transparent() {
        let err: DraftError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.to_string(), "connection reset");
        assert!(!err.is_lookup());
    }
}
