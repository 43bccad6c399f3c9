//! Draft, rule and VPC types
//!
//! A VPC is identified per region by its [`VpcId`]; records that share a
//! `label` across regions describe the same logical VPC.

use crate::defaults::{DEFAULT_RULE_PORT, DEFAULT_RULE_PROTOCOL};
use serde::{Deserialize, Serialize};

/// Region-scoped VPC identifier (e.g. `vpc-0a1b2c3d`)
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::Deref,
)]
#[serde(transparent)]
pub struct VpcId(String);

impl VpcId {
    pub fn new(id: impl Into<String>) -> Self {
        VpcId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VpcId {
    fn from(id: &str) -> Self {
        VpcId(id.to_string())
    }
}

impl From<String> for VpcId {
    fn from(id: String) -> Self {
        VpcId(id)
    }
}

/// One VPC as reported by the VPC directory for a single account and region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcRecord {
    pub id: VpcId,
    /// Human-facing name; the cross-region join key
    pub label: String,
    pub account: String,
    pub region: String,
    #[serde(default)]
    pub deprecated: bool,
}

impl VpcRecord {
    pub fn new(
        id: impl Into<VpcId>,
        label: impl Into<String>,
        account: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            account: account.into(),
            region: region.into(),
            deprecated: false,
        }
    }

    /// Mark the record as deprecated
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// A logical VPC resolved to its ids in each requested region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySet {
    pub ids: Vec<VpcId>,
    pub label: String,
    pub deprecated: bool,
}

impl AvailabilitySet {
    pub fn contains(&self, id: &VpcId) -> bool {
        self.ids.contains(id)
    }

    /// The id used when this logical VPC is selected
    pub fn primary_id(&self) -> Option<&VpcId> {
        self.ids.first()
    }
}

/// Result of one availability resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub active: Vec<AvailabilitySet>,
    pub deprecated: Vec<AvailabilitySet>,
    pub all: Vec<AvailabilitySet>,
}

impl Availability {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Find the set whose ids include `id`
    pub fn containing(&self, id: &VpcId) -> Option<&AvailabilitySet> {
        self.all.iter().find(|set| set.contains(id))
    }

    /// Find the set for a logical VPC label
    pub fn by_label(&self, label: &str) -> Option<&AvailabilitySet> {
        self.all.iter().find(|set| set.label == label)
    }
}

/// An ingress rule on the draft
///
/// Rules carrying a `source_name` reference another security group and are
/// subject to consistency enforcement. All other rules are literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub protocol: String,
    pub start_port: u16,
    pub end_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_vpc_id: Option<VpcId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

impl Default for Rule {
    fn default() -> Self {
        Self::tcp(DEFAULT_RULE_PORT, DEFAULT_RULE_PORT)
    }
}

impl Rule {
    /// Literal TCP rule over a port range
    pub fn tcp(start_port: u16, end_port: u16) -> Self {
        Self {
            protocol: DEFAULT_RULE_PROTOCOL.to_string(),
            start_port,
            end_port,
            source_account_name: None,
            source_vpc_id: None,
            source_name: None,
        }
    }

    /// Rule allowing traffic from another security group
    pub fn from_group(
        source_name: impl Into<String>,
        source_account_name: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            source_name: Some(source_name.into()),
            source_account_name: Some(source_account_name.into()),
            ..Self::tcp(port, port)
        }
    }

    /// Scope the source group to a VPC
    pub fn in_vpc(mut self, vpc_id: impl Into<VpcId>) -> Self {
        self.source_vpc_id = Some(vpc_id.into());
        self
    }

    pub fn is_referential(&self) -> bool {
        self.source_name.is_some()
    }
}

/// The security group under edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    /// Set when an existing group is being edited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub account_name: String,
    pub regions: Vec<String>,
    /// `None` means classic networking
    pub vpc_id: Option<VpcId>,
    pub ingress_rules: Vec<Rule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Draft {
    /// Create a new (not yet persisted) draft for an account and regions
    pub fn new(account_name: impl Into<String>, regions: &[&str]) -> Self {
        Self {
            account_name: account_name.into(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_vpc(mut self, vpc_id: impl Into<VpcId>) -> Self {
        self.vpc_id = Some(vpc_id.into());
        self
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.ingress_rules = rules;
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// True once the draft names an account and at least one region
    pub fn has_coordinates(&self) -> bool {
        !self.account_name.is_empty() && !self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_is_tcp_7001() {
        let rule = Rule::default();
        assert_eq!(rule.protocol, "tcp");
        assert_eq!((rule.start_port, rule.end_port), (7001, 7001));
        assert!(!rule.is_referential());
    }

    #[test]
    fn test_availability_lookup() {
        let availability = Availability {
            active: vec![],
            deprecated: vec![],
            all: vec![AvailabilitySet {
                ids: vec!["vpc-1".into(), "vpc-2".into()],
                label: "main".to_string(),
                deprecated: false,
            }],
        };

        assert_eq!(
            availability.containing(&"vpc-2".into()).map(|s| s.label.as_str()),
            Some("main")
        );
        assert!(availability.containing(&"vpc-3".into()).is_none());
        assert!(availability.by_label("other").is_none());
    }

    #[test]
    fn test_draft_deserializes_with_missing_fields() {
        let draft: Draft =
            serde_json::from_str(r#"{"account_name": "prod", "regions": ["us-east-1"]}"#)
                .unwrap();
        assert!(draft.is_new());
        assert!(draft.has_coordinates());
        assert!(draft.vpc_id.is_none());
        assert!(draft.ingress_rules.is_empty());
    }

    #[test]
    fn test_rule_serialization_skips_empty_sources() {
        let json = serde_json::to_value(Rule::tcp(80, 80)).unwrap();
        assert!(json.get("source_name").is_none());

        let json = serde_json::to_value(Rule::from_group("web", "prod", 443).in_vpc("vpc-1"))
            .unwrap();
        assert_eq!(json["source_vpc_id"], "vpc-1");
    }
}
