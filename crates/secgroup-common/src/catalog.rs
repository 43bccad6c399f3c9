//! Security-group catalog snapshot
//!
//! The catalog is keyed account → provider → region and lists the groups in
//! each region together with the VPC they belong to. Ordered maps keep every
//! derived result independent of insertion order.

use crate::model::VpcId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A security group as listed in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupSummary {
    pub name: String,
    #[serde(default)]
    pub vpc_id: Option<VpcId>,
}

impl SecurityGroupSummary {
    pub fn new(name: impl Into<String>, vpc_id: Option<&str>) -> Self {
        Self {
            name: name.into(),
            vpc_id: vpc_id.map(VpcId::from),
        }
    }
}

type RegionMap = BTreeMap<String, Vec<SecurityGroupSummary>>;
type ProviderMap = BTreeMap<String, RegionMap>;

/// Read-only snapshot of every known security group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityGroupCatalog(BTreeMap<String, ProviderMap>);

impl SecurityGroupCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Groups in one account/provider/region, empty when the path is unknown
    pub fn regional(&self, account: &str, provider: &str, region: &str) -> &[SecurityGroupSummary] {
        self.0
            .get(account)
            .and_then(|providers| providers.get(provider))
            .and_then(|regions| regions.get(region))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Names of the groups in one region that belong to `vpc_id`
    ///
    /// `None` selects classic (non-VPC) groups.
    pub fn names_in_vpc(
        &self,
        account: &str,
        provider: &str,
        region: &str,
        vpc_id: Option<&VpcId>,
    ) -> BTreeSet<String> {
        self.regional(account, provider, region)
            .iter()
            .filter(|sg| sg.vpc_id.as_ref() == vpc_id)
            .map(|sg| sg.name.clone())
            .collect()
    }

    /// Add a group to the snapshot (used when building catalogs)
    pub fn insert(
        &mut self,
        account: &str,
        provider: &str,
        region: &str,
        group: SecurityGroupSummary,
    ) {
        self.0
            .entry(account.to_string())
            .or_default()
            .entry(provider.to_string())
            .or_default()
            .entry(region.to_string())
            .or_default()
            .push(group);
    }
}

/// Security-group names visible to the draft
///
/// `existing_names` is the union over the requested regions and gates
/// duplicate-name checks. `available_names` is the intersection and gates
/// which groups an ingress rule may reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityIndex {
    pub existing_names: BTreeSet<String>,
    pub available_names: BTreeSet<String>,
}

impl AvailabilityIndex {
    pub fn is_available(&self, name: &str) -> bool {
        self.available_names.contains(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.existing_names.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SecurityGroupCatalog {
        let mut catalog = SecurityGroupCatalog::new();
        catalog.insert("prod", "aws", "us-east-1", SecurityGroupSummary::new("web", Some("vpc-1")));
        catalog.insert("prod", "aws", "us-east-1", SecurityGroupSummary::new("db", Some("vpc-1")));
        catalog.insert("prod", "aws", "us-east-1", SecurityGroupSummary::new("legacy", None));
        catalog
    }

    #[test]
    fn test_regional_unknown_path_is_empty() {
        let catalog = catalog();
        assert!(catalog.regional("test", "aws", "us-east-1").is_empty());
        assert!(catalog.regional("prod", "gce", "us-east-1").is_empty());
        assert!(catalog.regional("prod", "aws", "eu-west-1").is_empty());
        assert_eq!(catalog.regional("prod", "aws", "us-east-1").len(), 3);
    }

    #[test]
    fn test_names_in_vpc_filters_by_vpc() {
        let catalog = catalog();
        let vpc = VpcId::from("vpc-1");
        let names = catalog.names_in_vpc("prod", "aws", "us-east-1", Some(&vpc));
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["db", "web"]);

        let classic = catalog.names_in_vpc("prod", "aws", "us-east-1", None);
        assert_eq!(classic.into_iter().collect::<Vec<_>>(), vec!["legacy"]);
    }

    #[test]
    fn test_catalog_json_shape() {
        let json = r#"{
            "prod": {
                "aws": {
                    "us-east-1": [
                        {"name": "web", "vpc_id": "vpc-1"},
                        {"name": "legacy"}
                    ]
                }
            }
        }"#;
        let catalog: SecurityGroupCatalog = serde_json::from_str(json).unwrap();
        let groups = catalog.regional("prod", "aws", "us-east-1");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].vpc_id, None);
    }
}
