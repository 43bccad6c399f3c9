//! VPC availability across regions
//!
//! VPC ids are region-scoped, so a logical VPC is the group of records that
//! share a label. [`LogicalVpcIndex`] builds that grouping from a catalog
//! snapshot; it is rebuilt for every resolution and never cached.

use secgroup_common::{Availability, AvailabilitySet, VpcId, VpcRecord};
use std::collections::HashMap;

/// Records of one account grouped by label, in first-appearance order
#[derive(Debug)]
pub struct LogicalVpcIndex<'a> {
    groups: Vec<(&'a str, Vec<&'a VpcRecord>)>,
}

impl<'a> LogicalVpcIndex<'a> {
    pub fn build(catalog: &'a [VpcRecord], account: &str) -> Self {
        let mut groups: Vec<(&'a str, Vec<&'a VpcRecord>)> = Vec::new();
        let mut positions: HashMap<&'a str, usize> = HashMap::new();

        for record in catalog.iter().filter(|r| r.account == account) {
            let position = *positions.entry(record.label.as_str()).or_insert_with(|| {
                groups.push((record.label.as_str(), Vec::new()));
                groups.len() - 1
            });
            groups[position].1.push(record);
        }

        Self { groups }
    }

    /// The id of the record labeled `label` in `region`, if any
    pub fn regional_id(&self, label: &str, region: &str) -> Option<&'a VpcId> {
        self.groups
            .iter()
            .find(|(l, _)| *l == label)
            .and_then(|(_, records)| records.iter().find(|r| r.region == region))
            .map(|r| &r.id)
    }

    /// Logical VPCs that have a record in every requested region
    pub fn available(&self, regions: &[String]) -> Vec<AvailabilitySet> {
        self.groups
            .iter()
            .filter(|(_, records)| {
                regions
                    .iter()
                    .all(|region| records.iter().any(|r| &r.region == region))
            })
            .map(|(label, records)| AvailabilitySet {
                ids: records
                    .iter()
                    .filter(|r| regions.contains(&r.region))
                    .map(|r| r.id.clone())
                    .collect(),
                label: label.to_string(),
                // Deprecation is read from the first record only
                deprecated: records[0].deprecated,
            })
            .collect()
    }
}

/// Compute the VPCs usable by `account` in all of `regions`
pub fn resolve(catalog: &[VpcRecord], account: &str, regions: &[String]) -> Availability {
    let all = LogicalVpcIndex::build(catalog, account).available(regions);
    let (deprecated, active): (Vec<_>, Vec<_>) =
        all.iter().cloned().partition(|set| set.deprecated);

    Availability {
        active,
        deprecated,
        all,
    }
}
