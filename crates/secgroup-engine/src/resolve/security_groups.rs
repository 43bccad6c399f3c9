//! Security-group availability across regions

use super::availability::LogicalVpcIndex;
use crate::error::DraftError;
use secgroup_common::{AvailabilityIndex, SecurityGroupCatalog, VpcId, VpcRecord};
use std::collections::BTreeSet;

/// Coordinates an index is computed for
#[derive(Debug, Clone, Copy)]
pub struct IndexQuery<'a> {
    pub provider: &'a str,
    pub account: &'a str,
    pub regions: &'a [String],
    pub vpc_id: Option<&'a VpcId>,
}

/// Map the selected VPC onto its id in each requested region.
///
/// Classic drafts map to `None` everywhere. For a VPC the logical label is
/// looked up once and re-resolved per region, since ids differ by region.
fn regional_vpc_ids(
    vpcs: &[VpcRecord],
    query: &IndexQuery<'_>,
) -> Result<Vec<Option<VpcId>>, DraftError> {
    let Some(vpc_id) = query.vpc_id else {
        return Ok(vec![None; query.regions.len()]);
    };

    let base = vpcs
        .iter()
        .find(|r| &r.id == vpc_id)
        .ok_or_else(|| DraftError::UnknownVpc {
            vpc_id: vpc_id.clone(),
        })?;
    let logical = LogicalVpcIndex::build(vpcs, query.account);

    query
        .regions
        .iter()
        .map(|region| {
            logical
                .regional_id(&base.label, region)
                .cloned()
                .map(Some)
                .ok_or_else(|| DraftError::VpcLookup {
                    account: query.account.to_string(),
                    region: region.clone(),
                    label: base.label.clone(),
                })
        })
        .collect()
}

/// Compute which security-group names exist in, and are available across,
/// the requested regions under the selected VPC.
pub fn index(
    vpcs: &[VpcRecord],
    catalog: &SecurityGroupCatalog,
    query: IndexQuery<'_>,
) -> Result<AvailabilityIndex, DraftError> {
    let regional_ids = regional_vpc_ids(vpcs, &query)?;

    let mut existing_names = BTreeSet::new();
    let mut available_names: Option<BTreeSet<String>> = None;

    for (region, regional_id) in query.regions.iter().zip(&regional_ids) {
        let names = catalog.names_in_vpc(
            query.account,
            query.provider,
            region,
            regional_id.as_ref(),
        );
        existing_names.extend(names.iter().cloned());
        available_names = Some(match available_names {
            None => names,
            Some(available) => available.intersection(&names).cloned().collect(),
        });
    }

    Ok(AvailabilityIndex {
        existing_names,
        available_names: available_names.unwrap_or_default(),
    })
}
