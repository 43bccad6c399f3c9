//! Reference data for the standard two-region scenario
//!
//! Account `prod` spans `us-east-1` and `us-west-2`:
//!
//! | label    | us-east-1 | us-west-2 | deprecated |
//! |----------|-----------|-----------|------------|
//! | `main`   | `vpc-1`   | `vpc-2`   | no         |
//! | `other`  | `vpc-3`   |           | no         |
//! | `legacy` | `vpc-4`   | `vpc-5`   | yes        |
//!
//! Account `test` has a single `shared` VPC in `us-east-1`.

use secgroup_common::{
    ApplicationContext, Draft, SecurityGroupCatalog, SecurityGroupSummary, VpcRecord,
};
use std::collections::BTreeMap;

pub const ACCOUNT: &str = "prod";
pub const OTHER_ACCOUNT: &str = "test";
pub const EAST: &str = "us-east-1";
pub const WEST: &str = "us-west-2";
pub const APPLICATION: &str = "app";

pub fn scenario_vpcs() -> Vec<VpcRecord> {
    vec![
        VpcRecord::new("vpc-1", "main", ACCOUNT, EAST),
        VpcRecord::new("vpc-2", "main", ACCOUNT, WEST),
        VpcRecord::new("vpc-3", "other", ACCOUNT, EAST),
        VpcRecord::new("vpc-4", "legacy", ACCOUNT, EAST).deprecated(),
        VpcRecord::new("vpc-5", "legacy", ACCOUNT, WEST).deprecated(),
        VpcRecord::new("vpc-6", "shared", OTHER_ACCOUNT, EAST),
    ]
}

/// Security groups under the `aws` provider.
///
/// `web` exists in `main` in both regions, `db` only in `us-east-1`,
/// `legacy-sg` only in the deprecated `legacy` VPC, `old-classic` in classic
/// networking in both regions.
pub fn scenario_catalog() -> SecurityGroupCatalog {
    let mut catalog = SecurityGroupCatalog::new();
    for (region, name, vpc) in [
        (EAST, "web", Some("vpc-1")),
        (EAST, "db", Some("vpc-1")),
        (EAST, "batch", Some("vpc-3")),
        (EAST, "legacy-sg", Some("vpc-4")),
        (EAST, "old-classic", None),
        (WEST, "web", Some("vpc-2")),
        (WEST, "legacy-sg", Some("vpc-5")),
        (WEST, "old-classic", None),
    ] {
        catalog.insert(ACCOUNT, "aws", region, SecurityGroupSummary::new(name, vpc));
    }
    catalog.insert(
        OTHER_ACCOUNT,
        "aws",
        EAST,
        SecurityGroupSummary::new("shared-web", Some("vpc-6")),
    );
    catalog
}

pub fn scenario_accounts() -> Vec<String> {
    vec![ACCOUNT.to_string(), OTHER_ACCOUNT.to_string()]
}

pub fn scenario_regions() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        (ACCOUNT.to_string(), vec![EAST.to_string(), WEST.to_string()]),
        (OTHER_ACCOUNT.to_string(), vec![EAST.to_string()]),
    ])
}

/// A new draft in `prod` spanning both regions
pub fn scenario_draft() -> Draft {
    Draft::new(ACCOUNT, &[EAST, WEST])
}

pub fn application(create_ts: i64) -> ApplicationContext {
    ApplicationContext::new(APPLICATION, create_ts)
}

/// Region list helper
pub fn regions(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
