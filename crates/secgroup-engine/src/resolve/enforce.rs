//! Ingress rule consistency

use secgroup_common::{AvailabilityIndex, RemovedRules, Rule, VpcId};
use tracing::debug;

/// The draft coordinates rules are checked against
#[derive(Debug, Clone, Copy)]
pub struct RuleScope<'a> {
    pub account: &'a str,
    pub vpc_id: Option<&'a VpcId>,
}

/// Outcome of one enforcement pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enforcement {
    /// Rules that survived, in their original order
    pub rules: Vec<Rule>,
    /// Names removed by this pass (already appended to the ledger)
    pub removed: Vec<String>,
}

impl Enforcement {
    pub fn removed_any(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// True when the rule points at a group outside the draft's own account/VPC
fn is_foreign(rule: &Rule, scope: RuleScope<'_>) -> bool {
    if rule.source_account_name.as_deref() != Some(scope.account) {
        return true;
    }
    matches!(&rule.source_vpc_id, Some(vpc) if Some(vpc) != scope.vpc_id)
}

/// Drop referential rules whose source group is no longer available.
///
/// Foreign rules (other account or other VPC) and literal rules are always
/// kept. A rule naming a group already in the ledger is left alone, so a name
/// is recorded at most once per session.
///
/// This includes duplicates within one pass: of several rules naming the same
/// unavailable group, only the first is removed and the rest are kept. They
/// stay visible so the user can see the group is still referenced; dismissing
/// the ledger lets the next cascade remove them.
pub fn enforce(
    rules: &[Rule],
    scope: RuleScope<'_>,
    index: &AvailabilityIndex,
    ledger: &mut RemovedRules,
) -> Enforcement {
    let mut enforcement = Enforcement::default();

    for rule in rules {
        let remove = match &rule.source_name {
            Some(name) if !is_foreign(rule, scope) => {
                !index.is_available(name) && ledger.record(name)
            }
            _ => false,
        };

        if remove {
            if let Some(name) = &rule.source_name {
                debug!(source = %name, account = %scope.account, "Removing rule for unavailable group");
                enforcement.removed.push(name.clone());
            }
        } else {
            enforcement.rules.push(rule.clone());
        }
    }

    enforcement
}
