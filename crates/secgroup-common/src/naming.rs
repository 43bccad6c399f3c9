//! Security-group name rules

use crate::model::VpcId;
use regex::Regex;
use std::sync::LazyLock;

static VPC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9\s._\-:/()#,@\[\]+=&;{}!$*]+$").expect("valid VPC name pattern")
});

static CLASSIC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x00-\x7F]+$").expect("valid classic name pattern"));

/// Which name pattern applies to a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    /// Names inside a VPC: alphanumerics, whitespace and a fixed punctuation set
    Vpc,
    /// Classic names: any 7-bit ASCII
    Classic,
}

impl NamePattern {
    /// Select the pattern from the draft's VPC
    pub fn for_vpc(vpc_id: Option<&VpcId>) -> Self {
        match vpc_id {
            Some(_) => NamePattern::Vpc,
            None => NamePattern::Classic,
        }
    }

    pub fn matches(self, name: &str) -> bool {
        match self {
            NamePattern::Vpc => VPC_PATTERN.is_match(name),
            NamePattern::Classic => CLASSIC_PATTERN.is_match(name),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NamePattern::Vpc => VPC_PATTERN.as_str(),
            NamePattern::Classic => CLASSIC_PATTERN.as_str(),
        }
    }
}

/// Build a cluster-style name: `app`, `app-stack`, `app-stack-detail` or `app--detail`
pub fn cluster_name(application: &str, stack: Option<&str>, detail: Option<&str>) -> String {
    let stack = stack.filter(|s| !s.is_empty());
    let detail = detail.filter(|d| !d.is_empty());

    let mut name = application.to_string();
    if let Some(stack) = stack {
        name.push('-');
        name.push_str(stack);
    }
    if let Some(detail) = detail {
        if stack.is_none() {
            name.push('-');
        }
        name.push('-');
        name.push_str(detail);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pattern_follows_vpc_presence() {
        assert_eq!(NamePattern::for_vpc(None), NamePattern::Classic);
        assert_eq!(NamePattern::for_vpc(Some(&VpcId::from("vpc-1"))), NamePattern::Vpc);
    }

    #[test]
    fn test_vpc_pattern() {
        assert!(NamePattern::Vpc.matches("app-stack_1.0 (web) #2"));
        assert!(NamePattern::Vpc.matches("a:b/c,d@e[f]+g=h&i;j{k}!l$m*"));
        assert!(!NamePattern::Vpc.matches(""));
        assert!(!NamePattern::Vpc.matches("caf\u{e9}"));
        assert!(!NamePattern::Vpc.matches("quote\"d"));
        assert!(!NamePattern::Vpc.matches("percent%"));
    }

    #[test]
    fn test_classic_pattern() {
        assert!(NamePattern::Classic.matches("quote\"d %"));
        assert!(!NamePattern::Classic.matches(""));
        assert!(!NamePattern::Classic.matches("caf\u{e9}"));
    }

    #[test]
    fn test_cluster_name() {
        assert_eq!(cluster_name("app", None, None), "app");
        assert_eq!(cluster_name("app", Some("prod"), None), "app-prod");
        assert_eq!(cluster_name("app", Some("prod"), Some("v2")), "app-prod-v2");
        assert_eq!(cluster_name("app", None, Some("v2")), "app--v2");
        assert_eq!(cluster_name("app", Some(""), Some("")), "app");
    }

    proptest! {
        /// Every VPC-valid name is also classic-valid
        #[test]
        fn vpc_names_are_classic_names(name in "[a-zA-Z0-9 ._:/()#,@+=&;{}!$*-]{1,40}") {
            prop_assert!(NamePattern::Vpc.matches(&name));
            prop_assert!(NamePattern::Classic.matches(&name));
        }
    }
}
