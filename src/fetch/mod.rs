//! Fetch - resolve one document under a cache policy.
//!
//! Three sources can satisfy a read: the process-wide [`Store`](crate::Store),
//! the remote store's device-persistent cache, and the server. The
//! [`CachePolicy`] picks which are consulted:
//!
//! | Policy        | Process cache      | Remote read        | Completions |
//! |---------------|--------------------|--------------------|-------------|
//! | `Default`     | yes, synchronously | `Source::Default`  | up to two   |
//! | `CacheOnly`   | yes, synchronously | `Source::Cache`    | up to two   |
//! | `NetworkOnly` | no                 | `Source::Server`   | exactly one |
//!
//! When both legs fire, the process-cache completion always runs first,
//! before `get` returns. Callers must tolerate the second completion.

mod resolver;

use serde::{Deserialize, Serialize};

use crate::remote::Source;

/// How a read is satisfied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CachePolicy {
    /// Process cache if populated, plus the remote store's default tier.
    #[default]
    Default,
    /// Process cache if populated, plus the device-persistent cache.
    CacheOnly,
    /// Server only.
    NetworkOnly,
}

impl CachePolicy {
    /// Whether the process-wide store is consulted first.
    pub fn consults_store(self) -> bool {
        !matches!(self, CachePolicy::NetworkOnly)
    }

    /// The remote tier read under this policy.
    pub fn source(self) -> Source {
        match self {
            CachePolicy::Default => Source::Default,
            CachePolicy::CacheOnly => Source::Cache,
            CachePolicy::NetworkOnly => Source::Server,
        }
    }
}

pub(crate) use resolver::settle;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policies_map_to_tiers() {
        assert_eq!(CachePolicy::Default.source(), Source::Default);
        assert_eq!(CachePolicy::CacheOnly.source(), Source::Cache);
        assert_eq!(CachePolicy::NetworkOnly.source(), Source::Server);
        assert!(CachePolicy::CacheOnly.consults_store());
        assert!(!CachePolicy::NetworkOnly.consults_store());
    }

    #[test]
    fn serializes_in_camel_case() {
        assert_eq!(
            serde_json::to_string(&CachePolicy::NetworkOnly).unwrap(),
            "\"networkOnly\""
        );
        let policy: CachePolicy = serde_json::from_str("\"cacheOnly\"").unwrap();
        assert_eq!(policy, CachePolicy::CacheOnly);
        assert_eq!(CachePolicy::default(), CachePolicy::Default);
    }
}
