// Plan → quota. Pure function, consumed by the host — never invoked
// from the engine itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Basic,
    Advanced,
}

/// Monthly export quota. `unlimited` is represented as `limit: 0` with
/// `unlimited: true` rather than overloading `limit: 0` to mean
/// two different things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub limit: u32,
    pub unlimited: bool,
}

impl Quota {
    pub fn allows(&self, exports_this_month: u32) -> bool {
        self.unlimited || exports_this_month < self.limit
    }
}

pub fn quota_for_plan(plan: Plan) -> Quota {
    match plan {
        Plan::Free => Quota {
            limit: 3,
            unlimited: false,
        },
        Plan::Basic => Quota {
            limit: 100,
            unlimited: false,
        },
        Plan::Advanced => Quota {
            limit: 0,
            unlimited: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_limits_are_correct() {
        assert_eq!(quota_for_plan(Plan::Free).limit, 3);
        assert_eq!(quota_for_plan(Plan::Basic).limit, 100);
        assert!(quota_for_plan(Plan::Advanced).unlimited);
    }

    #[test]
    fn unlimited_always_allows() {
        let q = quota_for_plan(Plan::Advanced);
        assert!(q.allows(1_000_000));
    }

    #[test]
    fn limited_plan_blocks_at_cap() {
        let q = quota_for_plan(Plan::Free);
        assert!(q.allows(2));
        assert!(!q.allows(3));
    }
}
