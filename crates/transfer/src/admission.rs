//! Client-side admission control.
//!
//! Estimates whether a transfer fits the store's storage ceiling and
//! spendable balance before any bytes are sent. The check is advisory: a
//! concurrent spender can still drain the balance, and the store re-checks
//! authoritatively on every write.

use stowage_protocol::BoxState;

const GIB: u128 = 1024 * 1024 * 1024;

/// Default storage ceiling: 40 GiB.
pub const DEFAULT_STORAGE_CEILING: u64 = 40 * 1024 * 1024 * 1024;

/// Cost constants, in the store's cost unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    /// One-time cost per byte written.
    pub byte_write_cost: u128,
    /// Fixed cost per ingress message (one per chunk).
    pub ingress_message_cost: u128,
    /// Storage rent per GiB per second.
    pub gib_second_rent: u128,
    /// Retention horizon the rent is prepaid for, in seconds.
    pub retention_secs: u64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            byte_write_cost: 2_260,
            ingress_message_cost: 1_200_000,
            gib_second_rent: 127_000,
            retention_secs: 40 * 24 * 60 * 60,
        }
    }
}

/// Admission parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    /// Exclusive upper bound on total store usage, in bytes.
    pub storage_ceiling: u64,
    pub cost: CostModel,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            storage_ceiling: DEFAULT_STORAGE_CEILING,
            cost: CostModel::default(),
        }
    }
}

/// Cost estimate for a pending transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionQuote {
    pub current_usage_bytes: u64,
    pub incoming_bytes: u64,
    pub cost_estimate: u128,
    pub available_budget: u128,
}

impl AdmissionQuote {
    /// Exact deficit, if the estimate exceeds the budget.
    pub fn shortfall(&self) -> Option<u128> {
        self.cost_estimate
            .checked_sub(self.available_budget)
            .filter(|deficit| *deficit > 0)
    }

    /// Store usage after the transfer lands.
    pub fn final_usage_bytes(&self) -> u64 {
        self.current_usage_bytes.saturating_add(self.incoming_bytes)
    }
}

/// Reasons a transfer is refused before it starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    #[error("storage ceiling exceeded: {used} used + {incoming} incoming >= {ceiling}")]
    CapacityExceeded {
        used: u64,
        incoming: u64,
        ceiling: u64,
    },

    #[error("insufficient budget: top up by at least {shortfall}")]
    InsufficientBudget { shortfall: u128, quote: AdmissionQuote },
}

/// Computes the cost estimate without deciding admission.
pub fn quote(
    chunk_count: u64,
    chunk_size_bound: usize,
    state: &BoxState,
    policy: &AdmissionPolicy,
) -> AdmissionQuote {
    let incoming_bytes = chunk_count.saturating_mul(chunk_size_bound as u64);
    let current_usage_bytes = state.used_bytes();
    let final_bytes = current_usage_bytes.saturating_add(incoming_bytes) as u128;
    let cost = &policy.cost;

    // Saturates on absurd cost constants; a saturated estimate is never
    // affordable.
    let rent = final_bytes
        .saturating_mul(cost.gib_second_rent)
        .saturating_mul(cost.retention_secs as u128)
        / GIB;
    let write = (incoming_bytes as u128).saturating_mul(cost.byte_write_cost);
    let ingress = (chunk_count as u128).saturating_mul(cost.ingress_message_cost);

    AdmissionQuote {
        current_usage_bytes,
        incoming_bytes,
        cost_estimate: rent.saturating_add(write).saturating_add(ingress),
        available_budget: state.balance,
    }
}

/// Decides whether `chunk_count` chunks of at most `chunk_size_bound` bytes
/// may be sent to a store in `state`.
pub fn check_admission(
    chunk_count: u64,
    chunk_size_bound: usize,
    state: &BoxState,
    policy: &AdmissionPolicy,
) -> Result<AdmissionQuote, AdmissionError> {
    let quote = quote(chunk_count, chunk_size_bound, state, policy);

    if quote.final_usage_bytes() >= policy.storage_ceiling {
        return Err(AdmissionError::CapacityExceeded {
            used: quote.current_usage_bytes,
            incoming: quote.incoming_bytes,
            ceiling: policy.storage_ceiling,
        });
    }

    if let Some(shortfall) = quote.shortfall() {
        return Err(AdmissionError::InsufficientBudget { shortfall, quote });
    }

    Ok(quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(used: u64, balance: u128) -> BoxState {
        BoxState {
            memory_size: used,
            stable_memory_size: 0,
            balance,
        }
    }

    fn rich() -> u128 {
        u128::MAX / 2
    }

    #[test]
    fn incoming_is_count_times_bound() {
        let q = quote(3, 1000, &state(0, 0), &AdmissionPolicy::default());
        assert_eq!(q.incoming_bytes, 3000);
        assert_eq!(q.current_usage_bytes, 0);
    }

    #[test]
    fn three_term_cost() {
        let policy = AdmissionPolicy::default();
        let q = quote(2, 1024, &state(GIB as u64 - 2048, 0), &policy);
        // Final usage is exactly 1 GiB.
        let rent = 127_000u128 * 40 * 24 * 60 * 60;
        let write = 2048u128 * 2_260;
        let ingress = 2u128 * 1_200_000;
        assert_eq!(q.cost_estimate, rent + write + ingress);
    }

    #[test]
    fn ceiling_is_exclusive() {
        let policy = AdmissionPolicy {
            storage_ceiling: 10_000,
            cost: CostModel::default(),
        };

        // used + incoming == ceiling fails.
        let err = check_admission(1, 1000, &state(9_000, rich()), &policy).unwrap_err();
        assert_eq!(
            err,
            AdmissionError::CapacityExceeded {
                used: 9_000,
                incoming: 1000,
                ceiling: 10_000
            }
        );

        // One byte under passes.
        assert!(check_admission(1, 1000, &state(8_999, rich()), &policy).is_ok());
    }

    #[test]
    fn shortfall_is_exact() {
        let policy = AdmissionPolicy::default();
        let needed = quote(3, 1000, &state(0, 0), &policy).cost_estimate;

        let err = check_admission(3, 1000, &state(0, needed - 17), &policy).unwrap_err();
        match &err {
            AdmissionError::InsufficientBudget { shortfall, quote } => {
                assert_eq!(*shortfall, 17);
                assert_eq!(quote.cost_estimate, needed);
                assert!(err.to_string().contains("17"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exact_budget_is_admitted() {
        let policy = AdmissionPolicy::default();
        let needed = quote(3, 1000, &state(0, 0), &policy).cost_estimate;
        let q = check_admission(3, 1000, &state(0, needed), &policy).unwrap();
        assert_eq!(q.shortfall(), None);
    }

    #[test]
    fn capacity_checked_before_budget() {
        let policy = AdmissionPolicy {
            storage_ceiling: 100,
            cost: CostModel::default(),
        };
        let err = check_admission(1, 1000, &state(0, 0), &policy).unwrap_err();
        assert!(matches!(err, AdmissionError::CapacityExceeded { .. }));
    }

    #[test]
    fn extreme_costs_saturate_instead_of_overflowing() {
        let policy = AdmissionPolicy {
            storage_ceiling: u64::MAX,
            cost: CostModel {
                byte_write_cost: u128::MAX,
                ingress_message_cost: u128::MAX,
                gib_second_rent: u128::MAX,
                retention_secs: u64::MAX,
            },
        };
        let err = check_admission(4, 1000, &state(GIB as u64, rich()), &policy).unwrap_err();
        match err {
            AdmissionError::InsufficientBudget { quote, .. } => {
                assert_eq!(quote.cost_estimate, u128::MAX);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stable_memory_counts_as_usage() {
        let s = BoxState {
            memory_size: 100,
            stable_memory_size: 50,
            balance: 0,
        };
        let q = quote(1, 10, &s, &AdmissionPolicy::default());
        assert_eq!(q.current_usage_bytes, 150);
        assert_eq!(q.final_usage_bytes(), 160);
    }
}
