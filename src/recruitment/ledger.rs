//! Per-role open-slot counters and the derived recruiting flag.
//!
//! Counters only rise when a create/update request sets new absolute values.
//! Approvals take one slot away, flooring at zero.

use crate::errors::AppError;
use crate::models::{RecruitmentCounters, Role};

/// Counters together with the stored recruiting flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecruitmentState {
    pub counters: RecruitmentCounters,
    pub is_recruited: bool,
}

/// Validate requested counters and derive the flag.
///
/// A zero total forces `is_recruited = false` whatever the caller asked for.
pub fn check_and_normalize(
    counters: RecruitmentCounters,
    requested_recruited: bool,
) -> Result<RecruitmentState, AppError> {
    let total = counters.total();
    if total < 0 {
        return Err(AppError::NegativeRecruitment(total));
    }

    Ok(RecruitmentState {
        counters,
        is_recruited: requested_recruited && total > 0,
    })
}

/// Take one slot for `role` after an approval.
///
/// Approval is never refused here: a role already at zero stays at zero.
/// The persistence layer runs the same rule as a guarded UPDATE.
pub fn apply_approval(state: RecruitmentState, role: Role) -> RecruitmentState {
    let mut counters = state.counters;
    let slot = counters.get_mut(role);
    if *slot > 0 {
        *slot -= 1;
    }

    RecruitmentState {
        is_recruited: state.is_recruited && counters.total() > 0,
        counters,
    }
}
