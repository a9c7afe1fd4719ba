//! Root-finding for the 1099 gross income that matches a W-2 net income.
//!
//! The search doubles an upper bound until the net function reaches the
//! target, then bisects. Net income can dip locally as income rises (the
//! child credit phase-out takes credit away faster than income adds), so the
//! answer is reported from the side that meets or beats the target.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::calculations::common::round_half_up;

const MAX_DOUBLINGS: u32 = 12;
const BISECTION_STEPS: u32 = 30;
const MIN_UPPER_BOUND: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakEven {
    /// 1099 gross income whose net income matches the target.
    pub income_1099: Decimal,
    pub target_net_income: Decimal,
    /// Net income at `income_1099`.
    pub net_income: Decimal,
    /// `false` when doubling never reached the target; `income_1099` is then
    /// the last upper bound tried.
    pub converged: bool,
}

/// Finds `x` with `net(x) ≈ target`, starting the upper bound at
/// `max(initial_upper, 1,000)`.
///
/// # Errors
///
/// Whatever `net` returns.
pub fn search<E>(
    target: Decimal,
    initial_upper: Decimal,
    mut net: impl FnMut(Decimal) -> Result<Decimal, E>,
) -> Result<BreakEven, E> {
    let mut low = Decimal::ZERO;
    let mut high = initial_upper.max(MIN_UPPER_BOUND);
    let mut high_net = net(high)?;

    let mut doublings = 0;
    while high_net <= target && doublings < MAX_DOUBLINGS {
        low = high;
        high *= Decimal::TWO;
        high_net = net(high)?;
        doublings += 1;
    }

    if high_net <= target {
        warn!(
            target = %target,
            upper_bound = %high,
            "Break-even search did not reach the target"
        );
        return Ok(BreakEven {
            income_1099: round_half_up(high),
            target_net_income: target,
            net_income: high_net,
            converged: false,
        });
    }

    for _ in 0..BISECTION_STEPS {
        let mid = (low + high) / Decimal::TWO;
        if net(mid)? < target {
            low = mid;
        } else {
            high = mid;
        }
    }

    let income_1099 = round_half_up(high);
    let net_income = net(income_1099)?;
    debug!(
        target = %target,
        income_1099 = %income_1099,
        doublings,
        "Break-even found"
    );

    Ok(BreakEven {
        income_1099,
        target_net_income: target,
        net_income,
        converged: true,
    })
}
