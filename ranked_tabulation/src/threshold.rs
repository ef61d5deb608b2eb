//! Winning-threshold computation.

use crate::arithmetic::{ArithmeticOverflow, FixedDecimal};
use crate::config::TabulationRules;

/// Computes the vote total a candidate needs this round to be elected.
///
/// `active` is the weight currently held by continuing candidates and `seats`
/// the number of seats the tabulation is filling (always 1 for a
/// single-winner pass). The default quota is the whole-number Droop quota
/// `floor(active / (seats + 1)) + 1`; the Hare and non-integer variants keep
/// the quotient at the configured scale.
pub(crate) fn winning_threshold(
    active: &FixedDecimal,
    seats: u32,
    rules: &TabulationRules,
) -> Result<FixedDecimal, ArithmeticOverflow> {
    let scale = active.scale();
    if seats == 1 {
        let majority = active.floor_div_integer(2) + 1;
        return FixedDecimal::from_integer(u64::try_from(majority).map_err(|_| ArithmeticOverflow)?, scale);
    }
    if rules.hare_quota {
        let divisor = FixedDecimal::from_integer(seats as u64, scale)?;
        return active.div_truncating(&divisor);
    }
    if rules.non_integer_winning_threshold {
        let divisor = FixedDecimal::from_integer(seats as u64 + 1, scale)?;
        return active.div_truncating(&divisor);
    }
    let droop = active.floor_div_integer(seats as u64 + 1) + 1;
    FixedDecimal::from_integer(u64::try_from(droop).map_err(|_| ArithmeticOverflow)?, scale)
}
