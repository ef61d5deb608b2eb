//! Vote transfer bookkeeping.
//!
//! An eliminated candidate transfers whole ballots: every ballot that counted
//! for them keeps its weight and is re-read against the next round's
//! continuing set. An elected candidate with a surplus transfers fractional
//! ballots: every ballot is scaled by `surplus / tally`, truncated at the
//! contest scale, and the truncated remainder is booked as residual.

use crate::arithmetic::{ArithmeticOverflow, FixedDecimal};
use crate::record::TransferRecord;
use crate::{CandidateId, Registry};
use std::collections::BTreeMap;

/// The per-ballot fraction for a surplus transfer, `(tally - threshold) /
/// tally`, truncated at the scale.
pub(crate) fn surplus_fraction(
    tally: &FixedDecimal,
    threshold: &FixedDecimal,
) -> Result<FixedDecimal, ArithmeticOverflow> {
    debug_assert!(tally >= threshold);
    (*tally - *threshold).div_truncating(tally)
}

/// Accumulates where the votes of one candidate went during a transfer.
pub(crate) struct TransferLedger {
    from: CandidateId,
    to: BTreeMap<CandidateId, FixedDecimal>,
    exhausted: FixedDecimal,
    /// Weight that left the source but reached no destination (truncation).
    residual: FixedDecimal,
    scale: u8,
}

impl TransferLedger {
    pub(crate) fn new(from: CandidateId, scale: u8) -> TransferLedger {
        TransferLedger {
            from,
            to: BTreeMap::new(),
            exhausted: FixedDecimal::zero(scale),
            residual: FixedDecimal::zero(scale),
            scale,
        }
    }

    pub(crate) fn credit(&mut self, destination: CandidateId, weight: FixedDecimal) {
        if weight.is_zero() {
            return;
        }
        let entry = self
            .to
            .entry(destination)
            .or_insert_with(|| FixedDecimal::zero(self.scale));
        *entry += weight;
    }

    pub(crate) fn exhaust(&mut self, weight: FixedDecimal) {
        self.exhausted += weight;
    }

    pub(crate) fn add_residual(&mut self, weight: FixedDecimal) {
        self.residual += weight;
    }

    pub(crate) fn into_record(self, registry: &Registry) -> TransferRecord {
        let mut to: Vec<(String, FixedDecimal)> = self
            .to
            .into_iter()
            .map(|(cid, weight)| (registry.name(cid).to_string(), weight))
            .collect();
        to.sort_by(|a, b| a.0.cmp(&b.0));
        TransferRecord {
            from: registry.name(self.from).to_string(),
            to,
            exhausted: self.exhausted,
            residual: self.residual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fd(text: &str) -> FixedDecimal {
        FixedDecimal::parse_with_scale(text, 4).unwrap()
    }

    #[test]
    fn fraction_matches_the_truncated_quotient() {
        // Surplus 2 over a tally of 6: 0.3333 at scale 4.
        assert_eq!(fd("0.3333"), surplus_fraction(&fd("6"), &fd("4")).unwrap());
        // No surplus: fraction 0.
        assert_eq!(fd("0"), surplus_fraction(&fd("4"), &fd("4")).unwrap());
    }

    #[test]
    fn ledger_accumulates_per_destination() {
        let registry = Registry::toy(&["A", "B", "C"]);
        let mut ledger = TransferLedger::new(CandidateId(0), 4);
        ledger.credit(CandidateId(1), fd("1.5"));
        ledger.credit(CandidateId(1), fd("0.5"));
        ledger.credit(CandidateId(2), fd("1"));
        ledger.exhaust(fd("0.25"));
        ledger.add_residual(fd("0.0002"));
        let record = ledger.into_record(&registry);
        assert_eq!("A", record.from);
        assert_eq!(
            vec![("B".to_string(), fd("2")), ("C".to_string(), fd("1"))],
            record.to
        );
        assert_eq!(fd("0.25"), record.exhausted);
        assert_eq!(fd("0.0002"), record.residual);
    }

    #[test]
    fn zero_credits_are_not_recorded() {
        let registry = Registry::toy(&["A", "B"]);
        let mut ledger = TransferLedger::new(CandidateId(0), 4);
        ledger.credit(CandidateId(1), fd("0"));
        let record = ledger.into_record(&registry);
        assert!(record.to.is_empty());
    }
}
