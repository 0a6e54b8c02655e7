//! # Progressive Bracket Schedules
//!
//! A [`BracketSchedule`] is an ordered list of `(lower_bound, rate)` pairs
//! with strictly ascending lower bounds; the last bracket is open-ended.
//!
//! Liability for a base amount is the sum over brackets whose lower bound is
//! strictly below the base of
//! `(min(base, next_lower_bound) - lower_bound) * rate`. A base at or below
//! the first lower bound yields exactly zero, so the first bound doubles as
//! the exemption threshold.
//!
//! ## Invariant
//!
//! Because each slice ends exactly where the next begins and rates are
//! non-negative, liability is continuous, piecewise linear and
//! non-decreasing in the base.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// One marginal bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// Amounts strictly above this bound are taxed at `rate`.
    pub lower_bound: Decimal,
    /// Marginal rate as a fraction (`0.005` is 0.5 %).
    pub rate: Decimal,
}

impl Bracket {
    /// Bracket with a fractional rate.
    pub fn new(lower_bound: Decimal, rate: Decimal) -> Self {
        Self { lower_bound, rate }
    }

    /// Bracket with a rate given in percent.
    pub fn percent(lower_bound: Decimal, percent: Decimal) -> Self {
        Self {
            lower_bound,
            rate: percent / Decimal::ONE_HUNDRED,
        }
    }
}

/// A validated, ascending list of brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketSchedule {
    brackets: Vec<Bracket>,
}

impl BracketSchedule {
    /// Build a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] when the list is empty, a bound or rate is
    /// negative, or bounds are not strictly ascending.
    pub fn new(brackets: Vec<Bracket>) -> Result<Self, ScheduleError> {
        if brackets.is_empty() {
            return Err(ScheduleError::Empty);
        }
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.lower_bound < Decimal::ZERO || bracket.rate < Decimal::ZERO {
                return Err(ScheduleError::Negative { index });
            }
            if index > 0 && bracket.lower_bound <= brackets[index - 1].lower_bound {
                return Err(ScheduleError::NotAscending { index });
            }
        }
        Ok(Self { brackets })
    }

    /// Schedule from brackets already known to be valid.
    pub(crate) fn from_ascending(brackets: Vec<Bracket>) -> Self {
        debug_assert!(Self::new(brackets.clone()).is_ok());
        Self { brackets }
    }

    /// The brackets, lowest first.
    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    /// Lower bound of the first bracket; liability is zero at or below it.
    pub fn exemption_threshold(&self) -> Decimal {
        self.brackets
            .first()
            .map(|b| b.lower_bound)
            .unwrap_or(Decimal::ZERO)
    }

    /// Progressive marginal liability for `base`.
    pub fn liability(&self, base: Decimal) -> Decimal {
        if base <= self.exemption_threshold() {
            return Decimal::ZERO;
        }

        let mut total = Decimal::ZERO;
        for (i, bracket) in self.brackets.iter().enumerate() {
            if bracket.lower_bound >= base {
                break;
            }
            let upper = match self.brackets.get(i + 1) {
                Some(next) => base.min(next.lower_bound),
                None => base,
            };
            let slice = (upper - bracket.lower_bound).max(Decimal::ZERO);
            total += slice * bracket.rate;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn two_tier() -> BracketSchedule {
        BracketSchedule::new(vec![
            Bracket::percent(dec!(100), dec!(10)),
            Bracket::percent(dec!(200), dec!(20)),
        ])
        .unwrap()
    }

    #[test]
    fn zero_at_and_below_threshold() {
        let s = two_tier();
        assert_eq!(s.liability(dec!(0)), Decimal::ZERO);
        assert_eq!(s.liability(dec!(100)), Decimal::ZERO);
        assert_eq!(s.liability(dec!(-50)), Decimal::ZERO);
    }

    #[test]
    fn accumulates_marginal_slices() {
        let s = two_tier();
        assert_eq!(s.liability(dec!(150)), dec!(5));
        assert_eq!(s.liability(dec!(200)), dec!(10));
        assert_eq!(s.liability(dec!(300)), dec!(30));
    }

    #[test]
    fn exact_to_the_cent() {
        let s = two_tier();
        assert_eq!(s.liability(dec!(100.01)), dec!(0.001));
        assert_eq!(s.liability(dec!(200.10)), dec!(10.02));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(BracketSchedule::new(vec![]), Err(ScheduleError::Empty));
    }

    #[test]
    fn rejects_non_ascending() {
        let err = BracketSchedule::new(vec![
            Bracket::percent(dec!(100), dec!(1)),
            Bracket::percent(dec!(100), dec!(2)),
        ])
        .unwrap_err();
        assert_eq!(err, ScheduleError::NotAscending { index: 1 });
    }

    #[test]
    fn rejects_negative_rate() {
        let err = BracketSchedule::new(vec![Bracket::new(dec!(0), dec!(-0.1))]).unwrap_err();
        assert_eq!(err, ScheduleError::Negative { index: 0 });
    }

    #[test]
    fn exemption_threshold_is_first_bound() {
        assert_eq!(two_tier().exemption_threshold(), dec!(100));
    }
}
