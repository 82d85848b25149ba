//! Fine policy: pure overdue-fine calculation.
//!
//! [`FineSchedule::assess`] is deterministic and side-effect free; callers
//! may invoke it concurrently. Amounts are whole currency units.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors returned when constructing fine values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FineValidationError {
    NegativeAmount { value: i64 },
    NonPositiveLoanPeriod,
}

impl fmt::Display for FineValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeAmount { value } => {
                write!(f, "fine amount must not be negative, got {value}")
            }
            Self::NonPositiveLoanPeriod => write!(f, "loan period must be positive"),
        }
    }
}

impl std::error::Error for FineValidationError {}

/// Monetary fine amount in whole currency units; never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct FineAmount(i64);

impl FineAmount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Validate and construct a [`FineAmount`].
    pub fn new(value: i64) -> Result<Self, FineValidationError> {
        if value < 0 {
            return Err(FineValidationError::NegativeAmount { value });
        }
        Ok(Self(value))
    }

    /// Underlying amount in whole currency units.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Whether the amount is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FineAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<FineAmount> for i64 {
    fn from(value: FineAmount) -> Self {
        value.0
    }
}

impl TryFrom<i64> for FineAmount {
    type Error = FineValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Fine tariff and loan period applied across the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FineSchedule {
    rate_per_day: FineAmount,
    max_fine: FineAmount,
    loan_period: TimeDelta,
}

impl FineSchedule {
    /// Build a schedule from validated parts; the loan period must be
    /// positive.
    pub fn new(
        rate_per_day: FineAmount,
        max_fine: FineAmount,
        loan_period: TimeDelta,
    ) -> Result<Self, FineValidationError> {
        if loan_period <= TimeDelta::zero() {
            return Err(FineValidationError::NonPositiveLoanPeriod);
        }
        Ok(Self {
            rate_per_day,
            max_fine,
            loan_period,
        })
    }

    /// Fine accrued per started overdue day.
    pub fn rate_per_day(&self) -> FineAmount {
        self.rate_per_day
    }

    /// Upper bound on any single fine.
    pub fn max_fine(&self) -> FineAmount {
        self.max_fine
    }

    /// Length of a standard loan.
    pub fn loan_period(&self) -> TimeDelta {
        self.loan_period
    }

    /// Due date for a loan issued at `issued_at`.
    pub fn due_from(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + self.loan_period
    }

    /// Assess the fine owed for a loan due at `due`, as of `now`.
    ///
    /// Returns zero on or before the due date. Afterwards every started
    /// overdue day accrues [`Self::rate_per_day`], clamped to
    /// [`Self::max_fine`].
    ///
    /// # Examples
    /// ```
    /// use chrono::{DateTime, Utc};
    /// use circulation::domain::{FineAmount, FineSchedule};
    ///
    /// let schedule = FineSchedule::default();
    /// let due: DateTime<Utc> = "2026-03-01T00:00:00Z".parse().expect("timestamp");
    /// let now: DateTime<Utc> = "2026-03-06T00:00:00Z".parse().expect("timestamp");
    /// assert_eq!(schedule.assess(due, now), FineAmount::new(10).expect("amount"));
    /// ```
    pub fn assess(&self, due: DateTime<Utc>, now: DateTime<Utc>) -> FineAmount {
        let overdue = now.signed_duration_since(due);
        if overdue <= TimeDelta::zero() {
            return FineAmount::ZERO;
        }

        // num_days truncates; a partial day still counts as started.
        let mut days = overdue.num_days();
        if overdue > TimeDelta::days(days) {
            days += 1;
        }

        let raw = self.rate_per_day.0.saturating_mul(days);
        FineAmount(raw.min(self.max_fine.0))
    }
}

impl Default for FineSchedule {
    /// Standard tariff: 2 per started overdue day, capped at 1000, with a
    /// 14 day loan period.
    fn default() -> Self {
        Self {
            rate_per_day: FineAmount(2),
            max_fine: FineAmount(1000),
            loan_period: TimeDelta::days(14),
        }
    }
}
