//! Exact monetary amounts.
//!
//! All monetary arithmetic in the engine runs on [`rust_decimal::Decimal`]:
//! subtotals over large trees must not drift the way floating accumulation
//! would. Rounding happens only at presentation (see
//! [`crate::config::RenderConfig::format_money`]).

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An exact currency amount.
///
/// `Money` is a thin wrapper so that amounts and bare quantities do not mix
/// silently. Construction accepts any decimal; non-negativity is enforced
/// at the mutation boundary, not here, so that intermediate arithmetic
/// (e.g. price corrections) stays total.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// `quantity * self`, exact.
    ///
    /// Representability is checked when items enter a snapshot (see
    /// [`Money::checked_times`]), so this stays total for stored state.
    #[must_use]
    pub fn times(self, quantity: Decimal) -> Self {
        Self(self.0 * quantity)
    }

    /// `quantity * self`, or `None` when the product does not fit in a
    /// `Decimal`.
    #[must_use]
    pub fn checked_times(self, quantity: Decimal) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }

    /// `self + rhs`, or `None` when the sum does not fit in a `Decimal`.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
