//! Numeric interval constraints over one variable
//!
//! An interval is `(lower, lower_inclusive, upper, upper_inclusive)` over the
//! extended reals. Unbounded ends are ±infinity and always exclusive.
//! Folding a comparison never mutates: it returns a new, possibly tighter,
//! interval.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::rules::model::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub lower_inclusive: bool,
    pub upper: f64,
    pub upper_inclusive: bool,
}

impl Default for Interval {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Interval {
    /// `(-inf, +inf)`
    pub const fn unbounded() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            lower_inclusive: false,
            upper: f64::INFINITY,
            upper_inclusive: false,
        }
    }

    /// `[value, value]`
    pub const fn exact(value: f64) -> Self {
        Self {
            lower: value,
            lower_inclusive: true,
            upper: value,
            upper_inclusive: true,
        }
    }

    pub const fn new(lower: f64, lower_inclusive: bool, upper: f64, upper_inclusive: bool) -> Self {
        Self {
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
        }
    }

    /// Fold one comparison `x <op> value` into the interval.
    ///
    /// Bounds only move when the new one is at least as restrictive:
    /// - `>`: replace when `value > lower`, or equal and the lower is inclusive
    /// - `>=`: replace when `value > lower`, or equal and the lower is exclusive
    /// - `<` / `<=`: the mirror image on the upper bound
    /// - `==`: intersect with `[value, value]`
    /// - `!=`: no interval form, returned unchanged
    pub fn fold(self, operator: Operator, value: f64) -> Self {
        let mut next = self;
        match operator {
            Operator::Gt => {
                if value > self.lower || (value == self.lower && self.lower_inclusive) {
                    next.lower = value;
                    next.lower_inclusive = false;
                }
            }
            Operator::Ge => {
                if value > self.lower || (value == self.lower && !self.lower_inclusive) {
                    next.lower = value;
                    next.lower_inclusive = true;
                }
            }
            Operator::Lt => {
                if value < self.upper || (value == self.upper && self.upper_inclusive) {
                    next.upper = value;
                    next.upper_inclusive = false;
                }
            }
            Operator::Le => {
                if value < self.upper || (value == self.upper && !self.upper_inclusive) {
                    next.upper = value;
                    next.upper_inclusive = true;
                }
            }
            Operator::Eq => {
                next = self.intersect(&Self::exact(value));
            }
            Operator::Ne => {}
        }
        next
    }

    /// True when no real number satisfies the interval
    pub fn is_empty(&self) -> bool {
        if self.lower > self.upper {
            return true;
        }
        self.lower == self.upper && !(self.lower_inclusive && self.upper_inclusive)
    }

    /// Largest interval contained in both. On equal bounds the result is
    /// inclusive only if both sides were inclusive.
    pub fn intersect(&self, other: &Interval) -> Interval {
        let (lower, lower_inclusive) = if self.lower > other.lower {
            (self.lower, self.lower_inclusive)
        } else if other.lower > self.lower {
            (other.lower, other.lower_inclusive)
        } else {
            (self.lower, self.lower_inclusive && other.lower_inclusive)
        };

        let (upper, upper_inclusive) = if self.upper < other.upper {
            (self.upper, self.upper_inclusive)
        } else if other.upper < self.upper {
            (other.upper, other.upper_inclusive)
        } else {
            (self.upper, self.upper_inclusive && other.upper_inclusive)
        };

        Interval::new(lower, lower_inclusive, upper, upper_inclusive)
    }

    /// True when some value satisfies both intervals
    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.intersect(other).is_empty()
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.lower_inclusive { '[' } else { '(' };
        let close = if self.upper_inclusive { ']' } else { ')' };
        let lower = if self.lower == f64::NEG_INFINITY {
            "-inf".to_string()
        } else {
            self.lower.to_string()
        };
        let upper = if self.upper == f64::INFINITY {
            "+inf".to_string()
        } else {
            self.upper.to_string()
        };
        write!(f, "{}{}, {}{}", open, lower, upper, close)
    }
}
