use crate::TkError;

/// Floating point type used throughout the system.
pub type Real = f64;

/// Closed interval `[lo, hi]` a process variable is pinned to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub lo: Real,
    pub hi: Real,
}

impl Bounds {
    pub const fn new(lo: Real, hi: Real) -> Self {
        Self { lo, hi }
    }

    /// Saturating clamp. NaN pins to the lower bound so the result is always in range.
    #[inline]
    pub fn saturate(&self, v: Real) -> Real {
        if v.is_nan() { self.lo } else { v.clamp(self.lo, self.hi) }
    }

    #[inline]
    pub fn contains(&self, v: Real) -> bool {
        v >= self.lo && v <= self.hi
    }

    pub fn ensure_contains(&self, v: Real, what: &'static str) -> Result<Real, TkError> {
        let v = ensure_finite(v, what)?;
        if self.contains(v) {
            Ok(v)
        } else {
            Err(TkError::OutOfRange {
                what,
                value: v,
                lo: self.lo,
                hi: self.hi,
            })
        }
    }
}

/// Tolerances for float comparisons.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TkError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TkError::NonFinite { what, value: v })
    }
}
