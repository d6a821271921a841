use crate::CoreError;

/// Floating point type used for every timing value.
pub type Real = f64;

/// Scale applied to a nanosecond remainder to express it in seconds.
pub const NANOS_TO_SECONDS: Real = 1e-9;

/// Absolute and relative tolerance pair for float comparisons.
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

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Checks that `v` is a finite, non-negative whole number and narrows it.
///
/// Upload files carry counts (threads, run ids) as plain decimals, so `4.0`
/// is accepted while `4.5` and `-1` are not.
pub fn ensure_count(v: Real, what: &'static str) -> Result<u32, CoreError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(CoreError::Negative { what, value: v });
    }
    if v.fract() != 0.0 || v > u32::MAX as Real {
        return Err(CoreError::NotIntegral { what, value: v });
    }
    Ok(v as u32)
}

/// Combines a whole-second reading and its nanosecond remainder.
#[inline]
pub fn split_seconds(seconds: Real, nanos: Real) -> Real {
    seconds + nanos * NANOS_TO_SECONDS
}

/// Running arithmetic mean.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Mean {
    sum: Real,
    count: usize,
}

impl Mean {
    pub fn push(&mut self, v: Real) {
        self.sum += v;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `None` until at least one sample was pushed.
    pub fn value(&self) -> Option<Real> {
        (self.count > 0).then(|| self.sum / self.count as Real)
    }
}

impl FromIterator<Real> for Mean {
    fn from_iter<I: IntoIterator<Item = Real>>(iter: I) -> Self {
        let mut mean = Mean::default();
        for v in iter {
            mean.push(v);
        }
        mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances::default();
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn split_seconds_adds_scaled_remainder() {
        let t = split_seconds(1.0, 250_000_000.0);
        assert!(nearly_equal(t, 1.25, Tolerances::default()));
        assert_eq!(split_seconds(0.3, 0.0), 0.3);
    }

    #[test]
    fn ensure_count_rejects_fractions_and_negatives() {
        assert_eq!(ensure_count(4.0, "threads"), Ok(4));
        assert_eq!(ensure_count(0.0, "threads"), Ok(0));
        assert!(matches!(
            ensure_count(4.5, "threads"),
            Err(CoreError::NotIntegral { .. })
        ));
        assert!(matches!(
            ensure_count(-1.0, "threads"),
            Err(CoreError::Negative { .. })
        ));
        assert!(matches!(
            ensure_count(Real::NAN, "threads"),
            Err(CoreError::NonFinite { .. })
        ));
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(Mean::default().value(), None);
        let m: Mean = [1.0, 2.0, 3.0].into_iter().collect();
        assert_eq!(m.count(), 3);
        assert_eq!(m.value(), Some(2.0));
    }
}
