use core::cmp::Ordering;
use core::fmt;

use crate::error::{CoreError, CoreResult};
use crate::numeric::ensure_finite;

/// Number of worker threads a run used. Zero marks the serial baseline.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ThreadCount(pub u32);

impl ThreadCount {
    pub const SERIAL: ThreadCount = ThreadCount(0);

    pub fn is_serial(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ThreadCount {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Problem size used as the grouping and join key.
///
/// Always finite and never negative zero, which makes the `total_cmp`
/// ordering agree with `==` and lets the value key ordered maps.
/// Deserialization goes through [`ProblemSize::new`].
#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "f64", into = "f64")
)]
pub struct ProblemSize(f64);

impl ProblemSize {
    pub fn new(v: f64) -> CoreResult<Self> {
        let v = ensure_finite(v, "problem size")?;
        // total_cmp orders -0.0 before 0.0.
        Ok(Self(if v == 0.0 { 0.0 } else { v }))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for ProblemSize {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ProblemSize {}

impl PartialOrd for ProblemSize {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProblemSize {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl core::hash::Hash for ProblemSize {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for ProblemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl TryFrom<f64> for ProblemSize {
    type Error = CoreError;

    fn try_from(v: f64) -> CoreResult<Self> {
        Self::new(v)
    }
}

impl From<ProblemSize> for f64 {
    fn from(size: ProblemSize) -> Self {
        size.0
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> CoreResult<Self> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(CoreError::EmptyId { what: $what });
                }
                Ok(Self(id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Store id of a parallelization approach.
    ApproachId,
    "approach"
);
entity_id!(
    /// Store id of a benchmark machine.
    MachineId,
    "machine"
);
entity_id!(ProblemId, "problem");
entity_id!(CategoryId, "category");
entity_id!(
    /// Store id of a programming environment (compiler, runtime).
    PenvId,
    "programming environment"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn problem_size_orders_numerically() {
        let sizes: BTreeSet<ProblemSize> = [1000.0, 10.0, 100.0, 10.0]
            .into_iter()
            .map(|v| ProblemSize::new(v).unwrap())
            .collect();
        let ordered: Vec<f64> = sizes.iter().map(|s| s.get()).collect();
        assert_eq!(ordered, vec![10.0, 100.0, 1000.0]);
    }

    #[test]
    fn problem_size_rejects_nan() {
        assert!(ProblemSize::new(f64::NAN).is_err());
        assert!(ProblemSize::new(f64::INFINITY).is_err());
    }

    #[test]
    fn negative_zero_is_the_same_size() {
        let neg = ProblemSize::new(-0.0).unwrap();
        let pos = ProblemSize::new(0.0).unwrap();
        assert_eq!(neg, pos);
        assert!(neg.get().is_sign_positive());
        let keys: BTreeSet<ProblemSize> = [neg, pos].into_iter().collect();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn problem_size_display_drops_integral_fraction() {
        assert_eq!(ProblemSize::new(100.0).unwrap().to_string(), "100");
        assert_eq!(ProblemSize::new(2.5).unwrap().to_string(), "2.5");
    }

    #[test]
    fn entity_id_rejects_blank() {
        assert!(ApproachId::new("  ").is_err());
        assert_eq!(MachineId::new("m1").unwrap().as_str(), "m1");
    }

    #[test]
    fn serial_thread_count() {
        assert!(ThreadCount::SERIAL.is_serial());
        assert!(!ThreadCount(4).is_serial());
    }
}
