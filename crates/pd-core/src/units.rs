// pd-core/src/units.rs

use uom::si::f64::{Ratio as UomRatio, Time as UomTime};

// Public canonical unit types (SI, f64)
pub type Ratio = UomRatio;
pub type Time = UomTime;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

/// Speedup of `parallel` against `serial` as a dimensionless ratio.
#[inline]
pub fn speedup(serial: Time, parallel: Time) -> Ratio {
    serial / parallel
}

#[inline]
pub fn as_ratio(r: Ratio) -> f64 {
    use uom::si::ratio::ratio;
    r.get::<ratio>()
}
