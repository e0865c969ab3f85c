//! Special functions shared by the microfacet and hair models

use std::f64::consts;

use crate::{utils::FloatExt, Vec2d};

/// Error function, Abramowitz & Stegun 7.1.26
#[must_use]
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    #[allow(clippy::suboptimal_flops)]
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

/// Inverse of [`erf`] (Giles' single precision approximation)
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn erf_inv(x: f64) -> f64 {
    let x = x.clamp(-0.99999, 0.99999);
    let mut w = -((1.0 - x) * (1.0 + x)).ln();
    let mut p;
    if w < 5.0 {
        w -= 2.5;
        p = 2.810_226_36e-8;
        p = 3.432_739_39e-7 + p * w;
        p = -3.523_387_7e-6 + p * w;
        p = -4.391_506_54e-6 + p * w;
        p = 0.000_218_580_87 + p * w;
        p = -0.001_253_725_03 + p * w;
        p = -0.004_177_681_64 + p * w;
        p = 0.246_640_727 + p * w;
        p = 1.501_409_41 + p * w;
    } else {
        w = w.sqrt() - 3.0;
        p = -0.000_200_214_257;
        p = 0.000_100_950_558 + p * w;
        p = 0.001_349_343_22 + p * w;
        p = -0.003_673_428_44 + p * w;
        p = 0.005_739_507_73 + p * w;
        p = -0.007_622_461_3 + p * w;
        p = 0.009_438_870_47 + p * w;
        p = 1.001_674_06 + p * w;
        p = 2.832_976_82 + p * w;
    }
    p * x
}

/// Modified Bessel function of the first kind, order zero. Power series
/// `sum (x^2 / 4)^i / (i!)^2`, summed until the terms stop contributing.
#[must_use]
pub fn bessel_i0(x: f64) -> f64 {
    let quarter_x2 = 0.25 * x * x;
    let mut term = 1.0;
    let mut val = 1.0;
    for i in 1..64 {
        term *= quarter_x2 / f64::from(i * i);
        val += term;
        if term < val * f64::EPSILON {
            break;
        }
    }
    val
}

/// `ln(I0(x))` with an asymptotic expansion for large arguments, where the series overflows
#[must_use]
pub fn log_bessel_i0(x: f64) -> f64 {
    if x > 12.0 {
        #[allow(clippy::suboptimal_flops)]
        {
            x + 0.5 * (-(2.0 * consts::PI).ln() + (1.0 / x).ln() + 1.0 / (8.0 * x))
        }
    } else {
        bessel_i0(x).ln()
    }
}

/// Logistic distribution with scale `s`, centered at zero
#[must_use]
pub fn logistic(x: f64, s: f64) -> f64 {
    let x = x.abs();
    let e = (-x / s).exp();
    e / (s * (1.0 + e).sq())
}

#[must_use]
pub fn logistic_cdf(x: f64, s: f64) -> f64 {
    1.0 / (1.0 + (-x / s).exp())
}

/// Logistic distribution renormalized to the interval `[a, b]`
#[must_use]
pub fn trimmed_logistic(x: f64, s: f64, a: f64, b: f64) -> f64 {
    debug_assert!(a < b);
    logistic(x, s) / (logistic_cdf(b, s) - logistic_cdf(a, s))
}

/// Inverts the cdf of [`trimmed_logistic`]
#[must_use]
pub fn sample_trimmed_logistic(u: f64, s: f64, a: f64, b: f64) -> f64 {
    debug_assert!(a < b);
    let k = logistic_cdf(b, s) - logistic_cdf(a, s);
    #[allow(clippy::suboptimal_flops)]
    let x = -s * (1.0 / (u * k + logistic_cdf(a, s)) - 1.0).ln();
    debug_assert!(!x.is_nan());
    x.clamp(a, b)
}

// https://fgiesen.wordpress.com/2009/12/13/decoding-morton-codes/
const fn compact_1_by_1(mut x: u32) -> u32 {
    x &= 0x5555_5555;
    x = (x ^ (x >> 1)) & 0x3333_3333;
    x = (x ^ (x >> 2)) & 0x0f0f_0f0f;
    x = (x ^ (x >> 4)) & 0x00ff_00ff;
    x = (x ^ (x >> 8)) & 0x0000_ffff;
    x
}

/// Splits one uniform number in `[0, 1)` into two by de-interleaving the bits of its 32 bit
/// fixed point representation
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn demux_float(f: f64) -> Vec2d {
    debug_assert!((0.0..1.0).contains(&f));
    let v = ((f * (1u64 << 32) as f64) as u64).min(u64::from(u32::MAX));
    let bits = [compact_1_by_1(v as u32), compact_1_by_1((v >> 1) as u32)];
    Vec2d::new(
        f64::from(bits[0]) / f64::from(1u32 << 16),
        f64::from(bits[1]) / f64::from(1u32 << 16),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_eq_approx_abs;

    #[test]
    fn erf_inverse_round_trip() {
        for i in -9..=9 {
            let x = f64::from(i) * 0.1;
            assert_eq_approx_abs!(erf(erf_inv(x)), x, 1e-5);
        }
        assert_eq_approx_abs!(erf(0.0), 0.0, 1e-9);
        assert_eq_approx_abs!(erf(1.0), 0.842_700_79, 1e-6);
    }

    #[test]
    fn bessel_reference_values() {
        assert_eq_approx_abs!(bessel_i0(0.0), 1.0, 1e-12);
        assert_eq_approx_abs!(bessel_i0(1.0), 1.266_065_877_752, 1e-9);
        assert_eq_approx_abs!(bessel_i0(3.0), 4.880_792_585_865, 1e-6);
        assert_eq_approx_abs!(log_bessel_i0(2.0), bessel_i0(2.0).ln(), 1e-12);
        // ln(I0(20)) = ln(4.355_828e7)
        assert_eq_approx_abs!(log_bessel_i0(20.0), 17.589_7, 1e-2);
        // both branches meet at the switch
        assert_eq_approx_abs!(log_bessel_i0(12.000_001), bessel_i0(12.0).ln(), 1e-2);
        assert_eq_approx_abs!(bessel_i0(10.0), 2_815.716_628, 1e-4);
    }

    #[test]
    fn trimmed_logistic_is_normalized() {
        let s = 0.4;
        let n = 20_000;
        let dx = 2.0 * consts::PI / f64::from(n);
        let integral: f64 = (0..n)
            .map(|i| {
                let x = -consts::PI + (f64::from(i) + 0.5) * dx;
                trimmed_logistic(x, s, -consts::PI, consts::PI) * dx
            })
            .sum();
        assert_eq_approx_abs!(integral, 1.0, 1e-4);
    }

    #[test]
    fn trimmed_logistic_sampling_inverts_cdf() {
        let s = 0.3;
        let median = sample_trimmed_logistic(0.5, s, -consts::PI, consts::PI);
        assert_eq_approx_abs!(median, 0.0, 1e-9);
        let lo = sample_trimmed_logistic(0.0, s, -consts::PI, consts::PI);
        let hi = sample_trimmed_logistic(0.999_999, s, -consts::PI, consts::PI);
        assert!(lo >= -consts::PI && hi <= consts::PI && lo < hi);
    }

    #[test]
    fn demux_splits_interleaved_bits() {
        assert_eq!(demux_float(0.0), Vec2d::ZERO);
        let u = demux_float(0.75);
        // 0.75 sets bits 31 and 30, which land in the top bit of each output
        assert_eq_approx_abs!(u.x, 0.5, 1e-12);
        assert_eq_approx_abs!(u.y, 0.5, 1e-12);
        for i in 0..1000 {
            let u = demux_float(f64::from(i) / 1000.0);
            assert!((0.0..1.0).contains(&u.x) && (0.0..1.0).contains(&u.y));
        }
    }
}
