pub trait ApproxEqual: Copy {
    fn equals_approx(self, other: Self, eps: Self, eps_rel: Self) -> bool;
    fn equals_approx_abs(self, other: Self, eps: Self) -> bool;
    fn equals_approx_rel(self, other: Self, eps: Self) -> bool;
}

macro_rules! assert_eq_approx {
    ($lhs:expr, $rhs:expr, $eps_abs:expr, $eps_rel:expr) => {
        assert!(
            $crate::test_utils::ApproxEqual::equals_approx($lhs, $rhs, $eps_abs, $eps_rel),
            r#"assert_eq_approx failed:
    {}: {:?}
    {}: {:?}
    {} (maximum absolute error): {:?}
    {} (maximum relative error): {:?}"#,
            stringify!($lhs),
            $lhs,
            stringify!($rhs),
            $rhs,
            stringify!($eps_abs),
            $eps_abs,
            stringify!($eps_rel),
            $eps_rel,
        );
    };

    ($lhs:expr, $rhs:expr, $eps_abs: expr, $eps_rel:expr, $($arg:tt)+) => {
        assert!($crate::test_utils::ApproxEqual::equals_approx($lhs, $rhs, $eps_abs, $eps_rel), $($arg)*);
    }
}

macro_rules! assert_eq_approx_abs {
    ($lhs:expr, $rhs:expr, $eps_abs:expr) => {
        assert!(
            $crate::test_utils::ApproxEqual::equals_approx_abs($lhs, $rhs, $eps_abs),
            r#"assert_eq_abs failed:
    {}: {:?}
    {}: {:?}
    {} (maximum absolute error): {:?}"#,
            stringify!($lhs),
            $lhs,
            stringify!($rhs),
            $rhs,
            stringify!($eps_abs),
            $eps_abs,
        )
    };

    ($lhs:expr, $rhs:expr, $eps_abs:expr, $($arg:tt)+) => {
        assert!($crate::test_utils::ApproxEqual::equals_approx_abs($lhs, $rhs, $eps_abs),
        $($arg)*);
    };
}

macro_rules! assert_in_range {
    ($value:expr, $lower:expr, $upper:expr) => {
        assert!(
            $lower <= $value && $value <= $upper,
            r#"assert_in_range failed:
    {} (value): {:?}
    {} (lower bound): {:?}
    {} (upper bound): {:?}"#,
            stringify!($value),
            $value,
            stringify!($lower),
            $lower,
            stringify!($upper),
            $upper
        )
    };
}

macro_rules! impl_approx_equal {
    ($scalar:ty, $vector:ty) => {
        impl ApproxEqual for $scalar {
            fn equals_approx(self, other: Self, eps: Self, eps_rel: Self) -> bool {
                #[allow(clippy::float_cmp)]
                if self == other || (self - other).abs() <= eps {
                    true
                } else {
                    let diff = (self - other).abs();
                    let max = self.abs().max(other.abs());
                    diff <= max * eps_rel
                }
            }

            fn equals_approx_abs(self, other: Self, eps: Self) -> bool {
                #[allow(clippy::float_cmp)]
                if self == other {
                    true
                } else {
                    (self - other).abs() <= eps
                }
            }

            fn equals_approx_rel(self, other: Self, eps: Self) -> bool {
                #[allow(clippy::float_cmp)]
                if self == other {
                    return true;
                }
                let diff = (self - other).abs();
                let max = self.abs().max(other.abs());
                diff <= max * eps
            }
        }

        impl ApproxEqual for $vector {
            fn equals_approx_rel(self, other: Self, eps: Self) -> bool {
                $crate::test_utils::ApproxEqual::equals_approx_rel(self.x, other.x, eps.x)
                    && $crate::test_utils::ApproxEqual::equals_approx_rel(self.y, other.y, eps.y)
                    && $crate::test_utils::ApproxEqual::equals_approx_rel(self.z, other.z, eps.z)
            }
            fn equals_approx_abs(self, other: Self, eps: Self) -> bool {
                $crate::test_utils::ApproxEqual::equals_approx_abs(self.x, other.x, eps.x)
                    && $crate::test_utils::ApproxEqual::equals_approx_abs(self.y, other.y, eps.y)
                    && $crate::test_utils::ApproxEqual::equals_approx_abs(self.z, other.z, eps.z)
            }
            fn equals_approx(self, other: Self, eps_abs: Self, eps_rel: Self) -> bool {
                $crate::test_utils::ApproxEqual::equals_approx(
                    self.x, other.x, eps_abs.x, eps_rel.x,
                ) && $crate::test_utils::ApproxEqual::equals_approx(
                    self.y, other.y, eps_abs.y, eps_rel.y,
                ) && $crate::test_utils::ApproxEqual::equals_approx(
                    self.z, other.z, eps_abs.z, eps_rel.z,
                )
            }
        }
    };
}

impl_approx_equal!(f64, Vec3d);

use std::f64::consts;

pub(crate) use assert_eq_approx;
pub(crate) use assert_eq_approx_abs;
pub(crate) use assert_in_range;

use rayon::prelude::*;

use crate::{
    core::TransmissiveBxDF,
    utils::{FloatExt, VecExt},
    BxDF, BxDFType, RgbD, SampleIncomingResponse, Vec2d, Vec3d,
};

pub trait SamplerExt {
    fn vec2d(&mut self) -> Vec2d;
}

impl SamplerExt for fastrand::Rng {
    fn vec2d(&mut self) -> Vec2d {
        Vec2d::new(self.f64(), self.f64())
    }
}

/** sample a direction with density 1 / 4pi */
pub fn spherical_sample(rd: &mut fastrand::Rng) -> Vec3d {
    let u = rd.f64();
    let v = rd.f64();
    spherical_sample_uv(u, v)
}

fn spherical_sample_uv(u: f64, v: f64) -> Vec3d {
    #[allow(clippy::suboptimal_flops)]
    let cos_theta = 2.0 * u - 1.0;
    #[allow(clippy::suboptimal_flops)]
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let phi = v * 2.0 * consts::PI;
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3d::new(sin_theta * sin_phi, sin_theta * cos_phi, cos_theta)
}

fn assert_non_negative(value: RgbD) {
    assert!(
        value.x >= 0.0 && value.y >= 0.0 && value.z >= 0.0,
        "the bxdf should always be positive: {value:?}"
    );
}

/// Directions returned by `sample_incoming` must agree with `evaluate` and
/// `sample_incoming_pdf`
pub fn test_bxdf_sample_eval<T: BxDF + Sync>(bxdf: &T) {
    let runs = 16;
    let num_samples = 1000;
    (0..runs).into_par_iter().for_each(|_| {
        let mut rd = fastrand::Rng::new();
        for _ in 0..num_samples {
            let omega_o = spherical_sample(&mut rd);
            let Some(SampleIncomingResponse {
                omega_i,
                omega_o: sampled_omega_o,
                bxdf: value,
                pdf,
                bxdf_type,
            }) = bxdf.sample_incoming(omega_o, Vec3d::Z, rd.vec2d())
            else {
                continue;
            };
            assert_eq!(sampled_omega_o, omega_o);
            assert!(bxdf.bxdf_type().contains(bxdf_type));
            assert!(!omega_i.is_nan(), "omega_o: {omega_o:?}");

            let c_bxdf = bxdf.evaluate(omega_o, Vec3d::Z, omega_i);
            let c_pdf = bxdf.sample_incoming_pdf(omega_o, Vec3d::Z, omega_i);
            assert!(
                (c_pdf > 0.0 && pdf > 0.0) || value.luminance() == 0.0,
                r#"
    PDFs must be greater than 0.
    pdf: {pdf},
    c_pdf: {c_pdf},
    bxdf: {value:?},
    omega_o: {omega_o:?},
    omega_i: {omega_i:?}"#
            );
            assert_eq_approx!(
                pdf,
                c_pdf,
                0.01,
                0.003,
                r#"
    PDFs must be equal for sample_incoming and sample_incoming_pdf,
    pdf: {pdf},
    c_pdf: {c_pdf},
    omega_o: {omega_o:?},
    omega_i: {omega_i:?}"#
            );
            assert_eq_approx!(value, c_bxdf, RgbD::splat(0.001), RgbD::splat(0.001));
            assert!(pdf >= 0.0);
            assert_non_negative(value);
        }
    });
}

pub fn test_bxdf_reciprocity<T: BxDF + Sync>(bxdf: &T) {
    let runs = 16;
    let num_samples = 1000;
    (0..runs).into_par_iter().for_each(|_| {
        let mut rd = fastrand::Rng::new();
        for _ in 0..num_samples {
            let omega_o = spherical_sample(&mut rd);
            let omega_i = spherical_sample(&mut rd);

            let c_bxdf = bxdf.evaluate(omega_o, Vec3d::Z, omega_i);
            let r_bxdf = bxdf.evaluate(omega_i, Vec3d::Z, omega_o);

            let c_pdf = bxdf.sample_incoming_pdf(omega_o, Vec3d::Z, omega_i);
            let r_pdf = bxdf.sample_incoming_pdf(omega_i, Vec3d::Z, omega_o);

            assert!(c_pdf >= 0.0, "the pdf should always be more than 0");
            assert!(r_pdf >= 0.0, "the pdf should always be more than 0");
            assert_non_negative(c_bxdf);

            assert_eq_approx!(c_bxdf, r_bxdf, RgbD::splat(0.001), RgbD::splat(0.0001));
        }
    });
}

/// Reflection-only models must not scatter through the surface and transmission-only models
/// must not scatter back
pub fn test_hemisphere_consistency<T: BxDF + Sync>(bxdf: &T) {
    let bxdf_type = bxdf.bxdf_type();
    let reflects = bxdf_type.contains(BxDFType::REFLECTION);
    let transmits = bxdf_type.contains(BxDFType::TRANSMISSION);
    let runs = 16;
    let num_samples = 1000;
    (0..runs).into_par_iter().for_each(|_| {
        let mut rd = fastrand::Rng::new();
        for _ in 0..num_samples {
            let omega_o = spherical_sample(&mut rd);
            let omega_i = spherical_sample(&mut rd);
            let value = bxdf.evaluate(omega_o, Vec3d::Z, omega_i);
            let pdf = bxdf.sample_incoming_pdf(omega_o, Vec3d::Z, omega_i);
            assert_non_negative(value);
            assert!(pdf >= 0.0);

            let same_side = omega_o.z * omega_i.z > 0.0;
            let opposite_side = omega_o.z * omega_i.z < 0.0;
            if (same_side && !reflects) || (opposite_side && !transmits) {
                assert_eq!(value, RgbD::ZERO, "omega_o: {omega_o:?}, omega_i: {omega_i:?}");
                assert_eq!(pdf, 0.0, "omega_o: {omega_o:?}, omega_i: {omega_i:?}");
            }

            if let Some(sample) = bxdf.sample_incoming(omega_o, Vec3d::Z, rd.vec2d()) {
                let side = omega_o.z * sample.omega_i.z;
                if !reflects {
                    assert!(side <= 0.0, "{sample:?}");
                }
                if !transmits {
                    assert!(side >= 0.0, "{sample:?}");
                }
            }
        }
    });
}

/// Outgoing directions in or next to the tangent plane, down to subnormal cosines, must never
/// produce infinite or NaN values. Samples may be rejected.
pub fn test_grazing_directions<T: BxDF>(bxdf: &T) {
    let cosines = [
        0.0,
        1e-12,
        -1e-12,
        1e-300,
        -1e-300,
        f64::MIN_POSITIVE / 4.0,
        -f64::MIN_POSITIVE / 4.0,
        1e-320,
        -1e-320,
    ];
    let samples: Vec<Vec2d> = {
        let mut rd = fastrand::Rng::with_seed(7);
        (0..64).map(|_| rd.vec2d()).collect()
    };
    let mut rd = fastrand::Rng::with_seed(11);
    for z in cosines {
        for phi in [0.0, 0.3, 1.7, 4.0] {
            let (sin_phi, cos_phi) = f64::sin_cos(phi);
            let grazing = Vec3d::new(cos_phi, sin_phi, z);

            for &rdf in &samples {
                if let Some(sample) = bxdf.sample_incoming(grazing, Vec3d::Z, rdf) {
                    assert!(
                        sample.bxdf.is_finite() && sample.pdf.is_finite() && sample.pdf >= 0.0,
                        "grazing: {grazing:?}, sample: {sample:?}"
                    );
                    assert!(sample.omega_i.is_finite(), "{sample:?}");
                }
            }

            for _ in 0..64 {
                let omega = spherical_sample(&mut rd);
                for (omega_o, omega_i) in [(grazing, omega), (omega, grazing)] {
                    let value = bxdf.evaluate(omega_o, Vec3d::Z, omega_i);
                    let pdf = bxdf.sample_incoming_pdf(omega_o, Vec3d::Z, omega_i);
                    assert!(
                        value.is_finite(),
                        "omega_o: {omega_o:?}, omega_i: {omega_i:?}, bxdf: {value:?}"
                    );
                    assert_non_negative(value);
                    assert!(
                        pdf.is_finite() && pdf >= 0.0,
                        "omega_o: {omega_o:?}, omega_i: {omega_i:?}, pdf: {pdf}"
                    );
                }
            }

            let reflectance = bxdf.reflectance_hd(grazing, Vec3d::Z, &samples);
            assert!(reflectance.is_finite(), "grazing: {grazing:?}, {reflectance:?}");
        }
    }
}

/// Integrates `sample_incoming_pdf` over the sphere with uniformly distributed directions.
/// The total has to lie between `min_mass` and one, samplers that reject directions lose mass.
pub fn test_pdf_normalization<T: BxDF + Sync>(bxdf: &T, min_mass: f64) {
    const DOMAIN: f64 = 4.0 * consts::PI;

    let runs = 16;
    let num_samples = 200_000;
    (0..runs).into_par_iter().for_each(|i| {
        let mut rd = fastrand::Rng::new();
        let omega_o = spherical_sample(&mut rd);
        if omega_o.z.abs() < 0.05 {
            return;
        }
        let mut sum = 0.0;
        let mut sum_of_squared = 0.0;
        for _ in 0..num_samples {
            let omega_i = spherical_sample(&mut rd);
            let value = bxdf.sample_incoming_pdf(omega_o, Vec3d::Z, omega_i) * DOMAIN;
            sum += value;
            sum_of_squared += value.sq();
        }
        let n = f64::from(num_samples);
        sum /= n;
        sum_of_squared /= n;
        let variance = (sum_of_squared - sum.sq()).max(0.0) * n / (n - 1.0);
        let standard_error = (variance / n).sqrt();
        let confidence = 5.0 * standard_error + 0.01;

        assert!(
            sum <= 1.0 + confidence && sum >= min_mass - confidence,
            r#"
    expected the pdf to integrate to a value in [{min_mass}, 1].
    But it integrated to {sum} with a standard error of {standard_error}.
    omega_o: {omega_o:?}
    i: {i}"#
        );
    });
}

/// The directional albedo must not exceed `max_albedo`
pub fn test_energy_conservation<T: BxDF + Sync>(bxdf: &T, max_albedo: f64) {
    let runs = 16;
    let num_samples = 20_000;
    (0..runs).into_par_iter().for_each(|_| {
        let mut rd = fastrand::Rng::new();
        let omega_o = spherical_sample(&mut rd);
        let mut sum = RgbD::ZERO;
        let mut sum2 = RgbD::ZERO;
        for _ in 0..num_samples {
            let Some(sample) = bxdf.sample_incoming(omega_o, Vec3d::Z, rd.vec2d()) else {
                continue;
            };
            if sample.pdf > 0.0 && sample.bxdf.luminance() > 0.0 {
                let contrib = sample.bxdf / sample.pdf * sample.omega_i.z.abs();
                sum += contrib;
                sum2 += contrib.sq();
            }
        }
        let n = f64::from(num_samples);
        sum /= n;
        sum2 /= n;
        let variance = (sum2 - sum.sq()).luminance().abs() * n / (n - 1.0);
        let std_error = (variance / n).sqrt();
        let confidence = (4.0 * std_error).max(1e-3);

        assert_in_range!(sum.x, 0.0, max_albedo + confidence);
        assert_in_range!(sum.y, 0.0, max_albedo + confidence);
        assert_in_range!(sum.z, 0.0, max_albedo + confidence);
    });
}

pub fn test_bxdf_reciprocity_glass<T: TransmissiveBxDF + Sync>(bxdf: &T) {
    let get_ior = |z: f64| if z > 0.0 { 1.0 } else { bxdf.ior() };
    let runs = 16;
    let num_samples = 1000;
    (0..runs).into_par_iter().for_each(|_| {
        let mut rd = fastrand::Rng::new();
        for _ in 0..num_samples {
            let omega_o = spherical_sample(&mut rd);
            let omega_i = spherical_sample(&mut rd);
            let c_bxdf = bxdf.evaluate(omega_o, Vec3d::Z, omega_i);
            let r_bxdf = bxdf.evaluate(omega_i, Vec3d::Z, omega_o);

            // radiance is scaled by the squared index on the side it leaves to
            let c_bxdf_norm = c_bxdf / get_ior(omega_o.z).sq();
            let r_bxdf_norm = r_bxdf / get_ior(omega_i.z).sq();
            assert_eq_approx!(
                c_bxdf_norm,
                r_bxdf_norm,
                RgbD::splat(0.001),
                RgbD::splat(0.0001),
                r#"
    - c_bxdf_norm: {c_bxdf_norm:?},
    - r_bxdf_norm: {r_bxdf_norm:?},
    - max_delta: 0.001,
    - max_delta_rel: 0.0001,
    - omega_o: {omega_o:?},
    - omega_i: {omega_i:?},
    "#
            );
        }
    });
}
