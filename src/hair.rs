//! Scattering from a single hair or fur fiber
//!
//! Directions are given in the frame of the fiber: `x` runs along the fiber, `z` is the surface
//! normal of the curve the fiber is rendered as. The `normal` arguments of [`BxDF`] are ignored.
//!
//! Light that hits a fiber is split into lobes by the number of times `p` it passed through the
//! interior: direct reflection `R` (p = 0), transmission `TT` (p = 1), one internal reflection
//! `TRT` (p = 2), and a residual lobe for all higher orders.
//!
//! # Mathematical background
//! * [A Practical and Controllable Hair and Fur Model for Production Path Tracing](https://benedikt-bitterli.me/pchfm/)
//! * [An Energy-Conserving Hair Reflectance Model](https://eugenedeon.com/project/an-energy-conserving-hair-reflectance-model/)
use std::f64::consts;

use crate::{
    fresnel, numeric,
    utils::{self, FloatExt, VecExt},
    BxDF, BxDFType, RgbD, SampleIncomingResponse, Vec2d, Vec3d,
};

/// Number of explicitly modeled lobes, the residual lobe comes on top
pub const P_MAX: usize = 3;

const SQRT_PI_OVER_8: f64 = 0.626_657_069;

fn safe_sqrt(x: f64) -> f64 {
    x.max(0.0).sqrt()
}

fn safe_asin(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}

/// Longitudinal angle and azimuth of a direction in the fiber frame
#[derive(Clone, Copy, Debug)]
struct FiberAngles {
    sin_theta: f64,
    cos_theta: f64,
    phi: f64,
}

impl FiberAngles {
    fn new(omega: Vec3d) -> Self {
        Self {
            sin_theta: omega.x,
            cos_theta: safe_sqrt(1.0 - omega.x.sq()),
            phi: omega.z.atan2(omega.y),
        }
    }
}

/// Longitudinal scattering function with variance `v`
#[allow(clippy::suboptimal_flops)]
fn mp(cos_theta_i: f64, cos_theta_o: f64, sin_theta_i: f64, sin_theta_o: f64, v: f64) -> f64 {
    let a = cos_theta_i * cos_theta_o / v;
    let b = sin_theta_i * sin_theta_o / v;
    if v <= 0.1 {
        // sinh(1 / v) overflows for narrow lobes
        (numeric::log_bessel_i0(a) - b - 1.0 / v + consts::LN_2 + (1.0 / (2.0 * v)).ln()).exp()
    } else {
        (-b).exp() * numeric::bessel_i0(a) / ((1.0 / v).sinh() * 2.0 * v)
    }
}

/// Azimuthal deflection of lobe `p`
#[allow(clippy::cast_precision_loss, clippy::suboptimal_flops)]
fn phi(p: usize, gamma_o: f64, gamma_t: f64) -> f64 {
    let p = p as f64;
    2.0 * p * gamma_t - 2.0 * gamma_o + p * consts::PI
}

/// Azimuthal scattering function of lobe `p`
fn np(delta_phi: f64, p: usize, s: f64, gamma_o: f64, gamma_t: f64) -> f64 {
    let mut dphi = delta_phi - phi(p, gamma_o, gamma_t);
    while dphi > consts::PI {
        dphi -= 2.0 * consts::PI;
    }
    while dphi < -consts::PI {
        dphi += 2.0 * consts::PI;
    }
    numeric::trimmed_logistic(dphi, s, -consts::PI, consts::PI)
}

/// Fraction of light that leaves the fiber after `p` internal paths. `transmittance` is the
/// transmittance of a single path through the interior.
fn ap(cos_theta_o: f64, eta: f64, h: f64, transmittance: RgbD) -> [RgbD; P_MAX + 1] {
    let cos_gamma_o = safe_sqrt(1.0 - h.sq());
    let f = fresnel::fresnel_dielectric(cos_theta_o * cos_gamma_o, 1.0, eta);

    let mut ap = [RgbD::ZERO; P_MAX + 1];
    ap[0] = RgbD::splat(f);
    ap[1] = transmittance * (1.0 - f).sq();
    for p in 2..P_MAX {
        ap[p] = ap[p - 1] * transmittance * f;
    }
    // geometric series of all remaining orders
    ap[P_MAX] = ap[P_MAX - 1] * transmittance * f / (RgbD::ONE - transmittance * f);
    ap
}

/// Scattering model for a dielectric cylinder with absorbing interior and tilted cuticle scales
///
/// **Note: This code is only available with the `hair` feature**
#[derive(Clone, Copy, Debug)]
pub struct HairBxDF {
    h: f64,
    gamma_o: f64,
    eta: f64,
    sigma_a: RgbD,
    beta_m: f64,
    beta_n: f64,
    v: [f64; P_MAX + 1],
    s: f64,
    sin_2k_alpha: [f64; 3],
    cos_2k_alpha: [f64; 3],
}

impl HairBxDF {
    /// # Arguments
    /// * `h` - Offset in `[-1, 1]` across the width of the fiber where it was hit
    /// * `eta` - Index of refraction of the fiber, human hair has about `1.55`
    /// * `sigma_a` - Absorption coefficient of the interior, see
    ///   [`HairBxDF::sigma_a_from_concentration`] and [`HairBxDF::sigma_a_from_reflectance`]
    /// * `beta_m` - Longitudinal roughness in `(0, 1]`
    /// * `beta_n` - Azimuthal roughness in `(0, 1]`
    /// * `alpha_degrees` - Tilt of the cuticle scales, about `2` degrees for human hair
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn new(
        h: f64,
        eta: f64,
        sigma_a: RgbD,
        beta_m: f64,
        beta_n: f64,
        alpha_degrees: f64,
    ) -> Self {
        assert!((-1.0..=1.0).contains(&h), "h must be in [-1, 1], got {h}");
        assert!(
            beta_m > 0.0 && beta_m <= 1.0,
            "beta_m must be in (0, 1], got {beta_m}"
        );
        assert!(
            beta_n > 0.0 && beta_n <= 1.0,
            "beta_n must be in (0, 1], got {beta_n}"
        );
        assert!(eta > 0.0, "the index of refraction must be positive");

        let v0 = (0.726 * beta_m + 0.812 * beta_m.sq() + 3.7 * beta_m.powi(20)).sq();
        // higher orders share the variance of the TRT lobe
        let v = [v0, 0.25 * v0, 4.0 * v0, 4.0 * v0];

        let s = SQRT_PI_OVER_8 * (0.265 * beta_n + 1.194 * beta_n.sq() + 5.372 * beta_n.powi(22));

        let mut sin_2k_alpha = [0.0; 3];
        let mut cos_2k_alpha = [0.0; 3];
        sin_2k_alpha[0] = alpha_degrees.to_radians().sin();
        cos_2k_alpha[0] = safe_sqrt(1.0 - sin_2k_alpha[0].sq());
        for i in 1..3 {
            sin_2k_alpha[i] = 2.0 * cos_2k_alpha[i - 1] * sin_2k_alpha[i - 1];
            cos_2k_alpha[i] = cos_2k_alpha[i - 1].sq() - sin_2k_alpha[i - 1].sq();
        }

        Self {
            h,
            gamma_o: safe_asin(h),
            eta,
            sigma_a,
            beta_m,
            beta_n,
            v,
            s,
            sin_2k_alpha,
            cos_2k_alpha,
        }
    }

    #[must_use]
    pub const fn h(&self) -> f64 {
        self.h
    }

    #[must_use]
    pub const fn eta(&self) -> f64 {
        self.eta
    }

    #[must_use]
    pub const fn sigma_a(&self) -> RgbD {
        self.sigma_a
    }

    #[must_use]
    pub const fn beta_m(&self) -> f64 {
        self.beta_m
    }

    #[must_use]
    pub const fn beta_n(&self) -> f64 {
        self.beta_n
    }

    /// Absorption coefficient of a fiber with the given concentrations of the dark eumelanin and
    /// the reddish pheomelanin pigments
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn sigma_a_from_concentration(eumelanin: f64, pheomelanin: f64) -> RgbD {
        let eumelanin_sigma_a = RgbD::new(0.419, 0.697, 1.37);
        let pheomelanin_sigma_a = RgbD::new(0.187, 0.4, 1.05);
        eumelanin * eumelanin_sigma_a + pheomelanin * pheomelanin_sigma_a
    }

    /// Absorption coefficient that yields approximately the diffuse color `color` after multiple
    /// scattering between many fibers
    #[must_use]
    #[allow(clippy::suboptimal_flops)]
    pub fn sigma_a_from_reflectance(color: RgbD, beta_n: f64) -> RgbD {
        let denominator = 5.969 - 0.215 * beta_n + 2.532 * beta_n.powi(2) - 10.73 * beta_n.powi(3)
            + 5.574 * beta_n.powi(4)
            + 0.245 * beta_n.powi(5);
        RgbD::new(
            (color.x.ln() / denominator).sq(),
            (color.y.ln() / denominator).sq(),
            (color.z.ln() / denominator).sq(),
        )
    }

    /// Angle between the refracted ray and the fiber axis, projected onto the cross-section
    fn gamma_t(&self, sin_theta_o: f64, cos_theta_o: f64) -> f64 {
        let etap = (self.eta.sq() - sin_theta_o.sq()).sqrt() / cos_theta_o;
        safe_asin(self.h / etap)
    }

    fn attenuation(&self, sin_theta_o: f64, cos_theta_o: f64) -> [RgbD; P_MAX + 1] {
        let sin_theta_t = sin_theta_o / self.eta;
        let cos_theta_t = safe_sqrt(1.0 - sin_theta_t.sq());
        let cos_gamma_t = self.gamma_t(sin_theta_o, cos_theta_o).cos();

        let transmittance = (-self.sigma_a * (2.0 * cos_gamma_t / cos_theta_t)).exp();
        ap(cos_theta_o, self.eta, self.h, transmittance)
    }

    /// Probabilities for choosing each lobe when sampling for an outgoing direction with the
    /// given longitudinal cosine
    #[must_use]
    pub fn attenuation_pdf(&self, cos_theta_o: f64) -> [f64; P_MAX + 1] {
        let sin_theta_o = safe_sqrt(1.0 - cos_theta_o.sq());
        let ap = self.attenuation(sin_theta_o, cos_theta_o);
        let sum: f64 = ap.iter().map(|a| a.luminance()).sum();
        if sum <= 0.0 {
            return [0.0; P_MAX + 1];
        }
        ap.map(|a| a.luminance() / sum)
    }

    /// Rotates the incoming angle by the tilt of the scales, which shifts each lobe differently.
    /// `theta_i` moves by `+2 alpha` for R, `-alpha` for TT and `-4 alpha` for TRT, so the
    /// reflection off the cuticle peaks at `theta_i = -theta_o - 2 alpha`.
    #[allow(clippy::suboptimal_flops)]
    fn tilt(&self, p: usize, sin_theta_i: f64, cos_theta_i: f64) -> (f64, f64) {
        let (sin_theta_ip, cos_theta_ip) = match p {
            0 => (
                sin_theta_i * self.cos_2k_alpha[1] + cos_theta_i * self.sin_2k_alpha[1],
                cos_theta_i * self.cos_2k_alpha[1] - sin_theta_i * self.sin_2k_alpha[1],
            ),
            1 => (
                sin_theta_i * self.cos_2k_alpha[0] - cos_theta_i * self.sin_2k_alpha[0],
                cos_theta_i * self.cos_2k_alpha[0] + sin_theta_i * self.sin_2k_alpha[0],
            ),
            2 => (
                sin_theta_i * self.cos_2k_alpha[2] - cos_theta_i * self.sin_2k_alpha[2],
                cos_theta_i * self.cos_2k_alpha[2] + sin_theta_i * self.sin_2k_alpha[2],
            ),
            _ => (sin_theta_i, cos_theta_i),
        };
        // the rotation may tilt past the fiber axis
        (sin_theta_ip, cos_theta_ip.abs())
    }

    /// Inverse of [`HairBxDF::tilt`], applied to sampled angles
    #[allow(clippy::suboptimal_flops)]
    fn untilt(&self, p: usize, sin_theta_i: f64, cos_theta_i: f64) -> (f64, f64) {
        match p {
            0 => (
                sin_theta_i * self.cos_2k_alpha[1] - cos_theta_i * self.sin_2k_alpha[1],
                cos_theta_i * self.cos_2k_alpha[1] + sin_theta_i * self.sin_2k_alpha[1],
            ),
            1 => (
                sin_theta_i * self.cos_2k_alpha[0] + cos_theta_i * self.sin_2k_alpha[0],
                cos_theta_i * self.cos_2k_alpha[0] - sin_theta_i * self.sin_2k_alpha[0],
            ),
            2 => (
                sin_theta_i * self.cos_2k_alpha[2] + cos_theta_i * self.sin_2k_alpha[2],
                cos_theta_i * self.cos_2k_alpha[2] - sin_theta_i * self.sin_2k_alpha[2],
            ),
            _ => (sin_theta_i, cos_theta_i),
        }
    }

    /// `sum_p weights[p] * M_p * N_p`, shared by the value and the density
    fn lobes<T>(&self, omega_o: Vec3d, omega_i: Vec3d, weights: &[T; P_MAX + 1]) -> T
    where
        T: Copy + Default + std::ops::Add<Output = T> + std::ops::Mul<f64, Output = T>,
    {
        let o = FiberAngles::new(omega_o);
        let i = FiberAngles::new(omega_i);
        let gamma_t = self.gamma_t(o.sin_theta, o.cos_theta);
        let delta_phi = i.phi - o.phi;

        let mut sum = T::default();
        for (p, &weight) in weights.iter().enumerate().take(P_MAX) {
            let (sin_theta_ip, cos_theta_ip) = self.tilt(p, i.sin_theta, i.cos_theta);
            let longitudinal =
                mp(cos_theta_ip, o.cos_theta, sin_theta_ip, o.sin_theta, self.v[p]);
            let azimuthal = np(delta_phi, p, self.s, self.gamma_o, gamma_t);
            sum = sum + weight * (longitudinal * azimuthal);
        }
        let longitudinal = mp(i.cos_theta, o.cos_theta, i.sin_theta, o.sin_theta, self.v[P_MAX]);
        sum + weights[P_MAX] * (longitudinal / (2.0 * consts::PI))
    }
}

impl BxDF for HairBxDF {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::TRANSMISSION | BxDFType::GLOSSY
    }

    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        let o = FiberAngles::new(omega_o);
        let ap = self.attenuation(o.sin_theta, o.cos_theta);
        let f = self.lobes(omega_o, omega_i, &ap);

        // cancels the cosine the renderer applies with respect to the curve normal
        let abs_cos_theta_i = utils::abs_cos_theta(omega_i);
        if abs_cos_theta_i.is_zero() {
            f
        } else {
            f / abs_cos_theta_i
        }
    }

    #[allow(clippy::suboptimal_flops)]
    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        rdf: Vec2d,
    ) -> Option<SampleIncomingResponse> {
        let o = FiberAngles::new(omega_o);
        if o.cos_theta.is_zero() {
            return None;
        }

        // four streams of random numbers from two
        let mut u0 = numeric::demux_float(rdf.x.clamp(0.0, 1.0 - f64::EPSILON));
        let u1 = numeric::demux_float(rdf.y.clamp(0.0, 1.0 - f64::EPSILON));

        let ap_pdf = self.attenuation_pdf(o.cos_theta);
        let mut p = 0;
        while p < P_MAX && u0.x >= ap_pdf[p] {
            u0.x -= ap_pdf[p];
            p += 1;
        }

        // longitudinal angle from the inverted cdf of M_p
        let v = self.v[p];
        let ux = u1.x.max(1e-5);
        let cos_theta = 1.0 + v * (ux + (1.0 - ux) * (-2.0 / v).exp()).ln();
        let sin_theta = safe_sqrt(1.0 - cos_theta.sq());
        let cos_phi = (2.0 * consts::PI * u1.y).cos();
        let sin_theta_i = -cos_theta * o.sin_theta + sin_theta * cos_phi * o.cos_theta;
        let cos_theta_i = safe_sqrt(1.0 - sin_theta_i.sq());
        let (sin_theta_i, cos_theta_i) = self.untilt(p, sin_theta_i, cos_theta_i);

        let delta_phi = if p < P_MAX {
            let gamma_t = self.gamma_t(o.sin_theta, o.cos_theta);
            phi(p, self.gamma_o, gamma_t)
                + numeric::sample_trimmed_logistic(u0.y, self.s, -consts::PI, consts::PI)
        } else {
            2.0 * consts::PI * u0.y
        };

        let phi_i = o.phi + delta_phi;
        let omega_i = Vec3d::new(
            sin_theta_i,
            cos_theta_i * phi_i.cos(),
            cos_theta_i * phi_i.sin(),
        );

        let pdf = self.sample_incoming_pdf(omega_o, normal, omega_i);
        if pdf.is_nan() || pdf <= 0.0 {
            return None;
        }
        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.evaluate(omega_o, normal, omega_i),
            pdf,
            bxdf_type: self.bxdf_type(),
        })
    }

    fn sample_incoming_pdf(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> f64 {
        let o = FiberAngles::new(omega_o);
        let ap_pdf = self.attenuation_pdf(o.cos_theta);
        self.lobes(omega_o, omega_i, &ap_pdf)
    }
}
