//! An implementation of the Beckmann-Spizzichino distribution

use std::f64::consts;

use crate::{
    microfacet::{self, MicrofacetDistribution, MIN_ALPHA},
    numeric::{erf, erf_inv},
    utils::{self, FloatExt},
    Vec2d, Vec3d,
};

/// Gaussian distributed microfacet slopes. Produces slightly sharper highlights with shorter
/// tails than [`crate::TrowbridgeReitz`].
#[derive(Clone, Copy, Debug)]
pub struct Beckmann {
    /// roughness in direction x, never below [`MIN_ALPHA`]
    alpha_x: f64,
    /// roughness in direction y, never below [`MIN_ALPHA`]
    alpha_y: f64,
    sample_visible_area: bool,
}

impl Beckmann {
    /// Alphas are clamped to [`MIN_ALPHA`]
    #[must_use]
    pub fn new(alpha_x: f64, alpha_y: f64, sample_visible_area: bool) -> Self {
        Self {
            alpha_x: alpha_x.max(MIN_ALPHA),
            alpha_y: alpha_y.max(MIN_ALPHA),
            sample_visible_area,
        }
    }

    #[must_use]
    pub fn isotropic(alpha: f64) -> Self {
        Self::new(alpha, alpha, true)
    }

    /// Builds the distribution from perceptual roughness values, see
    /// [`microfacet::roughness_to_alpha`]
    #[must_use]
    pub fn from_roughness(roughness_x: f64, roughness_y: f64, sample_visible_area: bool) -> Self {
        Self::new(
            microfacet::roughness_to_alpha(roughness_x),
            microfacet::roughness_to_alpha(roughness_y),
            sample_visible_area,
        )
    }

    #[must_use]
    pub const fn alpha_x(&self) -> f64 {
        self.alpha_x
    }

    #[must_use]
    pub const fn alpha_y(&self) -> f64 {
        self.alpha_y
    }

    /// Samples the slopes of the visible normals for a direction stretched to unit roughness
    #[allow(clippy::suboptimal_flops)]
    fn sample_slopes(cos_theta_i: f64, u1: f64, u2: f64) -> Vec2d {
        if cos_theta_i > 0.9999 {
            // normal incidence, the visible normals are distributed like the normals
            let r = (-(1.0 - u1).ln()).sqrt();
            let (sin_phi, cos_phi) = (2.0 * consts::PI * u2).sin_cos();
            return Vec2d::new(r * cos_phi, r * sin_phi);
        }

        let sin_theta_i = (1.0 - cos_theta_i.sq()).max(0.0).sqrt();
        let tan_theta_i = sin_theta_i / cos_theta_i;
        let cot_theta_i = 1.0 / tan_theta_i;

        // search interval of the slope, in erf space
        let mut a = -1.0;
        let mut c = erf(cot_theta_i);
        let sample_x = u1.max(1e-6);

        // start from a fit of the inverse
        let theta_i = cos_theta_i.acos();
        let fit = 1.0 + theta_i * (-0.876 + theta_i * (0.4265 - 0.0594 * theta_i));
        let mut b = c - (1.0 + c) * (1.0 - sample_x).powf(fit);

        let sqrt_pi_inv = 1.0 / consts::PI.sqrt();
        let normalization =
            1.0 / (1.0 + c + sqrt_pi_inv * tan_theta_i * (-cot_theta_i * cot_theta_i).exp());

        // Newton iterations, falling back to bisection when leaving the interval
        for _ in 1..10 {
            if !(a..=c).contains(&b) {
                b = 0.5 * (a + c);
            }
            let inv_erf = erf_inv(b);
            let value = normalization
                * (1.0 + b + sqrt_pi_inv * tan_theta_i * (-inv_erf * inv_erf).exp())
                - sample_x;
            let derivative = normalization * (1.0 - inv_erf * tan_theta_i);
            if value.abs() < 1e-5 {
                break;
            }
            if value > 0.0 {
                c = b;
            } else {
                a = b;
            }
            b -= value / derivative;
        }

        Vec2d::new(erf_inv(b), erf_inv(2.0 * u2.max(1e-6) - 1.0))
    }

    /// Samples a visible normal for `omega_i` on the upper hemisphere
    #[allow(clippy::suboptimal_flops)]
    fn sample_visible(&self, omega_i: Vec3d, u: Vec2d) -> Vec3d {
        // stretch to the unit roughness configuration
        let stretched =
            Vec3d::new(self.alpha_x * omega_i.x, self.alpha_y * omega_i.y, omega_i.z).normalize();

        let slope = Self::sample_slopes(utils::cos_theta(stretched), u.x, u.y);

        // rotate back to the azimuth of the direction and unstretch
        let cos_phi = utils::cos_phi(stretched);
        let sin_phi = utils::sin_phi(stretched);
        let slope_x = (cos_phi * slope.x - sin_phi * slope.y) * self.alpha_x;
        let slope_y = (sin_phi * slope.x + cos_phi * slope.y) * self.alpha_y;

        Vec3d::new(-slope_x, -slope_y, 1.0).normalize()
    }
}

impl MicrofacetDistribution for Beckmann {
    fn ndf(&self, m: Vec3d) -> f64 {
        let tan2_theta = utils::tan2_theta(m);
        if tan2_theta.is_infinite() || tan2_theta.is_nan() {
            return 0.0;
        }
        let cos4_theta = utils::cos2_theta(m).sq();
        (-tan2_theta
            * (utils::cos2_phi(m) / self.alpha_x.sq() + utils::sin2_phi(m) / self.alpha_y.sq()))
        .exp()
            / (consts::PI * self.alpha_x * self.alpha_y * cos4_theta)
    }

    #[allow(clippy::suboptimal_flops)]
    fn lambda(&self, omega: Vec3d) -> f64 {
        let abs_tan_theta = utils::tan_theta(omega).abs();
        if abs_tan_theta.is_infinite() || abs_tan_theta.is_nan() {
            return 0.0;
        }
        let alpha = (utils::cos2_phi(omega) * self.alpha_x.sq()
            + utils::sin2_phi(omega) * self.alpha_y.sq())
        .sqrt();
        let a = 1.0 / (alpha * abs_tan_theta);
        if a >= 1.6 {
            return 0.0;
        }
        (1.0 - 1.259 * a + 0.396 * a * a) / (3.535 * a + 2.181 * a * a)
    }

    fn samples_visible_area(&self) -> bool {
        self.sample_visible_area
    }

    fn sample_normal(&self, omega_o: Vec3d, rnf: Vec2d) -> Vec3d {
        if self.sample_visible_area {
            let flip = omega_o.z < 0.0;
            let m = self.sample_visible(if flip { -omega_o } else { omega_o }, rnf);
            return if flip { -m } else { m };
        }

        let log_sample = (1.0 - rnf.x).ln();
        #[allow(clippy::float_cmp)]
        let (tan2_theta, phi) = if self.alpha_x == self.alpha_y {
            (
                -self.alpha_x.sq() * log_sample,
                rnf.y * 2.0 * consts::PI,
            )
        } else {
            let phi = microfacet::anisotropic_phi(self.alpha_x, self.alpha_y, rnf.y);
            let (sin_phi, cos_phi) = phi.sin_cos();
            (
                -log_sample / (cos_phi.sq() / self.alpha_x.sq() + sin_phi.sq() / self.alpha_y.sq()),
                phi,
            )
        };

        let cos_theta = 1.0 / (1.0 + tan2_theta).sqrt();
        let sin_theta = (1.0 - cos_theta.sq()).max(0.0).sqrt();
        let m = utils::spherical_direction(sin_theta, cos_theta, phi);
        if utils::same_hemisphere(omega_o, m) {
            m
        } else {
            -m
        }
    }
}
