//! An implementation of the Trowbridge-Reitz (GGX) Distribution

use crate::{
    microfacet::{self, MicrofacetDistribution, MIN_ALPHA},
    utils::{self, FloatExt},
    Vec2d, Vec3d,
};
use std::f64::consts;

/// This is a common microsurface model to describe anisotropic rough surfaces. Compared to
/// [`crate::Beckmann`] its highlights have longer tails.
///
/// # Mathematical background
/// * [Understanding the Masking-Shadowing Function in Microfacet-Based BRDFs](https://jcgt.org/published/0003/02/03/)
/// * [Sampling the GGX Distribution of Visible Normals](https://jcgt.org/published/0007/04/01/)
#[derive(Clone, Copy, Debug)]
pub struct TrowbridgeReitz {
    /// roughness in direction x
    /// This roughness values are not perceived linearly. Use
    /// [`microfacet::roughness_to_alpha`] or `alpha_x = perceived_rougness_x^2` for choosing
    /// roughness values.
    alpha_x: f64,

    /// roughness in direction y
    alpha_y: f64,

    sample_visible_area: bool,
}

impl TrowbridgeReitz {
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

    /// Squares the perceived roughness and stretches it by `anisotropic` in `[0, 1]`
    #[must_use]
    pub fn from_remapped(roughness: f64, anisotropic: f64) -> Self {
        let max_aniso: f64 = 0.9;
        let alpha = roughness.sq();

        #[allow(clippy::suboptimal_flops)]
        let aspect = (1.0 - max_aniso * anisotropic).sqrt();
        Self::new(alpha / aspect, alpha * aspect, true)
    }

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

    /// Samples a visible normal for `omega_o` on the upper hemisphere
    #[must_use]
    fn sample_vndf(&self, omega_o: Vec3d, r1: f64, r2: f64) -> Vec3d {
        let v_h: Vec3d = Vec3d::new(
            omega_o.x * self.alpha_x,
            omega_o.y * self.alpha_y,
            omega_o.z,
        )
        .normalize();

        #[allow(clippy::suboptimal_flops)]
        let lensq = v_h.x * v_h.x + v_h.y * v_h.y;
        let at1: Vec3d = if lensq > (1.0e-10) {
            Vec3d::new(-v_h.y, v_h.x, 0.0) / f64::sqrt(lensq)
        } else {
            Vec3d::new(1.0, 0.0, 0.0)
        };
        let at2: Vec3d = Vec3d::cross(v_h, at1);

        let r = r1.sqrt();
        let phi: f64 = (2.0) * consts::PI * r2;
        let t1 = r * phi.cos();
        let t2 = r * phi.sin();
        let s: f64 = (0.5) * ((1.0) + v_h.z);

        #[allow(clippy::suboptimal_flops)]
        let t2r = (1.0 - s) * (1.0 - t1 * t1).sqrt() + s * t2;

        #[allow(clippy::suboptimal_flops)]
        let m_h: Vec3d = at1 * t1 + at2 * t2r + v_h * (1.0 - t1 * t1 - t2r * t2r).max(0.0).sqrt();

        Vec3d::new(
            self.alpha_x * m_h.x,
            self.alpha_y * m_h.y,
            f64::max(0.0, m_h.z),
        )
        .normalize()
    }
}

impl MicrofacetDistribution for TrowbridgeReitz {
    fn ndf(&self, m: Vec3d) -> f64 {
        let tan2_theta = utils::tan2_theta(m);
        if tan2_theta.is_infinite() || tan2_theta.is_nan() {
            return 0.0;
        }
        let cos4_theta = utils::cos2_theta(m).sq();
        let e = (utils::cos2_phi(m) / self.alpha_x.sq() + utils::sin2_phi(m) / self.alpha_y.sq())
            * tan2_theta;
        1.0 / (consts::PI * self.alpha_x * self.alpha_y * cos4_theta * (1.0 + e).sq())
    }

    fn lambda(&self, omega: Vec3d) -> f64 {
        let abs_tan_theta = utils::tan_theta(omega).abs();
        if abs_tan_theta.is_infinite() || abs_tan_theta.is_nan() {
            return 0.0;
        }
        #[allow(clippy::suboptimal_flops)]
        let alpha = (utils::cos2_phi(omega) * self.alpha_x.sq()
            + utils::sin2_phi(omega) * self.alpha_y.sq())
        .sqrt();
        let alpha2_tan2_theta = (alpha * abs_tan_theta).sq();
        (-1.0 + (1.0 + alpha2_tan2_theta).sqrt()) / 2.0
    }

    fn samples_visible_area(&self) -> bool {
        self.sample_visible_area
    }

    fn sample_normal(&self, omega_o: Vec3d, rnf: Vec2d) -> Vec3d {
        if self.sample_visible_area {
            let flip = omega_o.z < 0.0;
            let m = self.sample_vndf(if flip { -omega_o } else { omega_o }, rnf.x, rnf.y);
            return if flip { -m } else { m };
        }

        #[allow(clippy::float_cmp)]
        let (tan2_theta, phi) = if self.alpha_x == self.alpha_y {
            (
                self.alpha_x.sq() * rnf.x / (1.0 - rnf.x),
                2.0 * consts::PI * rnf.y,
            )
        } else {
            let phi = microfacet::anisotropic_phi(self.alpha_x, self.alpha_y, rnf.y);
            let (sin_phi, cos_phi) = phi.sin_cos();
            let alpha2 = 1.0 / (cos_phi.sq() / self.alpha_x.sq() + sin_phi.sq() / self.alpha_y.sq());
            (alpha2 * rnf.x / (1.0 - rnf.x), phi)
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
