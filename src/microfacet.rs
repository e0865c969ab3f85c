//! The statistical description of rough surfaces shared by the microfacet based models
//!
//! A rough surface is treated as a collection of tiny perfect mirrors, the microfacets. A
//! [`MicrofacetDistribution`] describes how their normals are distributed and how much of the
//! microsurface is hidden from a given direction.
//!
//! # Mathematical background
//! * [Understanding the Masking-Shadowing Function in Microfacet-Based BRDFs](https://jcgt.org/published/0003/02/03/)
//! * [Microfacet Models for Refraction through Rough Surfaces](https://www.cs.cornell.edu/~srm/publications/EGSR07-btdf.html)
use crate::{
    utils::{self, FloatExt},
    Vec2d, Vec3d,
};

/// Alphas below this value produce numerically unusable distributions
pub const MIN_ALPHA: f64 = 0.001;

pub trait MicrofacetDistribution {
    /// Distribution of normals / Normal Distribution Function.
    /// The differential area of microfacets oriented along `m`. This is the $D$ term in the
    /// Torrance-Sparrow model. Returns `0.0` for normals in the tangent plane.
    fn ndf(&self, m: Vec3d) -> f64;

    /// Auxiliary function of the Smith masking-shadowing function. The ratio of invisible to
    /// visible microfacet area seen from `omega`.
    fn lambda(&self, omega: Vec3d) -> f64;

    /// `true` if [`MicrofacetDistribution::sample_normal`] only generates normals visible from
    /// the outgoing direction
    fn samples_visible_area(&self) -> bool;

    /// Samples a microfacet normal on the side of `omega_o`
    fn sample_normal(&self, omega_o: Vec3d, rnf: Vec2d) -> Vec3d;

    /// Fraction of microfacets visible from `omega`. This is the `G_1` term.
    fn shadowing(&self, omega: Vec3d) -> f64 {
        1.0 / (1.0 + self.lambda(omega))
    }

    /// Height correlated masking-shadowing of the pair of directions.
    /// This is the $G$ term in the Torrance-Sparrow model.
    fn geometric(&self, omega_o: Vec3d, omega_i: Vec3d) -> f64 {
        1.0 / (1.0 + self.lambda(omega_o) + self.lambda(omega_i))
    }

    /// Density of [`MicrofacetDistribution::sample_normal`] generating `m`, measured in solid
    /// angle around `m`
    fn sample_normal_pdf(&self, omega_o: Vec3d, m: Vec3d) -> f64 {
        if self.samples_visible_area() {
            let cos_o = utils::abs_cos_theta(omega_o);
            if cos_o.is_zero() {
                return 0.0;
            }
            self.ndf(m) * self.shadowing(omega_o) * omega_o.dot(m).abs() / cos_o
        } else {
            self.ndf(m) * utils::abs_cos_theta(m)
        }
    }
}

impl<T: MicrofacetDistribution + ?Sized> MicrofacetDistribution for &T {
    fn ndf(&self, m: Vec3d) -> f64 {
        (**self).ndf(m)
    }
    fn lambda(&self, omega: Vec3d) -> f64 {
        (**self).lambda(omega)
    }
    fn samples_visible_area(&self) -> bool {
        (**self).samples_visible_area()
    }
    fn sample_normal(&self, omega_o: Vec3d, rnf: Vec2d) -> Vec3d {
        (**self).sample_normal(omega_o, rnf)
    }
}

/// Maps a perceptually linear roughness in `[0, 1]` to the alpha of a [`crate::Beckmann`] or
/// [`crate::TrowbridgeReitz`] distribution
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn roughness_to_alpha(roughness: f64) -> f64 {
    let x = roughness.max(1e-3).ln();
    1.62142 + 0.819_955 * x + 0.1734 * x * x + 0.017_120_1 * x * x * x + 0.000_640_711 * x * x * x * x
}

/// The stretched azimuth used by the anisotropic samplers of both distributions
pub(crate) fn anisotropic_phi(alpha_x: f64, alpha_y: f64, u: f64) -> f64 {
    let phi = (alpha_y / alpha_x * (2.0 * std::f64::consts::PI * u + 0.5 * std::f64::consts::PI).tan())
        .atan();
    if u > 0.5 {
        phi + std::f64::consts::PI
    } else {
        phi
    }
}
