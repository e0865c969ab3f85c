//! Glossy coatings on top of a diffuse base, like varnished wood or glossy paint
//!
//! Both models blend a diffuse substrate with a glossy coating, such that the coating dominates
//! at grazing angles and light transmitted through the coating is scattered diffusely.
//!
//! # Mathematical background
//! * [An Anisotropic Phong BRDF Model](https://www.cs.utah.edu/~shirley/papers/jgtbrdf.pdf)
use std::f64::consts;

use crate::{
    fresnel,
    microfacet::MicrofacetDistribution,
    utils::{self, FloatExt, SafeCast},
    BxDF, BxDFType, RgbD, RgbF, SampleIncomingResponse, Vec2d, Vec3d,
};

/// Largest [f64] below `1.0`, keeps remapped sample points inside `[0, 1)`
const ONE_MINUS_EPSILON: f64 = 1.0 - f64::EPSILON / 2.0;

/// The diffuse term, energy that passed the coating twice is scattered diffusely
#[allow(clippy::suboptimal_flops)]
fn diffuse_term(diffuse: RgbD, specular: RgbD, omega_o: Vec3d, omega_i: Vec3d) -> RgbD {
    diffuse
        * (RgbD::ONE - specular)
        * (28.0 / (23.0 * consts::PI))
        * (1.0 - utils::pow5(1.0 - 0.5 * utils::abs_cos_theta(omega_i)))
        * (1.0 - utils::pow5(1.0 - 0.5 * utils::abs_cos_theta(omega_o)))
}

/// Picks one of both lobes with equal probability and stretches the sample point back to
/// `[0, 1)`. `true` selects the diffuse lobe.
fn choose_lobe(rdf: Vec2d) -> (bool, Vec2d) {
    if rdf.x < 0.5 {
        (true, Vec2d::new((2.0 * rdf.x).min(ONE_MINUS_EPSILON), rdf.y))
    } else {
        (
            false,
            Vec2d::new((2.0 * (rdf.x - 0.5)).min(ONE_MINUS_EPSILON), rdf.y),
        )
    }
}

/// Diffuse substrate under a glossy coating described by a [`MicrofacetDistribution`]
#[derive(Clone, Copy, Debug)]
pub struct FresnelBlend<D> {
    /// color of the diffuse substrate
    pub diffuse: RgbF,
    /// reflectance of the coating at normal incidence
    pub specular: RgbF,
    pub distribution: D,
}

impl<D: MicrofacetDistribution> FresnelBlend<D> {
    #[must_use]
    pub const fn new(diffuse: RgbF, specular: RgbF, distribution: D) -> Self {
        Self {
            diffuse,
            specular,
            distribution,
        }
    }
}

impl<D: MicrofacetDistribution> BxDF for FresnelBlend<D> {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::GLOSSY
    }

    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        if !utils::same_hemisphere(omega_o, omega_i) {
            return RgbD::ZERO;
        }
        let specular = self.specular.safe_cast();
        let diffuse = diffuse_term(self.diffuse.safe_cast(), specular, omega_o, omega_i);

        let Some(m) = utils::half_vector(omega_o, omega_i) else {
            return RgbD::ZERO;
        };
        let cos_i_m = omega_i.dot(m).abs();
        let glossy = fresnel::fresnel_schlick(specular, cos_i_m) * self.distribution.ndf(m)
            / (4.0
                * cos_i_m
                * utils::abs_cos_theta(omega_i).max(utils::abs_cos_theta(omega_o)));

        diffuse + glossy
    }

    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        rdf: Vec2d,
    ) -> Option<SampleIncomingResponse> {
        if omega_o.z.is_zero() {
            return None;
        }
        let omega_i = match choose_lobe(rdf) {
            (true, u) => utils::sample_diffuse_lobe(omega_o, u.x, u.y).0,
            (false, u) => {
                let m = self.distribution.sample_normal(omega_o, u);
                if omega_o.dot(m) <= 0.0 {
                    return None;
                }
                let omega_i = utils::reflect(m, omega_o);
                if !utils::same_hemisphere(omega_o, omega_i) {
                    return None;
                }
                omega_i
            }
        };

        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.evaluate(omega_o, normal, omega_i),
            pdf: self.sample_incoming_pdf(omega_o, normal, omega_i),
            bxdf_type: self.bxdf_type(),
        })
    }

    #[allow(clippy::suboptimal_flops)]
    fn sample_incoming_pdf(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> f64 {
        if !utils::same_hemisphere(omega_o, omega_i) {
            return 0.0;
        }
        let Some(m) = utils::half_vector(omega_o, omega_i) else {
            return 0.0;
        };
        let glossy_pdf = self.distribution.sample_normal_pdf(omega_o, m) / (4.0 * omega_o.dot(m));
        0.5 * (utils::sample_diffuse_lobe_pdf(omega_o, omega_i) + glossy_pdf)
    }
}

/// Diffuse substrate under an isotropic Phong coating
#[derive(Clone, Copy, Debug)]
pub struct AshikhminShirley {
    /// color of the diffuse substrate
    pub diffuse: RgbF,
    /// reflectance of the coating at normal incidence
    pub specular: RgbF,
    /// Phong exponent, larger values give sharper highlights
    exponent: f64,
}

impl AshikhminShirley {
    #[must_use]
    pub fn new(diffuse: RgbF, specular: RgbF, exponent: f64) -> Self {
        assert!(exponent >= 0.0, "the phong exponent must not be negative");
        Self {
            diffuse,
            specular,
            exponent,
        }
    }

    #[must_use]
    pub const fn exponent(&self) -> f64 {
        self.exponent
    }

    /// `(n + 1) / 2pi * cos^n(theta_m)`, the Phong lobe normalized over solid angle
    fn half_vector_pdf(&self, m: Vec3d) -> f64 {
        (self.exponent + 1.0) / (2.0 * consts::PI)
            * utils::abs_cos_theta(m).powf(self.exponent)
    }
}

impl BxDF for AshikhminShirley {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::GLOSSY
    }

    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        if !utils::same_hemisphere(omega_o, omega_i) {
            return RgbD::ZERO;
        }
        let specular = self.specular.safe_cast();
        let diffuse = diffuse_term(self.diffuse.safe_cast(), specular, omega_o, omega_i);

        let Some(m) = utils::half_vector(omega_o, omega_i) else {
            return RgbD::ZERO;
        };
        let cos_i_m = omega_i.dot(m).abs();
        let glossy = fresnel::fresnel_schlick(specular, cos_i_m) * self.half_vector_pdf(m)
            / (4.0
                * cos_i_m
                * utils::abs_cos_theta(omega_i).max(utils::abs_cos_theta(omega_o)));

        diffuse + glossy
    }

    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        rdf: Vec2d,
    ) -> Option<SampleIncomingResponse> {
        if omega_o.z.is_zero() {
            return None;
        }
        let omega_i = match choose_lobe(rdf) {
            (true, u) => utils::sample_diffuse_lobe(omega_o, u.x, u.y).0,
            (false, u) => {
                let cos_theta = u.x.powf(1.0 / (self.exponent + 1.0));
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
                let m = utils::spherical_direction(sin_theta, cos_theta, 2.0 * consts::PI * u.y);
                let m = if omega_o.z < 0.0 { -m } else { m };
                if omega_o.dot(m) <= 0.0 {
                    return None;
                }
                let omega_i = utils::reflect(m, omega_o);
                if !utils::same_hemisphere(omega_o, omega_i) {
                    return None;
                }
                omega_i
            }
        };

        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.evaluate(omega_o, normal, omega_i),
            pdf: self.sample_incoming_pdf(omega_o, normal, omega_i),
            bxdf_type: self.bxdf_type(),
        })
    }

    #[allow(clippy::suboptimal_flops)]
    fn sample_incoming_pdf(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> f64 {
        if !utils::same_hemisphere(omega_o, omega_i) {
            return 0.0;
        }
        let Some(m) = utils::half_vector(omega_o, omega_i) else {
            return 0.0;
        };
        let glossy_pdf = self.half_vector_pdf(m) / (4.0 * omega_o.dot(m));
        0.5 * (utils::sample_diffuse_lobe_pdf(omega_o, omega_i) + glossy_pdf)
    }
}
