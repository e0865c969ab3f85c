//! Lobes of the Disney BRDF that are not covered by the other models of this crate
//!
//! # Mathematical background
//! * [Physically Based Shading at Disney](https://media.disneyanimation.com/uploads/production/publication_asset/48/asset/s2012_pbs_disney_brdf_notes_v3.pdf)
//! * [Extending the Disney BRDF to a BSDF with Integrated Subsurface Scattering](https://blog.selfshadow.com/publications/s2015-shading-course/burley/s2015_pbs_disney_bsdf_notes.pdf)

use std::f64::consts;

use crate::{
    fresnel,
    utils::{self, FloatExt, SafeCast},
    BxDF, BxDFType, RgbD, RgbF, SampleIncomingResponse, Vec2d, Vec3d,
};

/// Generalized Trowbridge-Reitz with `gamma = 1`. Has much longer tails than
/// [`crate::TrowbridgeReitz`].
fn gtr1(cos_theta_h: f64, alpha: f64) -> f64 {
    let alpha2 = alpha.sq();
    #[allow(clippy::suboptimal_flops)]
    let denominator = consts::PI * alpha2.ln() * (1.0 + (alpha2 - 1.0) * cos_theta_h.sq());
    (alpha2 - 1.0) / denominator
}

/// Separable Smith shadowing of GGX, already divided by `2 cos(theta)`
fn smith_g_ggx(cos_theta: f64, alpha: f64) -> f64 {
    let alpha2 = alpha.sq();
    let cos2_theta = cos_theta.sq();
    #[allow(clippy::suboptimal_flops)]
    let root = (alpha2 + cos2_theta - alpha2 * cos2_theta).sqrt();
    1.0 / (cos_theta + root)
}

/// A thin, colorless and glossy layer on top of a surface, like the lacquer on a car
///
/// **Note: This code is only available with the `disney` feature**
#[derive(Copy, Clone, Debug)]
pub struct DisneyClearCoat {
    /// scales the whole lobe, usually in `[0, 1]`
    pub weight: f64,
    alpha: f64,
}

impl DisneyClearCoat {
    /// `gloss` in `[0, 1]` maps to a distribution width between `0.1` (satin) and `0.001`
    /// (mirror like)
    #[must_use]
    pub fn new(weight: f64, gloss: f64) -> Self {
        Self {
            weight,
            alpha: 0.1_f64.lerp(0.001, gloss),
        }
    }

    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl BxDF for DisneyClearCoat {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::GLOSSY
    }

    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        if !utils::same_hemisphere(omega_o, omega_i) {
            return RgbD::ZERO;
        }
        let Some(m) = utils::half_vector(omega_o, omega_i) else {
            return RgbD::ZERO;
        };

        let d = gtr1(utils::abs_cos_theta(m), self.alpha);
        let f = fresnel::fresnel_schlick(RgbD::splat(0.04), omega_o.dot(m));
        let g = smith_g_ggx(utils::abs_cos_theta(omega_o), 0.25)
            * smith_g_ggx(utils::abs_cos_theta(omega_i), 0.25);

        self.weight * g * f * d / 4.0
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

        // inverse of the cdf of gtr1 in cos(theta)
        let alpha2 = self.alpha.sq();
        let cos_theta = ((1.0 - alpha2.powf(1.0 - rdf.x)) / (1.0 - alpha2))
            .max(0.0)
            .sqrt();
        let sin_theta = (1.0 - cos_theta.sq()).max(0.0).sqrt();
        let m = utils::spherical_direction(sin_theta, cos_theta, 2.0 * consts::PI * rdf.y);
        let m = if utils::same_hemisphere(omega_o, m) { m } else { -m };

        let omega_i = utils::reflect(m, omega_o);
        if !utils::same_hemisphere(omega_o, omega_i) {
            return None;
        }

        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.evaluate(omega_o, normal, omega_i),
            pdf: self.sample_incoming_pdf(omega_o, normal, omega_i),
            bxdf_type: self.bxdf_type(),
        })
    }

    fn sample_incoming_pdf(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> f64 {
        if !utils::same_hemisphere(omega_o, omega_i) {
            return 0.0;
        }
        let Some(m) = utils::half_vector(omega_o, omega_i) else {
            return 0.0;
        };
        let cos_theta_h = utils::abs_cos_theta(m);
        gtr1(cos_theta_h, self.alpha) * cos_theta_h / (4.0 * omega_o.dot(m))
    }
}

/// Approximates the flattened look of subsurface scattering with a diffuse lobe, in the spirit
/// of the Hanrahan-Krueger model. Surfaces appear brighter at grazing angles.
///
/// **Note: This code is only available with the `disney` feature**
#[derive(Copy, Clone, Debug)]
pub struct DisneyFakeSubsurface {
    /// The color. Every component should be in \[0,1\] to preserve physical validity.
    pub reflectance: RgbF,
    /// Should be in \[0,1\]
    pub roughness: f64,
}

impl DisneyFakeSubsurface {
    #[must_use]
    pub const fn new(reflectance: RgbF, roughness: f64) -> Self {
        Self {
            reflectance,
            roughness,
        }
    }
}

impl BxDF for DisneyFakeSubsurface {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::DIFFUSE
    }

    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        if !utils::same_hemisphere(omega_o, omega_i) {
            return RgbD::ZERO;
        }
        let Some(m) = utils::half_vector(omega_o, omega_i) else {
            return RgbD::ZERO;
        };

        let cos_theta_o = utils::abs_cos_theta(omega_o);
        let cos_theta_i = utils::abs_cos_theta(omega_i);
        let fss90 = omega_i.dot(m).sq() * self.roughness;
        let fo = fresnel::schlick_weight(cos_theta_o);
        let fi = fresnel::schlick_weight(cos_theta_i);
        let fss = 1.0_f64.lerp(fss90, fo) * 1.0_f64.lerp(fss90, fi);

        #[allow(clippy::suboptimal_flops)]
        let ss = 1.25 * (fss * (1.0 / (cos_theta_o + cos_theta_i) - 0.5) + 0.5);

        self.reflectance.safe_cast() * consts::FRAC_1_PI * ss
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
        let (omega_i, pdf) = utils::sample_diffuse_lobe(omega_o, rdf.x, rdf.y);
        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.evaluate(omega_o, normal, omega_i),
            pdf,
            bxdf_type: self.bxdf_type(),
        })
    }

    fn sample_incoming_pdf(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> f64 {
        utils::sample_diffuse_lobe_pdf(omega_o, omega_i)
    }
}
