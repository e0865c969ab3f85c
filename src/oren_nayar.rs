//! [BxDF] for rough diffuse surfaces like clay, concrete or the moon
use std::f64::consts;

use crate::{
    utils::{self, FloatExt, SafeCast},
    BxDF, BxDFType, RgbD, RgbF, SampleIncomingResponse, Vec2d, Vec3d,
};

/// Microfacet model built from V-shaped Lambertian grooves. Rough diffuse surfaces appear flatter
/// than a [`crate::LambertianReflection`] and reflect more light back towards the viewer.
///
/// Uses the qualitative approximation of
/// [Generalization of Lambert's Reflectance Model](https://dl.acm.org/doi/10.1145/192161.192213).
#[derive(Copy, Clone, Debug)]
pub struct OrenNayar {
    /// The color. Every component should be in \[0,1\] to preserve physical validity.
    pub reflectance: RgbF,
    a: f64,
    b: f64,
}

impl OrenNayar {
    /// `sigma_degrees` is the standard deviation of the groove slopes, in degrees. Zero yields a
    /// Lambertian surface.
    #[must_use]
    pub fn new(reflectance: RgbF, sigma_degrees: f64) -> Self {
        let sigma2 = sigma_degrees.to_radians().sq();
        Self {
            reflectance,
            a: 1.0 - sigma2 / (2.0 * (sigma2 + 0.33)),
            b: 0.45 * sigma2 / (sigma2 + 0.09),
        }
    }
}

impl BxDF for OrenNayar {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::DIFFUSE
    }

    #[allow(clippy::suboptimal_flops)]
    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        if !utils::same_hemisphere(omega_o, omega_i) {
            return RgbD::ZERO;
        }
        let sin_theta_i = utils::sin_theta(omega_i);
        let sin_theta_o = utils::sin_theta(omega_o);

        let max_cos = if sin_theta_i > 1e-4 && sin_theta_o > 1e-4 {
            let d_cos = utils::cos_phi(omega_i) * utils::cos_phi(omega_o)
                + utils::sin_phi(omega_i) * utils::sin_phi(omega_o);
            d_cos.max(0.0)
        } else {
            0.0
        };

        // alpha is the larger of both elevation angles, beta the smaller one
        let abs_cos_theta_i = utils::abs_cos_theta(omega_i);
        let abs_cos_theta_o = utils::abs_cos_theta(omega_o);
        let (sin_alpha, tan_beta) = if abs_cos_theta_i > abs_cos_theta_o {
            (sin_theta_o, sin_theta_i / abs_cos_theta_i)
        } else {
            (sin_theta_i, sin_theta_o / abs_cos_theta_o)
        };

        self.reflectance.safe_cast() / consts::PI
            * (self.a + self.b * max_cos * sin_alpha * tan_beta)
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
