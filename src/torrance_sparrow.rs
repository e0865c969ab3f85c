//! Glossy [BxDF]s built on a [`MicrofacetDistribution`]. Rough metals, rough plastics and frosted
//! glass can be represented with them.
use crate::{
    fresnel::{self, Fresnel},
    microfacet::MicrofacetDistribution,
    utils::{self, FloatExt, SafeCast},
    BxDF, BxDFType, RgbD, RgbF, SampleIncomingResponse, TransportMode, Vec2d, Vec3d,
};

/// Torrance-Sparrow reflection off a surface made of perfectly specular microfacets
///
/// # Mathematical background
/// * [Microfacet Models for Refraction through Rough Surfaces](https://www.cs.cornell.edu/~srm/publications/EGSR07-btdf.html)
#[derive(Clone, Copy, Debug)]
pub struct TorranceSparrowReflection<D> {
    /// Scales the reflected light
    pub reflectance: RgbF,

    /// The scattering parameters, contains the directional roughness parameters
    pub distribution: D,

    /// Use [`Fresnel::Conductor`] for metals and [`Fresnel::Dielectric`] for the coating of
    /// plastics
    pub fresnel: Fresnel,
}

impl<D: MicrofacetDistribution> TorranceSparrowReflection<D> {
    #[must_use]
    pub const fn new(reflectance: RgbF, distribution: D, fresnel: Fresnel) -> Self {
        Self {
            reflectance,
            distribution,
            fresnel,
        }
    }
}

impl<D: MicrofacetDistribution> BxDF for TorranceSparrowReflection<D> {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::GLOSSY
    }

    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        if !utils::same_hemisphere(omega_o, omega_i) {
            return RgbD::ZERO;
        }
        let cos_theta_o = utils::abs_cos_theta(omega_o);
        let cos_theta_i = utils::abs_cos_theta(omega_i);
        if cos_theta_o < utils::EPS || cos_theta_i < utils::EPS {
            return RgbD::ZERO;
        }
        let Some(m) = utils::half_vector(omega_o, omega_i) else {
            return RgbD::ZERO;
        };

        let fresnel = self
            .fresnel
            .evaluate(omega_i.dot(utils::face_forward(m, Vec3d::Z)));
        let masking_shadowing = self.distribution.geometric(omega_o, omega_i);
        let ndf = self.distribution.ndf(m);

        self.reflectance.safe_cast() * fresnel * (ndf * masking_shadowing)
            / (4.0 * cos_theta_i * cos_theta_o)
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
        let m = self.distribution.sample_normal(omega_o, rdf);
        let cos_o_m = omega_o.dot(m);
        if cos_o_m <= 0.0 {
            return None;
        }
        let omega_i = utils::reflect(m, omega_o);
        if !utils::same_hemisphere(omega_o, omega_i) {
            return None;
        }

        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.evaluate(omega_o, normal, omega_i),
            pdf: self.distribution.sample_normal_pdf(omega_o, m) / (4.0 * cos_o_m),
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
        self.distribution.sample_normal_pdf(omega_o, m) / (4.0 * omega_o.dot(m))
    }
}

/// Torrance-Sparrow transmission through a rough dielectric interface.
/// `eta_a` is the index of refraction above the surface, `eta_b` below.
#[derive(Clone, Copy, Debug)]
pub struct TorranceSparrowTransmission<D> {
    /// Scales the transmitted light
    pub transmittance: RgbF,

    /// The scattering parameters, contains the directional roughness parameters
    pub distribution: D,

    /// index of refraction above the surface
    pub eta_a: f64,

    /// index of refraction below the surface
    pub eta_b: f64,

    pub mode: TransportMode,
}

impl<D: MicrofacetDistribution> TorranceSparrowTransmission<D> {
    #[must_use]
    pub fn new(
        transmittance: RgbF,
        distribution: D,
        eta_a: f64,
        eta_b: f64,
        mode: TransportMode,
    ) -> Self {
        assert!(
            eta_a > 0.0 && eta_b > 0.0,
            "indices of refraction must be positive"
        );
        Self {
            transmittance,
            distribution,
            eta_a,
            eta_b,
            mode,
        }
    }

    /// index of refraction on the side of `omega_i` relative to the side of `omega_o`
    fn relative_eta(&self, omega_o: Vec3d) -> f64 {
        if utils::cos_theta(omega_o) > 0.0 {
            self.eta_b / self.eta_a
        } else {
            self.eta_a / self.eta_b
        }
    }

    /// The generalized half vector on the upper side. `None` if both directions do not lie on
    /// opposite sides of it or it is not visible from `omega_o`.
    fn refraction_normal(&self, omega_o: Vec3d, omega_i: Vec3d, eta: f64) -> Option<Vec3d> {
        let m = (omega_o + omega_i * eta).try_normalize()?;
        let m = if m.z < 0.0 { -m } else { m };
        let cos_o_m = omega_o.dot(m);
        if cos_o_m * omega_i.dot(m) >= 0.0 || cos_o_m * omega_o.z <= 0.0 {
            return None;
        }
        Some(m)
    }
}

impl<D: MicrofacetDistribution> BxDF for TorranceSparrowTransmission<D> {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::TRANSMISSION | BxDFType::GLOSSY
    }

    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        if omega_o.z * omega_i.z >= 0.0 {
            return RgbD::ZERO;
        }
        let cos_theta_o = utils::cos_theta(omega_o);
        let cos_theta_i = utils::cos_theta(omega_i);
        if cos_theta_o.abs() < utils::EPS || cos_theta_i.abs() < utils::EPS {
            return RgbD::ZERO;
        }

        let eta = self.relative_eta(omega_o);
        let Some(m) = self.refraction_normal(omega_o, omega_i, eta) else {
            return RgbD::ZERO;
        };

        let cos_o_m = omega_o.dot(m);
        let cos_i_m = omega_i.dot(m);
        let fresnel = fresnel::fresnel_dielectric(cos_o_m, self.eta_a, self.eta_b);

        #[allow(clippy::suboptimal_flops)]
        let sqrt_denom = cos_o_m + eta * cos_i_m;
        let factor = match self.mode {
            TransportMode::Radiance => 1.0 / eta,
            TransportMode::Importance => 1.0,
        };

        let masking_shadowing = self.distribution.geometric(omega_o, omega_i);
        let ndf = self.distribution.ndf(m);

        let value = (ndf * masking_shadowing * eta.sq() * cos_i_m * cos_o_m * factor.sq()
            / (cos_theta_i * cos_theta_o * sqrt_denom.sq()))
        .abs();

        self.transmittance.safe_cast() * ((1.0 - fresnel) * value)
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
        let m = self.distribution.sample_normal(omega_o, rdf);
        if omega_o.dot(m) <= 0.0 {
            return None;
        }
        let eta = 1.0 / self.relative_eta(omega_o);
        let omega_i = utils::refract(omega_o, m, eta)?.normalize();

        let pdf = self.sample_incoming_pdf(omega_o, normal, omega_i);
        if pdf == 0.0 {
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
        if omega_o.z * omega_i.z >= 0.0 {
            return 0.0;
        }
        let eta = self.relative_eta(omega_o);
        let Some(m) = self.refraction_normal(omega_o, omega_i, eta) else {
            return 0.0;
        };

        let cos_i_m = omega_i.dot(m);
        #[allow(clippy::suboptimal_flops)]
        let sqrt_denom = omega_o.dot(m) + eta * cos_i_m;
        let jacobian = (eta.sq() * cos_i_m / sqrt_denom.sq()).abs();

        // the distribution samples normals on the side of omega_o
        let m = if omega_o.z < 0.0 { -m } else { m };
        self.distribution.sample_normal_pdf(omega_o, m) * jacobian
    }
}

#[cfg(test)]
impl<D: MicrofacetDistribution> crate::core::TransmissiveBxDF for TorranceSparrowTransmission<D> {
    fn ior(&self) -> f64 {
        self.eta_b
    }
}
