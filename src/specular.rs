//! Perfectly smooth mirrors and glass
//!
//! These models scatter all light into a single direction. [`BxDF::evaluate`] and
//! [`BxDF::sample_incoming_pdf`] therefore always return zero and light can only be transported
//! through [`BxDF::sample_incoming`]. The `pdf` of a sample is the discrete probability of the
//! branch that was taken.
use crate::{
    fresnel::{self, Fresnel},
    utils::{self, FloatExt, SafeCast},
    BxDF, BxDFType, RgbD, RgbF, SampleIncomingResponse, TransportMode, Vec2d, Vec3d,
};

/// Indices of refraction on the side of `omega_o` and on the opposite side
fn ior_pair(eta_a: f64, eta_b: f64, cos_theta_o: f64) -> (f64, f64) {
    if cos_theta_o > 0.0 {
        (eta_a, eta_b)
    } else {
        (eta_b, eta_a)
    }
}

/// Mirror direction of `omega_o`
fn reflection(omega_o: Vec3d, normal: Vec3d) -> Vec3d {
    utils::reflect(normal, omega_o)
}

/// Refracted direction of `omega_o`, `None` on total internal reflection
fn transmission(omega_o: Vec3d, normal: Vec3d, eta_o: f64, eta_t: f64) -> Option<Vec3d> {
    utils::refract(omega_o, utils::face_forward(normal, omega_o), eta_o / eta_t)
}

/// Transmitted color before the division by the cosine. Radiance is compressed when it enters a
/// denser medium.
fn transmitted(
    transmittance: RgbD,
    fresnel: f64,
    eta_o: f64,
    eta_t: f64,
    mode: TransportMode,
) -> RgbD {
    let ft = transmittance * (1.0 - fresnel);
    match mode {
        TransportMode::Radiance => ft * (eta_o / eta_t).sq(),
        TransportMode::Importance => ft,
    }
}

/// A perfect mirror. The [`Fresnel`] term controls how much light is reflected.
///
/// **Note: This code is only available with the `specular` feature**
#[derive(Clone, Copy, Debug)]
pub struct SpecularReflection {
    /// Should be in \[0,1\]
    pub reflectance: RgbF,
    pub fresnel: Fresnel,
}

impl SpecularReflection {
    #[must_use]
    pub const fn new(reflectance: RgbF, fresnel: Fresnel) -> Self {
        Self {
            reflectance,
            fresnel,
        }
    }
}

impl BxDF for SpecularReflection {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::SPECULAR
    }

    fn evaluate(&self, _omega_o: Vec3d, _normal: Vec3d, _omega_i: Vec3d) -> RgbD {
        RgbD::ZERO
    }

    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        _rdf: Vec2d,
    ) -> Option<SampleIncomingResponse> {
        if omega_o.dot(normal).is_zero() {
            return None;
        }
        let omega_i = reflection(omega_o, normal);
        let cos_theta_i = omega_i.dot(normal);
        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.fresnel.evaluate(cos_theta_i) * self.reflectance.safe_cast()
                / cos_theta_i.abs(),
            pdf: 1.0,
            bxdf_type: self.bxdf_type(),
        })
    }

    fn sample_incoming_pdf(&self, _omega_o: Vec3d, _normal: Vec3d, _omega_i: Vec3d) -> f64 {
        0.0
    }
}

/// A smooth dielectric interface that only transmits. The reflected part is lost.
///
/// **Note: This code is only available with the `specular` feature**
#[derive(Clone, Copy, Debug)]
pub struct SpecularTransmission {
    /// Should be in \[0,1\]
    pub transmittance: RgbF,
    /// index of refraction above the surface
    pub eta_a: f64,
    /// index of refraction below the surface
    pub eta_b: f64,
    pub mode: TransportMode,
}

impl SpecularTransmission {
    #[must_use]
    pub fn new(transmittance: RgbF, eta_a: f64, eta_b: f64, mode: TransportMode) -> Self {
        assert!(
            eta_a > 0.0 && eta_b > 0.0,
            "indices of refraction must be positive"
        );
        Self {
            transmittance,
            eta_a,
            eta_b,
            mode,
        }
    }
}

impl BxDF for SpecularTransmission {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::TRANSMISSION | BxDFType::SPECULAR
    }

    fn evaluate(&self, _omega_o: Vec3d, _normal: Vec3d, _omega_i: Vec3d) -> RgbD {
        RgbD::ZERO
    }

    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        _rdf: Vec2d,
    ) -> Option<SampleIncomingResponse> {
        let cos_theta_o = omega_o.dot(normal);
        if cos_theta_o.is_zero() {
            return None;
        }
        let (eta_o, eta_t) = ior_pair(self.eta_a, self.eta_b, cos_theta_o);
        let omega_i = transmission(omega_o, normal, eta_o, eta_t)?;

        let f = fresnel::fresnel_dielectric(cos_theta_o, self.eta_a, self.eta_b);
        let ft = transmitted(self.transmittance.safe_cast(), f, eta_o, eta_t, self.mode);
        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: ft / omega_i.dot(normal).abs(),
            pdf: 1.0,
            bxdf_type: self.bxdf_type(),
        })
    }

    fn sample_incoming_pdf(&self, _omega_o: Vec3d, _normal: Vec3d, _omega_i: Vec3d) -> f64 {
        0.0
    }
}

/// How [`FresnelSpecular`] decides between reflection and transmission
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpecularSampling {
    /// Picks a branch with its Fresnel weight and stores that weight as `pdf`
    #[default]
    FresnelWeighted,
    /// Picks reflection with probability `0.25 + 0.5 F`. The color of the sample is already
    /// divided by that probability and `pdf` is `1.0`.
    RussianRoulette,
}

/// Smooth glass that reflects and transmits, weighted by the dielectric Fresnel term
///
/// **Note: This code is only available with the `specular` feature**
#[derive(Clone, Copy, Debug)]
pub struct FresnelSpecular {
    /// Should be in \[0,1\]
    pub reflectance: RgbF,
    /// Should be in \[0,1\]
    pub transmittance: RgbF,
    /// index of refraction above the surface
    pub eta_a: f64,
    /// index of refraction below the surface
    pub eta_b: f64,
    pub mode: TransportMode,
    pub sampling: SpecularSampling,
}

/// Both outcomes of a [`FresnelSpecular`] interaction
#[derive(Clone, Copy, Debug)]
pub struct SpecularBranches {
    /// `pdf` is the reflected fraction
    pub reflection: SampleIncomingResponse,
    /// `pdf` is the transmitted fraction, `None` on total internal reflection
    pub transmission: Option<SampleIncomingResponse>,
}

impl FresnelSpecular {
    #[must_use]
    pub fn new(
        reflectance: RgbF,
        transmittance: RgbF,
        eta_a: f64,
        eta_b: f64,
        mode: TransportMode,
        sampling: SpecularSampling,
    ) -> Self {
        assert!(
            eta_a > 0.0 && eta_b > 0.0,
            "indices of refraction must be positive"
        );
        Self {
            reflectance,
            transmittance,
            eta_a,
            eta_b,
            mode,
            sampling,
        }
    }

    /// Reflected fraction for light leaving along `omega_o`
    #[must_use]
    pub fn fresnel(&self, omega_o: Vec3d, normal: Vec3d) -> f64 {
        fresnel::fresnel_dielectric(omega_o.dot(normal), self.eta_a, self.eta_b)
    }

    fn reflection_response(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        weight: f64,
        pdf: f64,
    ) -> SampleIncomingResponse {
        let omega_i = reflection(omega_o, normal);
        SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.reflectance.safe_cast() * weight / omega_i.dot(normal).abs(),
            pdf,
            bxdf_type: BxDFType::REFLECTION | BxDFType::SPECULAR,
        }
    }

    fn transmission_response(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        fresnel: f64,
        selection: f64,
        pdf: f64,
    ) -> Option<SampleIncomingResponse> {
        let (eta_o, eta_t) = ior_pair(self.eta_a, self.eta_b, omega_o.dot(normal));
        let omega_i = transmission(omega_o, normal, eta_o, eta_t)?;
        let ft = transmitted(self.transmittance.safe_cast(), fresnel, eta_o, eta_t, self.mode);
        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: ft / (selection * omega_i.dot(normal).abs()),
            pdf,
            bxdf_type: BxDFType::TRANSMISSION | BxDFType::SPECULAR,
        })
    }

    /// Computes both branches at once, as the [`SpecularSampling::FresnelWeighted`] strategy
    /// would return them. The sum of `bxdf * |cos(theta_i)|` over both branches accounts for all
    /// light scattered into `omega_o`.
    ///
    /// Returns `None` if `omega_o` lies in the tangent plane.
    #[must_use]
    pub fn sample_branches(&self, omega_o: Vec3d, normal: Vec3d) -> Option<SpecularBranches> {
        if omega_o.dot(normal).is_zero() {
            return None;
        }
        let f = self.fresnel(omega_o, normal);
        let transmission = self.transmission_response(omega_o, normal, f, 1.0, 1.0 - f);
        // only total internal reflection leaves no refracted direction
        let f = if transmission.is_some() { f } else { 1.0 };
        Some(SpecularBranches {
            reflection: self.reflection_response(omega_o, normal, f, f),
            transmission,
        })
    }
}

impl BxDF for FresnelSpecular {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::TRANSMISSION | BxDFType::SPECULAR
    }

    fn evaluate(&self, _omega_o: Vec3d, _normal: Vec3d, _omega_i: Vec3d) -> RgbD {
        RgbD::ZERO
    }

    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        rdf: Vec2d,
    ) -> Option<SampleIncomingResponse> {
        let cos_theta_o = omega_o.dot(normal);
        if cos_theta_o.is_zero() {
            return None;
        }
        let f = self.fresnel(omega_o, normal);

        let (eta_o, eta_t) = ior_pair(self.eta_a, self.eta_b, cos_theta_o);
        if transmission(omega_o, normal, eta_o, eta_t).is_none() {
            return Some(self.reflection_response(omega_o, normal, 1.0, 1.0));
        }

        match self.sampling {
            SpecularSampling::FresnelWeighted => {
                if rdf.x < f {
                    Some(self.reflection_response(omega_o, normal, f, f))
                } else {
                    self.transmission_response(omega_o, normal, f, 1.0, 1.0 - f)
                }
            }
            SpecularSampling::RussianRoulette => {
                #[allow(clippy::suboptimal_flops)]
                let p_reflection = 0.25 + 0.5 * f;
                if rdf.x < p_reflection {
                    Some(self.reflection_response(omega_o, normal, f / p_reflection, 1.0))
                } else {
                    self.transmission_response(omega_o, normal, f, 1.0 - p_reflection, 1.0)
                }
            }
        }
    }

    fn sample_incoming_pdf(&self, _omega_o: Vec3d, _normal: Vec3d, _omega_i: Vec3d) -> f64 {
        0.0
    }
}
