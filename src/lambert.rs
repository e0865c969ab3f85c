//! [BxDF]s that can resemble smooth Diffuse surfaces like plastic or thin diffuse sheets like paper
use std::f64::consts;

use crate::{
    utils::{self, FloatExt, SafeCast},
    BxDF, BxDFType, RgbD, RgbF, SampleIncomingResponse, Vec2d, Vec3d,
};

/// Scatters light equally into all directions above the surface
#[derive(Copy, Clone, Debug)]
pub struct LambertianReflection {
    /// The color. Every component should be in \[0,1\] to preserve physical validity.
    pub reflectance: RgbF,
}

impl LambertianReflection {
    #[must_use]
    pub const fn new(reflectance: RgbF) -> Self {
        Self { reflectance }
    }
}

impl BxDF for LambertianReflection {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::DIFFUSE
    }

    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        if utils::same_hemisphere(omega_o, omega_i) {
            self.reflectance.safe_cast() / consts::PI
        } else {
            RgbD::ZERO
        }
    }

    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        _normal: Vec3d,
        rdf: Vec2d,
    ) -> Option<SampleIncomingResponse> {
        if omega_o.z.is_zero() {
            return None;
        }
        let (omega_i, pdf) = utils::sample_diffuse_lobe(omega_o, rdf.x, rdf.y);
        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.reflectance.safe_cast() / consts::PI,
            pdf,
            bxdf_type: self.bxdf_type(),
        })
    }

    fn sample_incoming_pdf(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> f64 {
        utils::sample_diffuse_lobe_pdf(omega_o, omega_i)
    }

    fn reflectance_hd(&self, _omega_o: Vec3d, _normal: Vec3d, _samples: &[Vec2d]) -> RgbD {
        self.reflectance.safe_cast()
    }

    fn reflectance_hh(&self, _normal: Vec3d, _samples_o: &[Vec2d], _samples_i: &[Vec2d]) -> RgbD {
        self.reflectance.safe_cast()
    }
}

/// Scatters light equally into all directions below the surface
#[derive(Copy, Clone, Debug)]
pub struct LambertianTransmission {
    /// The color. Every component should be in \[0,1\] to preserve physical validity.
    pub transmittance: RgbF,
}

impl LambertianTransmission {
    #[must_use]
    pub const fn new(transmittance: RgbF) -> Self {
        Self { transmittance }
    }
}

impl BxDF for LambertianTransmission {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::TRANSMISSION | BxDFType::DIFFUSE
    }

    fn evaluate(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> RgbD {
        if omega_o.z * omega_i.z < 0.0 {
            self.transmittance.safe_cast() / consts::PI
        } else {
            RgbD::ZERO
        }
    }

    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        _normal: Vec3d,
        rdf: Vec2d,
    ) -> Option<SampleIncomingResponse> {
        if omega_o.z.is_zero() {
            return None;
        }
        let (omega_i, pdf) = utils::sample_diffuse_lobe(-omega_o, rdf.x, rdf.y);
        Some(SampleIncomingResponse {
            omega_i,
            omega_o,
            bxdf: self.transmittance.safe_cast() / consts::PI,
            pdf,
            bxdf_type: self.bxdf_type(),
        })
    }

    fn sample_incoming_pdf(&self, omega_o: Vec3d, _normal: Vec3d, omega_i: Vec3d) -> f64 {
        utils::sample_diffuse_lobe_pdf(-omega_o, omega_i)
    }

    fn reflectance_hd(&self, _omega_o: Vec3d, _normal: Vec3d, _samples: &[Vec2d]) -> RgbD {
        self.transmittance.safe_cast()
    }

    fn reflectance_hh(&self, _normal: Vec3d, _samples_o: &[Vec2d], _samples_i: &[Vec2d]) -> RgbD {
        self.transmittance.safe_cast()
    }
}
