use bitflags::bitflags;

use crate::utils;

/// used for colors
pub type RgbD = glam::f64::DVec3;
/// used for colors
pub type RgbF = glam::f32::Vec3;

/// used for direction vectors
pub type Vec3d = glam::f64::DVec3;
/// used for direction vectors and sample points
pub type Vec2d = glam::f64::DVec2;

bitflags! {
    /// Classifies the lobes a [`BxDF`] consists of. Every instance reports a fixed combination,
    /// a sampled [`SampleIncomingResponse`] reports the lobe it was drawn from.
    pub struct BxDFType: u8 {
        const REFLECTION = 1 << 0;
        const TRANSMISSION = 1 << 1;
        const DIFFUSE = 1 << 2;
        const GLOSSY = 1 << 3;
        const SPECULAR = 1 << 4;
        const ALL = Self::REFLECTION.bits
            | Self::TRANSMISSION.bits
            | Self::DIFFUSE.bits
            | Self::GLOSSY.bits
            | Self::SPECULAR.bits;
    }
}

/// Which quantity is carried along a path. Refraction scales radiance by the squared ratio of the
/// indices of refraction, but not importance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportMode {
    /// Paths started at the camera
    #[default]
    Radiance,
    /// Paths started at a light source
    Importance,
}

/// Contains the Data that is returned by [`BxDF::sample_incoming`]
#[derive(Clone, Copy, Debug)]
pub struct SampleIncomingResponse {
    /// # Incoming Direction
    /// The direction where light could be arriving at the surface
    pub omega_i: Vec3d,

    /// The outgoing direction the sample was drawn for
    pub omega_o: Vec3d,

    /// The value of the BxDF. Indicates how much light is scattered from the incoming
    /// direction to the outgoing direction
    pub bxdf: RgbD,

    /// The probability density for choosing `omega_i` given `omega_o`. Specular lobes store the
    /// discrete probability of the chosen branch here.
    pub pdf: f64,

    /// The lobe the sample was drawn from
    pub bxdf_type: BxDFType,
}

/// Bidirectional Scattering Distribution Functions. Describes how light arriving from
/// `omega_i` is scattered towards `omega_o`.
///
/// All directions are given in the local shading frame, `normal` is the shading normal in that
/// frame and usually `+Z`.
pub trait BxDF {
    /// The lobes this [`BxDF`] consists of
    fn bxdf_type(&self) -> BxDFType;

    /// Returns the value of the BxDF at the given directions. Returns zero if the directions lie
    /// in hemispheres this model does not scatter between.
    ///
    /// # Arguments
    /// * `omega_o` - Exitant light direction
    /// * `normal` - The shading normal
    /// * `omega_i` - Incident light direction
    fn evaluate(&self, omega_o: Vec3d, normal: Vec3d, omega_i: Vec3d) -> RgbD;

    /// Given a direction where light is scattered to, samples an incident direction, from which
    /// the light may come from
    ///
    /// # Arguments
    /// * `omega_o` - The direction where light is scattered to. Outgoing direction
    /// * `normal` - The shading normal
    /// * `rdf` - Uniformly distributed numbers in `[0, 1)` used for sampling
    ///
    /// # Return
    /// `None` if no direction could be generated, see [`SampleIncomingResponse`] otherwise
    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        rdf: Vec2d,
    ) -> Option<SampleIncomingResponse>;

    /// Returns the probability density of [`BxDF::sample_incoming`] generating `omega_i` given
    /// `omega_o`. Always `0.0` for specular models.
    fn sample_incoming_pdf(&self, omega_o: Vec3d, normal: Vec3d, omega_i: Vec3d) -> f64;

    /// Hemispherical-directional reflectance: the total fraction of light scattered towards
    /// `omega_o`
    fn reflectance_hd(&self, omega_o: Vec3d, normal: Vec3d, samples: &[Vec2d]) -> RgbD {
        estimate_reflectance_hd(self, omega_o, normal, samples)
    }

    /// Hemispherical-hemispherical reflectance: the fraction of light scattered under uniform
    /// illumination. Points missing from `samples_i` are drawn from the thread local generator.
    fn reflectance_hh(&self, normal: Vec3d, samples_o: &[Vec2d], samples_i: &[Vec2d]) -> RgbD {
        estimate_reflectance_hh(self, normal, samples_o, samples_i)
    }

    /// `true` if every lobe of this model is contained in `flags`
    fn matches(&self, flags: BxDFType) -> bool {
        flags.contains(self.bxdf_type())
    }

    /// `true` if this model contains a Dirac lobe
    fn is_specular(&self) -> bool {
        self.bxdf_type().contains(BxDFType::SPECULAR)
    }
}

/// Monte Carlo estimate of [`BxDF::reflectance_hd`] built on top of
/// [`BxDF::sample_incoming`].
pub fn estimate_reflectance_hd<B: BxDF + ?Sized>(
    bxdf: &B,
    omega_o: Vec3d,
    normal: Vec3d,
    samples: &[Vec2d],
) -> RgbD {
    if samples.is_empty() {
        return RgbD::ZERO;
    }
    let sum = samples
        .iter()
        .filter_map(|&rdf| bxdf.sample_incoming(omega_o, normal, rdf))
        .filter(|response| response.pdf > 0.0)
        .fold(RgbD::ZERO, |acc, response| {
            acc + response.bxdf * response.omega_i.z.abs() / response.pdf
        });
    sum / samples.len() as f64
}

/// Monte Carlo estimate of [`BxDF::reflectance_hh`]. Outgoing directions are sampled uniformly
/// over the upper hemisphere.
pub fn estimate_reflectance_hh<B: BxDF + ?Sized>(
    bxdf: &B,
    normal: Vec3d,
    samples_o: &[Vec2d],
    samples_i: &[Vec2d],
) -> RgbD {
    if samples_o.is_empty() {
        return RgbD::ZERO;
    }
    let mut sum = RgbD::ZERO;
    for (j, &u_o) in samples_o.iter().enumerate() {
        let omega_o = utils::uniform_sample_hemisphere(u_o);
        let u_i = samples_i
            .get(j)
            .copied()
            .unwrap_or_else(|| Vec2d::new(fastrand::f64(), fastrand::f64()));
        let Some(response) = bxdf.sample_incoming(omega_o, normal, u_i) else {
            continue;
        };
        if response.pdf > 0.0 {
            sum += response.bxdf * response.omega_i.z.abs() * omega_o.z.abs()
                / (utils::UNIFORM_HEMISPHERE_PDF * response.pdf);
        }
    }
    sum / (std::f64::consts::PI * samples_o.len() as f64)
}

macro_rules! forward_bxdf {
    ($ty:ty) => {
        fn bxdf_type(&self) -> BxDFType {
            <$ty as BxDF>::bxdf_type(self)
        }
        fn evaluate(&self, omega_o: Vec3d, normal: Vec3d, omega_i: Vec3d) -> RgbD {
            <$ty as BxDF>::evaluate(self, omega_o, normal, omega_i)
        }
        fn sample_incoming(
            &self,
            omega_o: Vec3d,
            normal: Vec3d,
            rdf: Vec2d,
        ) -> Option<SampleIncomingResponse> {
            <$ty as BxDF>::sample_incoming(self, omega_o, normal, rdf)
        }
        fn sample_incoming_pdf(&self, omega_o: Vec3d, normal: Vec3d, omega_i: Vec3d) -> f64 {
            <$ty as BxDF>::sample_incoming_pdf(self, omega_o, normal, omega_i)
        }
        fn reflectance_hd(&self, omega_o: Vec3d, normal: Vec3d, samples: &[Vec2d]) -> RgbD {
            <$ty as BxDF>::reflectance_hd(self, omega_o, normal, samples)
        }
        fn reflectance_hh(
            &self,
            normal: Vec3d,
            samples_o: &[Vec2d],
            samples_i: &[Vec2d],
        ) -> RgbD {
            <$ty as BxDF>::reflectance_hh(self, normal, samples_o, samples_i)
        }
    };
}

impl<T: BxDF + ?Sized> BxDF for &T {
    forward_bxdf!(T);
}

impl<T: BxDF + ?Sized> BxDF for Box<T> {
    forward_bxdf!(T);
}

/// this is only used for testing
#[cfg(test)]
pub trait TransmissiveBxDF: BxDF {
    /// index of refraction below the surface, above is assumed to be `1.0`
    fn ior(&self) -> f64;
}
