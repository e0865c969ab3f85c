#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::nursery)]
#![warn(clippy::suboptimal_flops)]
#![deny(clippy::return_self_not_must_use)]
#![allow(clippy::similar_names)]
#![deny(clippy::semicolon_if_nothing_returned)]
#![deny(clippy::must_use_candidate)]
#![deny(clippy::double_must_use)]
#![deny(clippy::use_self)]
#![deny(clippy::unreadable_literal)]
#![deny(clippy::explicit_iter_loop)]
// these are lints to enable later
#![allow(clippy::cast_lossless)]

//! Reflection and transmission models ([BxDF]s) for physically based renderers, together with
//! the methods to importance sample them.
//!
//! # Design Decisions
//! Every model implements the same small protocol: [`BxDF::evaluate`],
//! [`BxDF::sample_incoming`], [`BxDF::sample_incoming_pdf`] and the two reflectance estimates.
//! A renderer can therefore treat all materials alike, either through generics or through
//! `dyn BxDF`.
//!
//! Lighting calculations are done exclusively in [f64]s, since [BxDF]s can be extremely spiky.
//! Material parameters that are colors are stored as [f32]s for a minimal memory footprint.
//! Models are plain immutable values, they hold no caches and no random state, so sharing them
//! between render threads needs no synchronization.
//!
//! [BxDF]s are computed in a local space. That means, the surface is assumed to be the xy-plane
//! and the z-vector is assumed to be the normal. Incident and exitant vectors must be rotated
//! before or after evaluation. The hair model uses its own local frame, see [`HairBxDF`].
//!
//! The `|omega_i.dot(n)|`, `|cos theta_i|` or `|omega_i.z|` are not part of the [BxDF]. The user
//! is responsible for multiplying them in if necessary (almost always).
//!
//! `sample_...` functions are deterministic. You are responsible for generating [f64]s in the
//! range of `0.0..1.0` and passing them as a [Vec2d]. This allows you to control the random
//! generator or low discrepancy sequence in use.
//!
//! Perfectly specular models are Dirac distributions. Their [`BxDF::evaluate`] and
//! [`BxDF::sample_incoming_pdf`] are zero everywhere, only [`BxDF::sample_incoming`] returns
//! energy. Such samples carry [`BxDFType::SPECULAR`] and their `pdf` is the probability of the
//! chosen branch instead of a density.
//!
//! Degenerate geometry never panics: evaluation returns zero and sampling returns [None].
//! Invalid construction parameters do panic.
//!
//! This crate is built on [glam] for a simple but fast vector math library at the core.
//!
//! # Features
//! Every model family sits behind a cargo feature, all of them are enabled by default:
//! `diffuse`, `microfacet`, `torrance-sparrow`, `fresnel-blend`, `disney`, `specular`, `scaled`,
//! `hair` and `fourier`.
//!
//! # References
//! * Matt Pharr, Wenzel Jakob, and Greg Humphreys. *Physically Based Rendering: From Theory to
//!     Implementation*, 3rd edition, 2016.
//! * Bruce Walter, Stephen R. Marschner, Hongsong Li, and Kenneth E. Torrance. Microfacet models
//!     for refraction through rough surfaces. In *Proceedings of the Eurographics Symposium on
//!     Rendering,* 2007.
//! * Eric Heitz. Understanding the masking-shadowing function in microfacet-based brdfs.
//!     *Journal of Computer Graphics Techniques, 3(2):32–91,* 2014.
//! * Michael Ashikhmin and Peter Shirley. An anisotropic phong BRDF model. *Journal of Graphics
//!     Tools, 5(2):25–32,* 2000.
//! * Brent Burley. Physically-based shading at Disney, course notes, revised 2014. In *ACM
//!     SIGGRAPH, Practical physically-based shading in film and game production,* 2012.
//! * Eugene d'Eon, Guillaume Francois, Martin Hill, Joe Letteri, and Jean-Marie Aubry. An energy
//!     conserving hair reflectance model. *Computer Graphics Forum, 30(4),* 2011.
//! * Matt Pharr. The implementation of a hair scattering model, 2016.
//!     <https://www.pbrt.org/hair.pdf>
//! * Wenzel Jakob, Eugene d'Eon, Otto Jakob, and Steve Marschner. A comprehensive framework for
//!     rendering layered materials. *ACM Transactions on Graphics, 33(4),* 2014.

mod core;

pub use core::{
    estimate_reflectance_hd, estimate_reflectance_hh, BxDF, BxDFType, RgbD, RgbF,
    SampleIncomingResponse, TransportMode, Vec2d, Vec3d,
};
pub use fresnel::Fresnel;

#[cfg(test)]
pub(crate) mod test_utils;
pub(crate) mod utils;

pub mod fresnel;
pub mod numeric;

#[cfg(feature = "microfacet")]
mod beckmann;
#[cfg(feature = "microfacet")]
pub mod microfacet;
#[cfg(feature = "microfacet")]
mod trowbridge_reitz;
#[cfg(feature = "microfacet")]
pub use {beckmann::Beckmann, microfacet::MicrofacetDistribution, trowbridge_reitz::TrowbridgeReitz};

#[cfg(feature = "diffuse")]
mod lambert;
#[cfg(feature = "diffuse")]
mod oren_nayar;
#[cfg(feature = "diffuse")]
pub use {
    lambert::{LambertianReflection, LambertianTransmission},
    oren_nayar::OrenNayar,
};

#[cfg(feature = "torrance-sparrow")]
mod torrance_sparrow;
#[cfg(feature = "torrance-sparrow")]
pub use torrance_sparrow::{TorranceSparrowReflection, TorranceSparrowTransmission};

#[cfg(feature = "fresnel-blend")]
mod fresnel_blend;
#[cfg(feature = "fresnel-blend")]
pub use fresnel_blend::{AshikhminShirley, FresnelBlend};

#[cfg(feature = "disney")]
pub mod disney;
#[cfg(feature = "disney")]
pub use disney::{DisneyClearCoat, DisneyFakeSubsurface};

#[cfg(feature = "specular")]
mod specular;
#[cfg(feature = "specular")]
pub use specular::{
    FresnelSpecular, SpecularBranches, SpecularReflection, SpecularSampling, SpecularTransmission,
};

#[cfg(feature = "scaled")]
mod scaled;
#[cfg(feature = "scaled")]
pub use scaled::ScaledBxDF;

#[cfg(feature = "hair")]
pub mod hair;
#[cfg(feature = "hair")]
pub use hair::HairBxDF;

#[cfg(feature = "fourier")]
pub mod fourier;
#[cfg(feature = "fourier")]
pub use fourier::{FourierTable, FourierTableError};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn models_are_shareable_between_threads() {
        assert_send_sync::<Fresnel>();
        #[cfg(feature = "diffuse")]
        {
            assert_send_sync::<LambertianReflection>();
            assert_send_sync::<LambertianTransmission>();
            assert_send_sync::<OrenNayar>();
        }
        #[cfg(feature = "torrance-sparrow")]
        {
            assert_send_sync::<TorranceSparrowReflection<TrowbridgeReitz>>();
            assert_send_sync::<TorranceSparrowTransmission<Beckmann>>();
        }
        #[cfg(feature = "fresnel-blend")]
        {
            assert_send_sync::<FresnelBlend<Beckmann>>();
            assert_send_sync::<AshikhminShirley>();
        }
        #[cfg(feature = "disney")]
        {
            assert_send_sync::<DisneyClearCoat>();
            assert_send_sync::<DisneyFakeSubsurface>();
        }
        #[cfg(feature = "specular")]
        {
            assert_send_sync::<SpecularReflection>();
            assert_send_sync::<SpecularTransmission>();
            assert_send_sync::<FresnelSpecular>();
        }
        #[cfg(feature = "scaled")]
        assert_send_sync::<ScaledBxDF<Box<dyn BxDF + Send + Sync>>>();
        #[cfg(feature = "hair")]
        assert_send_sync::<HairBxDF>();
        #[cfg(feature = "fourier")]
        assert_send_sync::<FourierTable>();
    }

    #[cfg(all(feature = "diffuse", feature = "scaled"))]
    #[test]
    fn dynamic_dispatch() {
        let models: Vec<Box<dyn BxDF>> = vec![
            Box::new(LambertianReflection::new(RgbF::splat(0.5))),
            Box::new(ScaledBxDF::new(
                Box::new(OrenNayar::new(RgbF::ONE, 20.0)) as Box<dyn BxDF>,
                RgbF::splat(0.5),
            )),
        ];
        let omega = Vec3d::new(0.3, 0.4, 0.5).normalize();
        for model in &models {
            let value = model.evaluate(omega, Vec3d::Z, Vec3d::Z);
            assert!(value.cmpgt(RgbD::ZERO).all());
            assert!(model.sample_incoming(omega, Vec3d::Z, Vec2d::splat(0.5)).is_some());
        }
    }
}
