//! [BxDF] that tints another [BxDF]
use crate::{
    utils::SafeCast, BxDF, BxDFType, RgbD, RgbF, SampleIncomingResponse, Vec2d, Vec3d,
};

/// Multiplies every color returned by the wrapped [BxDF] with `scale`. Sampling and densities are
/// left untouched.
///
/// **Note: This code is only available with the `scaled` feature**
#[derive(Clone, Copy, Debug)]
pub struct ScaledBxDF<B> {
    pub bxdf: B,
    pub scale: RgbF,
}

impl<B: BxDF> ScaledBxDF<B> {
    #[must_use]
    pub const fn new(bxdf: B, scale: RgbF) -> Self {
        Self { bxdf, scale }
    }

    fn scale(&self) -> RgbD {
        self.scale.safe_cast()
    }
}

impl<B: BxDF> BxDF for ScaledBxDF<B> {
    fn bxdf_type(&self) -> BxDFType {
        self.bxdf.bxdf_type()
    }

    fn evaluate(&self, omega_o: Vec3d, normal: Vec3d, omega_i: Vec3d) -> RgbD {
        self.scale() * self.bxdf.evaluate(omega_o, normal, omega_i)
    }

    fn sample_incoming(
        &self,
        omega_o: Vec3d,
        normal: Vec3d,
        rdf: Vec2d,
    ) -> Option<SampleIncomingResponse> {
        self.bxdf
            .sample_incoming(omega_o, normal, rdf)
            .map(|response| SampleIncomingResponse {
                bxdf: self.scale() * response.bxdf,
                ..response
            })
    }

    fn sample_incoming_pdf(&self, omega_o: Vec3d, normal: Vec3d, omega_i: Vec3d) -> f64 {
        self.bxdf.sample_incoming_pdf(omega_o, normal, omega_i)
    }

    fn reflectance_hd(&self, omega_o: Vec3d, normal: Vec3d, samples: &[Vec2d]) -> RgbD {
        self.scale() * self.bxdf.reflectance_hd(omega_o, normal, samples)
    }

    fn reflectance_hh(&self, normal: Vec3d, samples_o: &[Vec2d], samples_i: &[Vec2d]) -> RgbD {
        self.scale() * self.bxdf.reflectance_hh(normal, samples_o, samples_i)
    }
}

#[cfg(all(test, feature = "diffuse"))]
mod tests {
    use super::*;
    use crate::{
        test_utils::{self, assert_eq_approx_abs, spherical_sample, SamplerExt},
        LambertianReflection, OrenNayar,
    };

    #[test]
    fn scaled() {
        let mat = ScaledBxDF::new(OrenNayar::new(RgbF::ONE, 15.0), RgbF::new(0.5, 0.2, 0.9));
        test_utils::test_bxdf_sample_eval(&mat);
        test_utils::test_bxdf_reciprocity(&mat);
        test_utils::test_hemisphere_consistency(&mat);
        test_utils::test_pdf_normalization(&mat, 1.0);
        test_utils::test_energy_conservation(
            &ScaledBxDF::new(LambertianReflection::new(RgbF::ONE), RgbF::splat(0.5)),
            0.5,
        );
    }

    #[test]
    fn grazing_directions() {
        test_utils::test_grazing_directions(&ScaledBxDF::new(
            OrenNayar::new(RgbF::ONE, 15.0),
            RgbF::splat(0.5),
        ));
    }

    #[test]
    fn scales_colors_but_not_densities() {
        let inner = OrenNayar::new(RgbF::new(0.8, 0.6, 0.4), 25.0);
        let scale = RgbF::new(0.5, 0.25, 2.0);
        let mat = ScaledBxDF::new(inner, scale);
        let mut rd = fastrand::Rng::with_seed(17);
        for _ in 0..1000 {
            let omega_o = spherical_sample(&mut rd);
            let omega_i = spherical_sample(&mut rd);
            assert_eq!(
                mat.evaluate(omega_o, Vec3d::Z, omega_i),
                scale.safe_cast() * inner.evaluate(omega_o, Vec3d::Z, omega_i)
            );
            assert_eq!(
                mat.sample_incoming_pdf(omega_o, Vec3d::Z, omega_i),
                inner.sample_incoming_pdf(omega_o, Vec3d::Z, omega_i)
            );

            let rdf = rd.vec2d();
            let (Some(scaled), Some(plain)) = (
                mat.sample_incoming(omega_o, Vec3d::Z, rdf),
                inner.sample_incoming(omega_o, Vec3d::Z, rdf),
            ) else {
                continue;
            };
            assert_eq!(scaled.omega_i, plain.omega_i);
            assert_eq!(scaled.pdf, plain.pdf);
            assert_eq!(scaled.bxdf, scale.safe_cast() * plain.bxdf);
        }
    }

    #[test]
    fn scales_reflectance() {
        let mat = ScaledBxDF::new(
            LambertianReflection::new(RgbF::new(0.8, 0.4, 0.2)),
            RgbF::splat(0.5),
        );
        assert_eq_approx_abs!(
            mat.reflectance_hh(Vec3d::Z, &[], &[]),
            RgbD::new(0.4, 0.2, 0.1),
            RgbD::splat(1e-7)
        );
        assert!(mat.matches(BxDFType::REFLECTION | BxDFType::DIFFUSE));
    }
}
