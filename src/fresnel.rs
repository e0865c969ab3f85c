//! Fresnel reflectance of dielectric and conducting interfaces
use crate::{
    utils::{self, FloatExt, VecExt},
    RgbD,
};

/// Fraction of light reflected by a smooth dielectric interface.
///
/// `cos_theta_i` is measured against the normal on the side with index `eta_i`. Negative values
/// mean the light arrives from the `eta_t` side, the indices are swapped accordingly.
/// Returns `1.0` on total internal reflection.
#[must_use]
pub fn fresnel_dielectric(cos_theta_i: f64, eta_i: f64, eta_t: f64) -> f64 {
    let cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
    let (c, n_rel) = if cos_theta_i > 0.0 {
        (cos_theta_i, eta_t / eta_i)
    } else {
        (-cos_theta_i, eta_i / eta_t)
    };

    let g2 = n_rel.sq() - 1.0 + c.sq();
    if g2 <= 0.0 {
        // total internal reflection
        return 1.0;
    }
    let g = g2.sqrt();
    if g + c == 0.0 {
        return 1.0;
    }
    let f1 = (g - c) / (g + c);

    #[allow(clippy::suboptimal_flops)]
    let f2 = (c * (g + c) - 1.0) / (c * (g - c) + 1.0);
    0.5 * f1.sq() * (1.0 + f2.sq())
}

/// Fraction of light reflected by a conductor with complex index of refraction `eta_t + i k`,
/// evaluated per color channel
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn fresnel_conductor(cos_theta_i: f64, eta_i: RgbD, eta_t: RgbD, k: RgbD) -> RgbD {
    let cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
    let eta = eta_t / eta_i;
    let eta_k = k / eta_i;

    let cos2 = cos_theta_i * cos_theta_i;
    let sin2 = 1.0 - cos2;
    let eta2 = eta.sq();
    let eta_k2 = eta_k.sq();

    let t0 = eta2 - eta_k2 - RgbD::splat(sin2);
    let a2_plus_b2 = (t0.sq() + eta2 * eta_k2 * 4.0).sqrt();
    let t1 = a2_plus_b2 + RgbD::splat(cos2);
    let a = ((a2_plus_b2 + t0) * 0.5).sqrt();
    let t2 = a * (2.0 * cos_theta_i);
    let rs = (t1 - t2) / (t1 + t2);

    let t3 = a2_plus_b2 * cos2 + RgbD::splat(sin2 * sin2);
    let t4 = t2 * sin2;
    let rp = rs * (t3 - t4) / (t3 + t4);

    (rp + rs) * 0.5
}

/// `(1 - cos)^5`, the angular falloff of Schlick's approximation
#[must_use]
pub fn schlick_weight(cos_theta: f64) -> f64 {
    utils::pow5((1.0 - cos_theta).clamp(0.0, 1.0))
}

/// Schlick's approximation with reflectance `f0` at normal incidence
#[must_use]
pub fn fresnel_schlick(f0: RgbD, cos_theta: f64) -> RgbD {
    f0.lerp(RgbD::ONE, schlick_weight(cos_theta))
}

/// Reflectance at normal incidence of a dielectric with relative index `eta`
#[must_use]
pub fn schlick_r0_from_eta(eta: f64) -> f64 {
    ((eta - 1.0) / (eta + 1.0)).sq()
}

/// The Fresnel term plugged into the reflective models
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fresnel {
    /// Smooth dielectric interface. `eta_i` lies on the side the normal points to
    Dielectric { eta_i: f64, eta_t: f64 },
    /// Conductor, `k` is the absorption coefficient
    Conductor { eta_i: RgbD, eta_t: RgbD, k: RgbD },
    /// Schlick's approximation
    Schlick { f0: RgbD },
    /// Reflects everything
    NoOp,
}

impl Fresnel {
    #[must_use]
    pub fn evaluate(&self, cos_theta_i: f64) -> RgbD {
        match *self {
            Self::Dielectric { eta_i, eta_t } => {
                RgbD::splat(fresnel_dielectric(cos_theta_i, eta_i, eta_t))
            }
            Self::Conductor { eta_i, eta_t, k } => {
                fresnel_conductor(cos_theta_i.abs(), eta_i, eta_t, k)
            }
            Self::Schlick { f0 } => fresnel_schlick(f0, cos_theta_i.abs()),
            Self::NoOp => RgbD::ONE,
        }
    }

    /// `true` if no light passes through the interface. Used to pick the glossy or specular
    /// reflection lobe of an energy-balanced material.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        !matches!(self, Self::Dielectric { .. })
    }

    /// Averaged reflectance at normal incidence
    #[must_use]
    pub fn normal_reflectance(&self) -> f64 {
        self.evaluate(1.0).luminance()
    }
}
