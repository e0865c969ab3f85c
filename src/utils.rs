use std::f64::consts;

use crate::{RgbD, RgbF, Vec2d, Vec3d};

/// Directions closer to the tangent plane than this are treated as grazing
pub const EPS: f64 = 1e-9;

/// Density of [`uniform_sample_hemisphere`]
pub const UNIFORM_HEMISPHERE_PDF: f64 = 0.5 * consts::FRAC_1_PI;

pub trait FloatExt {
    fn sq(self) -> Self;
    fn lerp(self, other: Self, t: Self) -> Self;
    /// `true` if closer to zero than [`EPS`]
    fn is_zero(self) -> bool;
}

impl FloatExt for f64 {
    fn sq(self) -> Self {
        self * self
    }
    fn lerp(self, other: Self, t: Self) -> Self {
        #[allow(clippy::suboptimal_flops)]
        {
            self * (1.0 - t) + other * t
        }
    }
    fn is_zero(self) -> bool {
        self.abs() < EPS
    }
}

impl FloatExt for f32 {
    fn sq(self) -> Self {
        self * self
    }

    fn lerp(self, other: Self, t: Self) -> Self {
        #[allow(clippy::suboptimal_flops)]
        {
            self * (1.0 - t) + other * t
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn is_zero(self) -> bool {
        self.abs() < EPS as f32
    }
}

pub trait SafeCast<Target> {
    fn safe_cast(self) -> Target;
}

impl SafeCast<RgbD> for RgbF {
    fn safe_cast(self) -> RgbD {
        RgbD {
            x: self.x as f64,
            y: self.y as f64,
            z: self.z as f64,
        }
    }
}

pub trait VecExt {
    type Scalar;
    #[must_use]
    fn luminance(self) -> Self::Scalar;
    #[must_use]
    fn sq(self) -> Self;
    #[must_use]
    fn sqrt(self) -> Self;
    #[must_use]
    fn exp(self) -> Self;
}

impl VecExt for Vec3d {
    type Scalar = f64;

    fn sq(self) -> Self {
        self * self
    }

    /// Returns the perceived brightness of the color
    fn luminance(self) -> Self::Scalar {
        let lfac = Self::new(0.2126, 0.7152, 0.0722);
        self.dot(lfac)
    }

    fn sqrt(self) -> Self {
        Self {
            x: self.x.sqrt(),
            y: self.y.sqrt(),
            z: self.z.sqrt(),
        }
    }

    fn exp(self) -> Self {
        Self {
            x: self.x.exp(),
            y: self.y.exp(),
            z: self.z.exp(),
        }
    }
}

// ---------- local shading frame trigonometry, theta is measured from +Z ----------

pub const fn cos_theta(w: Vec3d) -> f64 {
    w.z
}

pub fn abs_cos_theta(w: Vec3d) -> f64 {
    w.z.abs()
}

pub fn cos2_theta(w: Vec3d) -> f64 {
    w.z * w.z
}

pub fn sin2_theta(w: Vec3d) -> f64 {
    (1.0 - cos2_theta(w)).max(0.0)
}

pub fn sin_theta(w: Vec3d) -> f64 {
    sin2_theta(w).sqrt()
}

pub fn tan_theta(w: Vec3d) -> f64 {
    sin_theta(w) / cos_theta(w)
}

pub fn tan2_theta(w: Vec3d) -> f64 {
    sin2_theta(w) / cos2_theta(w)
}

pub fn cos_phi(w: Vec3d) -> f64 {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        1.0
    } else {
        (w.x / sin_theta).clamp(-1.0, 1.0)
    }
}

pub fn sin_phi(w: Vec3d) -> f64 {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        0.0
    } else {
        (w.y / sin_theta).clamp(-1.0, 1.0)
    }
}

pub fn cos2_phi(w: Vec3d) -> f64 {
    cos_phi(w).sq()
}

pub fn sin2_phi(w: Vec3d) -> f64 {
    sin_phi(w).sq()
}

/// `true` if both directions point strictly to the same side of the surface
pub fn same_hemisphere(a: Vec3d, b: Vec3d) -> bool {
    a.z * b.z > 0.0
}

/// Returns `n` flipped onto the side of `v`
pub fn face_forward(n: Vec3d, v: Vec3d) -> Vec3d {
    if n.dot(v) < 0.0 {
        -n
    } else {
        n
    }
}

pub fn spherical_direction(sin_theta: f64, cos_theta: f64, phi: f64) -> Vec3d {
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3d::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
}

/// Mirrors `vec` at `n`
pub fn reflect(n: Vec3d, vec: Vec3d) -> Vec3d {
    n * (n.dot(vec) * 2.0) - vec
}

/// Refracts `omega_i` through a surface with normal `n`, which has to lie on the same side as
/// `omega_i`. `eta` is the ratio of the index of refraction on the side of `omega_i` to the index
/// on the opposite side. Returns `None` on total internal reflection.
#[must_use]
pub fn refract(omega_i: Vec3d, n: Vec3d, eta: f64) -> Option<Vec3d> {
    let cos_theta_i = n.dot(omega_i);
    let sin2_theta_i = (1.0 - cos_theta_i.sq()).max(0.0);
    let sin2_theta_t = eta.sq() * sin2_theta_i;
    if sin2_theta_t >= 1.0 {
        return None;
    }
    let cos_theta_t = (1.0 - sin2_theta_t).sqrt();
    #[allow(clippy::suboptimal_flops)]
    Some(-omega_i * eta + n * (eta * cos_theta_i - cos_theta_t))
}

/// The normalized sum of both directions, `None` if they cancel out
pub fn half_vector(omega_o: Vec3d, omega_i: Vec3d) -> Option<Vec3d> {
    (omega_o + omega_i).try_normalize()
}

pub fn sample_diffuse_lobe_pdf(omega_o: Vec3d, omega_i: Vec3d) -> f64 {
    if same_hemisphere(omega_o, omega_i) {
        omega_i.z.abs() / (std::f64::consts::PI)
    } else {
        0.0
    }
}

/// cosine weighted direction on the side of `omega_o`
pub fn sample_diffuse_lobe(omega_o: Vec3d, eps1: f64, eps2: f64) -> (Vec3d, f64) {
    let (omega_i, pdf) = hemispherical_sample_cos_weighted_uv(eps1, eps2);
    (
        Vec3d {
            z: omega_i.z * omega_o.z.signum(),
            ..omega_i
        },
        pdf,
    )
}

/* pdf is cos(theta) / pi */
#[must_use]
pub fn hemispherical_sample_cos_weighted_uv(u: f64, v: f64) -> (Vec3d, f64) {
    let eps_theta_sample = u.clamp(1e-6, 1.0); // prevent division by zero (division by pdf)
    let cos_theta = eps_theta_sample.sqrt();
    let sin_theta = (1.0 - eps_theta_sample).sqrt();
    let phi = 2.0 * std::f64::consts::PI * v;
    let (sin_phi, cos_phi) = phi.sin_cos();
    let omega_i = Vec3d {
        x: sin_theta * sin_phi,
        y: sin_theta * cos_phi,
        z: cos_theta,
    };
    (omega_i, cos_theta / std::f64::consts::PI)
}

/* pdf is 1 / (2 pi) */
#[must_use]
pub fn uniform_sample_hemisphere(u: Vec2d) -> Vec3d {
    let z = u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * consts::PI * u.y;
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3d::new(r * cos_phi, r * sin_phi, z)
}

pub fn pow5(v: f64) -> f64 {
    let v2 = v * v;
    v2 * v2 * v
}
