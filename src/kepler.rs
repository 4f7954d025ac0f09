//! Keplerian ephemerides.

use std::f64::consts;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::time::UT;

/// Elliptical orbital elements of a body about its parent.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    /// Semi-major axis (`m`).
    pub sma: f64,
    /// Eccentricity (dimensionless, `< 1`).
    pub e: f64,
    /// Inclination (radians).
    pub i: f64,
    /// Longitude of ascending node (radians).
    pub lan: f64,
    /// Argument of periapsis (radians).
    pub argpe: f64,
    /// Mean anomaly at epoch (radians).
    pub ma0: f64,
    /// Epoch of `ma0`.
    pub epoch: UT,
    /// Standard gravitational parameter of the parent (`m^3/s^2`).
    pub mu: f64,
}

impl Orbit {
    pub fn mean_motion(&self) -> f64 {
        libm::sqrt(self.mu / self.sma.powi(3))
    }

    pub fn period(&self) -> f64 {
        2.0 * consts::PI / self.mean_motion()
    }

    /// Position relative to the parent body at `ut`.
    pub fn position_at(&self, ut: UT) -> Vector3<f64> {
        let dt = (ut - self.epoch).as_seconds_f64();
        let ma = wrap_angle(self.ma0 + self.mean_motion() * dt);
        let ea = ma_to_ea(ma, self.e, 1e-10, 50);
        let ta = ea_to_ta(ea, self.e);

        let p = self.sma * (1.0 - self.e * self.e);
        let r = p / (1.0 + self.e * libm::cos(ta));
        let rv = r * libm::cos(ta) * Vector3::new(1.0, 0.0, 0.0)
            + r * libm::sin(ta) * Vector3::new(0.0, 1.0, 0.0);

        self.pqw_ijk_matrix() * rv
    }

    fn pqw_ijk_matrix(&self) -> Matrix3<f64> {
        let m11 = libm::cos(self.lan) * libm::cos(self.argpe)
            - libm::sin(self.lan) * libm::sin(self.argpe) * libm::cos(self.i);
        let m12 = -libm::cos(self.lan) * libm::sin(self.argpe)
            - libm::sin(self.lan) * libm::cos(self.argpe) * libm::cos(self.i);
        let m13 = libm::sin(self.lan) * libm::sin(self.i);
        let m21 = libm::sin(self.lan) * libm::cos(self.argpe)
            + libm::cos(self.lan) * libm::sin(self.argpe) * libm::cos(self.i);
        let m22 = -libm::sin(self.lan) * libm::sin(self.argpe)
            + libm::cos(self.lan) * libm::cos(self.argpe) * libm::cos(self.i);
        let m23 = -libm::cos(self.lan) * libm::sin(self.i);
        let m31 = libm::sin(self.argpe) * libm::sin(self.i);
        let m32 = libm::cos(self.argpe) * libm::sin(self.i);
        let m33 = libm::cos(self.i);

        Matrix3::new(m11, m12, m13, m21, m22, m23, m31, m32, m33)
    }
}

fn wrap_angle(a: f64) -> f64 {
    (a + consts::PI).rem_euclid(2.0 * consts::PI) - consts::PI
}

pub fn ea_to_ta(ea: f64, e: f64) -> f64 {
    let beta = e / (1.0 + libm::sqrt(1.0 - e * e));
    ea + 2.0 * libm::atan2(beta * libm::sin(ea), 1.0 - beta * libm::cos(ea))
}

/// Solve Kepler's equation `ma = ea - e sin ea` by Newton iteration.
///
/// Converges in a handful of iterations for elliptical orbits; if the
/// tolerance is not reached within `maxiter` the last iterate is
/// returned.
pub fn ma_to_ea(ma: f64, e: f64, tol: f64, maxiter: u64) -> f64 {
    let mut ea_new = if (-consts::PI < ma && ma < 0.0) || ma > consts::PI {
        ma - e
    } else {
        ma + e
    };

    let mut ea;
    let mut iter = 0;
    while iter < maxiter {
        ea = ea_new;
        ea_new = ea + (ma - ea + e * libm::sin(ea)) / (1.0 - e * libm::cos(ea));

        if (ea_new - ea).abs() < tol {
            break;
        }

        iter += 1;
    }
    ea_new
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circular(sma: f64, mu: f64) -> Orbit {
        Orbit {
            sma,
            e: 0.0,
            i: 0.0,
            lan: 0.0,
            argpe: 0.0,
            ma0: 0.0,
            epoch: UT::new_seconds(0.0),
            mu,
        }
    }

    #[test]
    fn circular_orbit_keeps_radius() {
        let orbit = circular(12_000_000.0, 3.5316e12);
        for t in [0.0, 1000.0, 54_321.0, 1e6] {
            let r = orbit.position_at(UT::new_seconds(t)).norm();
            assert!(
                (r - 12_000_000.0).abs() < 1.0,
                "radius drifted to {r} at t={t}"
            );
        }
    }

    #[test]
    fn position_repeats_after_one_period() {
        let mut orbit = circular(12_000_000.0, 3.5316e12);
        orbit.e = 0.2;
        orbit.ma0 = 1.0;
        let p0 = orbit.position_at(UT::new_seconds(0.0));
        let p1 = orbit.position_at(UT::new_seconds(orbit.period()));
        assert!((p0 - p1).norm() < 1.0);
    }

    #[test]
    fn eccentric_orbit_respects_apsides() {
        let mut orbit = circular(12_000_000.0, 3.5316e12);
        orbit.e = 0.3;
        let peri = orbit.sma * (1.0 - orbit.e);
        let apo = orbit.sma * (1.0 + orbit.e);
        let steps = 200;
        for k in 0..steps {
            let t = orbit.period() * k as f64 / steps as f64;
            let r = orbit.position_at(UT::new_seconds(t)).norm();
            assert!(r >= peri - 1.0 && r <= apo + 1.0, "r={r} out of range");
        }
    }
}
