//! Atmospheric transmission factors.
//!
//! The atmosphere is modeled as an exponential-density shell of fixed
//! total optical depth. Two variants exist: a directional one for a
//! star's direct beam, which accounts for the slant path through the
//! shell, and an ambient one for bulk scattering of indirect flux,
//! which only looks at the vertical column above the observer.

use nalgebra::Vector3;

use crate::{bodies::Body, geometry};

/// Optical depth of a vertical column from the surface to space.
/// Vertical transmission at the surface is `exp(-0.35) ~ 0.70`.
const SURFACE_OPTICAL_DEPTH: f64 = 0.35;

/// Scale heights per atmosphere depth; density at the top of the
/// shell has fallen to `exp(-5)` of the surface value.
const SCALE_HEIGHTS_PER_DEPTH: f64 = 5.0;

/// Vertical optical depth of the column above `altitude`.
fn column_depth(body: &Body, altitude: f64) -> f64 {
    let scale_height = body.atmosphere_depth / SCALE_HEIGHTS_PER_DEPTH;
    SURFACE_OPTICAL_DEPTH * libm::exp(-altitude.max(0.0) / scale_height)
}

/// Transmission of a direct beam arriving at the observer from
/// `beam_direction` (unit vector, observer toward the source), in
/// `[0, 1]`. Returns `1.0` when the body has no atmosphere or the
/// observer is above it.
pub fn beam_factor(
    body: &Body,
    body_position: &Vector3<f64>,
    beam_direction: &Vector3<f64>,
    observer_position: &Vector3<f64>,
    altitude: f64,
) -> f64 {
    if !body.has_atmosphere || altitude >= body.atmosphere_depth {
        return 1.0;
    }

    let (up, _) = geometry::direction_and_distance(&(observer_position - body_position));
    let cos_zenith = up.dot(beam_direction);

    // slant path through the shell, from the observer to the top of
    // the atmosphere along the beam
    let inner = body.radius + altitude.max(0.0);
    let outer = body.radius + body.atmosphere_depth;
    let sin_sq = (1.0 - cos_zenith * cos_zenith).max(0.0);
    let slant = libm::sqrt(outer * outer - inner * inner * sin_sq) - inner * cos_zenith;

    let vertical = (body.atmosphere_depth - altitude.max(0.0)).max(geometry::MIN_DISTANCE);
    let air_mass = (slant / vertical).max(1.0);

    libm::exp(-column_depth(body, altitude) * air_mass)
}

/// Bulk transmission of ambient (reflected and re-emitted) flux at
/// `altitude`, in `[0, 1]`. Returns `1.0` when the body has no
/// atmosphere or the observer is above it.
pub fn ambient_factor(body: &Body, altitude: f64) -> f64 {
    if !body.has_atmosphere || altitude >= body.atmosphere_depth {
        return 1.0;
    }

    libm::exp(-column_depth(body, altitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::Ephemeris;

    fn atmo_body() -> Body {
        Body {
            radius: 600_000.0,
            albedo: 0.3,
            has_atmosphere: true,
            atmosphere_depth: 70_000.0,
            core_thermal_flux: 0.0,
            parent: None,
            ephem: Ephemeris::Fixed(Vector3::zeros()),
            is_star: false,
            name: "kerbin".into(),
        }
    }

    #[test]
    fn factors_stay_in_unit_interval() {
        let body = atmo_body();
        for altitude in [0.0, 100.0, 10_000.0, 69_999.0] {
            let ambient = ambient_factor(&body, altitude);
            assert!((0.0..=1.0).contains(&ambient), "ambient={ambient}");

            for cos_zenith in [-0.2, 0.0, 0.5, 1.0] {
                let sin = libm::sqrt(1.0 - cos_zenith * cos_zenith);
                let beam = beam_factor(
                    &body,
                    &Vector3::zeros(),
                    &Vector3::new(sin, cos_zenith, 0.0),
                    &Vector3::new(0.0, body.radius + altitude, 0.0),
                    altitude,
                );
                assert!((0.0..=1.0).contains(&beam), "beam={beam}");
            }
        }
    }

    #[test]
    fn above_the_atmosphere_nothing_is_absorbed() {
        let body = atmo_body();
        assert_eq!(ambient_factor(&body, 70_000.0), 1.0);
        assert_eq!(ambient_factor(&body, 1e9), 1.0);
        let beam = beam_factor(
            &body,
            &Vector3::zeros(),
            &Vector3::new(0.0, 1.0, 0.0),
            &Vector3::new(0.0, body.radius + 80_000.0, 0.0),
            80_000.0,
        );
        assert_eq!(beam, 1.0);
    }

    #[test]
    fn no_atmosphere_means_no_absorption() {
        let mut body = atmo_body();
        body.has_atmosphere = false;
        assert_eq!(ambient_factor(&body, 100.0), 1.0);
    }

    #[test]
    fn grazing_beam_is_dimmer_than_overhead_beam() {
        let body = atmo_body();
        let observer = Vector3::new(0.0, body.radius, 0.0);
        let overhead = beam_factor(
            &body,
            &Vector3::zeros(),
            &Vector3::new(0.0, 1.0, 0.0),
            &observer,
            0.0,
        );
        let grazing = beam_factor(
            &body,
            &Vector3::zeros(),
            &Vector3::new(1.0, 0.0, 0.0),
            &observer,
            0.0,
        );
        assert!(grazing < overhead, "grazing={grazing} overhead={overhead}");
    }

    #[test]
    fn ambient_transmission_improves_with_altitude() {
        let body = atmo_body();
        let low = ambient_factor(&body, 1_000.0);
        let high = ambient_factor(&body, 50_000.0);
        assert!(high > low);
    }
}
