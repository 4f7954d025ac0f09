//! Definitions of celestial bodies and the star catalog.

use std::sync::Arc;

use color_eyre::eyre::{self, bail};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    arena::{Arena, IdLike},
    geometry::MIN_DISTANCE,
    kepler::Orbit,
    time::UT,
};

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct BodyId(u64);

impl IdLike for BodyId {
    fn from_raw(index: usize) -> Self {
        Self(index as u64)
    }

    fn into_raw(self) -> usize {
        self.0 as usize
    }
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct StarId(u64);

impl IdLike for StarId {
    fn from_raw(index: usize) -> Self {
        Self(index as u64)
    }

    fn into_raw(self) -> usize {
        self.0 as usize
    }
}

/// A celestial body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Mean radius of the body's sphere (`m`).
    pub radius: f64,
    /// Bond albedo, the fraction of incoming stellar flux reflected
    /// back to space (`[0, 1]`).
    pub albedo: f64,
    /// Does this body have an atmosphere?
    pub has_atmosphere: bool,
    /// Depth of the atmosphere above the surface (`m`).
    pub atmosphere_depth: f64,
    /// Internal (geothermal/tidal) thermal flux at the surface
    /// (`W/m^2`, may be zero).
    pub core_thermal_flux: f64,
    /// The body this body orbits, if any. Moons reference a planet,
    /// planets reference a star.
    pub parent: Option<BodyId>,
    /// Position of this body relative to its parent over time.
    pub ephem: Ephemeris,
    /// Is this a star?
    pub is_star: bool,
    /// Name of this body.
    pub name: Arc<str>,
}

/// Position of a body relative to its parent over time.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Ephemeris {
    /// A constant offset from the parent. Root bodies typically sit at
    /// the origin with a zero offset.
    Fixed(Vector3<f64>),
    /// A Keplerian orbit about the parent.
    Orbit(Orbit),
}

impl Ephemeris {
    pub fn position_at(&self, ut: UT) -> Vector3<f64> {
        match self {
            Ephemeris::Fixed(offset) => *offset,
            Ephemeris::Orbit(orbit) => orbit.position_at(ut),
        }
    }
}

/// A star, tied to the catalog body that carries its sphere.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Star {
    /// The catalog body of this star.
    pub body: BodyId,
    /// Total radiated power (`W`).
    pub luminosity: f64,
}

impl Star {
    /// Flux (`W/m^2`) on a surface normal to the beam at `distance`
    /// meters, by the inverse-square law.
    pub fn solar_flux(&self, distance: f64) -> f64 {
        let distance = distance.max(MIN_DISTANCE);
        self.luminosity / (4.0 * std::f64::consts::PI * distance * distance)
    }
}

/// The catalog of bodies and stars a snapshot is evaluated against.
///
/// Bodies must be inserted parents-first; insertion validates every
/// cross-reference so that evaluation never has to.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolarSystem {
    bodies: Arena<BodyId, Arc<Body>>,
    stars: Arena<StarId, Star>,
}

impl SolarSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body to the catalog. Its parent, if any, must already be
    /// present.
    pub fn add_body(&mut self, body: Body) -> eyre::Result<BodyId> {
        if let Some(parent) = body.parent {
            if !self.bodies.contains(parent) {
                bail!("body {:?} references unknown parent {parent:?}", body.name);
            }
        }
        if body.radius <= 0.0 {
            bail!(
                "body {:?} has non-positive radius {}",
                body.name,
                body.radius
            );
        }
        if !(0.0..=1.0).contains(&body.albedo) {
            bail!(
                "body {:?} has albedo {} outside [0, 1]",
                body.name,
                body.albedo
            );
        }
        if body.core_thermal_flux < 0.0 {
            bail!(
                "body {:?} has negative core thermal flux {}",
                body.name,
                body.core_thermal_flux
            );
        }
        Ok(self.bodies.push(Arc::new(body)))
    }

    /// Add a star to the catalog. It must point at an existing body
    /// flagged as a star.
    pub fn add_star(&mut self, star: Star) -> eyre::Result<StarId> {
        let Some(body) = self.bodies.get(star.body) else {
            bail!("star references unknown body {:?}", star.body);
        };
        if !body.is_star {
            bail!("star references body {:?} which is not a star", body.name);
        }
        if star.luminosity < 0.0 {
            bail!(
                "star at body {:?} has negative luminosity {}",
                body.name,
                star.luminosity
            );
        }
        Ok(self.stars.push(star))
    }

    pub fn body(&self, id: BodyId) -> Option<&Arc<Body>> {
        self.bodies.get(id)
    }

    pub fn star(&self, id: StarId) -> Option<&Star> {
        self.stars.get(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Arc<Body>)> {
        self.bodies.iter()
    }

    pub fn stars(&self) -> impl Iterator<Item = (StarId, &Star)> {
        self.stars.iter()
    }

    pub fn star_count(&self) -> usize {
        self.stars.len()
    }

    /// Absolute position of a body at `ut`, found by summing ephemeris
    /// offsets up the parent chain (at most moon -> planet -> star).
    ///
    /// Ids handed out by [`Self::add_body`] are always valid here;
    /// parents-first insertion makes the chain finite.
    pub fn position_of(&self, id: BodyId, ut: UT) -> Vector3<f64> {
        let mut position = Vector3::zeros();
        let mut current = Some(id);
        while let Some(id) = current {
            let body = &self.bodies[id];
            position += body.ephem.position_at(ut);
            current = body.parent;
        }
        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star_body(name: &str) -> Body {
        Body {
            radius: 261_600_000.0,
            albedo: 0.0,
            has_atmosphere: false,
            atmosphere_depth: 0.0,
            core_thermal_flux: 0.0,
            parent: None,
            ephem: Ephemeris::Fixed(Vector3::zeros()),
            is_star: true,
            name: name.into(),
        }
    }

    #[test]
    fn parent_must_exist() {
        let mut system = SolarSystem::new();
        let mut planet = star_body("orphan");
        planet.is_star = false;
        planet.parent = Some(BodyId::from_raw(7));
        assert!(system.add_body(planet).is_err());
    }

    #[test]
    fn star_must_point_at_star_body() {
        let mut system = SolarSystem::new();
        let mut planet = star_body("rock");
        planet.is_star = false;
        let id = system.add_body(planet).unwrap();
        assert!(system
            .add_star(Star {
                body: id,
                luminosity: 1e24,
            })
            .is_err());
        assert!(system
            .add_star(Star {
                body: BodyId::from_raw(99),
                luminosity: 1e24,
            })
            .is_err());
    }

    #[test]
    fn albedo_out_of_range_is_rejected() {
        let mut system = SolarSystem::new();
        let mut body = star_body("shiny");
        body.albedo = 1.5;
        assert!(system.add_body(body).is_err());
    }

    #[test]
    fn positions_sum_up_the_parent_chain() {
        let mut system = SolarSystem::new();
        let sun = system.add_body(star_body("sun")).unwrap();
        let mut planet = star_body("planet");
        planet.is_star = false;
        planet.parent = Some(sun);
        planet.ephem = Ephemeris::Fixed(Vector3::new(1.0e10, 0.0, 0.0));
        let planet = system.add_body(planet).unwrap();
        let mut moon = star_body("moon");
        moon.is_star = false;
        moon.parent = Some(planet);
        moon.ephem = Ephemeris::Fixed(Vector3::new(0.0, 3.0e7, 0.0));
        let moon = system.add_body(moon).unwrap();

        let p = system.position_of(moon, UT::new_seconds(0.0));
        assert_eq!(p, Vector3::new(1.0e10, 3.0e7, 0.0));
    }

    #[test]
    fn solar_flux_follows_inverse_square() {
        let star = Star {
            body: BodyId::from_raw(0),
            luminosity: 4.0 * std::f64::consts::PI,
        };
        assert!((star.solar_flux(1.0) - 1.0).abs() < 1e-12);
        assert!((star.solar_flux(2.0) - 0.25).abs() < 1e-12);
    }
}
