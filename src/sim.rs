//! Radiative environment snapshots.
//!
//! A [`Step`] captures the geometry of a vessel relative to the body
//! and star catalog at one instant, then [`Step::evaluate`] fills in
//! the radiative environment: direct stellar flux, flux reflected and
//! thermally re-emitted by nearby bodies, and the internal core flux
//! of those bodies, all corrected for occlusion and atmospheric
//! absorption. A step is a pure function of (catalog, vessel, time);
//! steps for different vessels or times can be evaluated on separate
//! threads as long as the catalog is not mutated underneath them.

use std::{mem, sync::Arc};

use color_eyre::eyre::{self, eyre};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    atmosphere,
    bodies::{Body, BodyId, SolarSystem, Star},
    geometry,
    time::UT,
    vessel::Vessel,
};

/// Radiative flux received from one star, one slot per catalog star.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarFlux {
    /// Unit direction from the vessel to the star.
    pub direction: Vector3<f64>,
    /// Distance from the vessel to the star (`m`).
    pub distance: f64,
    /// Direct flux before occlusion and atmospheric attenuation
    /// (`W/m^2`).
    pub direct_raw_flux: f64,
    /// Direct flux at the vessel (`W/m^2`); zero when the star is
    /// occluded.
    pub direct_flux: f64,
    /// Accumulated starlight reflected by nearby bodies (`W/m^2`).
    pub bodies_albedo_flux: f64,
    /// Accumulated stellar energy re-emitted as heat by nearby bodies
    /// (`W/m^2`).
    pub bodies_emissive_flux: f64,
}

impl Default for StarFlux {
    fn default() -> Self {
        Self {
            direction: Vector3::zeros(),
            distance: 0.0,
            direct_raw_flux: 0.0,
            direct_flux: 0.0,
            bodies_albedo_flux: 0.0,
            bodies_emissive_flux: 0.0,
        }
    }
}

/// Albedo and re-emission deltas contributed by a single reflector.
#[derive(Copy, Clone, Debug, Default)]
struct IndirectFlux {
    albedo: f64,
    emissive: f64,
}

/// A body large enough in the sky to matter for occlusion, with its
/// precomputed offset from the vessel.
#[derive(Clone, Debug)]
struct Occluder {
    body: BodyId,
    radius: f64,
    offset: Vector3<f64>,
}

/// The parent planet of a moon the vessel orbits.
#[derive(Clone, Debug)]
struct MainPlanet {
    id: BodyId,
    body: Arc<Body>,
    position: Vector3<f64>,
    visible: bool,
}

/// One instant of a vessel's radiative environment.
pub struct Step<'a> {
    system: &'a SolarSystem,
    ut: UT,
    landed: bool,
    vessel_position: Vector3<f64>,
    main_body_id: BodyId,
    main_body: Arc<Body>,
    main_body_position: Vector3<f64>,
    main_body_direction: Vector3<f64>,
    altitude: f64,
    occluders: Vec<Occluder>,
    main_body_is_visible: bool,
    main_planet: Option<MainPlanet>,

    star_fluxes: Vec<StarFlux>,
    bodies_core_flux: f64,
}

impl<'a> Step<'a> {
    /// Capture the geometry of `vessel` at `ut`.
    ///
    /// Fails if the vessel references a main body that is not in the
    /// catalog.
    pub fn new(system: &'a SolarSystem, vessel: &Vessel, ut: UT) -> eyre::Result<Self> {
        let main_body_id = vessel.main_body;
        let main_body = Arc::clone(system.body(main_body_id).ok_or_else(|| {
            eyre!(
                "vessel {:?} references unknown main body {main_body_id:?}",
                vessel.name
            )
        })?);

        let vessel_position = vessel.position_at(system, ut);
        let main_body_position = system.position_of(main_body_id, ut);
        let (main_body_direction, main_body_distance) =
            geometry::direction_and_distance(&(main_body_position - vessel_position));
        let altitude = main_body_distance - main_body.radius;

        let mut occluders = Vec::new();
        for (id, body) in system.bodies() {
            let offset = system.position_of(id, ut) - vessel_position;

            // bodies of negligible apparent size cannot meaningfully
            // occlude anything
            if body.radius * 2.0 / offset.norm() < geometry::OCCLUSION_ANGULAR_THRESHOLD {
                continue;
            }

            occluders.push(Occluder {
                body: id,
                radius: body.radius,
                offset,
            });
        }

        // the atmosphere is not a foreground occluder of its own body
        let main_body_is_visible = vessel.landed
            || (main_body.has_atmosphere && altitude < main_body.atmosphere_depth)
            || has_line_of_sight(&occluders, main_body_id, &main_body_direction, altitude);

        // a main body orbiting a non-star is a moon; its planet then
        // also contributes indirect and core flux
        let main_planet = match main_body
            .parent
            .and_then(|id| system.body(id).map(|body| (id, body)))
        {
            Some((id, planet)) if !main_body.is_star && !planet.is_star => {
                let position = system.position_of(id, ut);
                let (direction, distance) =
                    geometry::direction_and_distance(&(position - vessel_position));
                let visible = has_line_of_sight(&occluders, id, &direction, distance);
                Some(MainPlanet {
                    id,
                    body: Arc::clone(planet),
                    position,
                    visible,
                })
            }
            _ => None,
        };

        trace!(
            "Step::new: ut={ut} altitude={altitude} occluders={} main_body_visible={main_body_is_visible}",
            occluders.len()
        );

        Ok(Self {
            system,
            ut,
            landed: vessel.landed,
            vessel_position,
            main_body_id,
            main_body,
            main_body_position,
            main_body_direction,
            altitude,
            occluders,
            main_body_is_visible,
            main_planet,
            star_fluxes: vec![StarFlux::default(); system.star_count()],
            bodies_core_flux: 0.0,
        })
    }

    /// Populate the per-star flux results and the total core flux.
    /// Call once per snapshot.
    pub fn evaluate(&mut self) {
        let system = self.system;
        let mut fluxes = mem::take(&mut self.star_fluxes);
        for ((_, star), flux) in system.stars().zip(fluxes.iter_mut()) {
            self.analyze_star_flux(star, flux);
        }
        self.star_fluxes = fluxes;
        self.bodies_core_flux = self.analyze_core_fluxes();
    }

    fn analyze_star_flux(&self, star: &Star, flux: &mut StarFlux) {
        let sun_position = self.system.position_of(star.body, self.ut);
        let (direction, distance) =
            geometry::direction_and_distance(&(sun_position - self.vessel_position));
        flux.direction = direction;
        flux.distance = distance;
        flux.direct_raw_flux = star.solar_flux(distance);

        let occluded = !has_line_of_sight(&self.occluders, star.body, &direction, distance);
        if occluded {
            flux.direct_flux = 0.0;
        } else {
            flux.direct_flux = flux.direct_raw_flux;

            if self.main_body.has_atmosphere && self.altitude < self.main_body.atmosphere_depth {
                flux.direct_flux *= atmosphere::beam_factor(
                    &self.main_body,
                    &self.main_body_position,
                    &direction,
                    &self.vessel_position,
                    self.altitude,
                );
            }
        }

        trace!(
            "Step::analyze_star_flux: star_body={:?} raw={} direct={} occluded={occluded}",
            star.body,
            flux.direct_raw_flux,
            flux.direct_flux
        );

        if self.main_body.is_star {
            return;
        }

        if self.main_body_is_visible {
            let (body_to_sun, body_to_sun_dist) =
                geometry::direction_and_distance(&(sun_position - self.main_body_position));

            // a moon in its planet's shadow reflects nothing
            let mut lit = true;
            if let Some(planet) = &self.main_planet {
                let moon_to_planet = planet.position - self.main_body_position;
                lit = !geometry::ray_hit_sphere(
                    &moon_to_planet,
                    &body_to_sun,
                    planet.body.radius,
                    body_to_sun_dist,
                );
            }

            let indirect = self.indirect_fluxes(
                star,
                &self.main_body,
                &self.main_body_position,
                &sun_position,
                body_to_sun_dist,
                lit,
            );
            flux.bodies_albedo_flux += indirect.albedo;
            flux.bodies_emissive_flux += indirect.emissive;
        }

        if let Some(planet) = &self.main_planet {
            if planet.visible {
                let planet_to_sun_dist = (sun_position - planet.position).norm();
                let indirect = self.indirect_fluxes(
                    star,
                    &planet.body,
                    &planet.position,
                    &sun_position,
                    planet_to_sun_dist,
                    true,
                );
                flux.bodies_albedo_flux += indirect.albedo;
                flux.bodies_emissive_flux += indirect.emissive;
            }
        }
    }

    /// Starlight returned to space by one reflector at the vessel
    /// altitude. The stellar flux intercepted by the body disc is
    /// assumed to leave again in full, split between direct reflection
    /// (over a hemisphere, weighted by albedo) and thermal re-emission
    /// (over the full sphere, weighted by `1 - albedo`).
    fn indirect_fluxes(
        &self,
        star: &Star,
        body: &Body,
        body_position: &Vector3<f64>,
        sun_position: &Vector3<f64>,
        body_to_sun_dist: f64,
        lit: bool,
    ) -> IndirectFlux {
        let sun_flux_at_body = star.solar_flux(body_to_sun_dist);
        let shell_sq = (body.radius + self.altitude) * (body.radius + self.altitude);

        let mut albedo_flux = 0.0;
        if lit {
            let hemispheric = sun_flux_at_body * body.radius * body.radius / (2.0 * shell_sq);
            albedo_flux = hemispheric * body.albedo;

            // full albedo on the sun-body axis, zero on the night
            // side; airless bodies fall off faster (opposition surge)
            let (body_to_sun, _) =
                geometry::direction_and_distance(&(sun_position - body_position));
            let (body_to_vessel, _) =
                geometry::direction_and_distance(&(self.vessel_position - body_position));
            let angle_factor = (body_to_sun.dot(&body_to_vessel) + 1.0) / 2.0;
            albedo_flux *= if body.has_atmosphere {
                angle_factor.powi(2)
            } else {
                angle_factor.powi(3)
            };
        }

        // re-emission continues whether or not the body is lit right
        // now; absorbed power leaves through the full sphere
        let spheric = sun_flux_at_body * body.radius * body.radius / (4.0 * shell_sq);
        let mut emissive_flux = spheric * (1.0 - body.albedo);

        if body.has_atmosphere && self.altitude < body.atmosphere_depth {
            let factor = atmosphere::ambient_factor(body, self.altitude);
            albedo_flux *= factor;
            emissive_flux *= factor;
        }

        IndirectFlux {
            albedo: albedo_flux,
            emissive: emissive_flux,
        }
    }

    fn analyze_core_fluxes(&self) -> f64 {
        if self.main_body.is_star {
            return 0.0;
        }

        let mut core_flux = 0.0;
        if self.main_body_is_visible {
            core_flux += self.body_core_flux(&self.main_body);
        }
        if let Some(planet) = &self.main_planet {
            if planet.visible {
                core_flux += self.body_core_flux(&planet.body);
            }
        }
        core_flux
    }

    /// Internal thermal flux at the vessel altitude: the surface flux
    /// scaled by surface area over enclosing-shell area,
    /// `core * r^2 / (r + alt)^2`. Atmospheres are ignored here.
    fn body_core_flux(&self, body: &Body) -> f64 {
        if body.core_thermal_flux == 0.0 {
            return 0.0;
        }

        let shell = body.radius + self.altitude;
        body.core_thermal_flux * body.radius * body.radius / (shell * shell)
    }

    pub fn ut(&self) -> UT {
        self.ut
    }

    pub fn landed(&self) -> bool {
        self.landed
    }

    /// Altitude above the main body's surface (`m`).
    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn main_body(&self) -> BodyId {
        self.main_body_id
    }

    /// Unit direction from the vessel to the main body's center.
    pub fn main_body_direction(&self) -> Vector3<f64> {
        self.main_body_direction
    }

    pub fn main_body_visible(&self) -> bool {
        self.main_body_is_visible
    }

    pub fn main_body_is_moon(&self) -> bool {
        self.main_planet.is_some()
    }

    pub fn main_planet(&self) -> Option<BodyId> {
        self.main_planet.as_ref().map(|planet| planet.id)
    }

    pub fn main_planet_visible(&self) -> bool {
        self.main_planet
            .as_ref()
            .is_some_and(|planet| planet.visible)
    }

    /// One result per catalog star, in catalog order.
    pub fn star_fluxes(&self) -> &[StarFlux] {
        &self.star_fluxes
    }

    /// Total internal thermal flux from nearby bodies (`W/m^2`).
    pub fn bodies_core_flux(&self) -> f64 {
        self.bodies_core_flux
    }

    /// Bodies considered for occlusion in this snapshot, for
    /// diagnostics and visualization.
    pub fn occluding_bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.occluders.iter().map(|occluder| occluder.body)
    }
}

/// True if no occluder other than `target` itself blocks the ray from
/// the vessel toward `target`.
fn has_line_of_sight(
    occluders: &[Occluder],
    target: BodyId,
    direction: &Vector3<f64>,
    max_dist: f64,
) -> bool {
    occluders.iter().all(|occluder| {
        occluder.body == target
            || !geometry::ray_hit_sphere(&occluder.offset, direction, occluder.radius, max_dist)
    })
}
