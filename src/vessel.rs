//! Observer (vessel) state consumed by snapshot evaluation.

use std::sync::Arc;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    bodies::{BodyId, SolarSystem},
    kepler::Orbit,
    time::UT,
};

/// A vessel, reduced to what flux evaluation needs: where it is, what
/// its reference body is, and whether it sits on the ground.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub name: Arc<str>,
    /// The body the vessel treats as its gravitational and
    /// atmospheric reference.
    pub main_body: BodyId,
    /// Is the vessel landed on the main body?
    pub landed: bool,
    /// Position relative to the main body over time.
    pub ephem: VesselEphemeris,
}

/// Position of a vessel relative to its main body over time.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VesselEphemeris {
    /// A constant offset from the main body's center.
    BodyFixed(Vector3<f64>),
    /// A Keplerian orbit about the main body.
    Orbit(Orbit),
}

impl Vessel {
    /// Absolute position at `ut`. The main body id must come from the
    /// same catalog.
    pub fn position_at(&self, system: &SolarSystem, ut: UT) -> Vector3<f64> {
        let main = system.position_of(self.main_body, ut);
        main + match &self.ephem {
            VesselEphemeris::BodyFixed(offset) => *offset,
            VesselEphemeris::Orbit(orbit) => orbit.position_at(ut),
        }
    }
}
