use std::{fmt, ops};

use serde::{Deserialize, Serialize};
use time::Duration;

/// Universal time, in seconds since the catalog epoch.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct UT(Duration);

impl UT {
    pub fn new_seconds(seconds: f64) -> Self {
        Self(Duration::seconds_f64(seconds))
    }

    pub fn new_dhms(days: u32, hours: u8, minutes: u8, seconds: u8, millis: u16) -> Self {
        Self(Duration::new(
            seconds as i64
                + 60 * minutes as i64
                + 60 * 60 * hours as i64
                + 60 * 60 * 24 * days as i64,
            millis as i32 * 1_000_000,
        ))
    }

    pub fn as_seconds_f64(self) -> f64 {
        self.0.as_seconds_f64()
    }

    pub fn into_duration(self) -> Duration {
        self.0
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }
}

impl ops::Sub<UT> for UT {
    type Output = Duration;

    fn sub(self, rhs: UT) -> Self::Output {
        self.0 - rhs.0
    }
}

impl ops::Sub<Duration> for UT {
    type Output = UT;

    fn sub(self, rhs: Duration) -> Self::Output {
        UT(self.0 - rhs)
    }
}

impl ops::Add<Duration> for UT {
    type Output = UT;

    fn add(self, rhs: Duration) -> Self::Output {
        UT(self.0 + rhs)
    }
}

impl fmt::Display for UT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UT({}s)", self.0.as_seconds_f64())
    }
}

impl fmt::Debug for UT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
