//! Lit/shadowed classification of a sloped surface.
//!
//! A facet is lit when the sun's incoming ray has a positive component along
//! the facet's outward normal. The magnitude of that cosine doubles as the
//! classification confidence: it is close to zero when the sun grazes the
//! face and close to one when the sun is squarely on it or squarely behind
//! the ridge.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::ephemeris::{sun_position, SunPosition};
use crate::error::{Error, Result};
use crate::geo::{angular_difference, normalize_degrees};

/// Orientation of a slope face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeFacet {
    /// Compass direction the face points toward, in [0, 360).
    pub aspect_degrees: f64,
    /// Inclination from horizontal, in [0, 90].
    pub slope_angle_degrees: f64,
}

impl SlopeFacet {
    pub fn new(aspect_degrees: f64, slope_angle_degrees: f64) -> Result<Self> {
        if !aspect_degrees.is_finite() || !slope_angle_degrees.is_finite() {
            return Err(Error::invalid_request("slope facet angles must be finite"));
        }
        if !(0.0..=90.0).contains(&slope_angle_degrees) {
            return Err(Error::invalid_request(format!(
                "slope angle {slope_angle_degrees} outside [0, 90]"
            )));
        }
        Ok(Self {
            aspect_degrees: normalize_degrees(aspect_degrees),
            slope_angle_degrees,
        })
    }

    /// Cosine of the angle between the sun direction and the facet normal.
    ///
    /// Positive values mean the face is lit. Only meaningful while the sun is
    /// above the horizon.
    pub fn illumination(&self, sun: &SunPosition) -> f64 {
        let altitude = sun.altitude_degrees.to_radians();
        let slope = self.slope_angle_degrees.to_radians();
        let delta_az = angular_difference(sun.azimuth_degrees, self.aspect_degrees).to_radians();

        altitude.sin() * slope.cos() + altitude.cos() * slope.sin() * delta_az.cos()
    }

    /// Classify this facet against a precomputed sun position.
    pub fn shade(&self, sun: SunPosition) -> ShadeResult {
        if sun.altitude_degrees <= 0.0 {
            return ShadeResult {
                is_shaded: true,
                confidence: 1.0,
                sun_position: sun,
            };
        }

        let illumination = self.illumination(&sun);
        ShadeResult {
            is_shaded: illumination <= 0.0,
            confidence: illumination.abs().clamp(0.0, 1.0),
            sun_position: sun,
        }
    }
}

/// Point-in-time lit/shadowed judgment for one slope facet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShadeResult {
    pub is_shaded: bool,
    /// Certainty of the classification in [0, 1].
    pub confidence: f64,
    pub sun_position: SunPosition,
}

/// Direction a cast shadow points: opposite the sun's bearing.
pub fn shadow_direction(sun_azimuth: f64) -> f64 {
    normalize_degrees(sun_azimuth + 180.0)
}

/// Shadow length per unit of object height.
///
/// Unbounded (`f64::INFINITY`) once the sun is at or below the horizon.
pub fn shadow_length_factor(sun_altitude_degrees: f64) -> f64 {
    if sun_altitude_degrees <= 0.0 {
        return f64::INFINITY;
    }
    1.0 / sun_altitude_degrees.to_radians().tan()
}

/// Decide whether a slope at a location is lit at an instant.
pub fn calculate_point_shade<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    lat: f64,
    lng: f64,
    aspect_degrees: f64,
    slope_angle_degrees: f64,
) -> Result<ShadeResult> {
    let facet = SlopeFacet::new(aspect_degrees, slope_angle_degrees)?;
    let sun = sun_position(instant, lat, lng)?;
    Ok(facet.shade(sun))
}
