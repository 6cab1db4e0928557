//! Low-precision solar ephemeris.
//!
//! Positions are derived from the cosine declination approximation, an
//! equation-of-time correction and the local hour angle. Accuracy is a few
//! tenths of a degree, which is plenty for deciding whether a piste is lit.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::geo::{normalize_degrees, validate_coordinates};

/// Obliquity used by the declination approximation, in degrees.
pub const EARTH_AXIAL_TILT: f64 = 23.45;

/// Earth rotation rate in degrees of hour angle per hour.
pub const DEGREES_PER_HOUR: f64 = 15.0;

/// Instantaneous position of the sun as seen from a point on the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunPosition {
    /// Compass bearing, 0 = north, clockwise, in [0, 360).
    pub azimuth_degrees: f64,
    /// Angle above the horizon in [-90, 90]; negative means below.
    pub altitude_degrees: f64,
}

impl SunPosition {
    pub fn is_above_horizon(&self) -> bool {
        self.altitude_degrees > 0.0
    }
}

/// Whether the sun crosses the horizon on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SunCondition {
    Normal,
    /// Sun stays above the horizon all day.
    PolarDay,
    /// Sun never rises.
    PolarNight,
}

/// Sun times for one calendar day at one location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunTimes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunset: Option<DateTime<Utc>>,
    pub solar_noon: DateTime<Utc>,
    pub condition: SunCondition,
}

impl SunTimes {
    /// Time between sunrise and sunset; a full day under polar day, zero under polar night.
    pub fn day_length(&self) -> TimeDelta {
        match (self.condition, self.sunrise, self.sunset) {
            (SunCondition::PolarDay, _, _) => TimeDelta::hours(24),
            (SunCondition::PolarNight, _, _) => TimeDelta::zero(),
            (SunCondition::Normal, Some(rise), Some(set)) => set - rise,
            (SunCondition::Normal, _, _) => TimeDelta::zero(),
        }
    }
}

/// Solar declination in degrees for a 1-based day of the year.
pub fn solar_declination(day_of_year: u32) -> f64 {
    let angle = (360.0 / 365.0 * (day_of_year as f64 + 10.0)).to_radians();
    -EARTH_AXIAL_TILT * angle.cos()
}

/// Equation of time in minutes (apparent minus mean solar time).
pub fn equation_of_time(day_of_year: u32) -> f64 {
    let b = (360.0 / 365.0 * (day_of_year as f64 - 1.0)).to_radians();
    229.18
        * (0.000075 + 0.001868 * b.cos()
            - 0.032077 * b.sin()
            - 0.014615 * (2.0 * b).cos()
            - 0.040849 * (2.0 * b).sin())
}

/// Sun position for an instant at a location.
pub fn sun_position<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    lat: f64,
    lng: f64,
) -> Result<SunPosition> {
    validate_coordinates(lat, lng)?;

    let utc = instant.with_timezone(&Utc);
    let day = utc.ordinal();
    let utc_hours = utc.num_seconds_from_midnight() as f64 / 3600.0
        + utc.nanosecond() as f64 / 3.6e12;

    let declination = solar_declination(day);
    let solar_time = utc_hours + lng / DEGREES_PER_HOUR + equation_of_time(day) / 60.0;
    let hour_angle = DEGREES_PER_HOUR * (solar_time - 12.0);

    Ok(position_from_angles(lat, declination, hour_angle))
}

/// Sunrise, sunset and solar noon for a calendar day (interpreted in UTC).
pub fn sun_times(date: NaiveDate, lat: f64, lng: f64) -> Result<SunTimes> {
    validate_coordinates(lat, lng)?;

    let day = date.ordinal();
    let declination = solar_declination(day).to_radians();
    let phi = lat.to_radians();

    let noon_hours = 12.0 - lng / DEGREES_PER_HOUR - equation_of_time(day) / 60.0;
    let midnight = date.and_time(NaiveTime::MIN).and_utc();
    let solar_noon = midnight + hours_to_delta(noon_hours);

    let cos_h0 = -phi.tan() * declination.tan();
    if cos_h0 < -1.0 {
        return Ok(SunTimes {
            sunrise: None,
            sunset: None,
            solar_noon,
            condition: SunCondition::PolarDay,
        });
    }
    if cos_h0 > 1.0 {
        return Ok(SunTimes {
            sunrise: None,
            sunset: None,
            solar_noon,
            condition: SunCondition::PolarNight,
        });
    }

    let half_day = hours_to_delta(cos_h0.acos().to_degrees() / DEGREES_PER_HOUR);
    Ok(SunTimes {
        sunrise: Some(solar_noon - half_day),
        sunset: Some(solar_noon + half_day),
        solar_noon,
        condition: SunCondition::Normal,
    })
}

/// Whether the sun is above the horizon at the instant.
pub fn is_sun_up<Tz: TimeZone>(instant: &DateTime<Tz>, lat: f64, lng: f64) -> Result<bool> {
    Ok(sun_position(instant, lat, lng)?.is_above_horizon())
}

fn position_from_angles(lat: f64, declination: f64, hour_angle: f64) -> SunPosition {
    let phi = lat.to_radians();
    let delta = declination.to_radians();
    let h = hour_angle.to_radians();

    let sin_alt = (phi.sin() * delta.sin() + phi.cos() * delta.cos() * h.cos()).clamp(-1.0, 1.0);
    let altitude = sin_alt.asin().to_degrees();

    let sin_az = -delta.cos() * h.sin();
    let cos_az = delta.sin() * phi.cos() - delta.cos() * phi.sin() * h.cos();
    let azimuth = normalize_degrees(sin_az.atan2(cos_az).to_degrees());

    SunPosition {
        azimuth_degrees: azimuth,
        altitude_degrees: altitude.clamp(-90.0, 90.0),
    }
}

fn hours_to_delta(hours: f64) -> TimeDelta {
    TimeDelta::milliseconds((hours * 3_600_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declination_peaks_near_solstices() {
        // Day 355 is roughly 21 December, day 172 roughly 21 June.
        assert!(solar_declination(355) < -23.0);
        assert!(solar_declination(172) > 23.0);
    }

    #[test]
    fn equation_of_time_stays_within_known_bounds() {
        for day in 1..=366 {
            let eot = equation_of_time(day);
            assert!(eot.abs() < 17.5, "day {day}: {eot}");
        }
    }

    #[test]
    fn noon_sun_is_due_south_in_northern_mid_latitudes() {
        let pos = position_from_angles(46.0, -23.0, 0.0);
        assert!((pos.azimuth_degrees - 180.0).abs() < 1e-9);
        assert!((pos.altitude_degrees - 21.0).abs() < 1e-9);
    }
}
