//! Per-run sun exposure over a time window.
//!
//! Without an elevation source the aspect of a piste is approximated from its
//! digitized centerline: the direction perpendicular to travel. Every result
//! produced here is flagged as approximate for that reason.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::ephemeris::sun_position;
use crate::error::{Error, Result};
use crate::geo::{normalize_degrees, GeoPoint};
use crate::shade::{ShadeResult, SlopeFacet};
use crate::topology::{FeatureId, RunDescriptor};

/// Closed interval of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(Error::invalid_request(format!(
                "time window ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Convert a wall-clock time on `date` in `tz` to UTC.
///
/// Ambiguous times resolve to the earlier instant; times skipped by a DST
/// transition are rejected.
pub fn local_to_utc(tz: Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>> {
    let local = date.and_time(time);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            Error::invalid_request(format!("{local} does not exist in time zone {tz}"))
        })
}

/// Sampling parameters for exposure scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureOptions {
    /// Spacing between shade evaluations.
    pub sample_interval_minutes: u32,
    /// Slope angle assumed for every facet in the absence of elevation data.
    pub slope_angle_degrees: f64,
}

impl Default for ExposureOptions {
    fn default() -> Self {
        Self {
            sample_interval_minutes: 20,
            slope_angle_degrees: 25.0,
        }
    }
}

impl ExposureOptions {
    fn step(&self) -> Result<TimeDelta> {
        if self.sample_interval_minutes == 0 {
            return Err(Error::invalid_request("sample interval must be positive"));
        }
        Ok(TimeDelta::minutes(i64::from(self.sample_interval_minutes)))
    }
}

/// Shade evaluation of one run at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExposureSample {
    pub time: DateTime<Utc>,
    pub lit_points: usize,
    pub total_points: usize,
    /// Result for the sample point nearest the middle of the run.
    pub shade: ShadeResult,
}

impl ExposureSample {
    pub fn lit_fraction(&self) -> f64 {
        if self.total_points == 0 {
            return 0.0;
        }
        self.lit_points as f64 / self.total_points as f64
    }
}

/// Exposure timeline and aggregates for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunExposure {
    pub run_id: FeatureId,
    pub samples: Vec<ExposureSample>,
    /// Mean lit fraction across all samples, in [0, 1].
    pub mean_illumination: f64,
    /// Earliest longest stretch at the best lit fraction; `None` if never lit.
    ///
    /// Reported to users as the time to ski the run. The planner does not
    /// consult it: it scores each run over the actual arrival window through
    /// [`RunExposure::score_between`].
    pub best_window: Option<TimeWindow>,
    pub aspect_is_approximate: bool,
}

impl RunExposure {
    /// Mean lit fraction for an arrival window.
    ///
    /// When no sample falls inside the window the nearest preceding sample is
    /// used, then the first sample.
    pub fn score_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        let inside: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| start <= s.time && s.time <= end)
            .map(ExposureSample::lit_fraction)
            .collect();
        if !inside.is_empty() {
            return inside.iter().sum::<f64>() / inside.len() as f64;
        }

        self.samples
            .iter()
            .rev()
            .find(|s| s.time <= start)
            .or_else(|| self.samples.first())
            .map(ExposureSample::lit_fraction)
            .unwrap_or(0.0)
    }
}

/// Exposure of many runs over the same window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExposureTimeline {
    pub runs: BTreeMap<FeatureId, RunExposure>,
}

impl ExposureTimeline {
    pub fn get(&self, run_id: &str) -> Option<&RunExposure> {
        self.runs.get(run_id)
    }

    /// Exposure score for a run over an arrival window; zero for unknown runs.
    pub fn score(&self, run_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        self.get(run_id)
            .map(|exposure| exposure.score_between(start, end))
            .unwrap_or(0.0)
    }
}

/// Approximate aspect of a piste segment: its travel bearing rotated 90°.
pub fn estimate_slope_aspect(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let from = GeoPoint {
        lat: lat1,
        lng: lng1,
    };
    let to = GeoPoint {
        lat: lat2,
        lng: lng2,
    };
    normalize_degrees(from.bearing_to(&to) + 90.0)
}

/// Score a single run over a window.
pub fn score_run_exposure(
    run: &RunDescriptor,
    window: TimeWindow,
    options: &ExposureOptions,
) -> Result<RunExposure> {
    let step = options.step()?;
    let points = sample_points(run, options.slope_angle_degrees)?;
    let mid = points.len() / 2;

    let mut samples = Vec::new();
    let mut time = window.start;
    while time <= window.end {
        let mut lit_points = 0usize;
        let mut representative = None;
        for (index, (location, facet)) in points.iter().enumerate() {
            let sun = sun_position(&time, location.lat, location.lng)?;
            let result = facet.shade(sun);
            if !result.is_shaded {
                lit_points += 1;
            }
            if index == mid {
                representative = Some(result);
            }
        }
        if let Some(shade) = representative {
            samples.push(ExposureSample {
                time,
                lit_points,
                total_points: points.len(),
                shade,
            });
        }
        time += step;
    }

    let mean_illumination = if samples.is_empty() {
        0.0
    } else {
        samples.iter().map(ExposureSample::lit_fraction).sum::<f64>() / samples.len() as f64
    };
    let best_window = best_window(&samples, step, window.end);

    Ok(RunExposure {
        run_id: run.id.clone(),
        samples,
        mean_illumination,
        best_window,
        aspect_is_approximate: true,
    })
}

/// Score every run over the same window.
pub fn build_exposure_timeline<'a>(
    runs: impl IntoIterator<Item = &'a RunDescriptor>,
    window: TimeWindow,
    options: &ExposureOptions,
) -> Result<ExposureTimeline> {
    let mut timeline = ExposureTimeline::default();
    for run in runs {
        let exposure = score_run_exposure(run, window, options)?;
        timeline.runs.insert(run.id.clone(), exposure);
    }
    Ok(timeline)
}

/// Start, middle and end of the run, each with the facet of its local segment.
fn sample_points(run: &RunDescriptor, slope_angle: f64) -> Result<Vec<(GeoPoint, SlopeFacet)>> {
    let geometry = &run.geometry;
    if geometry.len() < 2 {
        return Err(Error::invalid_topology(format!(
            "run {} needs at least two geometry points",
            run.id
        )));
    }

    let last = geometry.len() - 1;
    let m = (geometry.len() - 1) / 2;
    let middle = GeoPoint {
        lat: (geometry[m].lat + geometry[m + 1].lat) / 2.0,
        lng: (geometry[m].lng + geometry[m + 1].lng) / 2.0,
    };

    let segments = [
        (geometry[0], geometry[0], geometry[1]),
        (middle, geometry[m], geometry[m + 1]),
        (geometry[last], geometry[last - 1], geometry[last]),
    ];

    segments
        .into_iter()
        .map(|(location, from, to)| {
            let aspect = estimate_slope_aspect(from.lat, from.lng, to.lat, to.lng);
            SlopeFacet::new(aspect, slope_angle).map(|facet| (location, facet))
        })
        .collect()
}

fn best_window(
    samples: &[ExposureSample],
    step: TimeDelta,
    window_end: DateTime<Utc>,
) -> Option<TimeWindow> {
    let best = samples.iter().map(|s| s.lit_points).max()?;
    if best == 0 {
        return None;
    }

    let mut best_span: Option<(usize, usize)> = None;
    let mut index = 0;
    while index < samples.len() {
        if samples[index].lit_points != best {
            index += 1;
            continue;
        }
        let begin = index;
        while index < samples.len() && samples[index].lit_points == best {
            index += 1;
        }
        let span = (begin, index - 1);
        let longer = best_span.map_or(true, |(b, e)| span.1 - span.0 > e - b);
        if longer {
            best_span = Some(span);
        }
    }

    best_span.map(|(begin, end)| TimeWindow {
        start: samples[begin].time,
        end: (samples[end].time + step).min(window_end),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_of_southbound_run_faces_west() {
        // Travel due south, rotated 90° clockwise.
        let aspect = estimate_slope_aspect(46.0, 7.0, 45.99, 7.0);
        assert!((aspect - 270.0).abs() < 1e-6, "got {aspect}");
    }

    #[test]
    fn aspect_wraps_into_range() {
        // Travel due west (270°) rotates to 0°.
        let aspect = estimate_slope_aspect(46.0, 7.0, 46.0, 6.99);
        assert!(aspect < 1e-6 || (360.0 - aspect) < 1e-6, "got {aspect}");
    }

    #[test]
    fn local_times_convert_through_the_zone() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let utc = local_to_utc(chrono_tz::Europe::Paris, date, nine).unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2024, 12, 21, 8, 0, 0).unwrap());
    }

    #[test]
    fn skipped_spring_forward_time_is_rejected() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let gap = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let error = local_to_utc(chrono_tz::Europe::Paris, date, gap).unwrap_err();
        assert!(matches!(error, Error::InvalidRequest { .. }));
    }

    #[test]
    fn best_window_prefers_longest_stretch() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let step = TimeDelta::minutes(10);
        let shade = ShadeResult {
            is_shaded: false,
            confidence: 0.5,
            sun_position: crate::ephemeris::SunPosition {
                azimuth_degrees: 180.0,
                altitude_degrees: 20.0,
            },
        };
        let lit = [3, 0, 3, 3, 1];
        let samples: Vec<ExposureSample> = lit
            .iter()
            .enumerate()
            .map(|(i, &lit_points)| ExposureSample {
                time: t0 + step * i as i32,
                lit_points,
                total_points: 3,
                shade,
            })
            .collect();

        let window = best_window(&samples, step, t0 + TimeDelta::hours(1)).unwrap();
        assert_eq!(window.start, t0 + TimeDelta::minutes(20));
        assert_eq!(window.end, t0 + TimeDelta::minutes(40));
    }
}
