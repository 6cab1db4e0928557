#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use skisun_lib::{
    Difficulty, GeoPoint, LiftDescriptor, LiftType, OperatingHours, PlanRequest, RunDescriptor,
    SkiAreaTopology,
};

pub const SAMPLE_AREA: &str = "sample-area";

/// Bottom station shared by every lift in the sample area.
pub const BASE: GeoPoint = GeoPoint {
    lat: 45.9000,
    lng: 6.8700,
};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

pub fn sample_area() -> SkiAreaTopology {
    SkiAreaTopology::from_path(&fixtures_dir().join("sample_ski_area.json"))
        .expect("load fixture sample_ski_area.json")
}

pub fn paris() -> Tz {
    chrono_tz::Europe::Paris
}

pub fn winter_solstice() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 21).expect("valid date")
}

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

/// Request for the sample area starting next to the base station.
pub fn sample_request(difficulties: &[Difficulty]) -> PlanRequest {
    let home = GeoPoint {
        lat: 45.8998,
        lng: 6.8701,
    };
    difficulties.iter().fold(
        PlanRequest::new(SAMPLE_AREA, home, winter_solstice()).with_timezone(paris()),
        |request, difficulty| request.with_difficulty(*difficulty),
    )
}

pub fn run(id: &str, difficulty: Difficulty, geometry: &[(f64, f64)]) -> RunDescriptor {
    RunDescriptor {
        id: id.to_string(),
        name: id.to_string(),
        difficulty,
        is_open: true,
        geometry: points(geometry),
        locality: None,
    }
}

pub fn lift(
    id: &str,
    geometry: &[(f64, f64)],
    hours: Option<(NaiveTime, NaiveTime)>,
) -> LiftDescriptor {
    LiftDescriptor {
        id: id.to_string(),
        name: id.to_string(),
        lift_type: LiftType::ChairLift,
        is_open: true,
        capacity: None,
        geometry: points(geometry),
        operating_hours: hours.map(|(open, close)| OperatingHours { open, close }),
    }
}

pub fn topology(id: &str, runs: Vec<RunDescriptor>, lifts: Vec<LiftDescriptor>) -> SkiAreaTopology {
    SkiAreaTopology {
        id: id.to_string(),
        name: String::new(),
        resort_id: None,
        timezone: None,
        runs,
        lifts,
    }
}

fn points(geometry: &[(f64, f64)]) -> Vec<GeoPoint> {
    geometry
        .iter()
        .map(|&(lat, lng)| GeoPoint { lat, lng })
        .collect()
}
