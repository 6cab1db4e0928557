//! Ski-area topology as supplied by the topology collaborator.
//!
//! Runs and lifts are read-only inputs to the engine. The only mutation the
//! library performs is overlaying a live status snapshot (open/closed flags
//! and lift operating hours) before planning.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::{polyline_length, GeoPoint};

/// Identifier of a run or lift as assigned by the topology collaborator.
pub type FeatureId = String;

/// Colour used when a difficulty is missing or unrecognized.
pub const FALLBACK_DIFFICULTY_COLOR: &str = "#9E9E9E";

/// Piste difficulty rating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Novice,
    Easy,
    Intermediate,
    Advanced,
    Expert,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Difficulty {
    pub const ALL: [Difficulty; 6] = [
        Difficulty::Novice,
        Difficulty::Easy,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Expert,
        Difficulty::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Novice => "novice",
            Difficulty::Easy => "easy",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
            Difficulty::Unknown => "unknown",
        }
    }

    /// Map colour for the difficulty.
    pub fn color(self) -> &'static str {
        match self {
            Difficulty::Novice => "#4CAF50",
            Difficulty::Easy => "#2196F3",
            Difficulty::Intermediate => "#F44336",
            Difficulty::Advanced => "#212121",
            Difficulty::Expert => "#FF9800",
            Difficulty::Unknown => FALLBACK_DIFFICULTY_COLOR,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| Error::invalid_request(format!("unknown difficulty '{value}'")))
    }
}

/// Colour lookup for a raw difficulty label, falling back to gray.
pub fn difficulty_color(label: Option<&str>) -> &'static str {
    label
        .and_then(|value| value.parse::<Difficulty>().ok())
        .map(Difficulty::color)
        .unwrap_or(FALLBACK_DIFFICULTY_COLOR)
}

/// Aerialway classification, used to pick a nominal line speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LiftType {
    Gondola,
    CableCar,
    ChairLift,
    DragLift,
    TBar,
    Platter,
    RopeTow,
    MagicCarpet,
    MixedLift,
    Funicular,
    #[default]
    #[serde(other)]
    Unknown,
}

impl LiftType {
    /// Nominal line speed in metres per second.
    pub fn line_speed_mps(self) -> f64 {
        match self {
            LiftType::CableCar => 8.0,
            LiftType::Funicular => 6.0,
            LiftType::Gondola => 5.0,
            LiftType::MixedLift => 4.0,
            LiftType::DragLift | LiftType::TBar | LiftType::Platter => 3.0,
            LiftType::ChairLift | LiftType::Unknown => 2.5,
            LiftType::RopeTow => 2.0,
            LiftType::MagicCarpet => 0.8,
        }
    }
}

/// Daily operating window of a lift, in resort-local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl OperatingHours {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.open <= time && time <= self.close
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDescriptor {
    pub id: FeatureId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub is_open: bool,
    /// Centerline, ordered from the top of the run to the bottom.
    pub geometry: Vec<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
}

impl RunDescriptor {
    pub fn length_meters(&self) -> f64 {
        polyline_length(&self.geometry)
    }

    pub fn top(&self) -> Option<GeoPoint> {
        self.geometry.first().copied()
    }

    pub fn bottom(&self) -> Option<GeoPoint> {
        self.geometry.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftDescriptor {
    pub id: FeatureId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lift_type: LiftType,
    pub is_open: bool,
    /// Persons per hour, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    /// Line, ordered from the base station to the top station.
    pub geometry: Vec<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<OperatingHours>,
}

impl LiftDescriptor {
    pub fn length_meters(&self) -> f64 {
        polyline_length(&self.geometry)
    }

    pub fn base(&self) -> Option<GeoPoint> {
        self.geometry.first().copied()
    }

    pub fn top(&self) -> Option<GeoPoint> {
        self.geometry.last().copied()
    }
}

/// Snapshot of one ski area's runs and lifts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkiAreaTopology {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// External resort id used by the live-status collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resort_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<Tz>,
    #[serde(default)]
    pub runs: Vec<RunDescriptor>,
    #[serde(default)]
    pub lifts: Vec<LiftDescriptor>,
}

impl SkiAreaTopology {
    /// Parse and validate a topology document.
    pub fn from_json(json: &str) -> Result<Self> {
        let topology: SkiAreaTopology = serde_json::from_str(json)?;
        topology.validate()?;
        Ok(topology)
    }

    /// Load and validate a topology document from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Check that every descriptor can be placed on a graph.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::invalid_topology("ski area id is empty"));
        }

        let mut seen = BTreeSet::new();
        for run in &self.runs {
            validate_feature("run", &run.id, &run.geometry)?;
            if !seen.insert(("run", run.id.as_str())) {
                return Err(Error::invalid_topology(format!("duplicate run id {}", run.id)));
            }
        }
        for lift in &self.lifts {
            validate_feature("lift", &lift.id, &lift.geometry)?;
            if !seen.insert(("lift", lift.id.as_str())) {
                return Err(Error::invalid_topology(format!(
                    "duplicate lift id {}",
                    lift.id
                )));
            }
        }
        Ok(())
    }

    /// Open runs whose difficulty is in the requested set.
    pub fn eligible_runs<'a>(
        &'a self,
        difficulties: &'a BTreeSet<Difficulty>,
    ) -> impl Iterator<Item = &'a RunDescriptor> + 'a {
        self.runs
            .iter()
            .filter(move |run| run.is_open && difficulties.contains(&run.difficulty))
    }

    pub fn open_lifts(&self) -> impl Iterator<Item = &LiftDescriptor> {
        self.lifts.iter().filter(|lift| lift.is_open)
    }

    /// Overlay a live status snapshot onto this topology.
    ///
    /// Ids present in the snapshot but unknown to the topology are ignored.
    pub fn apply_status(&mut self, snapshot: &StatusSnapshot) -> Result<()> {
        match &self.resort_id {
            Some(expected) if *expected != snapshot.resort_id => {
                return Err(Error::ResortMismatch {
                    expected: expected.clone(),
                    found: snapshot.resort_id.clone(),
                });
            }
            Some(_) => {}
            None => debug!(
                ski_area = %self.id,
                resort = %snapshot.resort_id,
                "topology has no resort mapping; applying status unchecked"
            ),
        }

        let mut applied = 0usize;
        for run in &mut self.runs {
            if let Some(&open) = snapshot.runs.get(&run.id) {
                run.is_open = open;
                applied += 1;
            }
        }
        for lift in &mut self.lifts {
            if let Some(&open) = snapshot.lifts.get(&lift.id) {
                lift.is_open = open;
                applied += 1;
            }
            if let Some(hours) = snapshot.operating_hours.get(&lift.id) {
                lift.operating_hours = Some(*hours);
            }
        }

        debug!(
            ski_area = %self.id,
            applied,
            "applied live status snapshot"
        );
        Ok(())
    }
}

/// Live open/closed flags and lift hours, keyed by the external resort id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub resort_id: String,
    #[serde(default)]
    pub runs: BTreeMap<FeatureId, bool>,
    #[serde(default)]
    pub lifts: BTreeMap<FeatureId, bool>,
    #[serde(default)]
    pub operating_hours: BTreeMap<FeatureId, OperatingHours>,
}

impl StatusSnapshot {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Boundary check run before planning: at least one open run must match.
///
/// Returns the number of eligible runs.
pub fn ensure_eligible_terrain(
    topology: &SkiAreaTopology,
    difficulties: &BTreeSet<Difficulty>,
) -> Result<usize> {
    let count = topology.eligible_runs(difficulties).count();
    if count == 0 {
        return Err(Error::NoEligibleTerrain {
            ski_area_id: topology.id.clone(),
        });
    }
    Ok(count)
}

fn validate_feature(kind: &str, id: &str, geometry: &[GeoPoint]) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::invalid_topology(format!("{kind} with empty id")));
    }
    if geometry.len() < 2 {
        return Err(Error::invalid_topology(format!(
            "{kind} {id} needs at least two geometry points"
        )));
    }
    if let Some(point) = geometry.iter().find(|p| p.validate().is_err()) {
        return Err(Error::invalid_topology(format!(
            "{kind} {id} has invalid point ({}, {})",
            point.lat, point.lng
        )));
    }
    Ok(())
}
