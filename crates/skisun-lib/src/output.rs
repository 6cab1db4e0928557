use std::collections::HashMap;
use std::fmt::Write;

use chrono_tz::Tz;
use serde::Serialize;

use crate::routing::{RouteLeg, RoutePlan};
use crate::topology::{Difficulty, SkiAreaTopology};

/// Presentation style for turning a [`PlanSummary`] into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRenderMode {
    PlainText,
    Markdown,
}

/// Kind of leg shown in a summary.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    Lift,
    Run,
}

impl LegKind {
    /// Human-readable label shown in textual renderings.
    pub fn label(self) -> &'static str {
        match self {
            LegKind::Lift => "Lift",
            LegKind::Run => "Run",
        }
    }
}

/// Leg of a plan with resolved names and resort-local times.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanStep {
    pub index: usize,
    pub kind: LegKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Local wall-clock start, `HH:MM`.
    pub start: String,
    pub duration_minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sun_score: Option<f64>,
}

impl PlanStep {
    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Structured representation of a plan that higher-level consumers can serialise.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanSummary {
    pub ski_area: String,
    pub timezone: String,
    pub runs_covered: usize,
    pub runs_available: usize,
    pub total_sun_score: f64,
    pub start: String,
    pub end: String,
    pub steps: Vec<PlanStep>,
}

impl PlanSummary {
    /// Convert a [`RoutePlan`] into a summary with resolved run and lift names.
    pub fn from_plan(plan: &RoutePlan, topology: &SkiAreaTopology, timezone: Tz) -> Self {
        let runs: HashMap<&str, (&str, Difficulty)> = topology
            .runs
            .iter()
            .map(|run| (run.id.as_str(), (run.name.as_str(), run.difficulty)))
            .collect();
        let lifts: HashMap<&str, &str> = topology
            .lifts
            .iter()
            .map(|lift| (lift.id.as_str(), lift.name.as_str()))
            .collect();

        let local = |time: chrono::DateTime<chrono::Utc>| {
            time.with_timezone(&timezone).format("%H:%M").to_string()
        };

        let steps = plan
            .legs
            .iter()
            .enumerate()
            .map(|(index, leg)| match leg {
                RouteLeg::LiftRide {
                    lift_id,
                    start_time,
                    duration_minutes,
                    ..
                } => PlanStep {
                    index: index + 1,
                    kind: LegKind::Lift,
                    id: lift_id.clone(),
                    name: lifts
                        .get(lift_id.as_str())
                        .filter(|name| !name.is_empty())
                        .map(|name| name.to_string()),
                    difficulty: None,
                    start: local(*start_time),
                    duration_minutes: *duration_minutes,
                    sun_score: None,
                },
                RouteLeg::RunDescent {
                    run_id,
                    start_time,
                    duration_minutes,
                    sun_score,
                    ..
                } => {
                    let resolved = runs.get(run_id.as_str());
                    PlanStep {
                        index: index + 1,
                        kind: LegKind::Run,
                        id: run_id.clone(),
                        name: resolved
                            .filter(|(name, _)| !name.is_empty())
                            .map(|(name, _)| name.to_string()),
                        difficulty: resolved.map(|(_, difficulty)| *difficulty),
                        start: local(*start_time),
                        duration_minutes: *duration_minutes,
                        sun_score: Some(*sun_score),
                    }
                }
            })
            .collect();

        Self {
            ski_area: if topology.name.is_empty() {
                topology.id.clone()
            } else {
                topology.name.clone()
            },
            timezone: timezone.name().to_string(),
            runs_covered: plan.total_runs_covered,
            runs_available: plan.total_runs_available,
            total_sun_score: plan.total_sun_score,
            start: local(plan.start_time),
            end: local(plan.end_time),
            steps,
        }
    }

    /// Render the summary using the requested textual mode.
    pub fn render(&self, mode: PlanRenderMode) -> String {
        match mode {
            PlanRenderMode::PlainText => self.render_plain(),
            PlanRenderMode::Markdown => self.render_markdown(),
        }
    }

    fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Plan for {}: {} of {} runs, {} -> {} ({})",
            self.ski_area,
            self.runs_covered,
            self.runs_available,
            self.start,
            self.end,
            self.timezone
        );
        if self.steps.is_empty() {
            let _ = writeln!(buffer, "No reachable open terrain from the home location.");
            return buffer;
        }
        for step in &self.steps {
            let _ = write!(
                buffer,
                "{:>3}. {} {:<4} {} ({:.0} min",
                step.index,
                step.start,
                step.kind.label(),
                step.display_name(),
                step.duration_minutes
            );
            if let Some(score) = step.sun_score {
                let _ = write!(buffer, ", sun {:.0}%", score * 100.0);
            }
            let _ = writeln!(buffer, ")");
        }
        let _ = writeln!(buffer, "\nTotal sun score: {:.2}", self.total_sun_score);
        buffer
    }

    fn render_markdown(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "**{}**: {} of {} runs, _{} → {}_",
            self.ski_area, self.runs_covered, self.runs_available, self.start, self.end
        );
        for step in &self.steps {
            let detail = match (step.difficulty, step.sun_score) {
                (Some(difficulty), Some(score)) => {
                    format!(" ({difficulty}, sun {:.0}%)", score * 100.0)
                }
                _ => String::new(),
            };
            let _ = writeln!(
                buffer,
                "* {:>2}. `{}` {} **{}**{}",
                step.index,
                step.start,
                step.kind.label(),
                step.display_name(),
                detail
            );
        }
        buffer
    }
}
