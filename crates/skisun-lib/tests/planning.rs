mod common;

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use skisun_lib::{
    plan_route, plan_route_traced, Difficulty, Error, GeoPoint, PlanRenderMode, PlanRequest,
    PlanSummary, PlannerConfig, RouteLeg, RoutePlan, SkiAreaTopology, TerminationReason,
};

use common::{hm, lift, paris, run, sample_area, sample_request, topology, winter_solstice};

const ALL_RATED: [Difficulty; 4] = [
    Difficulty::Novice,
    Difficulty::Easy,
    Difficulty::Intermediate,
    Difficulty::Advanced,
];

fn run_ids(plan: &RoutePlan) -> Vec<&str> {
    plan.legs
        .iter()
        .filter_map(|leg| match leg {
            RouteLeg::RunDescent { run_id, .. } => Some(run_id.as_str()),
            RouteLeg::LiftRide { .. } => None,
        })
        .collect()
}

#[test]
fn full_day_covers_every_reachable_run() {
    let area = sample_area();
    let request = sample_request(&ALL_RATED);
    let (plan, reason) = plan_route_traced(&request, &area, &PlannerConfig::default()).unwrap();

    assert_eq!(reason, TerminationReason::AllRunsCovered);
    assert_eq!(plan.total_runs_available, 5);
    assert_eq!(plan.total_runs_covered, 5);
    assert_eq!(plan.run_count(), 5);
    assert!(plan.lift_count() >= 5);
    assert_eq!(plan.coverage_ratio(), 1.0);
}

#[test]
fn legs_are_chronological_and_inside_the_lift_day() {
    let area = sample_area();
    let plan = plan_route(&sample_request(&ALL_RATED), &area, &PlannerConfig::default()).unwrap();
    let open = Utc.with_ymd_and_hms(2024, 12, 21, 8, 0, 0).unwrap();
    let close = Utc.with_ymd_and_hms(2024, 12, 21, 15, 30, 0).unwrap();

    assert!(!plan.is_empty());
    assert_eq!(plan.start_time, plan.legs[0].start_time());
    for pair in plan.legs.windows(2) {
        assert!(
            pair[0].end_time() <= pair[1].start_time(),
            "{:?} overlaps {:?}",
            pair[0],
            pair[1]
        );
    }
    for leg in &plan.legs {
        assert!(leg.start_time() >= open);
        assert!(leg.end_time() <= close);
    }
    assert_eq!(plan.end_time, plan.legs.last().unwrap().end_time());
}

#[test]
fn lift_rides_respect_each_lift_hours() {
    let area = sample_area();
    let plan = plan_route(&sample_request(&ALL_RATED), &area, &PlannerConfig::default()).unwrap();

    for leg in &plan.legs {
        if let RouteLeg::LiftRide {
            lift_id,
            start_time,
            ..
        } = leg
        {
            let lift = area.lifts.iter().find(|l| &l.id == lift_id).unwrap();
            assert!(lift.is_open, "closed lift {lift_id} ridden");
            let local = start_time.with_timezone(&paris()).time();
            let hours = lift.operating_hours.unwrap();
            assert!(hours.contains(local), "{lift_id} boarded at {local}");
        }
    }
}

#[test]
fn runs_are_eligible_and_skied_at_most_once() {
    let area = sample_area();
    let request = sample_request(&[Difficulty::Easy, Difficulty::Advanced]);
    let plan = plan_route(&request, &area, &PlannerConfig::default()).unwrap();

    let ids = run_ids(&plan);
    let unique: BTreeSet<&str> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    for id in &ids {
        let run = area.runs.iter().find(|r| r.id == *id).unwrap();
        assert!(run.is_open);
        assert!(request.difficulties.contains(&run.difficulty));
    }
    assert_eq!(
        unique,
        ["r-crete", "r-liaison", "r-soleil"].into_iter().collect()
    );
}

#[test]
fn total_sun_score_sums_descents() {
    let area = sample_area();
    let plan = plan_route(&sample_request(&ALL_RATED), &area, &PlannerConfig::default()).unwrap();

    let scores: Vec<f64> = plan
        .legs
        .iter()
        .filter_map(|leg| match leg {
            RouteLeg::RunDescent { sun_score, .. } => Some(*sun_score),
            RouteLeg::LiftRide { .. } => None,
        })
        .collect();
    assert!(scores.iter().all(|score| (0.0..=1.0).contains(score)));
    assert!((plan.total_sun_score - scores.iter().sum::<f64>()).abs() < 1e-9);
}

#[test]
fn identical_input_gives_identical_plan() {
    let area = sample_area();
    let request = sample_request(&ALL_RATED);
    let config = PlannerConfig::default();

    let first = serde_json::to_string(&plan_route(&request, &area, &config).unwrap()).unwrap();
    let second = serde_json::to_string(&plan_route(&request, &area, &config).unwrap()).unwrap();
    assert_eq!(first, second);

    let mut reordered = area.clone();
    reordered.runs.reverse();
    reordered.lifts.reverse();
    let third = serde_json::to_string(&plan_route(&request, &reordered, &config).unwrap()).unwrap();
    assert_eq!(first, third);
}

/// Home H with one lift up to A and one up to B. The only run from A ends at
/// X, which no lift serves; both runs from B come back down to H.
fn loops_area() -> SkiAreaTopology {
    let home = (46.0, 7.0);
    let a = (46.01, 7.0);
    let b = (46.0, 7.01432);
    let hours = Some((hm(9, 0), hm(16, 0)));
    topology(
        "loops",
        vec![
            run("a-dead", Difficulty::Easy, &[a, (46.012, 7.02)]),
            run("b-loop1", Difficulty::Easy, &[b, home]),
            run("b-loop2", Difficulty::Easy, &[b, (46.003, 7.007), home]),
        ],
        vec![lift("l1", &[home, a], hours), lift("l2", &[home, b], hours)],
    )
}

fn loops_request() -> PlanRequest {
    let home = GeoPoint {
        lat: 46.0,
        lng: 7.0,
    };
    PlanRequest::new("loops", home, winter_solstice()).with_difficulty(Difficulty::Easy)
}

fn assert_closing_runs_never_increases_coverage(area: &SkiAreaTopology, request: &PlanRequest) {
    let config = PlannerConfig::default();
    let full = plan_route(request, area, &config).unwrap();

    let open: Vec<String> = area
        .runs
        .iter()
        .filter(|run| run.is_open)
        .map(|run| run.id.clone())
        .collect();
    for closed in &open {
        let mut reduced = area.clone();
        for run in &mut reduced.runs {
            if &run.id == closed {
                run.is_open = false;
            }
        }
        let smaller = plan_route(request, &reduced, &config).unwrap();
        assert!(
            smaller.total_runs_covered <= full.total_runs_covered,
            "closing {closed} covered {} runs, full plan covered {}",
            smaller.total_runs_covered,
            full.total_runs_covered
        );
        assert!(!run_ids(&smaller).contains(&closed.as_str()));
    }
}

#[test]
fn closing_a_run_never_increases_coverage() {
    assert_closing_runs_never_increases_coverage(&sample_area(), &sample_request(&ALL_RATED));
    assert_closing_runs_never_increases_coverage(&loops_area(), &loops_request());

    let mut reduced = sample_area();
    for run in &mut reduced.runs {
        if run.id == "r-ombre" {
            run.is_open = false;
        }
    }
    let smaller =
        plan_route(&sample_request(&ALL_RATED), &reduced, &PlannerConfig::default()).unwrap();
    assert_eq!(smaller.total_runs_available, 4);
}

#[test]
fn dead_end_run_is_skied_last() {
    let area = loops_area();
    let (plan, reason) =
        plan_route_traced(&loops_request(), &area, &PlannerConfig::default()).unwrap();

    assert_eq!(reason, TerminationReason::AllRunsCovered);
    assert_eq!(plan.total_runs_covered, 3);
    assert_eq!(run_ids(&plan).last(), Some(&"a-dead"));
}

#[test]
fn home_outside_cluster_radius_is_unreachable() {
    let area = sample_area();
    let config = PlannerConfig::default();

    // About 60 m south of the base station.
    let mut outside = sample_request(&ALL_RATED);
    outside.home_location = GeoPoint {
        lat: 45.89946,
        lng: 6.87,
    };
    let (plan, reason) = plan_route_traced(&outside, &area, &config).unwrap();
    assert_eq!(reason, TerminationReason::HomeUnreachable);
    assert!(plan.is_empty());

    // About 25 m south of it.
    let mut inside = sample_request(&ALL_RATED);
    inside.home_location = GeoPoint {
        lat: 45.89978,
        lng: 6.87,
    };
    let (plan, reason) = plan_route_traced(&inside, &area, &config).unwrap();
    assert_ne!(reason, TerminationReason::HomeUnreachable);
    assert!(!plan.is_empty());
}

#[test]
fn distant_home_yields_empty_plan() {
    let area = sample_area();
    let mut request = sample_request(&ALL_RATED);
    request.home_location = GeoPoint {
        lat: 46.5,
        lng: 7.5,
    };

    let (plan, reason) = plan_route_traced(&request, &area, &PlannerConfig::default()).unwrap();
    assert_eq!(reason, TerminationReason::HomeUnreachable);
    assert!(plan.is_empty());
    assert_eq!(plan.total_runs_covered, 0);
    assert_eq!(plan.total_runs_available, 5);
    assert_eq!(plan.total_sun_score, 0.0);
}

#[test]
fn nursery_waits_for_its_lift() {
    let area = sample_area();
    let request = sample_request(&[Difficulty::Novice]);
    let (plan, reason) = plan_route_traced(&request, &area, &PlannerConfig::default()).unwrap();

    assert_eq!(reason, TerminationReason::AllRunsCovered);
    assert_eq!(plan.legs.len(), 2);
    match &plan.legs[0] {
        RouteLeg::LiftRide {
            lift_id,
            start_time,
            ..
        } => {
            assert_eq!(lift_id, "l-baby");
            assert_eq!(
                *start_time,
                Utc.with_ymd_and_hms(2024, 12, 21, 8, 30, 0).unwrap()
            );
        }
        other => panic!("expected lift ride, got {other:?}"),
    }
    assert_eq!(run_ids(&plan), vec!["r-nursery"]);
}

#[test]
fn afternoon_window_misses_morning_only_lift() {
    let area = sample_area();
    let request = sample_request(&[Difficulty::Novice]).with_lift_hours(hm(13, 0), hm(16, 30));
    let (plan, reason) = plan_route_traced(&request, &area, &PlannerConfig::default()).unwrap();

    assert_eq!(reason, TerminationReason::NoReachableRuns);
    assert!(plan.is_empty());
    assert_eq!(plan.total_runs_available, 1);
}

#[test]
fn runs_that_cannot_finish_before_close_are_dropped() {
    let area = sample_area();
    let request = sample_request(&[Difficulty::Easy]).with_lift_hours(hm(16, 25), hm(16, 30));
    let (plan, reason) = plan_route_traced(&request, &area, &PlannerConfig::default()).unwrap();

    assert_eq!(reason, TerminationReason::OutOfTime);
    assert!(plan.is_empty());
}

#[test]
fn iteration_cap_stops_planning() {
    let area = sample_area();
    let config = PlannerConfig {
        max_iterations: 2,
        ..PlannerConfig::default()
    };
    let (plan, reason) = plan_route_traced(&sample_request(&ALL_RATED), &area, &config).unwrap();

    assert_eq!(reason, TerminationReason::IterationCap);
    assert_eq!(plan.total_runs_covered, 2);
}

#[test]
fn malformed_requests_are_rejected_before_planning() {
    let area = sample_area();
    let config = PlannerConfig::default();

    let no_difficulty = sample_request(&[]);
    assert!(matches!(
        plan_route(&no_difficulty, &area, &config),
        Err(Error::InvalidRequest { .. })
    ));

    let mut bad_home = sample_request(&[Difficulty::Easy]);
    bad_home.home_location.lat = f64::NAN;
    assert!(plan_route(&bad_home, &area, &config).is_err());

    let inverted = sample_request(&[Difficulty::Easy]).with_lift_hours(hm(16, 0), hm(9, 0));
    assert!(plan_route(&inverted, &area, &config).is_err());

    let mut other_area = sample_request(&[Difficulty::Easy]);
    other_area.ski_area_id = "elsewhere".to_string();
    assert!(plan_route(&other_area, &area, &config).is_err());
}

#[test]
fn config_file_overrides_only_given_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("planner.json");
    std::fs::write(&path, r#"{ "sun_weight": 4.0, "exposure": { "sample_interval_minutes": 30 } }"#)
        .unwrap();

    let config = PlannerConfig::from_path(&path).unwrap();
    assert_eq!(config.sun_weight, 4.0);
    assert_eq!(config.detour_weight, PlannerConfig::default().detour_weight);
    assert_eq!(config.exposure.sample_interval_minutes, 30);
    assert_eq!(config.exposure.slope_angle_degrees, 25.0);

    std::fs::write(&path, r#"{ "detour_weight": -1.0 }"#).unwrap();
    assert!(PlannerConfig::from_path(&path).is_err());
}

#[test]
fn summary_lists_every_leg_with_local_times() {
    let area = sample_area();
    let plan = plan_route(&sample_request(&[Difficulty::Novice]), &area, &PlannerConfig::default())
        .unwrap();
    let summary = PlanSummary::from_plan(&plan, &area, paris());

    assert_eq!(summary.steps.len(), plan.legs.len());
    assert_eq!(summary.steps[0].start, "09:30");
    assert_eq!(summary.steps[1].name.as_deref(), Some("Nursery"));

    let text = summary.render(PlanRenderMode::PlainText);
    assert!(text.starts_with("Plan for Sample Area: 1 of 1 runs, 09:30 ->"));
    assert!(text.contains("Baby Drag"));
}
