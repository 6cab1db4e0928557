mod common;

use std::collections::BTreeSet;
use std::fs;

use skisun_lib::{
    difficulty_color, ensure_eligible_terrain, Difficulty, Error, JsonTopologyStore, LiftType,
    SkiAreaTopology, StatusSnapshot, TopologySource,
};

use common::{fixtures_dir, hm, sample_area, SAMPLE_AREA};

fn difficulties(values: &[Difficulty]) -> BTreeSet<Difficulty> {
    values.iter().copied().collect()
}

#[test]
fn fixture_parses_with_timezone_and_lift_types() {
    let area = sample_area();
    assert_eq!(area.id, SAMPLE_AREA);
    assert_eq!(area.timezone, Some(chrono_tz::Europe::Paris));
    assert_eq!(area.runs.len(), 6);

    let gondola = area.lifts.iter().find(|l| l.id == "l-gondola").unwrap();
    assert_eq!(gondola.lift_type, LiftType::Gondola);
    let hours = gondola.operating_hours.unwrap();
    assert!(hours.contains(hm(12, 0)));
    assert!(!hours.contains(hm(16, 15)));
}

#[test]
fn eligible_runs_are_open_and_selected() {
    let area = sample_area();
    let easy = difficulties(&[Difficulty::Easy]);
    let ids: Vec<&str> = area.eligible_runs(&easy).map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r-soleil", "r-liaison"]);

    assert_eq!(
        ensure_eligible_terrain(&area, &difficulties(&[Difficulty::Expert]))
            .map_err(|e| e.to_string()),
        Err("ski area sample-area has no open runs matching the selected difficulties".to_string())
    );
}

#[test]
fn status_snapshot_overrides_flags_and_hours() {
    let mut area = sample_area();
    let snapshot = StatusSnapshot::from_path(&fixtures_dir().join("sample_status.json")).unwrap();
    area.apply_status(&snapshot).unwrap();

    let run_open = |id: &str| area.runs.iter().find(|r| r.id == id).unwrap().is_open;
    assert!(!run_open("r-ombre"));
    assert!(run_open("r-closed"));
    assert!(area.lifts.iter().find(|l| l.id == "l-closed").unwrap().is_open);

    let baby = area.lifts.iter().find(|l| l.id == "l-baby").unwrap();
    assert_eq!(baby.operating_hours.unwrap().open, hm(10, 0));

    let easy = difficulties(&[Difficulty::Easy]);
    assert_eq!(area.eligible_runs(&easy).count(), 3);
}

#[test]
fn status_for_another_resort_is_rejected() {
    let mut area = sample_area();
    let snapshot = StatusSnapshot {
        resort_id: "resort-7".to_string(),
        ..StatusSnapshot::default()
    };
    assert!(matches!(
        area.apply_status(&snapshot),
        Err(Error::ResortMismatch { .. })
    ));
}

#[test]
fn unknown_difficulty_label_falls_back_to_gray() {
    assert_eq!(difficulty_color(Some("novice")), "#4CAF50");
    assert_eq!(difficulty_color(Some("Easy")), "#2196F3");
    assert_eq!(difficulty_color(Some("intermediate")), "#F44336");
    assert_eq!(difficulty_color(Some("advanced")), "#212121");
    assert_eq!(difficulty_color(Some("expert")), "#FF9800");
    assert_eq!(difficulty_color(Some("freeride")), "#9E9E9E");
    assert_eq!(difficulty_color(None), "#9E9E9E");
}

#[test]
fn unrecognized_difficulty_in_document_parses_as_unknown() {
    let area = SkiAreaTopology::from_json(
        r#"{
            "id": "odd",
            "runs": [{
                "id": "r1", "difficulty": "extreme", "is_open": true,
                "geometry": [{"lat": 46.0, "lng": 7.0}, {"lat": 45.99, "lng": 7.0}]
            }]
        }"#,
    )
    .unwrap();
    assert_eq!(area.runs[0].difficulty, Difficulty::Unknown);
}

#[test]
fn degenerate_geometry_is_rejected() {
    let result = SkiAreaTopology::from_json(
        r#"{
            "id": "bad",
            "runs": [{
                "id": "r1", "difficulty": "easy", "is_open": true,
                "geometry": [{"lat": 46.0, "lng": 7.0}]
            }]
        }"#,
    );
    assert!(matches!(result, Err(Error::InvalidTopology { .. })));
}

#[test]
fn store_serves_fixture_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("ski_areas");
    fs::create_dir_all(&root).unwrap();
    fs::copy(
        fixtures_dir().join("sample_ski_area.json"),
        root.join(format!("{SAMPLE_AREA}.json")),
    )
    .unwrap();

    let store = JsonTopologyStore::from_data_dir(Some(dir.path())).unwrap();
    assert_eq!(store.load(SAMPLE_AREA).unwrap(), sample_area());

    match store.load("sample-aera") {
        Err(Error::UnknownSkiArea { suggestions, .. }) => {
            assert_eq!(suggestions, vec![SAMPLE_AREA.to_string()]);
        }
        other => panic!("expected unknown ski area, got {other:?}"),
    }
}
