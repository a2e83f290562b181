use std::time::Duration;

use serde::Deserialize;
use vector_grid_system_difficulty::{curve, DifficultyCurve, Tier, TuningError, RESERVED_TILES};

const SCANNED_LEVELS: u32 = 400;

#[test]
fn wall_bounds_never_exceed_reserved_capacity() {
    for level in 1..=SCANNED_LEVELS {
        let params = curve(level);
        let capacity = params.grid_size().cell_count() - RESERVED_TILES;
        assert!(
            params.wall_count_max() <= capacity,
            "level {level} allows {} walls on a {}x{} grid",
            params.wall_count_max(),
            params.grid_size().side(),
            params.grid_size().side(),
        );
        assert!(
            params.wall_count_min() <= params.wall_count_max(),
            "level {level} has an inverted wall range",
        );
    }
}

#[test]
fn progression_never_eases_grid_walls_or_complexity() {
    let mut previous = curve(1);
    for level in 2..=SCANNED_LEVELS {
        let params = curve(level);
        assert!(params.grid_size() >= previous.grid_size(), "grid shrank at {level}");
        assert!(
            params.wall_count_min() >= previous.wall_count_min(),
            "minimum walls dropped at {level}",
        );
        assert!(
            params.wall_count_max() >= previous.wall_count_max(),
            "maximum walls dropped at {level}",
        );
        assert!(
            params.complexity() >= previous.complexity(),
            "complexity dropped at {level}",
        );
        assert!((0.0..=1.0).contains(&params.complexity()));
        previous = params;
    }
}

#[test]
fn countdown_only_rises_when_grid_grows_or_walls_thicken() {
    let mut previous = curve(1);
    for level in 2..=SCANNED_LEVELS {
        let params = curve(level);
        if params.time_limit() > previous.time_limit() {
            let tier_changed = params.grid_size() != previous.grid_size()
                || params.wall_count_max() != previous.wall_count_max();
            assert!(tier_changed, "countdown rose inside a tier at level {level}");
        }
        previous = params;
    }
}

#[test]
fn late_levels_settle_on_the_hard_floor() {
    let params = curve(SCANNED_LEVELS);
    assert_eq!(params.grid_size().side(), 5);
    assert_eq!(params.time_limit(), Duration::from_millis(1_200));
    assert_eq!(params.wall_count_min(), 10);
    assert_eq!(params.wall_count_max(), 15);
}

#[derive(Deserialize)]
struct TuningFile {
    tiers: Vec<Tier>,
}

#[test]
fn tiers_load_from_toml() {
    let source = r#"
        [[tiers]]
        through_level = 4
        grid_size = 3
        wall_count_min = 0
        wall_count_max = 1
        time_base_ms = 6000
        time_step_ms = 100
        time_floor_ms = 5000

        [[tiers]]
        grid_size = 6
        wall_count_min = 8
        wall_count_max = 40
        time_base_ms = 7000
        time_step_ms = 25
        time_floor_ms = 3000
        level_offset = 4
        complexity = 0.6
    "#;

    let file: TuningFile = toml::from_str(source).expect("tier table parses");
    let curve = DifficultyCurve::from_tiers(file.tiers).expect("tier table validates");

    let early = curve.params(2);
    assert_eq!(early.grid_size().side(), 3);
    assert_eq!(early.time_limit(), Duration::from_millis(5_800));
    assert_eq!(early.complexity(), 0.0);

    let late = curve.params(8);
    assert_eq!(late.grid_size().side(), 6);
    assert_eq!(late.time_limit(), Duration::from_millis(6_900));
    assert_eq!(late.wall_count_max(), 30, "36 tiles leave room for 30 walls");
}

#[test]
fn closed_toml_table_is_rejected() {
    let source = r#"
        [[tiers]]
        through_level = 9
        grid_size = 4
        wall_count_min = 0
        wall_count_max = 2
        time_base_ms = 4000
        time_step_ms = 100
        time_floor_ms = 2000
    "#;

    let file: TuningFile = toml::from_str(source).expect("tier table parses");
    assert_eq!(
        DifficultyCurve::from_tiers(file.tiers),
        Err(TuningError::ClosedFinalTier { level: 9 })
    );
}
