//! Property-based tests for invariants that must hold over arbitrary input,
//! not just the handful of cases covered by example-based unit tests.

use proptest::prelude::*;
use uuid::Uuid;

use narrative_engine::model::{ArcPoint, CharacterArcState};
use narrative_engine::types::{ArcDirection, Severity};

fn arc_direction_strategy() -> impl Strategy<Value = ArcDirection> {
    prop_oneof![
        Just(ArcDirection::Ascending),
        Just(ArcDirection::Descending),
        Just(ArcDirection::Static),
        Just(ArcDirection::Crisis),
        Just(ArcDirection::Resolution),
    ]
}

proptest! {
    /// `arc_position` is the clamped fold of arc_points' signed impacts: no
    /// matter how many points land, or in what direction, it never leaves
    /// `[0, 1]` (spec invariant, §8).
    #[test]
    fn arc_position_always_stays_in_unit_interval(
        points in prop::collection::vec((arc_direction_strategy(), 0.0f64..=1.0f64), 0..200)
    ) {
        let mut state = CharacterArcState::new("p1", "Mira");
        for (index, (direction, impact)) in points.into_iter().enumerate() {
            state.push_arc_point(ArcPoint::new(
                Uuid::new_v4(),
                index as u32,
                "emotion",
                direction,
                impact,
            ));
            prop_assert!(state.arc_position >= 0.0);
            prop_assert!(state.arc_position <= 1.0);
        }
    }

    /// Gap severity bucketing: score<0.3 => critical; 0.3<=score<0.5 =>
    /// major; else minor, for any score in a realistic range including
    /// slightly out-of-bounds values (spec invariant, §8).
    #[test]
    fn severity_bucketing_matches_thresholds(score in -0.5f64..=1.5f64) {
        let severity = Severity::from_score(score);
        if score < 0.3 {
            prop_assert_eq!(severity, Severity::Critical);
        } else if score < 0.5 {
            prop_assert_eq!(severity, Severity::Major);
        } else {
            prop_assert_eq!(severity, Severity::Minor);
        }
    }
}
