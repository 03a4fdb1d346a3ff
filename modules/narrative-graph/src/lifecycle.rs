use narrative_common::types::LifecycleState;

const HOT_BY_VOLUME_7D: u32 = 10;
const RISING_BY_VELOCITY_24H: u32 = 3;
const COOLING_AFTER_HOURS: f64 = 48.0;
const DORMANT_AFTER_HOURS: f64 = 24.0 * 7.0;

/// Pure state-machine derivation (§4.C8 table). Never raises; "cannot
/// decide" simply means "stay." Dormant is only ever entered here via
/// staleness — the *exit* from dormant happens exclusively through a
/// `Reactivate` decision in the matcher, never passively through this
/// function (the table's "(via Reactivate decision)" note).
///
/// Priority, highest first: silence ≥7d → dormant; silence ≥48h →
/// cooling; otherwise evaluate the activity-based promotion rules for
/// the current state.
pub fn next_state(
    from: LifecycleState,
    articles_last_24h: u32,
    velocity_rising: bool,
    articles_last_7d: u32,
    hours_since_last_article: f64,
) -> LifecycleState {
    if from == LifecycleState::Dormant {
        return LifecycleState::Dormant;
    }

    if hours_since_last_article >= DORMANT_AFTER_HOURS {
        return LifecycleState::Dormant;
    }

    if hours_since_last_article >= COOLING_AFTER_HOURS {
        return LifecycleState::Cooling;
    }

    let hot_by_volume = articles_last_7d >= HOT_BY_VOLUME_7D;
    let rising_by_velocity = articles_last_24h >= RISING_BY_VELOCITY_24H && velocity_rising;

    match from {
        LifecycleState::Emerging => {
            if hot_by_volume {
                LifecycleState::Hot
            } else if rising_by_velocity {
                LifecycleState::Rising
            } else {
                LifecycleState::Emerging
            }
        }
        LifecycleState::Rising | LifecycleState::Reactivated => {
            if hot_by_volume || rising_by_velocity {
                if hot_by_volume {
                    LifecycleState::Hot
                } else {
                    LifecycleState::Rising
                }
            } else if from == LifecycleState::Reactivated {
                LifecycleState::Reactivated
            } else {
                LifecycleState::Rising
            }
        }
        LifecycleState::Hot => LifecycleState::Hot,
        LifecycleState::Cooling => {
            if hot_by_volume {
                LifecycleState::Hot
            } else if rising_by_velocity {
                LifecycleState::Rising
            } else {
                LifecycleState::Cooling
            }
        }
        LifecycleState::Dormant => unreachable!("handled above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleState::*;

    #[test]
    fn emerging_promotes_to_rising_on_velocity() {
        assert_eq!(next_state(Emerging, 3, true, 4, 1.0), Rising);
    }

    #[test]
    fn emerging_stays_without_velocity_rising() {
        assert_eq!(next_state(Emerging, 3, false, 4, 1.0), Emerging);
    }

    #[test]
    fn emerging_jumps_straight_to_hot_on_volume() {
        assert_eq!(next_state(Emerging, 0, false, 10, 1.0), Hot);
    }

    #[test]
    fn boundary_24h_exactly_three_triggers_rising() {
        assert_eq!(next_state(Emerging, 3, true, 0, 1.0), Rising);
    }

    #[test]
    fn boundary_24h_two_does_not_trigger_rising() {
        assert_eq!(next_state(Emerging, 2, true, 0, 1.0), Emerging);
    }

    #[test]
    fn rising_promotes_to_hot_on_volume_or_velocity() {
        assert_eq!(next_state(Rising, 3, true, 0, 1.0), Hot);
        assert_eq!(next_state(Rising, 0, false, 10, 1.0), Hot);
    }

    #[test]
    fn rising_stays_rising_without_promotion_condition() {
        assert_eq!(next_state(Rising, 0, false, 0, 1.0), Rising);
    }

    #[test]
    fn hot_stays_hot_regardless_of_activity() {
        assert_eq!(next_state(Hot, 0, false, 0, 1.0), Hot);
        assert_eq!(next_state(Hot, 3, true, 10, 1.0), Hot);
    }

    #[test]
    fn boundary_48h_exactly_triggers_cooling() {
        assert_eq!(next_state(Hot, 0, false, 0, 48.0), Cooling);
    }

    #[test]
    fn boundary_47h_does_not_trigger_cooling() {
        assert_eq!(next_state(Hot, 0, false, 0, 47.0), Hot);
    }

    #[test]
    fn cooling_recovers_to_rising_or_hot() {
        assert_eq!(next_state(Cooling, 3, true, 0, 1.0), Rising);
        assert_eq!(next_state(Cooling, 0, false, 10, 1.0), Hot);
    }

    #[test]
    fn cooling_stays_cooling_without_recovery() {
        assert_eq!(next_state(Cooling, 0, false, 0, 1.0), Cooling);
    }

    #[test]
    fn boundary_7d_exactly_triggers_dormant() {
        assert_eq!(next_state(Cooling, 0, false, 0, 24.0 * 7.0), Dormant);
    }

    #[test]
    fn boundary_just_under_7d_stays_cooling() {
        assert_eq!(next_state(Cooling, 0, false, 0, 24.0 * 7.0 - 1.0), Cooling);
    }

    #[test]
    fn dormant_never_transitions_passively() {
        assert_eq!(next_state(Dormant, 100, true, 100, 0.0), Dormant);
    }

    #[test]
    fn reactivated_promotes_by_normal_rules() {
        assert_eq!(next_state(Reactivated, 3, true, 0, 1.0), Rising);
        assert_eq!(next_state(Reactivated, 0, false, 10, 1.0), Hot);
    }

    #[test]
    fn reactivated_stays_reactivated_with_no_activity() {
        assert_eq!(next_state(Reactivated, 0, false, 0, 1.0), Reactivated);
    }

    #[test]
    fn reactivated_goes_cooling_after_silence() {
        assert_eq!(next_state(Reactivated, 0, false, 0, 49.0), Cooling);
    }
}
