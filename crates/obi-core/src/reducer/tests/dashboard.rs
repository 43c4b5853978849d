use pretty_assertions::assert_eq;

use super::*;
use crate::domain::DailyLog;
use crate::domain::MealAssessment;
use crate::domain::MealLog;
use crate::domain::MorningStats;

#[test]
fn untouched_day_reports_nothing_done() {
    let state = onboarded();
    let view = derive_dashboard(&state.study, t0());

    assert_eq!(view.day, 1);
    assert_eq!(view.phase, Phase::Blank);
    assert!(!view.morning_done);
    assert!(!view.breakfast_done);
    assert!(!view.dinner_done);
}

#[test]
fn morning_done_iff_stats_present() {
    let mut state = onboarded();
    state.study.current_log_mut(t0()).morning_stats = Some(MorningStats {
        weight: 70.0,
        body_fat_percentage: None,
        muscle_mass: None,
        visceral_fat: None,
        bmr: None,
        submitted_at: Some(t0()),
        notes: None,
    });

    assert!(derive_dashboard(&state.study, t0()).morning_done);
}

#[test]
fn partial_meal_log_is_not_done() {
    let mut state = onboarded();
    state.study.current_log_mut(t0()).breakfast = Some(MealLog {
        pre_assessment: Some(MealAssessment::default()),
        ..MealLog::default()
    });

    assert!(!derive_dashboard(&state.study, t0()).breakfast_done);
}

#[test]
fn completion_stamp_alone_marks_a_meal_done() {
    let mut state = onboarded();
    state.study.current_log_mut(t0()).dinner = Some(MealLog {
        completed_at: Some(t0()),
        ..MealLog::default()
    });

    assert!(derive_dashboard(&state.study, t0()).dinner_done);
}

#[test]
fn log_phase_is_pinned_at_materialization() {
    let mut state = onboarded();
    state.study.current_day = BLANK_PHASE_DAYS;
    state.study.current_log_mut(t0()); // materialize Day-14 as Blank

    reduce_at(
        &mut state,
        Action::Runtime(RuntimeAction::SetDay(BLANK_PHASE_DAYS + 1)),
        t0(),
    );

    let pinned = &state.study.logs[&day_key(BLANK_PHASE_DAYS)];
    assert_eq!(pinned.phase, Phase::Blank);
    assert_eq!(derive_dashboard(&state.study, t0()).phase, Phase::Stimulation);
}

#[test]
fn transient_default_log_is_not_persisted_by_a_read() {
    let state = onboarded();
    let log = state.study.current_log(t0());

    assert_eq!(log, DailyLog::fresh(1, t0()));
    assert!(state.study.logs.is_empty());
}

#[test]
fn sub_flows_open_only_from_the_dashboard() {
    let mut state = fresh();
    let effects = user(&mut state, UserAction::OpenMorningMeasure);

    assert_eq!(effects, vec![]);
    assert!(matches!(state.screen, Screen::Login(_)));
}

#[test]
fn set_day_clamps_to_one() {
    let mut state = onboarded();
    let effects = reduce_at(&mut state, Action::Runtime(RuntimeAction::SetDay(0)), t0());

    assert_eq!(state.study.current_day, 1);
    assert!(effects.contains(&Effect::SaveState));
}
