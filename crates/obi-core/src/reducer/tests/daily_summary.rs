use pretty_assertions::assert_eq;

use super::*;

fn at_summary_screen() -> AppState {
    let mut state = onboarded();
    user(&mut state, UserAction::OpenDailySummary);
    state
}

#[test]
fn submit_saves_before_requesting_the_insight() {
    let mut state = at_summary_screen();
    user(&mut state, UserAction::ToggleDeviceConfirmed);

    let effects = user(&mut state, UserAction::SubmitDailySummary);

    let save_pos = effects
        .iter()
        .position(|e| matches!(e, Effect::SaveState))
        .expect("save emitted");
    let insight_pos = effects
        .iter()
        .position(|e| matches!(e, Effect::RequestInsight { .. }))
        .expect("insight requested");
    assert!(save_pos < insight_pos, "persist must not wait on the insight");

    let log = &state.study.logs[&day_key(1)];
    let appetite = log.appetite.as_ref().expect("appetite stored");
    assert_eq!(appetite.breakfast_score, 50);
    let usage = log.device_usage.as_ref().expect("usage stored");
    assert!(usage.confirmed);
    assert_eq!(usage.duration_minutes, STIMULATION_TARGET_SECONDS / 60);
    // Day 1 is the blank phase: the asserted level is zero.
    assert_eq!(usage.intensity_level, 0);
    assert!(matches!(state.screen, Screen::Dashboard));
}

#[test]
fn active_phase_summary_asserts_level_five_not_the_session_default() {
    let mut state = onboarded();
    reduce_at(
        &mut state,
        Action::Runtime(RuntimeAction::SetDay(BLANK_PHASE_DAYS + 1)),
        t0(),
    );
    user(&mut state, UserAction::OpenDailySummary);
    user(&mut state, UserAction::ToggleDeviceConfirmed);

    user(&mut state, UserAction::SubmitDailySummary);

    let usage = state.study.logs[&day_key(BLANK_PHASE_DAYS + 1)]
        .device_usage
        .clone()
        .expect("usage stored");
    assert_eq!(usage.intensity_level, 5);
}

#[test]
fn insight_request_carries_the_committed_log_and_phase() {
    let mut state = at_summary_screen();
    let effects = user(&mut state, UserAction::SubmitDailySummary);

    let Some(Effect::RequestInsight { log, phase }) = effects
        .iter()
        .find(|e| matches!(e, Effect::RequestInsight { .. }))
    else {
        panic!("insight requested");
    };
    assert_eq!(*phase, Phase::Blank);
    assert!(log.appetite.is_some());
    assert!(log.device_usage.is_some());
}

#[test]
fn adjusted_scores_land_in_the_log() {
    let mut state = at_summary_screen();
    user(&mut state, UserAction::SummaryAdjust(25));
    user(&mut state, UserAction::SummaryNextField);
    user(&mut state, UserAction::SummaryAdjust(-30));

    user(&mut state, UserAction::SubmitDailySummary);

    let appetite = state.study.logs[&day_key(1)]
        .appetite
        .clone()
        .expect("appetite stored");
    assert_eq!(appetite.breakfast_score, 75);
    assert_eq!(appetite.dinner_score, 20);
}

#[test]
fn insight_ready_sets_the_banner_and_dismiss_clears_it() {
    let mut state = onboarded();

    reduce_at(
        &mut state,
        Action::Runtime(RuntimeAction::InsightReady(
            "Keep going, your consistency matters.".to_string(),
        )),
        t0(),
    );
    assert_eq!(
        state.insight.as_deref(),
        Some("Keep going, your consistency matters.")
    );

    user(&mut state, UserAction::DismissInsight);
    assert_eq!(state.insight, None);

    // Dismissing again does nothing.
    assert_eq!(user(&mut state, UserAction::DismissInsight), vec![]);
}
