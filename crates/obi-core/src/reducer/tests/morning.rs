use pretty_assertions::assert_eq;

use super::*;
use crate::state::MorningField;

fn at_morning_form() -> AppState {
    let mut state = onboarded();
    user(&mut state, UserAction::OpenMorningMeasure);
    state
}

#[test]
fn missing_weight_silently_blocks_the_write() {
    let mut state = at_morning_form();

    let effects = user(&mut state, UserAction::SubmitMorning);

    assert_eq!(effects, vec![]);
    assert!(matches!(state.screen, Screen::MorningMeasure(_)));
    assert!(state.study.logs.is_empty());
}

#[test]
fn zero_weight_is_rejected_like_a_missing_one() {
    let mut state = at_morning_form();
    type_text(&mut state, UserAction::MorningInput, "0");

    let effects = user(&mut state, UserAction::SubmitMorning);

    assert_eq!(effects, vec![]);
    assert!(state.study.logs.is_empty());
}

#[test]
fn valid_weight_saves_stamps_and_returns_to_dashboard() {
    let mut state = at_morning_form();
    type_text(&mut state, UserAction::MorningInput, "65.5");

    let effects = user(&mut state, UserAction::SubmitMorning);

    let log = &state.study.logs[&day_key(1)];
    let stats = log.morning_stats.as_ref().expect("stats saved");
    assert_eq!(stats.weight, 65.5);
    assert_eq!(stats.submitted_at, Some(t0()));
    assert!(matches!(state.screen, Screen::Dashboard));
    assert!(effects.contains(&Effect::SaveState));
    assert!(derive_dashboard(&state.study, t0()).morning_done);
}

#[test]
fn optional_fields_are_absent_when_left_blank() {
    let mut state = at_morning_form();
    type_text(&mut state, UserAction::MorningInput, "70");
    user(&mut state, UserAction::MorningNextField); // -> body fat
    type_text(&mut state, UserAction::MorningInput, "24.5");

    user(&mut state, UserAction::SubmitMorning);

    let stats = state.study.logs[&day_key(1)]
        .morning_stats
        .clone()
        .expect("stats saved");
    assert_eq!(stats.body_fat_percentage, Some(24.5));
    assert_eq!(stats.muscle_mass, None);
    assert_eq!(stats.bmr, None);
    assert_eq!(stats.notes, None);
}

#[test]
fn numeric_fields_ignore_letters() {
    let mut state = at_morning_form();
    type_text(&mut state, UserAction::MorningInput, "6a5");

    if let Screen::MorningMeasure(form) = &state.screen {
        assert_eq!(form.weight, "65");
        assert_eq!(form.focus, Some(MorningField::Weight));
    } else {
        panic!("expected morning screen");
    }
}

#[test]
fn notes_field_accepts_free_text() {
    let mut state = at_morning_form();
    type_text(&mut state, UserAction::MorningInput, "70");
    user(&mut state, UserAction::MorningPrevField); // weight -> notes (wraps)
    type_text(&mut state, UserAction::MorningInput, "slept well");

    user(&mut state, UserAction::SubmitMorning);

    let stats = state.study.logs[&day_key(1)]
        .morning_stats
        .clone()
        .expect("stats saved");
    assert_eq!(stats.notes.as_deref(), Some("slept well"));
}
