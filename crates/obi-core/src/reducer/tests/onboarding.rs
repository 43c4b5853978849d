use pretty_assertions::assert_eq;

use super::*;

#[test]
fn confirm_login_flips_auth_gate_before_profile_exists() {
    let mut state = fresh();
    assert!(matches!(state.screen, Screen::Login(_)));

    let effects = user(&mut state, UserAction::ConfirmLogin);

    assert!(state.study.is_authenticated);
    assert_eq!(state.study.profile, None);
    assert!(matches!(state.screen, Screen::ProfileSetup(_)));
    assert!(effects.contains(&Effect::SaveState));
}

#[test]
fn login_phone_is_carried_into_the_profile() {
    let mut state = fresh();
    type_text(&mut state, UserAction::LoginInput, "13812345678");
    user(&mut state, UserAction::ConfirmLogin);

    type_text(&mut state, UserAction::ProfileInput, "Lin");
    user(&mut state, UserAction::SubmitProfile);

    let profile = state.study.profile.expect("profile stored");
    assert_eq!(profile.phone_number, "13812345678");
    assert_eq!(profile.name, "Lin");
}

#[test]
fn code_field_is_cosmetic_and_never_verified() {
    let mut state = fresh();
    user(&mut state, UserAction::LoginNextField);
    type_text(&mut state, UserAction::LoginInput, "000000");

    user(&mut state, UserAction::ConfirmLogin);

    assert!(state.study.is_authenticated);
}

#[test]
fn profile_submit_without_a_name_is_silently_rejected() {
    let mut state = fresh();
    user(&mut state, UserAction::ConfirmLogin);

    let effects = user(&mut state, UserAction::SubmitProfile);

    assert_eq!(effects, vec![]);
    assert_eq!(state.study.profile, None);
    assert!(matches!(state.screen, Screen::ProfileSetup(_)));
}

#[test]
fn profile_submit_stores_immutable_profile_and_enters_dashboard() {
    let mut state = fresh();
    user(&mut state, UserAction::ConfirmLogin);
    type_text(&mut state, UserAction::ProfileInput, "Lin");
    user(&mut state, UserAction::CycleGender);

    let effects = user(&mut state, UserAction::SubmitProfile);

    let profile = state.study.profile.as_ref().expect("profile stored");
    assert_eq!(profile.gender, Gender::Female);
    // Age and height come from the form defaults.
    assert_eq!(profile.age, 30);
    assert_eq!(profile.height_cm, 170);
    assert!(matches!(state.screen, Screen::Dashboard));
    assert!(effects.contains(&Effect::SaveState));
}

#[test]
fn age_field_rejects_non_digit_input() {
    let mut state = fresh();
    user(&mut state, UserAction::ConfirmLogin);
    user(&mut state, UserAction::ProfileNextField); // name -> age
    user(&mut state, UserAction::ProfileBackspace);
    user(&mut state, UserAction::ProfileBackspace);
    type_text(&mut state, UserAction::ProfileInput, "4x2");

    if let Screen::ProfileSetup(form) = &state.screen {
        assert_eq!(form.age, "42");
    } else {
        panic!("expected profile screen");
    }
}

#[test]
fn initial_routing_follows_the_two_gates() {
    let mut study = StudyState::new(t0());
    assert!(matches!(
        AppState::new(study.clone()).screen,
        Screen::Login(_)
    ));

    study.is_authenticated = true;
    assert!(matches!(
        AppState::new(study.clone()).screen,
        Screen::ProfileSetup(_)
    ));

    study.profile = Some(UserProfile {
        name: "Lin".to_string(),
        phone_number: String::new(),
        gender: Gender::Male,
        age: 30,
        height_cm: 170,
    });
    assert!(matches!(AppState::new(study).screen, Screen::Dashboard));
}
