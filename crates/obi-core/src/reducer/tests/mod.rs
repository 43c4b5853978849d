use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;

pub(super) use super::reduce_at;
pub(super) use crate::actions::Action;
pub(super) use crate::actions::Effect;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::domain::day_key;
pub(super) use crate::domain::Gender;
pub(super) use crate::domain::MealType;
pub(super) use crate::domain::Phase;
pub(super) use crate::domain::UserProfile;
pub(super) use crate::domain::BLANK_PHASE_DAYS;
pub(super) use crate::domain::STIMULATION_TARGET_SECONDS;
pub(super) use crate::state::derive_dashboard;
pub(super) use crate::state::AppState;
pub(super) use crate::state::MealStep;
pub(super) use crate::state::Screen;
pub(super) use crate::state::StudyState;
pub(super) use crate::state::TimerPhase;

mod dashboard;
mod daily_summary;
mod morning;
mod onboarding;

pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

/// A participant who has finished onboarding, sitting on the dashboard.
pub(super) fn onboarded() -> AppState {
    let mut study = StudyState::new(t0());
    study.is_authenticated = true;
    study.profile = Some(UserProfile {
        name: "Lin".to_string(),
        phone_number: "13800000000".to_string(),
        gender: Gender::Other,
        age: 34,
        height_cm: 172,
    });
    AppState::new(study)
}

pub(super) fn fresh() -> AppState {
    AppState::new(StudyState::new(t0()))
}

pub(super) fn user(state: &mut AppState, action: UserAction) -> Vec<Effect> {
    reduce_at(state, Action::User(action), t0())
}

pub(super) fn tick(state: &mut AppState) -> Vec<Effect> {
    reduce_at(state, Action::Runtime(RuntimeAction::Tick), t0())
}

pub(super) fn type_text(
    state: &mut AppState,
    make: impl Fn(char) -> UserAction,
    text: &str,
) {
    for ch in text.chars() {
        user(state, make(ch));
    }
}
