use chrono::DateTime;
use chrono::Utc;

use crate::actions::Action;
use crate::actions::Effect;
use crate::actions::RuntimeAction;
use crate::actions::UserAction;
use crate::domain::DeviceUsageStats;
use crate::domain::GlucoseUpload;
use crate::domain::MorningStats;
use crate::domain::StimulationSession;
use crate::domain::UserProfile;
use crate::domain::STIMULATION_TARGET_SECONDS;
use crate::state::AppState;
use crate::state::AssessmentForm;
use crate::state::LoginField;
use crate::state::MealFlow;
use crate::state::MealStep;
use crate::state::MealTimerStep;
use crate::state::MorningField;
use crate::state::MorningForm;
use crate::state::ProfileField;
use crate::state::ProfileForm;
use crate::state::Screen;
use crate::state::StimulationStep;
use crate::state::StudyState;
use crate::state::SummaryField;
use crate::state::SummaryForm;
use crate::state::TimerPhase;
use crate::state::UploadForm;

/// Single transition function. Mutates the state in place and returns the
/// side effects the client must carry out, in order. All persistence goes
/// through `Effect::SaveState`; the reducer itself never does I/O.
pub fn reduce(state: &mut AppState, action: Action) -> Vec<Effect> {
    reduce_at(state, action, Utc::now())
}

/// Entry point with an explicit clock, used by tests.
pub fn reduce_at(state: &mut AppState, action: Action, now: DateTime<Utc>) -> Vec<Effect> {
    match action {
        Action::User(user) => reduce_user(state, user, now),
        Action::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn reduce_user(state: &mut AppState, action: UserAction, now: DateTime<Utc>) -> Vec<Effect> {
    match action {
        // -- Onboarding -----------------------------------------------------
        UserAction::LoginInput(ch) => {
            if let Screen::Login(form) = &mut state.screen {
                match form.focus {
                    LoginField::Phone => form.phone.push(ch),
                    LoginField::Code => form.code.push(ch),
                }
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::LoginBackspace => {
            if let Screen::Login(form) = &mut state.screen {
                match form.focus {
                    LoginField::Phone => form.phone.pop(),
                    LoginField::Code => form.code.pop(),
                };
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::LoginNextField => {
            if let Screen::Login(form) = &mut state.screen {
                form.focus = match form.focus {
                    LoginField::Phone => LoginField::Code,
                    LoginField::Code => LoginField::Phone,
                };
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::ConfirmLogin => {
            // The one-time code is never verified; signing in only flips the
            // authentication gate, profile completion is tracked separately.
            if let Screen::Login(form) = &state.screen {
                let phone = form.phone.clone();
                state.study.is_authenticated = true;
                state.screen = Screen::ProfileSetup(ProfileForm {
                    phone,
                    ..ProfileForm::default()
                });
                return vec![Effect::SaveState, Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::ProfileInput(ch) => {
            if let Screen::ProfileSetup(form) = &mut state.screen {
                match form.focus {
                    ProfileField::Name => form.name.push(ch),
                    ProfileField::Age if ch.is_ascii_digit() => form.age.push(ch),
                    ProfileField::Height if ch.is_ascii_digit() => form.height.push(ch),
                    _ => return Vec::new(),
                }
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::ProfileBackspace => {
            if let Screen::ProfileSetup(form) = &mut state.screen {
                match form.focus {
                    ProfileField::Name => form.name.pop(),
                    ProfileField::Age => form.age.pop(),
                    ProfileField::Height => form.height.pop(),
                };
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::ProfileNextField => {
            if let Screen::ProfileSetup(form) = &mut state.screen {
                form.focus = form.focus.next();
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::CycleGender => {
            if let Screen::ProfileSetup(form) = &mut state.screen {
                form.gender = form.gender.next();
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::SubmitProfile => {
            if let Screen::ProfileSetup(form) = &state.screen {
                let Some(profile) = parse_profile(form) else {
                    return Vec::new();
                };
                state.study.profile = Some(profile);
                state.screen = Screen::Dashboard;
                return vec![Effect::SaveState, Effect::RequestFrame];
            }
            Vec::new()
        }

        // -- Dashboard navigation -------------------------------------------
        UserAction::OpenMorningMeasure => {
            if matches!(state.screen, Screen::Dashboard) {
                state.screen = Screen::MorningMeasure(MorningForm::new());
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::OpenMealTask(meal) => {
            if matches!(state.screen, Screen::Dashboard) {
                let phase = state.study.current_phase();
                state.screen = Screen::MealTask {
                    meal,
                    flow: MealFlow::new(phase),
                };
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::OpenGlucoseUpload => {
            if matches!(state.screen, Screen::Dashboard) {
                state.screen = Screen::GlucoseUpload(UploadForm::default());
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::OpenDailySummary => {
            if matches!(state.screen, Screen::Dashboard) {
                state.screen = Screen::DailySummary(SummaryForm::default());
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::LeaveScreen => {
            match state.screen {
                Screen::MorningMeasure(_)
                | Screen::MealTask { .. }
                | Screen::GlucoseUpload(_)
                | Screen::DailySummary(_) => {
                    // Abandons all transient step data. The ticker is
                    // released unconditionally: a timer may still be running.
                    state.screen = Screen::Dashboard;
                    vec![Effect::StopTicker, Effect::RequestFrame]
                }
                _ => Vec::new(),
            }
        }

        // -- Morning measurement --------------------------------------------
        UserAction::MorningInput(ch) => {
            if let Screen::MorningMeasure(form) = &mut state.screen {
                let Some(focus) = form.focus else {
                    return Vec::new();
                };
                let numeric = !matches!(focus, MorningField::Notes);
                if numeric && !(ch.is_ascii_digit() || ch == '.') {
                    return Vec::new();
                }
                form.field_mut(focus).push(ch);
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::MorningBackspace => {
            if let Screen::MorningMeasure(form) = &mut state.screen {
                if let Some(focus) = form.focus {
                    form.field_mut(focus).pop();
                    return vec![Effect::RequestFrame];
                }
            }
            Vec::new()
        }
        UserAction::MorningNextField => {
            if let Screen::MorningMeasure(form) = &mut state.screen {
                form.focus = Some(form.focus.map_or(MorningField::Weight, MorningField::next));
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::MorningPrevField => {
            if let Screen::MorningMeasure(form) = &mut state.screen {
                form.focus = Some(form.focus.map_or(MorningField::Weight, MorningField::prev));
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::SubmitMorning => {
            if let Screen::MorningMeasure(form) = &state.screen {
                // Missing or non-positive weight silently blocks the write.
                let Some(stats) = parse_morning(form, now) else {
                    return Vec::new();
                };
                state.study.current_log_mut(now).morning_stats = Some(stats);
                state.screen = Screen::Dashboard;
                return vec![Effect::SaveState, Effect::RequestFrame];
            }
            Vec::new()
        }

        // -- Meal task flow -------------------------------------------------
        UserAction::AssessmentAdjust(delta) => {
            if let Some(form) = assessment_form_mut(&mut state.screen) {
                form.adjust(delta);
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::AssessmentNextAxis => {
            if let Some(form) = assessment_form_mut(&mut state.screen) {
                form.focus = form.focus.next();
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::SubmitAssessment => {
            if let Screen::MealTask { flow, .. } = &mut state.screen {
                match &flow.step {
                    MealStep::PreAssess(form) => {
                        flow.draft.pre_assessment = Some(form.values);
                        flow.step = MealStep::Stimulation(StimulationStep::new(flow.phase));
                        return vec![Effect::RequestFrame];
                    }
                    MealStep::PostAssess(form) => {
                        flow.draft.post_assessment = Some(form.values);
                        flow.step = MealStep::MealTimer(MealTimerStep::default());
                        return vec![Effect::RequestFrame];
                    }
                    _ => {}
                }
            }
            Vec::new()
        }
        UserAction::StartStimulation => {
            if let Screen::MealTask { flow, .. } = &mut state.screen {
                if let MealStep::Stimulation(step) = &mut flow.step {
                    if step.timer == TimerPhase::Idle {
                        step.timer = TimerPhase::Running;
                        step.started_at = Some(now);
                        return vec![Effect::StartTicker, Effect::RequestFrame];
                    }
                }
            }
            Vec::new()
        }
        UserAction::FinishStimulation => {
            if let Screen::MealTask { flow, .. } = &mut state.screen {
                if let MealStep::Stimulation(step) = &flow.step {
                    // Valid once started, whether the countdown ran out or
                    // was cut short; a zero-second session is accepted.
                    let Some(started_at) = step.started_at else {
                        return Vec::new();
                    };
                    flow.draft.stimulation = Some(StimulationSession {
                        intensity: step.intensity,
                        duration_seconds: step.elapsed(),
                        completed: true,
                        started_at,
                    });
                    flow.step = MealStep::PostAssess(AssessmentForm::default());
                    return vec![Effect::StopTicker, Effect::RequestFrame];
                }
            }
            Vec::new()
        }
        UserAction::StartMeal => {
            if let Screen::MealTask { flow, .. } = &mut state.screen {
                if let MealStep::MealTimer(timer) = &mut flow.step {
                    if !timer.running {
                        timer.running = true;
                        return vec![Effect::StartTicker, Effect::RequestFrame];
                    }
                }
            }
            Vec::new()
        }
        UserAction::FinishMeal => {
            if let Screen::MealTask { meal, flow } = &mut state.screen {
                if let MealStep::MealTimer(timer) = &flow.step {
                    if !timer.running {
                        return Vec::new();
                    }
                    // The single commit point: the whole accumulated log
                    // lands in the study state in one write.
                    let log = std::mem::take(&mut flow.draft).finalize(timer.elapsed, now);
                    let meal = *meal;
                    state.study.current_log_mut(now).set_meal(meal, log);
                    state.screen = Screen::Dashboard;
                    return vec![Effect::StopTicker, Effect::SaveState, Effect::RequestFrame];
                }
            }
            Vec::new()
        }

        // -- Glucose upload -------------------------------------------------
        UserAction::ToggleUploadKind => {
            if let Screen::GlucoseUpload(form) = &mut state.screen {
                form.kind = form.kind.toggle();
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::ToggleUploadEvent => {
            if let Screen::GlucoseUpload(form) = &mut state.screen {
                form.event = form.event.toggle();
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::UploadInput(ch) => {
            if let Screen::GlucoseUpload(form) = &mut state.screen {
                form.file_input.push(ch);
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::UploadBackspace => {
            if let Screen::GlucoseUpload(form) = &mut state.screen {
                form.file_input.pop();
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::FileProvided { file_name } => {
            if let Screen::GlucoseUpload(form) = &mut state.screen {
                let upload = GlucoseUpload {
                    id: upload_id(&state.study, now),
                    kind: form.kind,
                    file_name,
                    upload_date: now,
                    related_event: form.event,
                };
                form.file_input.clear();
                state.study.record_upload(upload);
                return vec![Effect::SaveState, Effect::RequestFrame];
            }
            Vec::new()
        }

        // -- Daily summary --------------------------------------------------
        UserAction::SummaryAdjust(delta) => {
            if let Screen::DailySummary(form) = &mut state.screen {
                form.adjust(delta);
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::SummaryNextField => {
            if let Screen::DailySummary(form) = &mut state.screen {
                form.focus = form.focus.next();
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::ToggleDeviceConfirmed => {
            if let Screen::DailySummary(form) = &mut state.screen {
                form.device_confirmed = !form.device_confirmed;
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }
        UserAction::SubmitDailySummary => {
            if let Screen::DailySummary(form) = &state.screen {
                let form = form.clone();
                let phase = state.study.current_phase();
                let log = state.study.current_log_mut(now);
                log.appetite = Some(form.appetite);
                log.device_usage = Some(DeviceUsageStats {
                    confirmed: form.device_confirmed,
                    duration_minutes: STIMULATION_TARGET_SECONDS / 60,
                    intensity_level: phase.reported_intensity(),
                    timestamp: now,
                });
                let snapshot = log.clone();
                state.screen = Screen::Dashboard;
                // The save comes first; the insight call is best-effort
                // enrichment and must never hold up persistence.
                return vec![
                    Effect::SaveState,
                    Effect::RequestInsight {
                        log: Box::new(snapshot),
                        phase,
                    },
                    Effect::RequestFrame,
                ];
            }
            Vec::new()
        }
        UserAction::DismissInsight => {
            if state.insight.take().is_some() {
                return vec![Effect::RequestFrame];
            }
            Vec::new()
        }

        // -- Reset ----------------------------------------------------------
        UserAction::ResetStudy => {
            state.study = StudyState::new(now);
            state.insight = None;
            state.screen = Screen::Login(Default::default());
            vec![Effect::WipeState, Effect::StopTicker, Effect::RequestFrame]
        }
    }
}

fn reduce_runtime(state: &mut AppState, action: RuntimeAction) -> Vec<Effect> {
    match action {
        RuntimeAction::Tick => {
            if let Screen::MealTask { flow, .. } = &mut state.screen {
                match &mut flow.step {
                    MealStep::Stimulation(step) if step.timer == TimerPhase::Running => {
                        step.remaining = step.remaining.saturating_sub(1);
                        if step.remaining == 0 {
                            // Natural end: stop counting, but stay on this
                            // step until the user confirms completion.
                            step.timer = TimerPhase::Ended;
                            return vec![Effect::StopTicker, Effect::RequestFrame];
                        }
                        return vec![Effect::RequestFrame];
                    }
                    MealStep::MealTimer(timer) if timer.running => {
                        timer.elapsed = timer.elapsed.saturating_add(1);
                        return vec![Effect::RequestFrame];
                    }
                    _ => {}
                }
            }
            // Stale tick for a view no longer showing a timer.
            Vec::new()
        }
        RuntimeAction::InsightReady(text) => {
            state.insight = Some(text);
            vec![Effect::RequestFrame]
        }
        RuntimeAction::SetDay(day) => {
            state.study.current_day = day.max(1);
            vec![Effect::SaveState, Effect::RequestFrame]
        }
    }
}

fn assessment_form_mut(screen: &mut Screen) -> Option<&mut AssessmentForm> {
    if let Screen::MealTask { flow, .. } = screen {
        match &mut flow.step {
            MealStep::PreAssess(form) | MealStep::PostAssess(form) => return Some(form),
            _ => {}
        }
    }
    None
}

fn parse_profile(form: &ProfileForm) -> Option<UserProfile> {
    let name = form.name.trim();
    if name.is_empty() {
        return None;
    }
    let age: u32 = form.age.trim().parse().ok().filter(|age| *age > 0)?;
    let height_cm: u32 = form.height.trim().parse().ok().filter(|cm| *cm > 0)?;
    Some(UserProfile {
        name: name.to_string(),
        phone_number: form.phone.clone(),
        gender: form.gender,
        age,
        height_cm,
    })
}

fn parse_morning(form: &MorningForm, now: DateTime<Utc>) -> Option<MorningStats> {
    let weight: f64 = form.weight.trim().parse().ok().filter(|kg| *kg > 0.0)?;
    let notes = form.notes.trim();
    Some(MorningStats {
        weight,
        body_fat_percentage: parse_optional(&form.body_fat),
        muscle_mass: parse_optional(&form.muscle_mass),
        visceral_fat: parse_optional(&form.visceral_fat),
        bmr: parse_optional(&form.bmr),
        submitted_at: Some(now),
        notes: (!notes.is_empty()).then(|| notes.to_string()),
    })
}

/// Optional numeric fields: blank or unparseable input is simply absent.
fn parse_optional(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

/// Time-based unique token. The sequence suffix keeps two uploads landing
/// in the same millisecond distinct within one history.
fn upload_id(study: &StudyState, now: DateTime<Utc>) -> String {
    format!("{}-{}", now.timestamp_millis(), study.glucose_uploads.len())
}

#[cfg(test)]
mod tests;
