use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::day_key;
use crate::domain::AppetiteStats;
use crate::domain::DailyLog;
use crate::domain::Gender;
use crate::domain::GlucoseEvent;
use crate::domain::GlucoseUpload;
use crate::domain::GlucoseUploadKind;
use crate::domain::MealAssessment;
use crate::domain::MealType;
use crate::domain::MealLog;
use crate::domain::Phase;
use crate::domain::StimulationSession;
use crate::domain::UserProfile;
use crate::domain::ASSESSMENT_MAX;
use crate::domain::STIMULATION_TARGET_SECONDS;

/// Root aggregate. Loaded once at startup, written back as a whole after
/// every mutation. `logs` is a BTreeMap so the serialized form is
/// deterministic and a load-then-save round trip is byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyState {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    /// Study day, >= 1. Never advanced automatically; operator-set.
    pub current_day: u32,
    pub start_date: DateTime<Utc>,
    pub logs: BTreeMap<String, DailyLog>,
    /// Newest first.
    pub glucose_uploads: Vec<GlucoseUpload>,
}

impl StudyState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            is_authenticated: false,
            profile: None,
            current_day: 1,
            start_date: now,
            logs: BTreeMap::new(),
            glucose_uploads: Vec::new(),
        }
    }

    pub fn current_phase(&self) -> Phase {
        Phase::classify(self.current_day)
    }

    /// The current day's log, or a transient default if none has been
    /// persisted yet. The transient copy is not stored; only a sub-flow
    /// write materializes it.
    pub fn current_log(&self, now: DateTime<Utc>) -> DailyLog {
        self.logs
            .get(&day_key(self.current_day))
            .cloned()
            .unwrap_or_else(|| DailyLog::fresh(self.current_day, now))
    }

    /// Materializes the current day's log for writing. This is the point
    /// where the log's `phase` gets pinned.
    pub fn current_log_mut(&mut self, now: DateTime<Utc>) -> &mut DailyLog {
        let day = self.current_day;
        self.logs
            .entry(day_key(day))
            .or_insert_with(|| DailyLog::fresh(day, now))
    }

    pub fn record_upload(&mut self, upload: GlucoseUpload) {
        self.glucose_uploads.insert(0, upload);
    }
}

/// Per-task completion flags the dashboard renders. Derived, never stored.
/// Glucose upload has no completion concept and is always offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardView {
    pub day: u32,
    pub phase: Phase,
    pub morning_done: bool,
    pub breakfast_done: bool,
    pub dinner_done: bool,
}

pub fn derive_dashboard(study: &StudyState, now: DateTime<Utc>) -> DashboardView {
    let log = study.current_log(now);
    DashboardView {
        day: study.current_day,
        phase: study.current_phase(),
        morning_done: log.morning_stats.is_some(),
        breakfast_done: log.breakfast.as_ref().is_some_and(MealLog::is_complete),
        dinner_done: log.dinner.as_ref().is_some_and(MealLog::is_complete),
    }
}

// ---------------------------------------------------------------------------
// Transient per-screen state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Phone,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub phone: String,
    pub code: String,
    pub focus: LoginField,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            phone: String::new(),
            code: String::new(),
            focus: LoginField::Phone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Age,
    Height,
}

impl ProfileField {
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Age,
            Self::Age => Self::Height,
            Self::Height => Self::Name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
    pub gender: Gender,
    pub age: String,
    pub height: String,
    pub focus: ProfileField,
}

impl Default for ProfileForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            gender: Gender::Male,
            age: "30".to_string(),
            height: "170".to_string(),
            focus: ProfileField::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorningField {
    Weight,
    BodyFat,
    MuscleMass,
    VisceralFat,
    Bmr,
    Notes,
}

impl MorningField {
    pub fn next(self) -> Self {
        match self {
            Self::Weight => Self::BodyFat,
            Self::BodyFat => Self::MuscleMass,
            Self::MuscleMass => Self::VisceralFat,
            Self::VisceralFat => Self::Bmr,
            Self::Bmr => Self::Notes,
            Self::Notes => Self::Weight,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Weight => Self::Notes,
            Self::BodyFat => Self::Weight,
            Self::MuscleMass => Self::BodyFat,
            Self::VisceralFat => Self::MuscleMass,
            Self::Bmr => Self::VisceralFat,
            Self::Notes => Self::Bmr,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Weight => "Weight (kg)",
            Self::BodyFat => "Body fat (%)",
            Self::MuscleMass => "Muscle mass (kg)",
            Self::VisceralFat => "Visceral fat level",
            Self::Bmr => "BMR (kcal/day)",
            Self::Notes => "Notes",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MorningForm {
    pub weight: String,
    pub body_fat: String,
    pub muscle_mass: String,
    pub visceral_fat: String,
    pub bmr: String,
    pub notes: String,
    pub focus: Option<MorningField>,
}

impl MorningForm {
    pub fn new() -> Self {
        Self {
            focus: Some(MorningField::Weight),
            ..Self::default()
        }
    }

    pub fn field(&self, field: MorningField) -> &str {
        match field {
            MorningField::Weight => &self.weight,
            MorningField::BodyFat => &self.body_fat,
            MorningField::MuscleMass => &self.muscle_mass,
            MorningField::VisceralFat => &self.visceral_fat,
            MorningField::Bmr => &self.bmr,
            MorningField::Notes => &self.notes,
        }
    }

    pub fn field_mut(&mut self, field: MorningField) -> &mut String {
        match field {
            MorningField::Weight => &mut self.weight,
            MorningField::BodyFat => &mut self.body_fat,
            MorningField::MuscleMass => &mut self.muscle_mass,
            MorningField::VisceralFat => &mut self.visceral_fat,
            MorningField::Bmr => &mut self.bmr,
            MorningField::Notes => &mut self.notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentAxis {
    Hunger,
    Fullness,
    DesireToEat,
}

impl AssessmentAxis {
    pub fn next(self) -> Self {
        match self {
            Self::Hunger => Self::Fullness,
            Self::Fullness => Self::DesireToEat,
            Self::DesireToEat => Self::Hunger,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hunger => "Hunger",
            Self::Fullness => "Fullness",
            Self::DesireToEat => "Desire to eat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentForm {
    pub values: MealAssessment,
    pub focus: AssessmentAxis,
}

impl Default for AssessmentForm {
    fn default() -> Self {
        Self {
            values: MealAssessment::default(),
            focus: AssessmentAxis::Hunger,
        }
    }
}

impl AssessmentForm {
    pub fn adjust(&mut self, delta: i8) {
        let slot = match self.focus {
            AssessmentAxis::Hunger => &mut self.values.hunger,
            AssessmentAxis::Fullness => &mut self.values.fullness,
            AssessmentAxis::DesireToEat => &mut self.values.desire_to_eat,
        };
        *slot = slot.saturating_add_signed(delta).min(ASSESSMENT_MAX);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Ended,
}

/// Countdown step. The one-second tick itself lives in the client and is
/// armed and disarmed only through reducer effects, so the step can never
/// be mutated by a tick after it has been left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulationStep {
    pub intensity: u8,
    pub remaining: u32,
    pub timer: TimerPhase,
    pub started_at: Option<DateTime<Utc>>,
}

impl StimulationStep {
    pub fn new(phase: Phase) -> Self {
        Self {
            intensity: phase.default_intensity(),
            remaining: STIMULATION_TARGET_SECONDS,
            timer: TimerPhase::Idle,
            started_at: None,
        }
    }

    pub fn elapsed(&self) -> u32 {
        STIMULATION_TARGET_SECONDS - self.remaining
    }
}

/// Open-ended meal stopwatch, counting up with no cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealTimerStep {
    pub elapsed: u32,
    pub running: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MealStep {
    PreAssess(AssessmentForm),
    Stimulation(StimulationStep),
    PostAssess(AssessmentForm),
    MealTimer(MealTimerStep),
}

impl MealStep {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PreAssess(_) => "Step 1: pre-stimulation assessment",
            Self::Stimulation(_) => "Step 2: stimulation session",
            Self::PostAssess(_) => "Step 3: post-stimulation assessment",
            Self::MealTimer(_) => "Step 4: meal",
        }
    }
}

/// Everything gathered so far in one meal task. Held only here until the
/// final step commits the assembled MealLog in a single write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealDraft {
    pub pre_assessment: Option<MealAssessment>,
    pub stimulation: Option<StimulationSession>,
    pub post_assessment: Option<MealAssessment>,
}

impl MealDraft {
    pub fn finalize(self, meal_duration_seconds: u32, now: DateTime<Utc>) -> MealLog {
        MealLog {
            pre_assessment: self.pre_assessment,
            stimulation: self.stimulation,
            post_assessment: self.post_assessment,
            meal_duration_seconds: Some(meal_duration_seconds),
            completed_at: Some(now),
        }
    }
}

/// The four-step meal task, strictly linear. Phase is captured at flow
/// start and parameterizes the stimulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct MealFlow {
    pub phase: Phase,
    pub draft: MealDraft,
    pub step: MealStep,
}

impl MealFlow {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            draft: MealDraft::default(),
            step: MealStep::PreAssess(AssessmentForm::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    pub kind: GlucoseUploadKind,
    pub event: GlucoseEvent,
    /// File name being typed or dropped in; cleared once an upload is
    /// recorded.
    pub file_input: String,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            kind: GlucoseUploadKind::SensorData,
            event: GlucoseEvent::Application,
            file_input: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    BreakfastScore,
    DinnerScore,
    DeviceConfirmed,
}

impl SummaryField {
    pub fn next(self) -> Self {
        match self {
            Self::BreakfastScore => Self::DinnerScore,
            Self::DinnerScore => Self::DeviceConfirmed,
            Self::DeviceConfirmed => Self::BreakfastScore,
        }
    }
}

/// End-of-day recap: appetite scores plus device-usage confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryForm {
    pub appetite: AppetiteStats,
    pub device_confirmed: bool,
    pub focus: SummaryField,
}

impl Default for SummaryForm {
    fn default() -> Self {
        Self {
            appetite: AppetiteStats::default(),
            device_confirmed: false,
            focus: SummaryField::BreakfastScore,
        }
    }
}

impl SummaryForm {
    pub fn adjust(&mut self, delta: i8) {
        let slot = match self.focus {
            SummaryField::BreakfastScore => &mut self.appetite.breakfast_score,
            SummaryField::DinnerScore => &mut self.appetite.dinner_score,
            SummaryField::DeviceConfirmed => return,
        };
        *slot = slot.saturating_add_signed(delta).min(ASSESSMENT_MAX);
    }
}

/// Every navigable view, with the flow's transient state held inside the
/// variant. Leaving a variant drops everything not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Login(LoginForm),
    ProfileSetup(ProfileForm),
    Dashboard,
    MorningMeasure(MorningForm),
    MealTask { meal: MealType, flow: MealFlow },
    GlucoseUpload(UploadForm),
    DailySummary(SummaryForm),
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Login(_) => "Sign in",
            Self::ProfileSetup(_) => "Your profile",
            Self::Dashboard => "Today",
            Self::MorningMeasure(_) => "Morning measurement",
            Self::MealTask {
                meal: MealType::Breakfast,
                ..
            } => "Breakfast task",
            Self::MealTask {
                meal: MealType::Dinner,
                ..
            } => "Dinner task",
            Self::GlucoseUpload(_) => "Glucose data upload",
            Self::DailySummary(_) => "Daily summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub study: StudyState,
    pub screen: Screen,
    /// Last insight returned by the generator, shown on the dashboard
    /// until dismissed.
    pub insight: Option<String>,
}

impl AppState {
    /// Initial routing mirrors the persisted gates: authentication first,
    /// then profile completion, then the dashboard.
    pub fn new(study: StudyState) -> Self {
        let screen = if !study.is_authenticated {
            Screen::Login(LoginForm::default())
        } else if study.profile.is_none() {
            Screen::ProfileSetup(ProfileForm::default())
        } else {
            Screen::Dashboard
        };
        Self {
            study,
            screen,
            insight: None,
        }
    }
}
