use crate::domain::DailyLog;
use crate::domain::MealType;
use crate::domain::Phase;

#[derive(Debug, Clone)]
pub enum Action {
    User(UserAction),
    Runtime(RuntimeAction),
}

/// Everything a participant can do, one variant per control. Field edits
/// are char-granular so the reducer owns all form state.
#[derive(Debug, Clone)]
pub enum UserAction {
    // Onboarding
    LoginInput(char),
    LoginBackspace,
    LoginNextField,
    ConfirmLogin,
    ProfileInput(char),
    ProfileBackspace,
    ProfileNextField,
    CycleGender,
    SubmitProfile,

    // Dashboard navigation
    OpenMorningMeasure,
    OpenMealTask(MealType),
    OpenGlucoseUpload,
    OpenDailySummary,
    /// Back action of the enclosing screen: abandons all in-progress data.
    LeaveScreen,

    // Morning measurement
    MorningInput(char),
    MorningBackspace,
    MorningNextField,
    MorningPrevField,
    SubmitMorning,

    // Meal task flow
    AssessmentAdjust(i8),
    AssessmentNextAxis,
    SubmitAssessment,
    StartStimulation,
    FinishStimulation,
    StartMeal,
    FinishMeal,

    // Glucose upload
    ToggleUploadKind,
    ToggleUploadEvent,
    UploadInput(char),
    UploadBackspace,
    FileProvided { file_name: String },

    // Daily summary
    SummaryAdjust(i8),
    SummaryNextField,
    ToggleDeviceConfirmed,
    SubmitDailySummary,
    DismissInsight,

    /// Operator-facing full wipe.
    ResetStudy,
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    /// One-second tick from the client's ticker. Only meaningful while a
    /// timer step is running; stale ticks are no-ops.
    Tick,
    /// Insight generator finished (or fell back). Always a plain string.
    InsightReady(String),
    /// Administrative study-day override.
    SetDay(u32),
}

/// Side effects the client must carry out after a reduction. The reducer
/// never performs I/O itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persist the whole StudyState.
    SaveState,
    /// Delete the persisted state file (full reset).
    WipeState,
    /// Arm the one-second ticker.
    StartTicker,
    /// Disarm the one-second ticker. Always safe to apply when idle.
    StopTicker,
    /// Ask the insight generator for a feedback line, off the UI thread.
    RequestInsight { log: Box<DailyLog>, phase: Phase },
    /// Redraw.
    RequestFrame,
}
