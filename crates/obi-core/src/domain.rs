use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Sham period at the start of the study: device worn but kept off.
pub const BLANK_PHASE_DAYS: u32 = 14;
/// Active stimulation period following the blank phase.
pub const STIMULATION_PHASE_DAYS: u32 = 42;
pub const TOTAL_STUDY_DAYS: u32 = BLANK_PHASE_DAYS + STIMULATION_PHASE_DAYS;

/// Fixed target length of one stimulation session (30 minutes).
pub const STIMULATION_TARGET_SECONDS: u32 = 1800;
/// Mid-range current level used as the session default in the active phase.
pub const DEFAULT_ACTIVE_INTENSITY: u8 = 4;
/// Level the end-of-day device-usage report asserts in the active phase.
pub const REPORTED_ACTIVE_INTENSITY: u8 = 5;

pub const ASSESSMENT_MAX: u8 = 100;
pub const ASSESSMENT_DEFAULT: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Blank,
    Stimulation,
}

impl Phase {
    /// Day 1..=14 is the blank (sham) phase, everything after is active.
    /// A DailyLog stores the phase computed when it is first materialized
    /// and never recomputes it.
    pub fn classify(day: u32) -> Self {
        if day <= BLANK_PHASE_DAYS {
            Self::Blank
        } else {
            Self::Stimulation
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Blank => "Blank (sham)",
            Self::Stimulation => "Stimulation",
        }
    }

    /// Intensity a new stimulation session starts at for this phase.
    pub fn default_intensity(self) -> u8 {
        match self {
            Self::Blank => 0,
            Self::Stimulation => DEFAULT_ACTIVE_INTENSITY,
        }
    }

    /// Intensity the end-of-day device report asserts for this phase.
    /// Deliberately not the session default.
    pub fn reported_intensity(self) -> u8 {
        match self {
            Self::Blank => 0,
            Self::Stimulation => REPORTED_ACTIVE_INTENSITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Other,
            Self::Other => Self::Male,
        }
    }
}

/// Which meal a task flow targets. Routing parameter only, never persisted
/// on its own; the result lands in `DailyLog::breakfast` or `::dinner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealType {
    Breakfast,
    Dinner,
}

impl MealType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Dinner => "Dinner",
        }
    }
}

/// Collected once during onboarding; there is no edit flow afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub phone_number: String,
    pub gender: Gender,
    pub age: u32,
    pub height_cm: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorningStats {
    /// Kilograms. The only required field of the morning form.
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscle_mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visceral_fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Three-axis subjective rating, each 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAssessment {
    pub hunger: u8,
    pub fullness: u8,
    pub desire_to_eat: u8,
}

impl Default for MealAssessment {
    fn default() -> Self {
        Self {
            hunger: ASSESSMENT_DEFAULT,
            fullness: ASSESSMENT_DEFAULT,
            desire_to_eat: ASSESSMENT_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StimulationSession {
    /// 0 in the blank phase (device stays off), user-asserted otherwise.
    pub intensity: u8,
    /// Seconds actually spent; 0 is accepted (session ended immediately).
    pub duration_seconds: u32,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
}

/// Built incrementally across the four meal-task steps; committed to the
/// daily log as a whole only by the final step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_assessment: Option<MealAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stimulation: Option<StimulationSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_assessment: Option<MealAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl MealLog {
    /// `completed_at` is the sole completion criterion; a partial log with
    /// every other field filled in still counts as not done.
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppetiteStats {
    pub breakfast_score: u8,
    pub dinner_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakfast_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dinner_time: Option<String>,
}

impl Default for AppetiteStats {
    fn default() -> Self {
        Self {
            breakfast_score: ASSESSMENT_DEFAULT,
            dinner_score: ASSESSMENT_DEFAULT,
            breakfast_time: Some("08:00".to_string()),
            dinner_time: Some("19:00".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUsageStats {
    pub confirmed: bool,
    pub duration_minutes: u32,
    pub intensity_level: u8,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub day: u32,
    pub date: DateTime<Utc>,
    /// Pinned when the log is first materialized for this day.
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morning_stats: Option<MorningStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<MealLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dinner: Option<MealLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appetite: Option<AppetiteStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_usage: Option<DeviceUsageStats>,
}

impl DailyLog {
    pub fn fresh(day: u32, now: DateTime<Utc>) -> Self {
        Self {
            day,
            date: now,
            phase: Phase::classify(day),
            morning_stats: None,
            breakfast: None,
            dinner: None,
            appetite: None,
            device_usage: None,
        }
    }

    pub fn meal(&self, meal: MealType) -> Option<&MealLog> {
        match meal {
            MealType::Breakfast => self.breakfast.as_ref(),
            MealType::Dinner => self.dinner.as_ref(),
        }
    }

    pub fn set_meal(&mut self, meal: MealType, log: MealLog) {
        match meal {
            MealType::Breakfast => self.breakfast = Some(log),
            MealType::Dinner => self.dinner = Some(log),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlucoseUploadKind {
    SensorData,
    Report,
}

impl GlucoseUploadKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::SensorData => "Sensor data",
            Self::Report => "Report",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::SensorData => Self::Report,
            Self::Report => Self::SensorData,
        }
    }
}

/// Whether the file relates to putting a sensor on or taking one off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlucoseEvent {
    Application,
    Removal,
}

impl GlucoseEvent {
    pub fn label(self) -> &'static str {
        match self {
            Self::Application => "Sensor application",
            Self::Removal => "Sensor removal",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Application => Self::Removal,
            Self::Removal => Self::Application,
        }
    }
}

/// Metadata-only record of an uploaded monitor file. Append-only; nothing
/// about the file content is read or validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlucoseUpload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: GlucoseUploadKind,
    pub file_name: String,
    pub upload_date: DateTime<Utc>,
    pub related_event: GlucoseEvent,
}

/// Key under which a day's log is stored in `StudyState::logs`.
pub fn day_key(day: u32) -> String {
    format!("Day-{day}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn phase_boundaries() {
        assert_eq!(Phase::classify(1), Phase::Blank);
        assert_eq!(Phase::classify(BLANK_PHASE_DAYS), Phase::Blank);
        assert_eq!(Phase::classify(BLANK_PHASE_DAYS + 1), Phase::Stimulation);
        assert_eq!(Phase::classify(TOTAL_STUDY_DAYS), Phase::Stimulation);
    }

    #[test]
    fn blank_phase_sessions_default_to_zero_intensity() {
        assert_eq!(Phase::Blank.default_intensity(), 0);
        assert_eq!(
            Phase::Stimulation.default_intensity(),
            DEFAULT_ACTIVE_INTENSITY
        );
    }

    #[test]
    fn device_report_level_differs_from_the_session_default() {
        assert_eq!(Phase::Blank.reported_intensity(), 0);
        assert_eq!(
            Phase::Stimulation.reported_intensity(),
            REPORTED_ACTIVE_INTENSITY
        );
        assert_ne!(REPORTED_ACTIVE_INTENSITY, DEFAULT_ACTIVE_INTENSITY);
    }

    #[test]
    fn meal_log_done_only_when_completion_stamped() {
        let mut log = MealLog {
            pre_assessment: Some(MealAssessment::default()),
            ..MealLog::default()
        };
        assert!(!log.is_complete());

        log.completed_at = Some(Utc::now());
        assert!(log.is_complete());
    }

    #[test]
    fn enum_wire_values_match_stored_format() {
        assert_eq!(serde_json::to_string(&Phase::Blank).unwrap(), "\"BLANK\"");
        assert_eq!(
            serde_json::to_string(&GlucoseUploadKind::SensorData).unwrap(),
            "\"SENSOR_DATA\""
        );
        assert_eq!(serde_json::to_string(&Gender::Other).unwrap(), "\"OTHER\"");
    }

    #[test]
    fn day_key_format() {
        assert_eq!(day_key(1), "Day-1");
        assert_eq!(day_key(56), "Day-56");
    }
}
