//! Plan document schema: what the plan generator is asked to produce and
//! what the materializer consumes.
//!
//! Parsing is lenient. Missing lists are empty, unknown keys are ignored and
//! optional fields take the defaults below. Numeric targets are accepted as
//! JSON floats and rounded where the column is an integer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use growthness_db::models::ExerciseType;

/// A generated plan: habits, a weekly exercise routine and a diet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub habits: Vec<HabitEntry>,
    #[serde(default)]
    pub exercises: Vec<ExerciseDay>,
    #[serde(default)]
    pub diet: Vec<MealEntry>,
}

impl PlanDocument {
    /// Rebuild a document from stored JSON.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitEntry {
    pub name: String,
    pub goal: f64,
    #[serde(default = "default_measure")]
    pub measure: String,
    #[serde(default)]
    pub frequency: FrequencySpec,
    #[serde(default)]
    pub logs: Vec<HabitLogEntry>,
}

fn default_measure() -> String {
    "steps".to_string()
}

/// A habit frequency, written either as one name or as a list of names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrequencySpec {
    One(String),
    Many(Vec<String>),
}

impl Default for FrequencySpec {
    fn default() -> Self {
        Self::One("daily".to_string())
    }
}

impl FrequencySpec {
    /// The requested names, in the order given.
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}

impl std::fmt::Display for FrequencySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One(name) => f.write_str(name),
            Self::Many(names) => f.write_str(&names.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLogEntry {
    pub date: NaiveDate,
    pub amount: f64,
}

/// One day of the exercise routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDay {
    /// Day label as generated (Portuguese, e.g. `Segunda-feira`).
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub routine: Vec<RoutineEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineEntry {
    pub exercise: String,
    #[serde(default)]
    pub exercise_type: ExerciseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_velocity: Option<f64>,
    /// Kept as given; nothing is stored from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub meal: String,
    #[serde(default)]
    pub foods: Vec<FoodEntry>,
}

/// A food of a meal. Nutrition values are per serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub name: String,
    #[serde(default = "default_servings")]
    pub servings: f64,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

fn default_servings() -> f64 {
    1.0
}

/// Round a generated numeric target to an integer column value, or `None`
/// when it does not fit one.
pub(crate) fn round_target(value: f64) -> Option<i32> {
    let rounded = value.round();
    (rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX)).then_some(rounded as i32)
}

impl PlanDocument {
    /// First integer-column target that cannot be stored, as a message.
    fn out_of_range_target(&self) -> Option<String> {
        let routine = self.exercises.iter().flat_map(|day| &day.routine);
        for entry in routine {
            for (field, value) in [
                ("weight", entry.weight),
                ("reps", entry.reps),
                ("duration", entry.duration),
            ] {
                if let Some(value) = value.filter(|v| round_target(*v).is_none()) {
                    return Some(format!("{} {field} {value} is out of range", entry.exercise));
                }
            }
        }
        self.diet
            .iter()
            .flat_map(|meal| &meal.foods)
            .find(|food| round_target(food.calories).is_none())
            .map(|food| format!("{} calories {} is out of range", food.name, food.calories))
    }
}

/// Parse the text of a model reply into a [`PlanDocument`].
///
/// A surrounding Markdown code fence (with or without a language tag) is
/// removed first.
pub fn parse_plan_reply(content: &str) -> Result<PlanDocument, serde_json::Error> {
    let doc: PlanDocument = serde_json::from_str(strip_code_fence(content))?;
    match doc.out_of_range_target() {
        Some(msg) => Err(serde::de::Error::custom(msg)),
        None => Ok(doc),
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let inner = match inner.split_once('\n') {
        Some((_, body)) => body,
        None => inner,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
