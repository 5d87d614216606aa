use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of exercise. Determines which routine targets apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    #[default]
    Gym,
    Cardio,
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gym => "gym",
            Self::Cardio => "cardio",
        };
        f.write_str(s)
    }
}

impl FromStr for ExerciseType {
    type Err = ExerciseTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gym" => Ok(Self::Gym),
            "cardio" => Ok(Self::Cardio),
            other => Err(ExerciseTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ExerciseType`] string.
#[derive(Debug, Clone)]
pub struct ExerciseTypeParseError(pub String);

impl fmt::Display for ExerciseTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid exercise type: {:?}", self.0)
    }
}

impl std::error::Error for ExerciseTypeParseError {}

// ---------------------------------------------------------------------------

/// Canonical day of the week as stored on routine exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Canonical lowercase token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Map a Portuguese day label (as written by the plan generator) to a
    /// canonical day. Exact match only.
    pub fn from_portuguese(label: &str) -> Option<Self> {
        match label {
            "Segunda-feira" => Some(Self::Monday),
            "Terça-feira" => Some(Self::Tuesday),
            "Quarta-feira" => Some(Self::Wednesday),
            "Quinta-feira" => Some(Self::Thursday),
            "Sexta-feira" => Some(Self::Friday),
            "Sábado" => Some(Self::Saturday),
            "Domingo" => Some(Self::Sunday),
            _ => None,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = DayOfWeekParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| DayOfWeekParseError(s.to_owned()))
    }
}

/// Error returned when parsing an invalid [`DayOfWeek`] string.
#[derive(Debug, Clone)]
pub struct DayOfWeekParseError(pub String);

impl fmt::Display for DayOfWeekParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid day of week: {:?}", self.0)
    }
}

impl std::error::Error for DayOfWeekParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// An account. `password_hash` is `None` for accounts without a local password.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub weight: Option<f64>,
    pub weight_measure: Option<String>,
    pub height: Option<f64>,
    pub height_measure: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub fitness_goal_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A selectable profile objective ("Hipertrofia", ...).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FitnessGoal {
    pub id: i32,
    pub title: String,
}

/// A tracked habit, with the names of its attached frequencies.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub goal: f64,
    pub measure: Option<String>,
    pub frequencies: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HabitLog {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Shared exercise reference row, unique by `(name, exercise_type)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub exercise_type: ExerciseType,
    pub duration: Option<i32>,
    pub distance: Option<f64>,
    pub average_velocity: Option<f64>,
    pub pace: Option<f64>,
}

/// A user's routine for the week starting at `week_start_date`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Routine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_start_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoutineExercise {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub exercise_id: Uuid,
    pub day_of_week: Option<String>,
    pub weight_goal: Option<i32>,
    pub reps_goal: Option<i32>,
    pub duration: Option<i32>,
    pub distance: Option<f64>,
    pub pace: Option<f64>,
    pub average_velocity: Option<f64>,
}

/// A routine exercise joined with its exercise's name and type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoutineExerciseDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub routine_exercise: RoutineExercise,
    pub exercise_name: String,
    pub exercise_type: ExerciseType,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub routine_exercise_id: Uuid,
    pub date_logged: NaiveDate,
    pub weight: Option<i32>,
    pub reps: Option<i32>,
    pub distance_logged: Option<f64>,
    pub average_velocity_logged: Option<f64>,
    pub pace_logged: Option<f64>,
}

/// One day of aggregated exercise logs, for progress graphs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseProgressPoint {
    pub date: NaiveDate,
    pub sessions: i64,
    pub max_weight: Option<i32>,
    pub total_reps: Option<i64>,
    pub total_distance: Option<f64>,
    pub average_pace: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrainingGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub target_date: NaiveDate,
    pub achieved: bool,
}

/// Shared food reference row, unique by name. Nutrition is per serving.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    pub calories: i32,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealFood {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub food_id: Uuid,
    pub servings: f64,
}

/// A food entry of a meal, with the food's nutrition inlined.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealFoodDetail {
    pub servings: f64,
    #[sqlx(flatten)]
    pub food: Food,
}

/// A generated plan stored under its literal goal string.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CachedPlan {
    pub goal: String,
    pub plan_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exercise_type_display_roundtrip() {
        for v in [ExerciseType::Gym, ExerciseType::Cardio] {
            let parsed: ExerciseType = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn exercise_type_invalid() {
        assert!("yoga".parse::<ExerciseType>().is_err());
        assert!("Gym".parse::<ExerciseType>().is_err());
    }

    #[test]
    fn exercise_type_defaults_to_gym() {
        assert_eq!(ExerciseType::default(), ExerciseType::Gym);
    }

    #[test]
    fn day_of_week_parses_canonical_tokens_only() {
        assert_eq!("monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("sunday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Sunday);
        assert!("Monday".parse::<DayOfWeek>().is_err());
        assert!("Segunda-feira".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn portuguese_labels_cover_the_week() {
        let labels = [
            "Segunda-feira",
            "Terça-feira",
            "Quarta-feira",
            "Quinta-feira",
            "Sexta-feira",
            "Sábado",
            "Domingo",
        ];
        let mapped: Vec<DayOfWeek> = labels
            .iter()
            .map(|l| DayOfWeek::from_portuguese(l).expect("known label"))
            .collect();
        assert_eq!(mapped, DayOfWeek::ALL.to_vec());
    }

    #[test]
    fn portuguese_labels_are_case_sensitive() {
        assert_eq!(DayOfWeek::from_portuguese("segunda-feira"), None);
        assert_eq!(DayOfWeek::from_portuguese("Funday"), None);
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            first_name: String::new(),
            last_name: String::new(),
            weight: None,
            weight_measure: None,
            height: None,
            height_measure: None,
            birth_date: None,
            fitness_goal_id: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@example.com");
    }
}
