use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Weight, WorkoutExerciseId, WorkoutId};

/// One joined workout × exercise × set row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRow {
    pub workout_id: WorkoutId,
    pub workout_name: Option<String>,
    pub exercise_name: String,
    pub workout_exercise_id: WorkoutExerciseId,
    pub order: i32,
    pub set_number: i32,
    pub reps: Option<i32>,
    pub weight: Option<Weight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEntry {
    pub set_number: i32,
    pub reps: Option<i32>,
    pub weight: Option<Weight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedExercise {
    pub workout_exercise_id: WorkoutExerciseId,
    pub exercise_name: String,
    pub sets: Vec<SetEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub date: NaiveDate,
    pub formatted_date: String,
    pub exercises: Vec<GroupedExercise>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub date: Option<String>,
}
