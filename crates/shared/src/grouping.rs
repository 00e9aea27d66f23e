//! Folds flat join rows back into per-exercise groups.

use std::collections::HashMap;

use crate::{
    domain::WorkoutExerciseId,
    protocol::{GroupedExercise, SetEntry, WorkoutRow},
};

/// Groups rows by `workout_exercise_id` in a single pass.
///
/// Groups come out in the order their key first appears in `rows`, not sorted
/// by `order` or `set_number`. Sets inside a group keep input order and are
/// never merged, so duplicate set numbers both survive.
pub fn group_by_exercise(rows: &[WorkoutRow]) -> Vec<GroupedExercise> {
    let mut positions: HashMap<WorkoutExerciseId, usize> = HashMap::new();
    let mut groups: Vec<GroupedExercise> = Vec::new();

    for row in rows {
        let index = *positions.entry(row.workout_exercise_id).or_insert_with(|| {
            groups.push(GroupedExercise {
                workout_exercise_id: row.workout_exercise_id,
                exercise_name: row.exercise_name.clone(),
                sets: Vec::new(),
            });
            groups.len() - 1
        });
        groups[index].sets.push(SetEntry {
            set_number: row.set_number,
            reps: row.reps,
            weight: row.weight,
        });
    }

    groups
}

#[cfg(test)]
#[path = "tests/grouping_tests.rs"]
mod tests;
