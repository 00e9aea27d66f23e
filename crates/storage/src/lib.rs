use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{ExerciseId, SetId, UserId, Weight, WorkoutExerciseId, WorkoutId},
    protocol::WorkoutRow,
};

/// Read side of the workout store used by the dashboard.
#[async_trait]
pub trait WorkoutRowSource: Send + Sync {
    /// Every set logged by `user_id` on `date`, joined up to its exercise and
    /// workout. Workouts without exercises or sets contribute no rows.
    async fn workout_rows_for_date(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<WorkoutRow>>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub user_id: UserId,
    pub name: Option<String>,
    pub date: NaiveDate,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewWorkout {
    pub fn on(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            user_id,
            name: None,
            date,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct StoredExercise {
    pub exercise_id: ExerciseId,
    pub name: String,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_exercise(&self, name: &str) -> Result<ExerciseId> {
        let exercise_id = ExerciseId::new();
        sqlx::query("INSERT INTO exercises (id, name) VALUES (?, ?)")
            .bind(exercise_id.to_string())
            .bind(name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to insert exercise '{name}'"))?;
        Ok(exercise_id)
    }

    pub async fn find_exercise_by_name(&self, name: &str) -> Result<Option<StoredExercise>> {
        let row = sqlx::query("SELECT id, name FROM exercises WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| {
            Ok(StoredExercise {
                exercise_id: parse_id(&r, 0)?,
                name: r.get::<String, _>(1),
            })
        })
        .transpose()
    }

    pub async fn create_workout(&self, workout: &NewWorkout) -> Result<WorkoutId> {
        let workout_id = WorkoutId::new();
        sqlx::query(
            "INSERT INTO workouts (id, user_id, name, date, started_at, completed_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(workout_id.to_string())
        .bind(workout.user_id.as_str())
        .bind(workout.name.as_deref())
        .bind(workout.date)
        .bind(workout.started_at)
        .bind(workout.completed_at)
        .execute(&self.pool)
        .await
        .context("failed to insert workout")?;
        Ok(workout_id)
    }

    pub async fn add_workout_exercise(
        &self,
        workout_id: WorkoutId,
        exercise_id: ExerciseId,
        order: i32,
    ) -> Result<WorkoutExerciseId> {
        let workout_exercise_id = WorkoutExerciseId::new();
        sqlx::query(
            r#"INSERT INTO workout_exercises (id, workout_id, exercise_id, "order") VALUES (?, ?, ?, ?)"#,
        )
        .bind(workout_exercise_id.to_string())
        .bind(workout_id.to_string())
        .bind(exercise_id.to_string())
        .bind(order)
        .execute(&self.pool)
        .await
        .context("failed to attach exercise to workout")?;
        Ok(workout_exercise_id)
    }

    pub async fn add_set(
        &self,
        workout_exercise_id: WorkoutExerciseId,
        set_number: i32,
        reps: Option<i32>,
        weight: Option<Weight>,
    ) -> Result<SetId> {
        let set_id = SetId::new();
        sqlx::query(
            "INSERT INTO sets (id, workout_exercise_id, set_number, reps, weight)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(set_id.to_string())
        .bind(workout_exercise_id.to_string())
        .bind(set_number)
        .bind(reps)
        .bind(weight.map(|w| w.to_string()))
        .execute(&self.pool)
        .await
        .context("failed to insert set")?;
        Ok(set_id)
    }

    pub async fn delete_workout(&self, workout_id: WorkoutId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = ?")
            .bind(workout_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[cfg(test)]
    pub(crate) async fn count_sets(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl WorkoutRowSource for Storage {
    async fn workout_rows_for_date(
        &self,
        user_id: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<WorkoutRow>> {
        let rows = sqlx::query(
            r#"SELECT w.id, w.name, e.name, we.id, we."order", s.set_number, s.reps, s.weight
               FROM workouts w
               INNER JOIN workout_exercises we ON we.workout_id = w.id
               INNER JOIN exercises e ON e.id = we.exercise_id
               INNER JOIN sets s ON s.workout_exercise_id = we.id
               WHERE w.user_id = ? AND w.date = ?
               ORDER BY w.created_at, w.rowid, we."order", s.set_number, s.rowid"#,
        )
        .bind(user_id.as_str())
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to load workout rows for {date}"))?;

        rows.iter().map(workout_row).collect()
    }
}

fn workout_row(r: &SqliteRow) -> Result<WorkoutRow> {
    let weight = r
        .get::<Option<String>, _>(7)
        .map(|raw| {
            raw.parse::<Weight>()
                .with_context(|| format!("stored weight '{raw}' is not a valid decimal"))
        })
        .transpose()?;
    Ok(WorkoutRow {
        workout_id: parse_id(r, 0)?,
        workout_name: r.get::<Option<String>, _>(1),
        exercise_name: r.get::<String, _>(2),
        workout_exercise_id: parse_id(r, 3)?,
        order: r.get::<i32, _>(4),
        set_number: r.get::<i32, _>(5),
        reps: r.get::<Option<i32>, _>(6),
        weight,
    })
}

fn parse_id<T>(r: &SqliteRow, index: usize) -> Result<T>
where
    T: FromStr<Err = uuid::Error>,
{
    let raw = r.get::<String, _>(index);
    raw.parse::<T>()
        .with_context(|| format!("stored id '{raw}' is not a uuid"))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
