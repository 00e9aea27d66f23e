use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use server_api::{dashboard, mint_session_token, render_text, AuthSession, SessionConfig};
use shared::{
    domain::{ExerciseId, UserId, Weight, WorkoutExerciseId, WorkoutId},
    error::ApiException,
    protocol::DashboardQuery,
};
use storage::{NewWorkout, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/workouts.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateExercise {
        name: String,
    },
    CreateWorkout {
        user_id: String,
        date: NaiveDate,
        #[arg(long)]
        name: Option<String>,
    },
    AddExercise {
        workout_id: WorkoutId,
        /// Exercise id, or the exact name of an existing exercise.
        exercise: String,
        order: i32,
    },
    AddSet {
        workout_exercise_id: WorkoutExerciseId,
        set_number: i32,
        #[arg(long)]
        reps: Option<i32>,
        #[arg(long)]
        weight: Option<Weight>,
    },
    MintToken {
        user_id: String,
        #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
        secret: String,
        #[arg(long, default_value = "liftlog")]
        issuer: String,
        #[arg(long, default_value_t = 3600)]
        ttl_seconds: i64,
    },
    Dashboard {
        user_id: String,
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::MintToken {
            user_id,
            secret,
            issuer,
            ttl_seconds,
        } => {
            let cfg = SessionConfig {
                issuer,
                secret,
                ttl_seconds,
            };
            println!("{}", mint_token(&cfg, user_id)?);
        }
        Command::CreateExercise { name } => {
            let storage = Storage::new(&cli.database_url).await?;
            let exercise_id = storage.create_exercise(&name).await?;
            println!("created exercise_id={exercise_id}");
        }
        Command::CreateWorkout {
            user_id,
            date,
            name,
        } => {
            let storage = Storage::new(&cli.database_url).await?;
            let mut workout = NewWorkout::on(UserId(user_id), date);
            workout.name = name;
            let workout_id = storage.create_workout(&workout).await?;
            println!("created workout_id={workout_id}");
        }
        Command::AddExercise {
            workout_id,
            exercise,
            order,
        } => {
            let storage = Storage::new(&cli.database_url).await?;
            let exercise_id = match exercise.parse::<ExerciseId>() {
                Ok(id) => id,
                Err(_) => {
                    storage
                        .find_exercise_by_name(&exercise)
                        .await?
                        .with_context(|| format!("no exercise named '{exercise}'"))?
                        .exercise_id
                }
            };
            let workout_exercise_id = storage
                .add_workout_exercise(workout_id, exercise_id, order)
                .await?;
            println!("created workout_exercise_id={workout_exercise_id}");
        }
        Command::AddSet {
            workout_exercise_id,
            set_number,
            reps,
            weight,
        } => {
            let storage = Storage::new(&cli.database_url).await?;
            let set_id = storage
                .add_set(workout_exercise_id, set_number, reps, weight)
                .await?;
            println!("created set_id={set_id}");
        }
        Command::Dashboard { user_id, date } => {
            let session = AuthSession::new(UserId(user_id)).context("user id must not be empty")?;
            let storage = Storage::new(&cli.database_url).await?;
            let view = dashboard(
                &storage,
                Some(&session),
                &DashboardQuery { date },
                Local::now().date_naive(),
            )
            .await
            .map_err(ApiException::from)?;
            print!("{}", render_text(&view));
        }
    }

    Ok(())
}

fn mint_token(cfg: &SessionConfig, user_id: String) -> Result<String> {
    anyhow::ensure!(!cfg.secret.trim().is_empty(), "session secret must not be empty");
    anyhow::ensure!(
        cfg.ttl_seconds > 0,
        "ttl must be positive, got {}",
        cfg.ttl_seconds
    );
    let session = AuthSession::new(UserId(user_id)).context("user id must not be empty")?;
    mint_session_token(cfg, session.user_id())
}
