use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate};
use shared::protocol::DashboardView;

pub const DATE_PARAM_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date_param(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_PARAM_FORMAT).ok()
}

pub fn date_param(date: NaiveDate) -> String {
    date.format(DATE_PARAM_FORMAT).to_string()
}

/// Where selecting `date` on the calendar navigates to.
pub fn dashboard_path(date: NaiveDate) -> String {
    format!("/dashboard?date={}", date_param(date))
}

/// `19th Oct 2026`
pub fn format_display_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix} {}", date.format("%b %Y"))
}

pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Workouts for {}", view.formatted_date);

    if view.exercises.is_empty() {
        out.push_str("No workouts logged for this date.\n");
        return out;
    }

    for exercise in &view.exercises {
        let count = exercise.sets.len();
        let noun = if count == 1 { "set" } else { "sets" };
        let _ = writeln!(out);
        let _ = writeln!(out, "{} ({count} {noun})", exercise.exercise_name);
        for set in &exercise.sets {
            let reps = set
                .reps
                .map(|r| r.to_string())
                .unwrap_or_else(|| "—".to_string());
            let _ = write!(out, "  Set {}: {reps} reps", set.set_number);
            if let Some(weight) = set.weight {
                let _ = write!(out, " × {weight} kg");
            }
            out.push('\n');
        }
    }

    out
}
