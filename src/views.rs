//! Display models for the HTML pages. Everything here is derived from
//! controller snapshots or gateway records and holds no state of its own.

use chrono::{DateTime, Utc};

use crate::lifecycle::{DayCompletion, DaySnapshot, LinkState};
use crate::models::{
    PerformedSet, PrescribedExercise, Program, TemplateStatus, Workout, WorkoutTemplate,
};

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{:.0}", weight)
    } else {
        format!("{}", weight)
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// "5 × 5 @ 75%, rest 3 min" style summary of a prescription.
pub fn prescription_summary(exercise: &PrescribedExercise) -> String {
    let mut summary = match (exercise.sets, exercise.reps.as_deref()) {
        (Some(sets), Some(reps)) => format!("{} × {}", sets, reps),
        (Some(sets), None) => format!("{} sets", sets),
        (None, Some(reps)) => format!("{} reps", reps),
        (None, None) => String::new(),
    };
    if let Some(load) = exercise.load.as_deref() {
        if summary.is_empty() {
            summary.push_str(load);
        } else {
            summary.push_str(&format!(" @ {}", load));
        }
    }
    if let Some(rest) = exercise.rest.as_deref() {
        if !summary.is_empty() {
            summary.push_str(", ");
        }
        summary.push_str(&format!("rest {}", rest));
    }
    summary
}

/// Collapse runs of identical sets: `5 × 5 @ 225, 1 × 3 @ 245`.
pub fn sets_summary(sets: &[PerformedSet]) -> String {
    let mut groups: Vec<(usize, PerformedSet)> = Vec::new();
    for set in sets {
        match groups.last_mut() {
            Some((count, last)) if last == set => *count += 1,
            _ => groups.push((1, *set)),
        }
    }
    groups
        .iter()
        .map(|(count, set)| match set.weight {
            Some(w) => format!("{} × {} @ {}", count, set.reps, format_weight(w)),
            None => format!("{} × {}", count, set.reps),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
pub struct ExerciseLine {
    pub name: String,
    pub summary: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TemplateCard {
    pub template_id: String,
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub equipment: Option<String>,
    pub exercises: Vec<ExerciseLine>,
    pub status_label: &'static str,
    pub is_pending: bool,
    pub is_completed: bool,
    pub is_skipped: bool,
    pub busy: bool,
    pub completed_at: Option<String>,
    pub skip_reason: Option<String>,
    pub link_label: Option<String>,
    pub workout_id: Option<String>,
}

impl TemplateCard {
    fn new(template: &WorkoutTemplate, link: Option<&LinkState>, busy: bool) -> Self {
        let status = template.status();
        let (link_label, workout_id) = match link {
            Some(LinkState::Linked(id)) => (Some("View workout".to_string()), Some(id.clone())),
            Some(LinkState::Awaiting { .. }) => {
                (Some("Processing your workout…".to_string()), None)
            }
            Some(LinkState::Failed) => (
                Some("We couldn't build a workout record from this log".to_string()),
                None,
            ),
            None => (None, None),
        };

        Self {
            template_id: template.template_id.clone(),
            name: template.name.clone(),
            description: template.description.clone(),
            notes: template.notes.clone(),
            equipment: (!template.equipment.is_empty()).then(|| template.equipment.join(", ")),
            exercises: template
                .prescribed_exercises
                .iter()
                .map(|e| ExerciseLine {
                    name: e.name.clone(),
                    summary: prescription_summary(e),
                    notes: e.notes.clone(),
                })
                .collect(),
            status_label: match status {
                TemplateStatus::Pending => "To do",
                TemplateStatus::Completed => "Done",
                TemplateStatus::Skipped => "Skipped",
            },
            is_pending: status == TemplateStatus::Pending,
            is_completed: status == TemplateStatus::Completed,
            is_skipped: status == TemplateStatus::Skipped,
            busy,
            completed_at: template.completed_at().map(format_time),
            skip_reason: template.skip_reason().map(str::to_string),
            link_label,
            workout_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DayView {
    pub program_id: String,
    pub program_name: String,
    pub day_number: i64,
    pub total_days: i64,
    pub phase_label: Option<String>,
    pub prev_day: Option<i64>,
    pub next_day: Option<i64>,
    pub cards: Vec<TemplateCard>,
    pub progress: String,
    pub is_rest_day: bool,
    pub complete: bool,
    pub celebrate: bool,
}

impl DayView {
    pub fn new(program: &Program, snapshot: &DaySnapshot, completion: DayCompletion) -> Self {
        let resolved = snapshot
            .templates
            .iter()
            .filter(|t| t.is_resolved())
            .count();
        let phase_label = match (snapshot.phase_number, snapshot.phase_name.as_deref()) {
            (Some(n), Some(name)) => Some(format!("Phase {}: {}", n, name)),
            (None, Some(name)) => Some(name.to_string()),
            (Some(n), None) => Some(format!("Phase {}", n)),
            (None, None) => None,
        };

        Self {
            program_id: program.id.clone(),
            program_name: program.name.clone(),
            day_number: snapshot.day_number,
            total_days: program.total_days,
            phase_label,
            prev_day: (snapshot.day_number > 1).then(|| snapshot.day_number - 1),
            next_day: (snapshot.day_number < program.total_days).then(|| snapshot.day_number + 1),
            cards: snapshot
                .templates
                .iter()
                .map(|t| {
                    TemplateCard::new(
                        t,
                        snapshot.link_state(&t.template_id),
                        snapshot.in_flight.contains(&t.template_id),
                    )
                })
                .collect(),
            progress: format!("{} of {} done", resolved, snapshot.templates.len()),
            is_rest_day: snapshot.templates.is_empty(),
            complete: completion.complete,
            celebrate: completion.celebrate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkoutView {
    pub id: String,
    pub title: String,
    pub program_id: String,
    pub performed_at: String,
    pub user_performance: String,
    pub exercises: Vec<ExerciseLine>,
    pub total_sets: usize,
    pub total_volume: Option<String>,
}

impl From<&Workout> for WorkoutView {
    fn from(workout: &Workout) -> Self {
        let volume = workout.total_volume();
        Self {
            id: workout.id.clone(),
            title: workout.title.clone(),
            program_id: workout.program_id.clone(),
            performed_at: format_time(workout.performed_at),
            user_performance: workout.user_performance.clone(),
            exercises: workout
                .exercises
                .iter()
                .map(|e| ExerciseLine {
                    name: e.name.clone(),
                    summary: sets_summary(&e.sets),
                    notes: None,
                })
                .collect(),
            total_sets: workout.total_sets(),
            total_volume: (volume > 0.0).then(|| format_weight(volume)),
        }
    }
}
