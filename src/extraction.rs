//! Turns free-text performance notes into structured exercises.
//!
//! Recognised fragments look like `5x5 squat at 225` or `bench 3x8 @ 60kg`.
//! Fragments are separated by newlines, `;` or `,`. Anything else is ignored,
//! including fragments with more than [`MAX_SETS`] sets or [`MAX_REPS`] reps.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{PerformedExercise, PerformedSet};

/// Upper bound on sets in one fragment. One set record is built per set.
pub const MAX_SETS: u32 = 100;
pub const MAX_REPS: u32 = 1000;

static SETS_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:did\s+)?(\d+)\s*[x×]\s*(\d+)\s+(.+?)(?:\s*(?:\bat\b|@)\s*(\d+(?:\.\d+)?)\s*(?:lbs?|kg)?)?$",
    )
    .expect("sets-first pattern is valid")
});

static NAME_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:did\s+)?(.+?)\s+(\d+)\s*[x×]\s*(\d+)(?:\s*(?:\bat\b|@)\s*(\d+(?:\.\d+)?)\s*(?:lbs?|kg)?)?$",
    )
    .expect("name-first pattern is valid")
});

struct Fragment {
    name: String,
    sets: u32,
    reps: u32,
    weight: Option<f64>,
}

fn parse_fragment(text: &str) -> Option<Fragment> {
    let text = text.trim().trim_end_matches('.');
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = SETS_FIRST.captures(text) {
        return Some(Fragment {
            sets: caps[1].parse().ok()?,
            reps: caps[2].parse().ok()?,
            name: caps[3].trim().to_string(),
            weight: caps.get(4).and_then(|m| m.as_str().parse().ok()),
        });
    }

    let caps = NAME_FIRST.captures(text)?;
    Some(Fragment {
        name: caps[1].trim().to_string(),
        sets: caps[2].parse().ok()?,
        reps: caps[3].parse().ok()?,
        weight: caps.get(4).and_then(|m| m.as_str().parse().ok()),
    })
}

/// Extract exercises in the order they first appear. Repeated exercise names
/// (case-insensitive) are merged into one entry.
pub fn extract_exercises(text: &str) -> Vec<PerformedExercise> {
    let mut exercises: Vec<PerformedExercise> = Vec::new();

    for fragment in text.split(['\n', ';', ',']).filter_map(parse_fragment) {
        if fragment.sets == 0 || fragment.name.is_empty() {
            continue;
        }
        if fragment.sets > MAX_SETS || fragment.reps > MAX_REPS {
            tracing::debug!(
                "Ignoring {}x{} {}: outside plausible range",
                fragment.sets,
                fragment.reps,
                fragment.name
            );
            continue;
        }
        let sets = (0..fragment.sets).map(|_| PerformedSet {
            reps: fragment.reps,
            weight: fragment.weight,
        });

        match exercises
            .iter_mut()
            .find(|e| e.name.eq_ignore_ascii_case(&fragment.name))
        {
            Some(existing) => existing.sets.extend(sets),
            None => exercises.push(PerformedExercise {
                name: fragment.name,
                sets: sets.collect(),
            }),
        }
    }

    exercises
}
