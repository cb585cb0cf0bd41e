use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{DayCompletion, LifecycleError, LinkState, Transition};
use crate::models::{ProgramDay, TemplateState, WorkoutTemplate};

/// A day is complete once every template is completed or skipped.
pub fn day_complete(templates: &[WorkoutTemplate]) -> bool {
    templates.iter().all(WorkoutTemplate::is_resolved)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkTracking {
    Awaiting { attempts: u32 },
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    pub day_number: i64,
    pub phase_name: Option<String>,
    pub phase_number: Option<i64>,
    pub templates: Vec<WorkoutTemplate>,
    pub complete: bool,
    #[serde(skip)]
    pub link_states: HashMap<String, LinkState>,
    #[serde(skip)]
    pub in_flight: HashSet<String>,
}

impl DaySnapshot {
    pub fn link_state(&self, template_id: &str) -> Option<&LinkState> {
        self.link_states.get(template_id)
    }
}

#[derive(Debug, Clone)]
struct DayHeader {
    day_number: i64,
    phase_name: Option<String>,
    phase_number: Option<i64>,
}

/// In-memory state of the loaded program day.
#[derive(Debug, Default)]
pub struct TemplateStore {
    day: Option<DayHeader>,
    templates: Vec<WorkoutTemplate>,
    in_flight: HashSet<String>,
    links: HashMap<String, LinkTracking>,
    celebrated: bool,
    armed: bool,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day_number(&self) -> Option<i64> {
        self.day.as_ref().map(|d| d.day_number)
    }

    pub fn template(&self, template_id: &str) -> Option<&WorkoutTemplate> {
        self.templates.iter().find(|t| t.template_id == template_id)
    }

    pub fn templates(&self) -> &[WorkoutTemplate] {
        &self.templates
    }

    /// Load a new day, forgetting celebration and link tracking.
    pub fn replace_day(&mut self, day: ProgramDay) {
        self.links.clear();
        self.celebrated = false;
        self.armed = false;
        self.set_day(day);
    }

    /// Re-read the loaded day. Celebration and link tracking survive when the
    /// day number is unchanged; otherwise this behaves like `replace_day`.
    ///
    /// A day that was still open before the read is disarmed: if the fresh
    /// copy is all resolved, something other than this store finished it.
    pub fn refresh_day(&mut self, day: ProgramDay) {
        if self.day_number() != Some(day.day_number) {
            self.replace_day(day);
            return;
        }
        if !day_complete(&self.templates) {
            self.armed = false;
        }
        self.set_day(day);
        let templates = &self.templates;
        self.links.retain(|id, _| {
            templates
                .iter()
                .any(|t| t.template_id == *id && t.linked_workout_id().is_none())
        });
        if !day_complete(&self.templates) {
            self.celebrated = false;
        }
    }

    fn set_day(&mut self, day: ProgramDay) {
        let mut templates = day.templates;
        templates.sort_by_key(|t| t.position);
        self.day = Some(DayHeader {
            day_number: day.day_number,
            phase_name: day.phase_name,
            phase_number: day.phase_number,
        });
        self.templates = templates;
    }

    /// Mark a template as having a transition in flight and return it as it
    /// was. Fails without side effects when the template is unknown or busy
    /// or in the wrong status.
    pub fn try_begin(
        &mut self,
        template_id: &str,
        transition: Transition,
    ) -> Result<WorkoutTemplate, LifecycleError> {
        let template = self
            .template(template_id)
            .ok_or_else(|| LifecycleError::NotFound(template_id.to_string()))?;

        if self.in_flight.contains(template_id) {
            return Err(LifecycleError::InFlight(template_id.to_string()));
        }

        let status = template.status();
        if status != transition.required_status() {
            return Err(LifecycleError::InvalidTransition {
                template_id: template_id.to_string(),
                transition,
                status,
            });
        }

        let before = template.clone();
        self.in_flight.insert(template_id.to_string());
        Ok(before)
    }

    pub fn finish(&mut self, template_id: &str) {
        self.in_flight.remove(template_id);
    }

    pub fn is_in_flight(&self, template_id: &str) -> bool {
        self.in_flight.contains(template_id)
    }

    /// Apply an acknowledged transition. Returns the updated template, or
    /// `None` if it is no longer part of the loaded day.
    pub fn apply(
        &mut self,
        template_id: &str,
        transition: Transition,
        now: DateTime<Utc>,
        reason: Option<String>,
    ) -> Option<WorkoutTemplate> {
        let template = self
            .templates
            .iter_mut()
            .find(|t| t.template_id == template_id)?;

        template.state = transition.target_state(now, reason);
        let updated = template.clone();

        match transition {
            Transition::Log => {
                self.links
                    .insert(template_id.to_string(), LinkTracking::Awaiting { attempts: 0 });
            }
            Transition::Unskip => self.celebrated = false,
            Transition::Skip => {}
        }
        self.armed = true;

        Some(updated)
    }

    pub fn check_completion(&mut self) -> DayCompletion {
        if self.day.is_none() || !day_complete(&self.templates) {
            self.celebrated = false;
            return DayCompletion::default();
        }

        let celebrate = self.armed && !self.celebrated;
        if celebrate {
            self.celebrated = true;
        }
        DayCompletion {
            complete: true,
            celebrate,
        }
    }

    pub fn link_state(&self, template_id: &str) -> Option<LinkState> {
        let template = self.template(template_id)?;
        if let Some(workout_id) = template.linked_workout_id() {
            return Some(LinkState::Linked(workout_id.to_string()));
        }
        match self.links.get(template_id)? {
            LinkTracking::Awaiting { attempts } => Some(LinkState::Awaiting {
                attempts: *attempts,
            }),
            LinkTracking::Failed => Some(LinkState::Failed),
        }
    }

    pub fn awaiting_links(&self) -> bool {
        self.links
            .values()
            .any(|l| matches!(l, LinkTracking::Awaiting { .. }))
    }

    /// Copy workout links from a fresh read of the same day into templates
    /// that are still waiting for one. Every waiting template that stays
    /// unlinked uses up one attempt.
    pub fn merge_links(&mut self, fresh: &ProgramDay, max_attempts: u32) -> Vec<(String, LinkState)> {
        if self.day_number() != Some(fresh.day_number) {
            return Vec::new();
        }

        let mut changes = Vec::new();
        let waiting: Vec<String> = self
            .links
            .iter()
            .filter(|(_, l)| matches!(l, LinkTracking::Awaiting { .. }))
            .map(|(id, _)| id.clone())
            .collect();

        for template_id in waiting {
            let linked = fresh
                .templates
                .iter()
                .find(|t| t.template_id == template_id)
                .and_then(|t| t.linked_workout_id().map(str::to_string));

            match linked {
                Some(workout_id) => {
                    if let Some(TemplateState::Completed {
                        linked_workout_id, ..
                    }) = self
                        .templates
                        .iter_mut()
                        .find(|t| t.template_id == template_id)
                        .map(|t| &mut t.state)
                    {
                        *linked_workout_id = Some(workout_id.clone());
                    }
                    self.links.remove(&template_id);
                    changes.push((template_id, LinkState::Linked(workout_id)));
                }
                None => {
                    let state = self.count_attempt(&template_id, max_attempts);
                    changes.push((template_id, state));
                }
            }
        }

        changes
    }

    /// Count a poll that could not reach the gateway against every waiting
    /// template. Returns whether any link is still awaited.
    pub fn record_failed_poll(&mut self, max_attempts: u32) -> bool {
        let waiting: Vec<String> = self
            .links
            .iter()
            .filter(|(_, l)| matches!(l, LinkTracking::Awaiting { .. }))
            .map(|(id, _)| id.clone())
            .collect();
        for template_id in waiting {
            self.count_attempt(&template_id, max_attempts);
        }
        self.awaiting_links()
    }

    fn count_attempt(&mut self, template_id: &str, max_attempts: u32) -> LinkState {
        let Some(tracking) = self.links.get_mut(template_id) else {
            return LinkState::Failed;
        };
        if let LinkTracking::Awaiting { attempts } = tracking {
            *attempts += 1;
            if *attempts >= max_attempts {
                tracing::warn!(
                    "No workout record for template {} after {} polls",
                    template_id,
                    attempts
                );
                *tracking = LinkTracking::Failed;
                return LinkState::Failed;
            }
            return LinkState::Awaiting {
                attempts: *attempts,
            };
        }
        LinkState::Failed
    }

    pub fn snapshot(&self) -> Option<DaySnapshot> {
        let day = self.day.as_ref()?;
        let link_states = self
            .templates
            .iter()
            .filter_map(|t| {
                self.link_state(&t.template_id)
                    .map(|state| (t.template_id.clone(), state))
            })
            .collect();

        Some(DaySnapshot {
            day_number: day.day_number,
            phase_name: day.phase_name.clone(),
            phase_number: day.phase_number,
            templates: self.templates.clone(),
            complete: day_complete(&self.templates),
            link_states,
            in_flight: self.in_flight.clone(),
        })
    }
}

/// Every loaded day of one program, each with its own [`TemplateStore`].
///
/// Loading one day never touches another, so a transition keeps its store
/// while its gateway call is in flight. Template ids are unique across a
/// program, so a template belongs to at most one day.
#[derive(Debug, Default)]
pub struct DayStores {
    days: HashMap<i64, TemplateStore>,
}

impl DayStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh read of a day. A day seen before is refreshed and keeps
    /// its celebration and link tracking.
    pub fn load(&mut self, day: ProgramDay) -> &mut TemplateStore {
        let store = self.days.entry(day.day_number).or_default();
        store.refresh_day(day);
        store
    }

    pub fn day(&self, day_number: i64) -> Option<&TemplateStore> {
        self.days.get(&day_number)
    }

    pub fn day_mut(&mut self, day_number: i64) -> Option<&mut TemplateStore> {
        self.days.get_mut(&day_number)
    }

    /// Day number of the loaded day holding `template_id`.
    pub fn day_of(&self, template_id: &str) -> Option<i64> {
        self.days
            .iter()
            .find(|(_, store)| store.template(template_id).is_some())
            .map(|(day_number, _)| *day_number)
    }

    pub fn link_state(&self, template_id: &str) -> Option<LinkState> {
        self.days
            .values()
            .find_map(|store| store.link_state(template_id))
    }

    pub fn is_in_flight(&self, template_id: &str) -> bool {
        self.days.values().any(|store| store.is_in_flight(template_id))
    }

    /// Days with at least one link still awaited, in day order.
    pub fn awaiting_days(&self) -> Vec<i64> {
        let mut days: Vec<i64> = self
            .days
            .iter()
            .filter(|(_, store)| store.awaiting_links())
            .map(|(day_number, _)| *day_number)
            .collect();
        days.sort_unstable();
        days
    }

    pub fn awaiting_links(&self) -> bool {
        self.days.values().any(TemplateStore::awaiting_links)
    }
}
