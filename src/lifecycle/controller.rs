use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::store::{DaySnapshot, DayStores};
use super::{DayCompletion, LifecycleError, LinkPollPolicy, LinkState, Transition};
use crate::gateway::{GatewayError, LogPerformance, ProgramGateway};
use crate::models::{DaySelector, Program, TransitionOptions, WorkoutTemplate};

/// Mediates every status change for the templates of one program.
///
/// Each loaded day keeps its own store, so requests for different days never
/// disturb each other. Each operation makes exactly one gateway call. A
/// template with a call in flight rejects further transitions until that
/// call returns.
pub struct TemplateLifecycleController {
    program_id: String,
    gateway: Arc<dyn ProgramGateway>,
    policy: LinkPollPolicy,
    days: Mutex<DayStores>,
    watching: AtomicBool,
}

/// Clears the processing flag for a template when dropped.
struct InFlightGuard<'a> {
    controller: &'a TemplateLifecycleController,
    day_number: i64,
    template_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(store) = self.controller.days().day_mut(self.day_number) {
            store.finish(&self.template_id);
        }
    }
}

impl TemplateLifecycleController {
    pub fn new(
        gateway: Arc<dyn ProgramGateway>,
        program_id: impl Into<String>,
        policy: LinkPollPolicy,
    ) -> Self {
        Self {
            program_id: program_id.into(),
            gateway,
            policy,
            days: Mutex::new(DayStores::new()),
            watching: AtomicBool::new(false),
        }
    }

    pub fn program_id(&self) -> &str {
        &self.program_id
    }

    fn days(&self) -> MutexGuard<'_, DayStores> {
        self.days.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn load_program(&self) -> Result<Program, LifecycleError> {
        Ok(self.gateway.load_program(&self.program_id).await?)
    }

    /// Fetch a day from the gateway. A day loaded before is refreshed in
    /// place and keeps its celebration and link tracking; a new one starts
    /// with neither.
    pub async fn load_day(&self, selector: DaySelector) -> Result<DaySnapshot, LifecycleError> {
        let day = self
            .gateway
            .load_workout_templates(&self.program_id, selector)
            .await?;
        tracing::debug!(
            "Loaded {} of program {} (day {}, {} templates)",
            selector,
            self.program_id,
            day.day_number,
            day.templates.len()
        );

        self.days()
            .load(day)
            .snapshot()
            .ok_or(LifecycleError::NoDayLoaded)
    }

    /// Re-fetch a day without resetting its completion tracking.
    pub async fn reload(&self, day_number: i64) -> Result<DaySnapshot, LifecycleError> {
        self.load_day(DaySelector::Day(day_number)).await
    }

    pub fn snapshot(&self, day_number: i64) -> Option<DaySnapshot> {
        self.days().day(day_number).and_then(|store| store.snapshot())
    }

    pub fn link_state(&self, template_id: &str) -> Option<LinkState> {
        self.days().link_state(template_id)
    }

    pub fn is_in_flight(&self, template_id: &str) -> bool {
        self.days().is_in_flight(template_id)
    }

    fn begin(
        &self,
        template_id: &str,
        transition: Transition,
    ) -> Result<(InFlightGuard<'_>, WorkoutTemplate), LifecycleError> {
        let mut days = self.days();
        let day_number = days
            .day_of(template_id)
            .ok_or_else(|| LifecycleError::NotFound(template_id.to_string()))?;
        let before = days
            .day_mut(day_number)
            .ok_or_else(|| LifecycleError::NotFound(template_id.to_string()))?
            .try_begin(template_id, transition)?;

        let guard = InFlightGuard {
            controller: self,
            day_number,
            template_id: template_id.to_string(),
        };
        Ok((guard, before))
    }

    async fn run_transition<F, Fut>(
        &self,
        template_id: &str,
        transition: Transition,
        reason: Option<String>,
        send: F,
    ) -> Result<WorkoutTemplate, LifecycleError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), GatewayError>>,
    {
        let (guard, before) = self.begin(template_id, transition)?;

        if let Err(e) = send().await {
            tracing::warn!(
                "Gateway rejected {} of template {}: {}",
                transition,
                template_id,
                e
            );
            return Err(e.into());
        }

        let now = Utc::now();
        let applied = self
            .days()
            .day_mut(guard.day_number)
            .and_then(|store| store.apply(template_id, transition, now, reason.clone()));

        tracing::info!(
            "Template {} of program {}: {} acknowledged",
            template_id,
            self.program_id,
            transition
        );

        // The gateway has the change even if a fresh read dropped the template.
        let updated = applied.unwrap_or_else(|| {
            tracing::warn!(
                "Template {} left day {} while its {} was in flight",
                template_id,
                guard.day_number,
                transition
            );
            WorkoutTemplate {
                state: transition.target_state(now, reason),
                ..before
            }
        });
        Ok(updated)
    }

    /// Send free-text performance for a pending template. The workout record
    /// is linked later, see [`Self::refresh_links`].
    pub async fn log_workout(
        &self,
        template_id: &str,
        performance_text: &str,
    ) -> Result<WorkoutTemplate, LifecycleError> {
        let text = performance_text.trim();
        if text.is_empty() {
            return Err(LifecycleError::EmptyPerformance);
        }

        let performance = LogPerformance {
            user_performance: text.to_string(),
        };
        let options = TransitionOptions::default();
        self.run_transition(template_id, Transition::Log, None, || {
            self.gateway.log_workout_from_template(
                &self.program_id,
                template_id,
                &performance,
                &options,
            )
        })
        .await
    }

    pub async fn skip_workout(
        &self,
        template_id: &str,
        reason: Option<&str>,
    ) -> Result<WorkoutTemplate, LifecycleError> {
        let options = TransitionOptions::with_reason(reason);
        let reason = options.reason.clone();
        self.run_transition(template_id, Transition::Skip, reason, || {
            self.gateway
                .skip_workout_template(&self.program_id, template_id, &options)
        })
        .await
    }

    pub async fn unskip_workout(&self, template_id: &str) -> Result<WorkoutTemplate, LifecycleError> {
        let options = TransitionOptions::default();
        self.run_transition(template_id, Transition::Unskip, None, || {
            self.gateway
                .unskip_workout_template(&self.program_id, template_id, &options)
        })
        .await
    }

    pub fn day_completion_check(&self, day_number: i64) -> DayCompletion {
        let completion = self
            .days()
            .day_mut(day_number)
            .map(|store| store.check_completion())
            .unwrap_or_default();
        if completion.celebrate {
            tracing::info!("Program {} day {} complete", self.program_id, day_number);
        }
        completion
    }

    /// Poll the gateway once for workout records of logged templates, one
    /// read per day that still waits. Returns whether any link is still
    /// awaited.
    pub async fn refresh_links(&self) -> Result<bool, LifecycleError> {
        let waiting = self.days().awaiting_days();
        if waiting.is_empty() {
            return Ok(false);
        }

        let mut failure = None;
        for day_number in waiting {
            let result = self
                .gateway
                .load_workout_templates(&self.program_id, DaySelector::Day(day_number))
                .await;

            let mut days = self.days();
            let Some(store) = days.day_mut(day_number) else {
                continue;
            };
            match result {
                Ok(day) => {
                    for (template_id, state) in store.merge_links(&day, self.policy.max_attempts) {
                        if let LinkState::Linked(workout_id) = state {
                            tracing::info!(
                                "Template {} linked to workout {}",
                                template_id,
                                workout_id
                            );
                        }
                    }
                }
                Err(e) => {
                    store.record_failed_poll(self.policy.max_attempts);
                    failure = Some(e);
                }
            }
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(self.days().awaiting_links()),
        }
    }

    /// Poll at the policy interval until no link is awaited.
    pub async fn watch_links(&self) {
        loop {
            tokio::time::sleep(self.policy.interval).await;

            let awaiting = match self.refresh_links().await {
                Ok(awaiting) => awaiting,
                Err(e) => {
                    tracing::warn!("Link poll for program {} failed: {}", self.program_id, e);
                    self.days().awaiting_links()
                }
            };

            if !awaiting {
                self.watching.store(false, Ordering::Release);
                // A log may have started waiting after the last poll.
                if self.days().awaiting_links() && !self.watching.swap(true, Ordering::AcqRel) {
                    continue;
                }
                break;
            }
        }
    }

    /// Start a background link watcher unless one is already running.
    pub fn spawn_link_watch(self: &Arc<Self>) {
        if self.watching.swap(true, Ordering::AcqRel) {
            return;
        }
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            controller.watch_links().await;
        });
    }
}
