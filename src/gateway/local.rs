use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};

use super::{GatewayError, LogPerformance, ProgramGateway};
use crate::db::DbPool;
use crate::extraction::extract_exercises;
use crate::models::{
    DaySelector, Program, ProgramDay, TemplateStatus, TransitionOptions, Workout, WorkoutTemplate,
};
use crate::repositories::{ProgramRepository, TemplateRepository, WorkoutRepository};

/// Program service backed by the local SQLite database.
///
/// Logging a workout stores the performance text and returns right away. A
/// background task then extracts exercises and links the resulting workout
/// record to the template.
#[derive(Clone)]
pub struct LocalGateway {
    program_repo: ProgramRepository,
    template_repo: TemplateRepository,
    workout_repo: WorkoutRepository,
    fixed_today: Option<NaiveDate>,
}

impl LocalGateway {
    pub fn new(pool: DbPool) -> Self {
        Self {
            program_repo: ProgramRepository::new(pool.clone()),
            template_repo: TemplateRepository::new(pool.clone()),
            workout_repo: WorkoutRepository::new(pool),
            fixed_today: None,
        }
    }

    /// Pin the calendar date used to resolve "today".
    pub fn with_fixed_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    async fn require_program(&self, program_id: &str) -> Result<Program, GatewayError> {
        self.program_repo
            .find_by_id(program_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("Program {} not found", program_id)))
    }

    async fn require_template(
        &self,
        program_id: &str,
        template_id: &str,
    ) -> Result<WorkoutTemplate, GatewayError> {
        self.template_repo
            .find_by_id(program_id, template_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("Template {} not found", template_id)))
    }

    fn reject(template: &WorkoutTemplate, action: &str) -> GatewayError {
        GatewayError::Validation(format!(
            "Cannot {} template {} while it is {}",
            action,
            template.template_id,
            template.status()
        ))
    }

    /// Extract exercises from `text` and link a new workout record to the
    /// template. Returns the workout id, or `None` when nothing was
    /// recognised or the template no longer accepts a link.
    pub async fn link_extracted_workout(
        &self,
        program_id: &str,
        template: &WorkoutTemplate,
        text: &str,
    ) -> Result<Option<String>, GatewayError> {
        let exercises = extract_exercises(text);
        if exercises.is_empty() {
            tracing::warn!(
                "No exercises recognised for template {}; leaving it unlinked",
                template.template_id
            );
            return Ok(None);
        }

        let workout = self
            .workout_repo
            .create(
                program_id,
                &template.template_id,
                &template.name,
                text,
                exercises,
            )
            .await?;
        let linked = self
            .template_repo
            .set_linked_workout(&template.template_id, &workout.id)
            .await?;
        if !linked {
            tracing::warn!(
                "Template {} is not completed; workout {} was stored without a link",
                template.template_id,
                workout.id
            );
            return Ok(None);
        }
        Ok(Some(workout.id))
    }

    fn spawn_extraction(&self, program_id: String, template: WorkoutTemplate, text: String) {
        let gateway = self.clone();

        tokio::spawn(async move {
            match gateway
                .link_extracted_workout(&program_id, &template, &text)
                .await
            {
                Ok(Some(workout_id)) => tracing::info!(
                    "Linked workout {} to template {}",
                    workout_id,
                    template.template_id
                ),
                Ok(None) => {}
                Err(e) => tracing::error!(
                    "Extraction for template {} failed: {}",
                    template.template_id,
                    e
                ),
            }
        });
    }
}

#[async_trait]
impl ProgramGateway for LocalGateway {
    async fn load_program(&self, program_id: &str) -> Result<Program, GatewayError> {
        self.require_program(program_id).await
    }

    async fn load_workout_templates(
        &self,
        program_id: &str,
        selector: DaySelector,
    ) -> Result<ProgramDay, GatewayError> {
        let program = self.require_program(program_id).await?;

        let day_number = match selector {
            DaySelector::Today => program.day_for_date(self.today()),
            DaySelector::Day(n) if (1..=program.total_days).contains(&n) => n,
            DaySelector::Day(n) => {
                return Err(GatewayError::NotFound(format!(
                    "Day {} is outside program {} (1-{})",
                    n, program_id, program.total_days
                )))
            }
        };

        let templates = self
            .template_repo
            .find_by_program_day(program_id, day_number)
            .await?;
        let phase = program.phase_for_day(day_number);

        Ok(ProgramDay {
            day_number,
            phase_name: phase.map(|p| p.name.clone()),
            phase_number: phase.map(|p| p.phase_number),
            templates,
        })
    }

    async fn log_workout_from_template(
        &self,
        program_id: &str,
        template_id: &str,
        performance: &LogPerformance,
        _options: &TransitionOptions,
    ) -> Result<(), GatewayError> {
        let text = performance.user_performance.trim();
        if text.is_empty() {
            return Err(GatewayError::Validation(
                "Performance description is required".to_string(),
            ));
        }

        let template = self.require_template(program_id, template_id).await?;
        if template.status() != TemplateStatus::Pending {
            return Err(Self::reject(&template, "log"));
        }

        let updated = self
            .template_repo
            .mark_completed(program_id, template_id, text, Utc::now())
            .await?;
        if !updated {
            return Err(Self::reject(&template, "log"));
        }

        tracing::info!("Template {} logged; extracting workout", template_id);
        self.spawn_extraction(program_id.to_string(), template, text.to_string());
        Ok(())
    }

    async fn skip_workout_template(
        &self,
        program_id: &str,
        template_id: &str,
        options: &TransitionOptions,
    ) -> Result<(), GatewayError> {
        let template = self.require_template(program_id, template_id).await?;
        if template.status() != TemplateStatus::Pending {
            return Err(Self::reject(&template, "skip"));
        }

        let updated = self
            .template_repo
            .mark_skipped(program_id, template_id, options.reason.as_deref(), Utc::now())
            .await?;
        if !updated {
            return Err(Self::reject(&template, "skip"));
        }

        tracing::info!("Template {} skipped", template_id);
        Ok(())
    }

    async fn unskip_workout_template(
        &self,
        program_id: &str,
        template_id: &str,
        _options: &TransitionOptions,
    ) -> Result<(), GatewayError> {
        let template = self.require_template(program_id, template_id).await?;
        if template.status() != TemplateStatus::Skipped {
            return Err(Self::reject(&template, "unskip"));
        }

        let updated = self.template_repo.mark_pending(program_id, template_id).await?;
        if !updated {
            return Err(Self::reject(&template, "unskip"));
        }

        tracing::info!("Template {} unskipped", template_id);
        Ok(())
    }

    async fn load_workout(&self, workout_id: &str) -> Result<Workout, GatewayError> {
        self.workout_repo
            .find_by_id(workout_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("Workout {} not found", workout_id)))
    }
}
