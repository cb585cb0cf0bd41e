#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde_json::Map;

use programlog::db::{create_memory_pool, DbPool};
use programlog::gateway::{GatewayError, LocalGateway, LogPerformance, ProgramGateway};
use programlog::handlers::{api, programs};
use programlog::lifecycle::{ControllerRegistry, LinkPollPolicy};
use programlog::migrations::run_migrations;
use programlog::models::{
    DaySelector, PrescribedExercise, Program, ProgramDay, ProgramPhase, TemplateState,
    TransitionOptions, Workout, WorkoutTemplate,
};
use programlog::repositories::{NewProgram, NewTemplate, ProgramRepository, TemplateRepository};

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations(&pool).expect("Failed to run migrations");
    pool
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

pub fn fast_policy() -> LinkPollPolicy {
    LinkPollPolicy {
        interval: Duration::from_millis(10),
        max_attempts: 3,
    }
}

pub struct SeededProgram {
    pub program: Program,
    /// Templates of day 1, in position order.
    pub day_one: Vec<WorkoutTemplate>,
}

/// A three-day program: two templates on day 1, one on day 2, rest on day 3.
pub async fn seed_program(pool: &DbPool) -> SeededProgram {
    let program_repo = ProgramRepository::new(pool.clone());
    let template_repo = TemplateRepository::new(pool.clone());

    let program = program_repo
        .create(NewProgram {
            name: "Test Block".to_string(),
            description: Some("Three days".to_string()),
            start_date: start_date(),
            total_days: 3,
            phases: vec![
                ProgramPhase {
                    phase_number: 1,
                    name: "Base".to_string(),
                    start_day: 1,
                    end_day: 2,
                },
                ProgramPhase {
                    phase_number: 2,
                    name: "Peak".to_string(),
                    start_day: 3,
                    end_day: 3,
                },
            ],
        })
        .await
        .unwrap();

    let squat = template_repo
        .create(
            &program.id,
            1,
            NewTemplate {
                name: "Lower".to_string(),
                position: 0,
                equipment: vec!["barbell".to_string()],
                prescribed_exercises: vec![PrescribedExercise {
                    name: "Back Squat".to_string(),
                    sets: Some(5),
                    reps: Some("5".to_string()),
                    load: Some("75%".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let core = template_repo
        .create(
            &program.id,
            1,
            NewTemplate {
                name: "Core".to_string(),
                position: 1,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    template_repo
        .create(
            &program.id,
            2,
            NewTemplate {
                name: "Upper".to_string(),
                position: 0,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    SeededProgram {
        program,
        day_one: vec![squat, core],
    }
}

pub fn local_gateway(pool: &DbPool) -> LocalGateway {
    LocalGateway::new(pool.clone()).with_fixed_today(start_date())
}

/// Full router backed by the local gateway, with "today" pinned to day 1.
pub fn create_test_app(pool: DbPool) -> Router {
    let gateway = local_gateway(&pool);
    let registry = ControllerRegistry::new(Arc::new(gateway.clone()), fast_policy());

    let programs_state = programs::ProgramsState {
        registry,
        default_program_id: None,
        service_mode: "local",
    };
    let api_state = api::ApiState { gateway };

    programlog::routes::create_router(programs_state, api_state)
}

pub fn pending_template(id: &str, position: i64) -> WorkoutTemplate {
    WorkoutTemplate {
        template_id: id.to_string(),
        name: format!("Workout {}", id),
        position,
        state: TemplateState::Pending,
        description: None,
        notes: None,
        equipment: Vec::new(),
        prescribed_exercises: Vec::new(),
        metadata: Map::new(),
    }
}

pub fn scripted_program() -> Program {
    Program {
        id: "p1".to_string(),
        name: "Scripted".to_string(),
        description: None,
        start_date: start_date(),
        total_days: 7,
        phases: Vec::new(),
        created_at: None,
    }
}

/// In-memory gateway that records every call and applies acknowledged
/// transitions to its own copy of the days. "Today" is the first day.
pub struct ScriptedGateway {
    program: Program,
    days: Mutex<Vec<ProgramDay>>,
    calls: Mutex<Vec<String>>,
    fail_transitions: AtomicBool,
    fail_loads: AtomicBool,
    delay: Option<Duration>,
    link_after_loads: Option<u32>,
    loads_since_log: AtomicU32,
}

impl ScriptedGateway {
    pub fn new(templates: Vec<WorkoutTemplate>) -> Self {
        Self {
            program: scripted_program(),
            days: Mutex::new(vec![ProgramDay {
                day_number: 1,
                phase_name: Some("Base".to_string()),
                phase_number: Some(1),
                templates,
            }]),
            calls: Mutex::new(Vec::new()),
            fail_transitions: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
            delay: None,
            link_after_loads: None,
            loads_since_log: AtomicU32::new(0),
        }
    }

    pub fn with_day(self, day_number: i64, templates: Vec<WorkoutTemplate>) -> Self {
        self.days.lock().unwrap().push(ProgramDay {
            day_number,
            phase_name: Some("Base".to_string()),
            phase_number: Some(1),
            templates,
        });
        self
    }

    /// Hold every transition call for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Attach a workout record to logged templates once the day has been
    /// read `loads` times after the log.
    pub fn linking_after(mut self, loads: u32) -> Self {
        self.link_after_loads = Some(loads);
        self
    }

    pub fn fail_transitions(&self, fail: bool) {
        self.fail_transitions.store(fail, Ordering::SeqCst);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    async fn transition(
        &self,
        call: &str,
        template_id: &str,
        state: TemplateState,
    ) -> Result<(), GatewayError> {
        self.record(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_transitions.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("connection reset".to_string()));
        }

        let mut days = self.days.lock().unwrap();
        let template = days
            .iter_mut()
            .flat_map(|day| day.templates.iter_mut())
            .find(|t| t.template_id == template_id)
            .ok_or_else(|| GatewayError::NotFound(template_id.to_string()))?;
        template.state = state;
        Ok(())
    }
}

#[async_trait]
impl ProgramGateway for ScriptedGateway {
    async fn load_program(&self, program_id: &str) -> Result<Program, GatewayError> {
        self.record("load_program");
        if program_id != self.program.id {
            return Err(GatewayError::NotFound(program_id.to_string()));
        }
        Ok(self.program.clone())
    }

    async fn load_workout_templates(
        &self,
        _program_id: &str,
        selector: DaySelector,
    ) -> Result<ProgramDay, GatewayError> {
        self.record("load_workout_templates");
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("timed out".to_string()));
        }

        let loads = self.loads_since_log.fetch_add(1, Ordering::SeqCst) + 1;
        let mut days = self.days.lock().unwrap();
        if self.link_after_loads.is_some_and(|n| loads >= n) {
            for template in days.iter_mut().flat_map(|day| day.templates.iter_mut()) {
                if let TemplateState::Completed {
                    linked_workout_id, ..
                } = &mut template.state
                {
                    linked_workout_id.get_or_insert_with(|| format!("w-{}", template.template_id));
                }
            }
        }
        let day = match selector {
            DaySelector::Today => days.first(),
            DaySelector::Day(n) => days.iter().find(|day| day.day_number == n),
        };
        day.cloned()
            .ok_or_else(|| GatewayError::NotFound(selector.to_string()))
    }

    async fn log_workout_from_template(
        &self,
        _program_id: &str,
        template_id: &str,
        _performance: &LogPerformance,
        _options: &TransitionOptions,
    ) -> Result<(), GatewayError> {
        self.loads_since_log.store(0, Ordering::SeqCst);
        self.transition(
            "log",
            template_id,
            TemplateState::Completed {
                completed_at: Utc::now(),
                linked_workout_id: None,
            },
        )
        .await
    }

    async fn skip_workout_template(
        &self,
        _program_id: &str,
        template_id: &str,
        options: &TransitionOptions,
    ) -> Result<(), GatewayError> {
        self.transition(
            "skip",
            template_id,
            TemplateState::Skipped {
                completed_at: Utc::now(),
                reason: options.reason.clone(),
            },
        )
        .await
    }

    async fn unskip_workout_template(
        &self,
        _program_id: &str,
        template_id: &str,
        _options: &TransitionOptions,
    ) -> Result<(), GatewayError> {
        self.transition("unskip", template_id, TemplateState::Pending)
            .await
    }

    async fn load_workout(&self, workout_id: &str) -> Result<Workout, GatewayError> {
        self.record("load_workout");
        Err(GatewayError::NotFound(workout_id.to_string()))
    }
}

/// Poll `check` until it holds or about a second has passed.
pub async fn eventually<F: FnMut() -> bool>(mut check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
