pub mod program_repo;
pub mod template_repo;
pub mod workout_repo;

pub use program_repo::{NewProgram, ProgramRepository};
pub use template_repo::{NewTemplate, TemplateRepository};
pub use workout_repo::WorkoutRepository;
