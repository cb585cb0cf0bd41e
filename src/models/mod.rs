pub mod from_row;
pub mod program;
pub mod template;
pub mod workout;

pub use from_row::FromSqliteRow;
pub use program::{DaySelector, Program, ProgramDay, ProgramPhase};
pub use template::{
    PrescribedExercise, TemplateState, TemplateStatus, TransitionOptions, WorkoutTemplate,
};
pub use workout::{PerformedExercise, PerformedSet, Workout};
