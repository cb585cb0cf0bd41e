pub mod api;
pub mod health;
pub mod programs;
pub mod workouts;
