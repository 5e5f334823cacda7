pub mod api;
pub mod models;

pub use models::{Habit, HabitEvent, Periodicity, User};
