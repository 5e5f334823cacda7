//! Habits Streak Engine
//!
//! Pure functions over a habit's check-off timestamps. Nothing here touches
//! the store or the clock: callers fetch the events and pass "today" in.

pub mod leaders;
pub mod streak;

pub use leaders::{StreakLeaders, streak_leaders};
pub use streak::{is_broken, longest_streak};
