use anyhow::{Context, Result};
use chrono::Duration;
use tracing::info;

use habits_api::AppStateInner;
use habits_types::Periodicity;

const DEMO_EMAIL: &str = "example@example.com";
const DEMO_PASSWORD: &str = "somehashedpassword";
const DEMO_WEEKS: i64 = 4;

const DEMO_HABITS: &[(&str, &str, Periodicity)] = &[
    ("Exercise", "Daily exercise", Periodicity::Daily),
    ("Read", "Read a book", Periodicity::Daily),
    ("Meditate", "Meditate for 10 minutes", Periodicity::Daily),
    ("Weekly Review", "Weekly review of goals", Periodicity::Weekly),
    ("Call Family", "Call family members", Periodicity::Weekly),
];

/// Ensure the demo user exists and owns the predefined habits, each with
/// four weekly check-offs ending today. Safe to run on every start.
pub fn seed_demo(state: &AppStateInner) -> Result<()> {
    let user = match state.db.get_user_by_email(DEMO_EMAIL)? {
        Some(user) => user,
        None => {
            let hash = state.passwords.hash(DEMO_PASSWORD)?;
            state
                .db
                .create_user("John", "Doe", DEMO_EMAIL, &hash)?
                .context("demo user appeared while seeding")?
        }
    };

    if !state.db.list_habits(user.id)?.is_empty() {
        info!("Demo data already present for user {}", user.id);
        return Ok(());
    }

    let now = state.clock.now();
    // Dated at the oldest check-off so no event precedes its habit.
    let created_at = now - Duration::weeks(DEMO_WEEKS - 1);
    for (name, description, periodicity) in DEMO_HABITS {
        let habit = state
            .db
            .create_habit(user.id, name, description, *periodicity, created_at)?
            .context("demo user vanished while seeding")?;

        for week in 0..DEMO_WEEKS {
            state.db.create_event(habit.id, now - Duration::weeks(week))?;
        }
    }

    info!("Seeded {} demo habits for {}", DEMO_HABITS.len(), DEMO_EMAIL);
    Ok(())
}
