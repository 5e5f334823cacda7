use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, habits, habit_events)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name      TEXT NOT NULL,
                last_name       TEXT NOT NULL,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL
            );

            CREATE TABLE habits (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                description     TEXT NOT NULL,
                periodicity     TEXT NOT NULL CHECK (periodicity IN ('daily', 'weekly')),
                created_at      TEXT NOT NULL,
                owner_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_habits_owner ON habits(owner_id);

            CREATE TABLE habit_events (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                habit_id        INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
                timestamp       TEXT NOT NULL
            );

            CREATE INDEX idx_habit_events_habit ON habit_events(habit_id, timestamp);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
