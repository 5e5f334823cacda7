use crate::Database;
use crate::models::{EventRow, HabitHistory, HabitRow, UserRow};
use anyhow::Result;
use chrono::{DateTime, Utc};
use habits_types::Periodicity;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, ffi, params};
use tracing::info;

impl Database {
    // -- Users --

    /// Insert a user. Returns `None` when the email is already registered.
    pub fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (first_name, last_name, email, password_hash) VALUES (?1, ?2, ?3, ?4)",
                params![first_name, last_name, email, password_hash],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            }

            let id = conn.last_insert_rowid();
            info!("Created user {}", id);
            Ok(Some(UserRow {
                id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            }))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, first_name, last_name, email, password_hash FROM users WHERE email = ?1",
                [email],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Habits --

    /// Returns `None` when `owner_id` does not name a user.
    pub fn create_habit(
        &self,
        owner_id: i64,
        name: &str,
        description: &str,
        periodicity: Periodicity,
        created_at: DateTime<Utc>,
    ) -> Result<Option<HabitRow>> {
        self.with_conn_mut(|conn| {
            if query_user_by_id(conn, owner_id)?.is_none() {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO habits (name, description, periodicity, created_at, owner_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![name, description, periodicity.as_str(), created_at, owner_id],
            )?;

            let id = conn.last_insert_rowid();
            info!("Created {} habit {} for user {}", periodicity, id, owner_id);
            Ok(Some(HabitRow {
                id,
                name: name.to_string(),
                description: description.to_string(),
                periodicity,
                created_at,
                owner_id,
            }))
        })
    }

    pub fn get_habit(&self, id: i64) -> Result<Option<HabitRow>> {
        self.with_conn(|conn| query_habit(conn, id))
    }

    pub fn list_habits(&self, owner_id: i64) -> Result<Vec<HabitRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, periodicity, created_at, owner_id
                 FROM habits WHERE owner_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([owner_id], habit_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_habits_by_periodicity(
        &self,
        owner_id: i64,
        periodicity: Periodicity,
    ) -> Result<Vec<HabitRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, periodicity, created_at, owner_id
                 FROM habits WHERE owner_id = ?1 AND periodicity = ?2 ORDER BY id",
            )?;
            let rows = stmt
                .query_map(params![owner_id, periodicity.as_str()], habit_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Replace name, description and periodicity. Returns `None` if the habit
    /// does not exist.
    pub fn update_habit(
        &self,
        id: i64,
        name: &str,
        description: &str,
        periodicity: Periodicity,
    ) -> Result<Option<HabitRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE habits SET name = ?1, description = ?2, periodicity = ?3 WHERE id = ?4",
                params![name, description, periodicity.as_str(), id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_habit(conn, id)
        })
    }

    /// Delete a habit and, through the cascade, its events. Returns the
    /// deleted row.
    pub fn delete_habit(&self, id: i64) -> Result<Option<HabitRow>> {
        self.with_conn_mut(|conn| {
            let Some(habit) = query_habit(conn, id)? else {
                return Ok(None);
            };
            conn.execute("DELETE FROM habits WHERE id = ?1", [id])?;
            info!("Deleted habit {}", id);
            Ok(Some(habit))
        })
    }

    // -- Events --

    /// Record a check-off at `at`. Returns the habit, or `None` if it does
    /// not exist. Repeats on the same day are stored like any other event.
    pub fn checkoff_habit(&self, habit_id: i64, at: DateTime<Utc>) -> Result<Option<HabitRow>> {
        self.with_conn_mut(|conn| {
            let Some(habit) = query_habit(conn, habit_id)? else {
                return Ok(None);
            };
            insert_event(conn, habit_id, at)?;
            Ok(Some(habit))
        })
    }

    /// Insert a raw event. Returns `None` if the habit does not exist.
    pub fn create_event(&self, habit_id: i64, at: DateTime<Utc>) -> Result<Option<EventRow>> {
        self.with_conn_mut(|conn| {
            if query_habit(conn, habit_id)?.is_none() {
                return Ok(None);
            }
            insert_event(conn, habit_id, at).map(Some)
        })
    }

    /// Events of a habit, oldest first. `None` if the habit does not exist.
    pub fn list_events(&self, habit_id: i64) -> Result<Option<Vec<EventRow>>> {
        self.with_conn(|conn| {
            if query_habit(conn, habit_id)?.is_none() {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT id, habit_id, timestamp FROM habit_events
                 WHERE habit_id = ?1 ORDER BY timestamp, id",
            )?;
            let rows = stmt
                .query_map([habit_id], |row| {
                    Ok(EventRow {
                        id: row.get(0)?,
                        habit_id: row.get(1)?,
                        timestamp: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Some(rows))
        })
    }

    /// A habit and its check-off timestamps. `None` if the habit does not exist.
    pub fn habit_history(&self, habit_id: i64) -> Result<Option<HabitHistory>> {
        self.with_conn(|conn| {
            let Some(habit) = query_habit(conn, habit_id)? else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT timestamp FROM habit_events WHERE habit_id = ?1 ORDER BY timestamp",
            )?;
            let timestamps = stmt
                .query_map([habit_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<DateTime<Utc>>, _>>()?;

            Ok(Some(HabitHistory { habit, timestamps }))
        })
    }

    /// Histories of every habit owned by `owner_id`, or of every habit in the
    /// store when `owner_id` is `None`. Ordered by habit id.
    pub fn habit_histories(&self, owner_id: Option<i64>) -> Result<Vec<HabitHistory>> {
        self.with_conn(|conn| query_histories(conn, owner_id))
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
    })
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<HabitRow> {
    let periodicity: String = row.get(3)?;
    let periodicity = periodicity
        .parse::<Periodicity>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(HabitRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        periodicity,
        created_at: row.get(4)?,
        owner_id: row.get(5)?,
    })
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    conn.query_row(
        "SELECT id, first_name, last_name, email, password_hash FROM users WHERE id = ?1",
        [id],
        user_from_row,
    )
    .optional()
}

fn query_habit(conn: &Connection, id: i64) -> Result<Option<HabitRow>> {
    conn.query_row(
        "SELECT id, name, description, periodicity, created_at, owner_id FROM habits WHERE id = ?1",
        [id],
        habit_from_row,
    )
    .optional()
}

fn insert_event(conn: &Connection, habit_id: i64, at: DateTime<Utc>) -> Result<EventRow> {
    conn.execute(
        "INSERT INTO habit_events (habit_id, timestamp) VALUES (?1, ?2)",
        params![habit_id, at],
    )?;

    Ok(EventRow {
        id: conn.last_insert_rowid(),
        habit_id,
        timestamp: at,
    })
}

fn query_histories(conn: &Connection, owner_id: Option<i64>) -> Result<Vec<HabitHistory>> {
    // LEFT JOIN so habits without events still show up (with no timestamps)
    let mut stmt = conn.prepare(
        "SELECT h.id, h.name, h.description, h.periodicity, h.created_at, h.owner_id, e.timestamp
         FROM habits h
         LEFT JOIN habit_events e ON e.habit_id = h.id
         WHERE ?1 IS NULL OR h.owner_id = ?1
         ORDER BY h.id, e.timestamp",
    )?;

    let mut histories: Vec<HabitHistory> = Vec::new();
    let mut rows = stmt.query([owner_id])?;
    while let Some(row) = rows.next()? {
        let habit_id: i64 = row.get(0)?;
        if histories.last().is_none_or(|h| h.habit.id != habit_id) {
            histories.push(HabitHistory {
                habit: habit_from_row(row)?,
                timestamps: Vec::new(),
            });
        }

        let timestamp: Option<DateTime<Utc>> = row.get(6)?;
        if let (Some(ts), Some(history)) = (timestamp, histories.last_mut()) {
            history.timestamps.push(ts);
        }
    }

    Ok(histories)
}

/// Extension trait for optional query results
/// Only a UNIQUE clash counts; other constraint failures stay errors.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap()
    }

    fn db_with_user() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user("Ada", "Lovelace", "ada@example.com", "$argon2id$fake")
            .unwrap()
            .unwrap();
        (db, user.id)
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (db, _) = db_with_user();
        let dup = db.create_user("Other", "Person", "ada@example.com", "x").unwrap();
        assert!(dup.is_none());

        let found = db.get_user_by_email("ada@example.com").unwrap().unwrap();
        assert_eq!(found.first_name, "Ada");
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn only_unique_clashes_count_as_taken() {
        let (db, user_id) = db_with_user();

        db.with_conn(|conn| {
            let dup = conn
                .execute(
                    "INSERT INTO users (first_name, last_name, email, password_hash) VALUES ('a', 'b', 'ada@example.com', 'x')",
                    [],
                )
                .unwrap_err();
            assert!(is_unique_violation(&dup));

            let bad_periodicity = conn
                .execute(
                    "INSERT INTO habits (name, description, periodicity, created_at, owner_id) VALUES ('x', 'y', 'monthly', ?1, ?2)",
                    params![at(1), user_id],
                )
                .unwrap_err();
            assert!(!is_unique_violation(&bad_periodicity));

            conn.execute_batch(
                "CREATE TRIGGER block_test_domain BEFORE INSERT ON users
                 WHEN NEW.email LIKE '%@blocked.test'
                 BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        let blocked = db.create_user("Eve", "Blocked", "eve@blocked.test", "x");
        assert!(blocked.is_err());
    }

    #[test]
    fn habit_requires_existing_owner() {
        let db = Database::open_in_memory().unwrap();
        let habit = db
            .create_habit(42, "Read", "Read a book", Periodicity::Daily, at(1))
            .unwrap();
        assert!(habit.is_none());
    }

    #[test]
    fn habit_roundtrips_through_store() {
        let (db, user_id) = db_with_user();
        let created = db
            .create_habit(user_id, "Read", "Read a book", Periodicity::Weekly, at(1))
            .unwrap()
            .unwrap();

        let fetched = db.get_habit(created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Read");
        assert_eq!(fetched.periodicity, Periodicity::Weekly);
        assert_eq!(fetched.created_at, at(1));
        assert_eq!(fetched.owner_id, user_id);
    }

    #[test]
    fn update_replaces_fields() {
        let (db, user_id) = db_with_user();
        let habit = db
            .create_habit(user_id, "Run", "5k", Periodicity::Daily, at(1))
            .unwrap()
            .unwrap();

        let updated = db
            .update_habit(habit.id, "Walk", "10k steps", Periodicity::Weekly)
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Walk");
        assert_eq!(updated.description, "10k steps");
        assert_eq!(updated.periodicity, Periodicity::Weekly);
        assert_eq!(updated.created_at, at(1));

        assert!(db.update_habit(999, "x", "y", Periodicity::Daily).unwrap().is_none());
    }

    #[test]
    fn delete_cascades_to_events() {
        let (db, user_id) = db_with_user();
        let habit = db
            .create_habit(user_id, "Run", "5k", Periodicity::Daily, at(1))
            .unwrap()
            .unwrap();
        db.checkoff_habit(habit.id, at(2)).unwrap().unwrap();
        db.checkoff_habit(habit.id, at(3)).unwrap().unwrap();

        let deleted = db.delete_habit(habit.id).unwrap().unwrap();
        assert_eq!(deleted.id, habit.id);
        assert!(db.get_habit(habit.id).unwrap().is_none());
        assert!(db.delete_habit(habit.id).unwrap().is_none());

        let orphans: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM habit_events WHERE habit_id = ?1",
                    [habit.id],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn events_for_missing_habit() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.checkoff_habit(7, at(1)).unwrap().is_none());
        assert!(db.create_event(7, at(1)).unwrap().is_none());
        assert!(db.list_events(7).unwrap().is_none());
        assert!(db.habit_history(7).unwrap().is_none());
    }

    #[test]
    fn events_are_listed_oldest_first() {
        let (db, user_id) = db_with_user();
        let habit = db
            .create_habit(user_id, "Run", "5k", Periodicity::Daily, at(1))
            .unwrap()
            .unwrap();
        db.create_event(habit.id, at(5)).unwrap().unwrap();
        db.create_event(habit.id, at(3)).unwrap().unwrap();
        db.create_event(habit.id, at(3) + Duration::hours(2)).unwrap().unwrap();

        let events = db.list_events(habit.id).unwrap().unwrap();
        let stamps: Vec<_> = events.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![at(3), at(3) + Duration::hours(2), at(5)]);

        let history = db.habit_history(habit.id).unwrap().unwrap();
        assert_eq!(history.timestamps, stamps);
    }

    #[test]
    fn histories_group_by_habit_and_owner() {
        let (db, ada) = db_with_user();
        let bob = db
            .create_user("Bob", "B", "bob@example.com", "x")
            .unwrap()
            .unwrap()
            .id;

        let run = db.create_habit(ada, "Run", "", Periodicity::Daily, at(1)).unwrap().unwrap();
        let read = db.create_habit(ada, "Read", "", Periodicity::Weekly, at(1)).unwrap().unwrap();
        let swim = db.create_habit(bob, "Swim", "", Periodicity::Daily, at(1)).unwrap().unwrap();
        db.create_event(run.id, at(2)).unwrap();
        db.create_event(run.id, at(3)).unwrap();
        db.create_event(swim.id, at(2)).unwrap();

        let mine = db.habit_histories(Some(ada)).unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].habit.id, run.id);
        assert_eq!(mine[0].timestamps, vec![at(2), at(3)]);
        assert_eq!(mine[1].habit.id, read.id);
        assert!(mine[1].timestamps.is_empty());

        let everyone = db.habit_histories(None).unwrap();
        assert_eq!(everyone.len(), 3);
        assert_eq!(everyone[2].habit.id, swim.id);
    }

    #[test]
    fn filter_by_periodicity() {
        let (db, user_id) = db_with_user();
        db.create_habit(user_id, "Run", "", Periodicity::Daily, at(1)).unwrap();
        db.create_habit(user_id, "Review", "", Periodicity::Weekly, at(1)).unwrap();

        let weekly = db.list_habits_by_periodicity(user_id, Periodicity::Weekly).unwrap();
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].name, "Review");
        assert_eq!(db.list_habits(user_id).unwrap().len(), 2);
    }
}
