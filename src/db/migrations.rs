use anyhow::{bail, Context, Result};
use rusqlite::Connection;

const SCHEMA_VERSION: i32 = 1;
const SLOTS_SCHEMA: &str = include_str!("schemas/schema_v1.sql");

/// Brings a results database up to [`SCHEMA_VERSION`]. A file written by a
/// newer build is refused rather than guessed at.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let found: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("could not read the results schema version")?;

    match found {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn
                .transaction()
                .context("could not start the schema transaction")?;
            tx.execute_batch(SLOTS_SCHEMA)
                .context("could not create the slots table")?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)
                .context("could not record the results schema version")?;
            tx.commit().context("could not commit the results schema")
        }
        other => bail!("results database has schema {other}, this build knows {SCHEMA_VERSION}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> i32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn fresh_database_gets_slots_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        assert_eq!(user_version(&conn), SCHEMA_VERSION);

        conn.execute(
            "INSERT INTO slots (key, value, updated_at) VALUES ('k', 'v', 'now')",
            [],
        )
        .unwrap();

        // Already current: nothing is re-applied.
        run_migrations(&mut conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM slots", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn newer_schema_is_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        assert!(run_migrations(&mut conn).is_err());
    }
}
