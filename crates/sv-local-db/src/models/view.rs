//! Viewer fingerprints backing unique-view accounting.

use rusqlite::params;

/// Database operations for per-viewer snippet view rows.
///
/// There is no record type to fetch back; the table exists to answer one
/// question at write time: has this fingerprint seen this snippet before?
pub struct ViewStore<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> ViewStore<'a> {
    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Record one view. Returns true when the fingerprint is new for this
    /// snippet; repeat visits bump the hit counter instead.
    pub fn record(&self, snippet_id: i64, fingerprint: &str, seen_at: &str) -> crate::Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO snippet_views (snippet_id, fingerprint, hits,
                                                 first_seen_at, last_seen_at)
            VALUES (?, ?, 1, ?, ?)
            "#,
            params![snippet_id, fingerprint, seen_at, seen_at],
        )?;
        if inserted == 1 {
            return Ok(true);
        }

        self.conn.execute(
            r#"
            UPDATE snippet_views SET hits = hits + 1, last_seen_at = ?
            WHERE snippet_id = ? AND fingerprint = ?
            "#,
            params![seen_at, snippet_id, fingerprint],
        )?;
        Ok(false)
    }

    /// Distinct fingerprints that have viewed a snippet.
    pub fn unique_viewers(&self, snippet_id: i64) -> crate::Result<i64> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM snippet_views WHERE snippet_id = ?")?;
        let count = stmt.query_row(params![snippet_id], |row| row.get(0))?;
        Ok(count)
    }
}
