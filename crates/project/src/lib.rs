use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use timeline::ProjectDto;

pub fn app_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
    base.join("atv_editor")
}

pub fn default_db_path() -> PathBuf {
    app_data_dir().join("drafts.sqlite")
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("project has no id")]
    MissingId,
    #[error("no draft stored for {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftRow {
    pub id: String,
    pub name: String,
    pub status: String,
    pub updated_at: i64,
    /// Bumped by every save.
    pub revision: i64,
    pub pushed_at: Option<i64>,
    pub pushed_revision: Option<i64>,
}

impl DraftRow {
    /// True when the draft was saved since the backend last accepted it.
    pub fn is_dirty(&self) -> bool {
        self.pushed_revision.map_or(true, |p| p < self.revision)
    }
}

/// Local SQLite store of committed project snapshots, one row per remote id.
pub struct ProjectDb {
    conn: Connection,
    path: PathBuf,
}

impl ProjectDb {
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() { fs::create_dir_all(dir)?; }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let _ = conn.pragma_update(None, "cache_size", "-8000"); // ~8MB page cache
        apply_migrations(&conn)?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    pub fn connection(&self) -> &Connection { &self.conn }

    pub fn path(&self) -> &Path { &self.path }

    /// Insert or replace the stored snapshot for `project.id`.
    pub fn save_draft(&self, project: &ProjectDto) -> Result<()> {
        let id = project.id.as_deref().ok_or(DraftError::MissingId)?;
        let now = chrono::Utc::now().timestamp();
        let data = serde_json::to_string(project)?;
        self.conn.execute(
            "INSERT INTO drafts(id, name, status, data_json, created_at, updated_at) VALUES(?1, ?2, ?3, ?4, ?5, ?5) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, status = excluded.status, \
             data_json = excluded.data_json, updated_at = excluded.updated_at, revision = drafts.revision + 1",
            params![id, project.name, project.status.as_str(), data, now],
        )?;
        tracing::debug!(id, bytes = data.len(), "draft saved");
        Ok(())
    }

    pub fn load_draft(&self, id: &str) -> Result<Option<ProjectDto>> {
        let data: Option<String> = self
            .conn
            .query_row("SELECT data_json FROM drafts WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn list_drafts(&self) -> Result<Vec<DraftRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.name, d.status, d.updated_at, d.revision, p.pushed_at, p.revision \
             FROM drafts d LEFT JOIN pushes p ON p.draft_id = d.id \
             ORDER BY d.updated_at DESC, d.id ASC LIMIT 500",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DraftRow {
                id: row.get(0)?,
                name: row.get(1)?,
                status: row.get(2)?,
                updated_at: row.get(3)?,
                revision: row.get(4)?,
                pushed_at: row.get(5)?,
                pushed_revision: row.get(6)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows { out.push(r?); }
        Ok(out)
    }

    /// Returns whether a row was removed.
    pub fn delete_draft(&self, id: &str) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM drafts WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Record that the current revision of `id` reached the backend.
    pub fn mark_pushed(&self, id: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let n = self.conn.execute(
            "INSERT INTO pushes(draft_id, pushed_at, revision) SELECT id, ?2, revision FROM drafts WHERE id = ?1 \
             ON CONFLICT(draft_id) DO UPDATE SET pushed_at = excluded.pushed_at, revision = excluded.revision",
            params![id, now],
        )?;
        if n == 0 {
            return Err(DraftError::NotFound(id.to_string()).into());
        }
        Ok(())
    }
}

const MIGRATIONS: &[(&str, &str)] = &[
    ("V0001__drafts", include_str!("../migrations/V0001__drafts.sql")),
    ("V0002__pushes", include_str!("../migrations/V0002__pushes.sql")),
    ("V0003__revisions", include_str!("../migrations/V0003__revisions.sql")),
];

fn apply_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS migrations(name TEXT PRIMARY KEY, applied_at INTEGER NOT NULL);")?;
    for (name, sql) in MIGRATIONS {
        let applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?1)",
            params![name],
            |row| row.get(0),
        )?;
        if applied { continue; }
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO migrations(name, applied_at) VALUES(?1, strftime('%s','now'))",
            params![name],
        )?;
        tx.commit()?;
        tracing::info!(migration = name, "applied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use timeline::{ProjectStatus, SentenceDto};

    fn project(id: &str, name: &str) -> ProjectDto {
        ProjectDto { id: Some(id.into()), name: name.into(), ..Default::default() }
    }

    fn open() -> (tempfile::TempDir, ProjectDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = ProjectDb::open_or_create(&dir.path().join("nested/drafts.sqlite")).unwrap();
        (dir, db)
    }

    #[test]
    fn save_and_load_round_trip_keeps_sentences() {
        let (_dir, db) = open();
        let mut p = project("p1", "Launch");
        p.sentences = Some(vec![SentenceDto { text: "Hello".into(), duration: 1200, ..Default::default() }]);
        db.save_draft(&p).unwrap();
        assert_eq!(db.load_draft("p1").unwrap(), Some(p));
        assert_eq!(db.load_draft("p2").unwrap(), None);
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let (_dir, db) = open();
        db.save_draft(&project("p1", "First")).unwrap();
        let mut p = project("p1", "Second");
        p.status = ProjectStatus::VideoDone;
        db.save_draft(&p).unwrap();
        let rows = db.list_drafts().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Second");
        assert_eq!(rows[0].status, "VIDEO_DONE");
    }

    #[test]
    fn save_without_id_is_rejected() {
        let (_dir, db) = open();
        let err = db.save_draft(&ProjectDto::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<DraftError>(), Some(DraftError::MissingId)));
    }

    #[test]
    fn delete_and_push_tracking() {
        let (_dir, db) = open();
        db.save_draft(&project("p1", "A")).unwrap();
        assert!(db.list_drafts().unwrap()[0].is_dirty());
        db.mark_pushed("p1").unwrap();
        assert!(!db.list_drafts().unwrap()[0].is_dirty());
        assert!(db.mark_pushed("ghost").is_err());
        // a save right after the push is still a change
        db.save_draft(&project("p1", "B")).unwrap();
        let row = &db.list_drafts().unwrap()[0];
        assert_eq!((row.revision, row.pushed_revision), (2, Some(1)));
        assert!(row.is_dirty());
        assert!(db.delete_draft("p1").unwrap());
        assert!(!db.delete_draft("p1").unwrap());
        assert!(db.list_drafts().unwrap().is_empty());
    }

    #[test]
    fn reopening_does_not_reapply_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.sqlite");
        ProjectDb::open_or_create(&path).unwrap().save_draft(&project("p1", "A")).unwrap();
        let db = ProjectDb::open_or_create(&path).unwrap();
        let count: i64 = db.connection().query_row("SELECT COUNT(*) FROM migrations", [], |r| r.get(0)).unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
        assert_eq!(db.list_drafts().unwrap().len(), 1);
    }
}
