//! The pull-status store: merged per-pull plan/apply outcomes.
//!
//! A single command usually touches only a subset of a pull's projects,
//! so updates merge into the existing record instead of replacing it —
//! unless the pull's head commit has advanced, in which case everything
//! recorded for the old commit is stale and the record is rebuilt from
//! the incoming results alone.

use crate::core::db::{self, Store};
use crate::core::error::Result;
use crate::core::keys;
use crate::core::models::{ProjectResult, ProjectStatus, PullRequest, PullStatus};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

impl Store {
    /// Applies `results` to the stored status for `pull` and returns the
    /// new record. One read-modify-write transaction.
    ///
    /// Replace policy: no existing record, or the existing record is for a
    /// different head commit — build fresh from `results`. Merge policy:
    /// same head commit — update matching (workspace, dir, name) entries
    /// in place and append the rest, preserving projects this update does
    /// not mention.
    pub fn update_pull_with_results(
        &self,
        pull: &PullRequest,
        results: &[ProjectResult],
    ) -> Result<PullStatus> {
        let key = keys::pull_key(pull)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = get_pull_record(&tx, &key)?;

        let new_status = match current {
            Some(mut status) if status.pull.head_commit == pull.head_commit => {
                for res in results {
                    // Index-based update-or-append pass: overwrite the
                    // status of a matching entry, otherwise append.
                    let existing = status.projects.iter_mut().find(|proj| {
                        res.workspace == proj.workspace
                            && res.repo_rel_dir == proj.repo_rel_dir
                            && res.project_name == proj.project_name
                    });
                    match existing {
                        Some(proj) => proj.status = res.derived_status(),
                        None => status.projects.push(ProjectStatus::from(res)),
                    }
                }
                status
            }
            _ => PullStatus {
                pull: pull.clone(),
                projects: results.iter().map(ProjectStatus::from).collect(),
            },
        };

        tx.execute(
            "INSERT OR REPLACE INTO pulls(key, value) VALUES(?1, ?2)",
            params![key, db::encode(&new_status)?],
        )?;
        tx.commit()?;
        Ok(new_status)
    }

    /// Returns the stored status for `pull`, or `None` if none exists.
    pub fn get_pull_status(&self, pull: &PullRequest) -> Result<Option<PullStatus>> {
        let key = keys::pull_key(pull)?;
        let conn = self.conn.lock().unwrap();
        get_pull_record(&conn, &key)
    }

    /// Deletes the entire status record for `pull`.
    pub fn delete_pull_status(&self, pull: &PullRequest) -> Result<()> {
        let key = keys::pull_key(pull)?;
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM pulls WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Drops every project status under `pull` matching (workspace,
    /// repo_rel_dir), regardless of project name. No-op when the pull has
    /// no record; an emptied record stays present.
    pub fn delete_project_status(
        &self,
        pull: &PullRequest,
        workspace: &str,
        repo_rel_dir: &str,
    ) -> Result<()> {
        let key = keys::pull_key(pull)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(mut status) = get_pull_record(&tx, &key)? else {
            return Ok(());
        };
        status
            .projects
            .retain(|p| !(p.workspace == workspace && p.repo_rel_dir == repo_rel_dir));
        tx.execute(
            "INSERT OR REPLACE INTO pulls(key, value) VALUES(?1, ?2)",
            params![key, db::encode(&status)?],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn get_pull_record(conn: &Connection, key: &str) -> Result<Option<PullStatus>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM pulls WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;
    match raw {
        Some(raw) => Ok(Some(db::decode(key, &raw)?)),
        None => Ok(None),
    }
}
