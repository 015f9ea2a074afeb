//! The lock store: mutual exclusion for (project, workspace) pairs.
//!
//! Each operation runs inside a single engine transaction, so the
//! check-then-write in [`Store::try_acquire`] is atomic: of any number of
//! concurrent acquisitions for the same key, exactly one observes the key
//! absent and wins. There is no application-level locking on top of the
//! engine's transaction serialization.

use crate::core::db::{self, Store};
use crate::core::error::{DriftlockError, Result};
use crate::core::keys;
use crate::core::models::{Project, ProjectLock};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

impl Store {
    /// Attempts to acquire `candidate`. Returns `(true, candidate)` when
    /// the lock was free, or `(false, holder)` with the untouched current
    /// holder when it was not. An existing lock is never overwritten.
    pub fn try_acquire(&self, candidate: ProjectLock) -> Result<(bool, ProjectLock)> {
        let key = keys::lock_key(&candidate.project, &candidate.workspace);
        let encoded = db::encode(&candidate)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing: Option<String> = tx
            .query_row("SELECT value FROM locks WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        match existing {
            None => {
                tx.execute(
                    "INSERT INTO locks(key, value) VALUES(?1, ?2)",
                    params![key, encoded],
                )?;
                tx.commit()?;
                Ok((true, candidate))
            }
            Some(raw) => {
                let holder: ProjectLock = db::decode(&key, &raw)?;
                tx.commit()?;
                Ok((false, holder))
            }
        }
    }

    /// Releases the lock on (project, workspace) and returns it, or `None`
    /// if no lock was held. Releasing an absent lock is not an error.
    pub fn release(&self, project: &Project, workspace: &str) -> Result<Option<ProjectLock>> {
        let key = keys::lock_key(project, workspace);

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing: Option<String> = tx
            .query_row("SELECT value FROM locks WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        let released = match existing {
            Some(raw) => Some(db::decode(&key, &raw)?),
            None => None,
        };
        tx.execute("DELETE FROM locks WHERE key = ?1", params![key])?;
        tx.commit()?;
        Ok(released)
    }

    /// Returns every current lock in engine key order (lexicographic over
    /// the encoded key, not acquisition order).
    pub fn list_locks(&self) -> Result<Vec<ProjectLock>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key, value FROM locks ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut locks = Vec::new();
        for row in rows {
            let (key, raw) = row?;
            locks.push(db::decode(&key, &raw)?);
        }
        Ok(locks)
    }

    /// Point lookup for the lock on (project, workspace). Timestamps come
    /// back normalized to the local zone regardless of the offset they
    /// were stored with.
    pub fn get_lock(&self, project: &Project, workspace: &str) -> Result<Option<ProjectLock>> {
        let key = keys::lock_key(project, workspace);
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row("SELECT value FROM locks WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(db::decode(&key, &raw)?)),
            None => Ok(None),
        }
    }

    /// Releases every lock under `repo_full_name` held by pull `pull_num`
    /// and returns the released locks.
    ///
    /// This is one read scan over the repo key prefix followed by one
    /// delete transaction per match. It is deliberately not atomic as a
    /// whole: bulk release happens when a pull is closing, so it is not
    /// expected to race new acquisitions for the same pull. A failed
    /// delete aborts with an error naming the lock and how many of the
    /// found locks had already been released.
    pub fn release_all_for_pull(
        &self,
        repo_full_name: &str,
        pull_num: u64,
    ) -> Result<Vec<ProjectLock>> {
        let matched = {
            let conn = self.conn.lock().unwrap();
            let mut stmt =
                conn.prepare("SELECT key, value FROM locks WHERE key >= ?1 ORDER BY key")?;
            let rows = stmt.query_map(params![repo_full_name], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut matched: Vec<ProjectLock> = Vec::new();
            for row in rows {
                let (key, raw) = row?;
                // Keys sort by byte order, so the repo's locks are one
                // contiguous run starting at the prefix itself.
                if !key.starts_with(repo_full_name) {
                    break;
                }
                // The prefix run also covers sibling repos like
                // "org/repo-other", so match on the decoded repo name too.
                let lock: ProjectLock = db::decode(&key, &raw)?;
                if lock.project.repo_full_name == repo_full_name && lock.pull.num == pull_num {
                    matched.push(lock);
                }
            }
            matched
        };

        let total = matched.len();
        for (released, lock) in matched.iter().enumerate() {
            self.release(&lock.project, &lock.workspace).map_err(|e| {
                DriftlockError::BulkRelease {
                    context: format!(
                        "releasing lock for repo {}, path {}, workspace {} ({} of {} found locks already released)",
                        lock.project.repo_full_name,
                        lock.project.path,
                        lock.workspace,
                        released,
                        total
                    ),
                    source: Box::new(e),
                }
            })?;
        }
        Ok(matched)
    }
}
