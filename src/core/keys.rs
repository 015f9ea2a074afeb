//! Key encoding for the two store namespaces.
//!
//! Keys are plain UTF-8 strings chosen so that SQLite's byte-wise TEXT
//! ordering gives us the range scans we need: every lock key for one
//! repository shares the `repo_full_name` prefix, so "all locks under this
//! repo" is a single ordered prefix scan with no secondary index.

use crate::core::error::{DriftlockError, Result};
use crate::core::models::{Project, PullRequest};

/// Separator for pull keys. Multi-character on purpose: it is rejected in
/// hostnames and repo names at encode time, so pull keys never alias.
pub const PULL_KEY_SEPARATOR: &str = "::";

/// Encodes the key for a (project, workspace) lock.
///
/// The components are joined with a bare "/" and never decoded back into
/// fields. A repo name or path containing "/" segments that line up with
/// another project's can in theory alias; this matches the original
/// relaxed behavior and is an accepted limitation.
pub fn lock_key(project: &Project, workspace: &str) -> String {
    format!("{}/{}/{}", project.repo_full_name, project.path, workspace)
}

/// Encodes the key for a pull-status record.
///
/// Fails with a validation error if the hostname or repo name contains the
/// separator, so a stored key always splits back unambiguously.
pub fn pull_key(pull: &PullRequest) -> Result<String> {
    if pull.hostname.contains(PULL_KEY_SEPARATOR) {
        return Err(DriftlockError::Validation(format!(
            "vcs hostname {:?} contains illegal string {:?}",
            pull.hostname, PULL_KEY_SEPARATOR
        )));
    }
    if pull.base_repo.contains(PULL_KEY_SEPARATOR) {
        return Err(DriftlockError::Validation(format!(
            "repo name {:?} contains illegal string {:?}",
            pull.base_repo, PULL_KEY_SEPARATOR
        )));
    }
    Ok(format!(
        "{}{sep}{}{sep}{}",
        pull.hostname,
        pull.base_repo,
        pull.num,
        sep = PULL_KEY_SEPARATOR
    ))
}
