//! Record types persisted by the lock and pull-status stores.
//!
//! All records are serialized as self-describing JSON so the backing file
//! stays inspectable with ordinary tooling. Values are copies: nothing
//! handed to or returned from a store aliases store-internal state.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One deployable infrastructure unit: a repository plus a relative path
/// within it. Pure value, no lifecycle of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub repo_full_name: String,
    pub path: String,
}

impl Project {
    pub fn new(repo_full_name: &str, path: &str) -> Self {
        Self {
            repo_full_name: repo_full_name.to_string(),
            path: path.to_string(),
        }
    }
}

/// An open change request. Identity is (hostname, base_repo, num); the
/// head commit advances as the author pushes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// VCS host the request lives on, e.g. "github.com".
    pub hostname: String,
    /// Full name of the base repository, e.g. "org/repo".
    pub base_repo: String,
    pub num: u64,
    pub head_commit: String,
}

/// A held lock on a (project, workspace) pair.
///
/// At most one of these exists at any time for a given pair; that is the
/// store's core guarantee. `time` is normalized to the local zone on read
/// since there is a single lock manager clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLock {
    pub project: Project,
    pub workspace: String,
    pub pull: PullRequest,
    pub time: DateTime<Local>,
}

/// Last known plan/apply outcome of a single run, as classified by the
/// caller. The store never derives these values itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPlanStatus {
    Planned,
    PlanErrored,
    Applied,
    ApplyErrored,
    Discarded,
}

impl fmt::Display for ProjectPlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectPlanStatus::Planned => "planned",
            ProjectPlanStatus::PlanErrored => "plan_errored",
            ProjectPlanStatus::Applied => "applied",
            ProjectPlanStatus::ApplyErrored => "apply_errored",
            ProjectPlanStatus::Discarded => "discarded",
        };
        write!(f, "{}", s)
    }
}

/// One project's entry inside a [`PullStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub workspace: String,
    pub repo_rel_dir: String,
    pub project_name: String,
    pub status: ProjectPlanStatus,
}

/// The merged status snapshot for one pull request.
///
/// Invariant: (workspace, repo_rel_dir, project_name) is unique across
/// `projects`. An empty `projects` list is a valid persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullStatus {
    pub pull: PullRequest,
    pub projects: Vec<ProjectStatus>,
}

/// An external run report for a single project, fed into
/// `update_with_results`. The status value arrives pre-derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectResult {
    pub workspace: String,
    pub repo_rel_dir: String,
    pub project_name: String,
    pub status: ProjectPlanStatus,
}

impl ProjectResult {
    /// The status classification supplied by the caller.
    pub fn derived_status(&self) -> ProjectPlanStatus {
        self.status
    }
}

impl From<&ProjectResult> for ProjectStatus {
    fn from(r: &ProjectResult) -> Self {
        ProjectStatus {
            workspace: r.workspace.clone(),
            repo_rel_dir: r.repo_rel_dir.clone(),
            project_name: r.project_name.clone(),
            status: r.derived_status(),
        }
    }
}
