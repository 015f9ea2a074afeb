use chrono::Local;
use driftlock::core::db::Store;
use driftlock::core::models::{Project, ProjectLock, PullRequest};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn pull(num: u64) -> PullRequest {
    PullRequest {
        hostname: "github.com".to_string(),
        base_repo: "org/repo".to_string(),
        num,
        head_commit: "abc123".to_string(),
    }
}

fn lock(repo: &str, path: &str, workspace: &str, pull_num: u64) -> ProjectLock {
    ProjectLock {
        project: Project::new(repo, path),
        workspace: workspace.to_string(),
        pull: pull(pull_num),
        time: Local::now(),
    }
}

#[test]
fn test_try_acquire_when_free() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    let candidate = lock("org/repo", "prod/vpc", "default", 1);
    let (acquired, holder) = store.try_acquire(candidate.clone()).unwrap();
    assert!(acquired);
    assert_eq!(holder, candidate);

    let held = store
        .get_lock(&candidate.project, &candidate.workspace)
        .unwrap();
    assert_eq!(held, Some(candidate));
}

#[test]
fn test_try_acquire_when_held_returns_holder_unchanged() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    let first = lock("org/repo", "prod/vpc", "default", 1);
    assert!(store.try_acquire(first.clone()).unwrap().0);

    let second = lock("org/repo", "prod/vpc", "default", 2);
    let (acquired, holder) = store.try_acquire(second).unwrap();
    assert!(!acquired);
    assert_eq!(holder, first);

    // The stored lock must still be the first one.
    let held = store.get_lock(&first.project, "default").unwrap().unwrap();
    assert_eq!(held.pull.num, 1);
}

#[test]
fn test_mutual_exclusion_under_concurrent_acquisition() {
    let tmp = tempdir().unwrap();
    let store = Arc::new(Store::open(tmp.path()).unwrap());

    let mut handles = Vec::new();
    for n in 0..8u64 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            store
                .try_acquire(lock("org/repo", "prod/vpc", "default", n))
                .unwrap()
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<_> = results.iter().filter(|(acquired, _)| *acquired).collect();
    assert_eq!(winners.len(), 1);

    // Every loser saw the winning lock as the holder.
    let winning = &winners[0].1;
    for (acquired, holder) in &results {
        if !acquired {
            assert_eq!(holder, winning);
        }
    }
}

#[test]
fn test_release_returns_lock_and_removes_it() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    let held = lock("org/repo", "prod/vpc", "default", 1);
    store.try_acquire(held.clone()).unwrap();

    let released = store.release(&held.project, "default").unwrap();
    assert_eq!(released, Some(held.clone()));
    assert_eq!(store.get_lock(&held.project, "default").unwrap(), None);
}

#[test]
fn test_release_absent_is_not_an_error() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    let other = lock("org/repo", "prod/vpc", "default", 1);
    store.try_acquire(other.clone()).unwrap();

    let released = store
        .release(&Project::new("org/repo", "staging/vpc"), "default")
        .unwrap();
    assert!(released.is_none());

    // Unrelated locks are unaffected.
    assert!(store.get_lock(&other.project, "default").unwrap().is_some());
}

#[test]
fn test_list_returns_locks_in_key_order() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    store.try_acquire(lock("org/zeta", "a", "default", 1)).unwrap();
    store.try_acquire(lock("org/alpha", "b", "default", 2)).unwrap();
    store.try_acquire(lock("org/alpha", "a", "default", 3)).unwrap();

    let locks = store.list_locks().unwrap();
    let repos: Vec<_> = locks
        .iter()
        .map(|l| format!("{}/{}", l.project.repo_full_name, l.project.path))
        .collect();
    assert_eq!(repos, vec!["org/alpha/a", "org/alpha/b", "org/zeta/a"]);
}

#[test]
fn test_release_all_for_pull_filters_prefix_and_pull_num() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    store.try_acquire(lock("org/repo", "prod/vpc", "default", 42)).unwrap();
    store.try_acquire(lock("org/repo", "prod/dns", "staging", 42)).unwrap();
    store.try_acquire(lock("org/repo", "prod/vpc", "staging", 43)).unwrap();
    store.try_acquire(lock("org/repo-other", "prod/vpc", "default", 42)).unwrap();

    let released = store.release_all_for_pull("org/repo", 42).unwrap();
    assert_eq!(released.len(), 2);
    for l in &released {
        assert_eq!(l.project.repo_full_name, "org/repo");
        assert_eq!(l.pull.num, 42);
    }

    // Pull 43 under the same repo and the sibling repo stay locked.
    assert!(store
        .get_lock(&Project::new("org/repo", "prod/vpc"), "staging")
        .unwrap()
        .is_some());
    assert!(store
        .get_lock(&Project::new("org/repo-other", "prod/vpc"), "default")
        .unwrap()
        .is_some());

    // The released locks are gone.
    assert!(store
        .get_lock(&Project::new("org/repo", "prod/vpc"), "default")
        .unwrap()
        .is_none());
    assert!(store
        .get_lock(&Project::new("org/repo", "prod/dns"), "staging")
        .unwrap()
        .is_none());
}

#[test]
fn test_release_all_for_pull_no_matches_is_empty() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path()).unwrap();

    store.try_acquire(lock("org/repo", "prod/vpc", "default", 1)).unwrap();
    let released = store.release_all_for_pull("org/missing", 1).unwrap();
    assert!(released.is_empty());
}
