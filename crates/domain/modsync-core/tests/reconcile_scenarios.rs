use modsync_core::{plan_deletes, plan_downloads, LocalFileSet, RemoteEntry};

// --- Helper Functions to build listings easily ---

fn remote(names: &[&str]) -> Vec<RemoteEntry> {
    names
        .iter()
        .map(|n| RemoteEntry::file(*n, Some(100)))
        .collect()
}

fn local(names: &[&str]) -> LocalFileSet {
    names.iter().copied().collect()
}

// --- Tests ---

#[test]
fn test_empty_local_downloads_only_jars() {
    let remote = remote(&["a.jar", "b.jar", "readme.txt"]);
    let plan = plan_downloads(&remote, &LocalFileSet::new(), ".jar");

    let names: Vec<_> = plan.fetches().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a.jar", "b.jar"]);
    assert_eq!(plan.skips().count(), 0);
}

#[test]
fn test_existing_file_is_skipped_and_extra_is_deleted() {
    let remote = remote(&["a.jar"]);
    let local = local(&["a.jar", "old.jar"]);

    let plan = plan_downloads(&remote, &local, ".jar");
    assert_eq!(plan.fetches().count(), 0, "a.jar exists locally, nothing to fetch");
    assert_eq!(plan.skips().collect::<Vec<_>>(), vec!["a.jar"]);

    let deletes = plan_deletes(&local, &remote);
    assert_eq!(deletes, vec!["old.jar".to_string()]);
}

#[test]
fn test_second_pass_is_a_noop() {
    let remote = remote(&["a.jar", "b.jar", "readme.txt"]);
    // Local state after a first pass over this listing.
    let local = local(&["a.jar", "b.jar"]);

    let plan = plan_downloads(&remote, &local, ".jar");
    assert_eq!(plan.fetches().count(), 0);
    assert_eq!(plan.skips().count(), 2);
    assert!(plan_deletes(&local, &remote).is_empty());
}

#[test]
fn test_suffix_match_is_case_sensitive() {
    let remote = remote(&["UPPER.JAR", "lower.jar"]);
    let plan = plan_downloads(&remote, &LocalFileSet::new(), ".jar");
    let names: Vec<_> = plan.fetches().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["lower.jar"]);
}

#[test]
fn test_empty_remote_deletes_everything() {
    let local = local(&["a.jar", "config.txt"]);
    let deletes = plan_deletes(&local, &[]);
    assert_eq!(deletes.len(), 2);
}

#[test]
fn test_stale_part_file_is_deleted() {
    let remote = remote(&["a.jar"]);
    let local = local(&["a.jar", "b.jar.part"]);
    assert_eq!(plan_deletes(&local, &remote), vec!["b.jar.part".to_string()]);
}
