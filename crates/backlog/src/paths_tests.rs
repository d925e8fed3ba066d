// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lv_core::test_support::{docs_policy, TaskBuilder};
use yare::parameterized;

#[parameterized(
    plain = { "docs/README.md", "docs/README.md" },
    dir_prefix = { "docs/", "docs/" },
    nested = { "a/b/c.txt", "a/b/c.txt" },
)]
fn normalize_accepts(input: &str, expected: &str) {
    assert_eq!(normalize_path(input).unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    root = { "/" },
    leading_slash = { "/docs/x" },
    dotdot = { "docs/../secrets" },
    dotdot_leading = { "../outside" },
    dot = { "docs/./x" },
    double_slash = { "docs//x" },
    backslash = { "docs\\x" },
)]
fn normalize_rejects(input: &str) {
    assert!(normalize_path(input).is_err(), "{input:?} should be rejected");
}

#[parameterized(
    inside_dir = { "docs/README.md", true },
    dir_itself = { "docs/", true },
    dir_without_slash = { "docs", true },
    deep = { "docs/guides/setup.md", true },
    naked_prefix = { "docs2/readme.md", false },
    sibling = { "src/lib.rs", false },
    traversal = { "docs/../src/lib.rs", false },
    absolute = { "/docs/README.md", false },
)]
fn containment_under_docs_prefix(path: &str, expected: bool) {
    let policy = docs_policy(); // allows "docs/"
    assert_eq!(is_path_within_policy(path, &policy), expected);
}

#[test]
fn concrete_file_prefix_matches_only_itself() {
    let mut policy = docs_policy();
    policy.allowed_path_prefixes = vec!["docs/README.md".to_string()];

    assert!(is_path_within_policy("docs/README.md", &policy));
    assert!(!is_path_within_policy("docs/README.md.bak", &policy));
    assert!(!is_path_within_policy("docs/other.md", &policy));
}

#[test]
fn unslashed_directory_prefix_is_still_boundary_safe() {
    let mut policy = docs_policy();
    policy.allowed_path_prefixes = vec!["docs".to_string()];

    assert!(is_path_within_policy("docs/README.md", &policy));
    assert!(!is_path_within_policy("docs2/readme.md", &policy));
}

#[test]
fn task_scope_requires_every_path_allowed() {
    let policy = docs_policy();

    let in_scope = TaskBuilder::new("a").allowed_paths(&["docs/one.md", "docs/two.md"]).build();
    assert!(is_task_in_scope(&in_scope, &policy));

    let partially_out =
        TaskBuilder::new("b").allowed_paths(&["docs/one.md", "docs2/notes.md"]).build();
    assert!(!is_task_in_scope(&partially_out, &policy));

    let empty = TaskBuilder::new("c").allowed_paths(&[]).build();
    assert!(!is_task_in_scope(&empty, &policy));
}

#[test]
fn containment_is_case_sensitive() {
    let policy = docs_policy();
    assert!(!is_path_within_policy("Docs/README.md", &policy));
}
