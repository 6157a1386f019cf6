//! End-to-end upgrades against a real git
//!
//! Every test returns early when git is not installed.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use stencil_template::{CreateRequest, Engine, TemplateResolver};
use stencil_test_utils::{commit_all, git_available, init_repo, run_git, TemplateFixture};
use stencil_upgrade::{UpgradeOrchestrator, UpgradeOutcome, UpgradeRequest, TEMPLATE_BRANCH};
use stencil_vcs::{Git, ProcessRunner};

struct Setup {
    _root: tempfile::TempDir,
    fixture: TemplateFixture,
    engine: Engine<ProcessRunner>,
    project: PathBuf,
}

/// Generate `app` from the default fixture, commit it on `main` and return
/// everything needed to upgrade it
fn generated_repository(license: &str) -> Setup {
    let root = tempfile::tempdir().unwrap();
    let fixture = TemplateFixture::new();
    let engine = Engine::new(
        TemplateResolver::new(Git::new(ProcessRunner::new())),
        root.path().join("clones"),
    );
    let project = engine
        .create(
            &CreateRequest::new(fixture.reference())
                .with_output_dir(root.path())
                .with_parameter("name", "app")
                .with_parameter("license", license),
        )
        .unwrap();
    init_repo(&project);
    commit_all(&project, "Initial commit");
    Setup {
        _root: root,
        fixture,
        engine,
        project,
    }
}

/// Template revision adding a `python` parameter and two files
fn evolve_template(fixture: &TemplateFixture) {
    fixture
        .set_declared(&json!({
            "name": "Demo App",
            "project_slug": "{{ name|snakecase }}",
            "license": ["MIT", "BSD-3-Clause"],
            "python": "3.12"
        }))
        .write_file(".python-version", "{{ python }}\n")
        .write_file("CHANGELOG.md", "# Changes to {{ name }}\n");
}

fn head(dir: &Path) -> String {
    run_git(dir, &["rev-parse", "HEAD"])
}

#[test]
fn pristine_project_has_no_changes() {
    if !git_available() {
        return;
    }
    let setup = generated_repository("MIT");
    let before = head(&setup.project);

    let outcome = UpgradeOrchestrator::new(&setup.engine)
        .upgrade(&UpgradeRequest::new(&setup.project))
        .unwrap();

    assert_eq!(outcome, UpgradeOutcome::NoChanges);
    assert_eq!(head(&setup.project), before);
    assert!(!setup.project.join(".git").join(TEMPLATE_BRANCH).exists());
    let worktrees = run_git(&setup.project, &["worktree", "list", "--porcelain"]);
    assert_eq!(worktrees.lines().filter(|l| l.starts_with("worktree ")).count(), 1);
}

#[test]
fn template_changes_merge_alongside_local_edits() {
    if !git_available() {
        return;
    }
    let setup = generated_repository("BSD-3-Clause");
    fs::write(setup.project.join("README.md"), "# app\n\nLocal notes.\n").unwrap();
    fs::create_dir_all(setup.project.join("src")).unwrap();
    fs::write(setup.project.join("src/main.rs"), "fn main() {}\n").unwrap();
    commit_all(&setup.project, "Local work");
    evolve_template(&setup.fixture);

    let outcome = UpgradeOrchestrator::new(&setup.engine)
        .upgrade(&UpgradeRequest::new(&setup.project))
        .unwrap();

    assert_eq!(
        outcome,
        UpgradeOutcome::Merged {
            branch: TEMPLATE_BRANCH.to_string()
        }
    );
    let read = |relative: &str| fs::read_to_string(setup.project.join(relative)).unwrap();
    assert_eq!(read("README.md"), "# app\n\nLocal notes.\n");
    assert_eq!(read("src/main.rs"), "fn main() {}\n");
    assert_eq!(read("LICENSE"), "BSD-3-Clause\n");
    assert_eq!(read(".python-version"), "3.12\n");
    assert_eq!(read("CHANGELOG.md"), "# Changes to app\n");

    let record = setup.engine.store().load(&setup.project).unwrap();
    assert_eq!(record.context.get("license"), Some(&json!("BSD-3-Clause")));
    assert_eq!(record.context.get("python"), Some(&json!("3.12")));
    assert_eq!(record.context.get("name"), Some(&json!("app")));

    assert_eq!(run_git(&setup.project, &["status", "--porcelain"]), "");
    assert!(!setup.project.join(".git").join(TEMPLATE_BRANCH).exists());
}

#[test]
fn second_upgrade_after_merge_has_no_changes() {
    if !git_available() {
        return;
    }
    let setup = generated_repository("MIT");
    evolve_template(&setup.fixture);
    let orchestrator = UpgradeOrchestrator::new(&setup.engine);

    let first = orchestrator.upgrade(&UpgradeRequest::new(&setup.project)).unwrap();
    assert!(matches!(first, UpgradeOutcome::Merged { .. }));
    let merged = head(&setup.project);

    let second = orchestrator.upgrade(&UpgradeRequest::new(&setup.project)).unwrap();
    assert_eq!(second, UpgradeOutcome::NoChanges);
    assert_eq!(head(&setup.project), merged);
}

#[test]
fn deferred_merge_only_advances_template_branch() {
    if !git_available() {
        return;
    }
    let setup = generated_repository("MIT");
    evolve_template(&setup.fixture);
    let before = head(&setup.project);

    let outcome = UpgradeOrchestrator::new(&setup.engine)
        .upgrade(&UpgradeRequest::new(&setup.project).with_merge(false))
        .unwrap();

    assert_eq!(
        outcome,
        UpgradeOutcome::Deferred {
            branch: TEMPLATE_BRANCH.to_string()
        }
    );
    assert_eq!(head(&setup.project), before);
    assert!(!setup.project.join("CHANGELOG.md").exists());
    let on_branch = run_git(&setup.project, &["show", &format!("{TEMPLATE_BRANCH}:CHANGELOG.md")]);
    assert_eq!(on_branch, "# Changes to app");
    assert_eq!(
        run_git(&setup.project, &["log", "-1", "--format=%s", TEMPLATE_BRANCH]),
        "Updated from template"
    );
}

#[test]
fn overlapping_ignore_patterns_discard_template_changes() {
    if !git_available() {
        return;
    }
    let setup = generated_repository("MIT");
    setup.fixture.write_file("README.md", "# {{ name }}\n\nRewritten upstream.\n");
    let before = head(&setup.project);

    let outcome = UpgradeOrchestrator::new(&setup.engine)
        .upgrade(&UpgradeRequest::new(&setup.project).with_ignore(["README.md", "*.md"]))
        .unwrap();

    assert_eq!(outcome, UpgradeOutcome::NoChanges);
    assert_eq!(head(&setup.project), before);
    assert_eq!(fs::read_to_string(setup.project.join("README.md")).unwrap(), "# app\n");
}

#[test]
fn ignored_file_added_by_template_is_dropped() {
    if !git_available() {
        return;
    }
    let setup = generated_repository("MIT");
    evolve_template(&setup.fixture);

    let outcome = UpgradeOrchestrator::new(&setup.engine)
        .upgrade(&UpgradeRequest::new(&setup.project).with_ignore(["CHANGELOG.md"]))
        .unwrap();

    assert!(matches!(outcome, UpgradeOutcome::Merged { .. }));
    assert!(!setup.project.join("CHANGELOG.md").exists());
    assert_eq!(
        fs::read_to_string(setup.project.join(".python-version")).unwrap(),
        "3.12\n"
    );
    let on_branch = run_git(&setup.project, &["ls-tree", "--name-only", TEMPLATE_BRANCH]);
    assert!(!on_branch.lines().any(|path| path == "CHANGELOG.md"));
    assert_eq!(run_git(&setup.project, &["status", "--porcelain"]), "");
}

#[test]
fn ignore_pattern_matching_nothing_is_harmless() {
    if !git_available() {
        return;
    }
    let setup = generated_repository("MIT");
    evolve_template(&setup.fixture);

    let outcome = UpgradeOrchestrator::new(&setup.engine)
        .upgrade(&UpgradeRequest::new(&setup.project).with_ignore(["docs"]))
        .unwrap();

    assert!(matches!(outcome, UpgradeOutcome::Merged { .. }));
    assert_eq!(
        fs::read_to_string(setup.project.join("CHANGELOG.md")).unwrap(),
        "# Changes to app\n"
    );
}

#[test]
fn subdirectory_project_upgrades_in_place() {
    if !git_available() {
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let fixture = TemplateFixture::new();
    let engine = Engine::new(
        TemplateResolver::new(Git::new(ProcessRunner::new())),
        root.path().join("clones"),
    );
    let mono = root.path().join("mono");
    init_repo(&mono);
    fs::write(mono.join("other.txt"), "untouched\n").unwrap();
    let project = engine
        .create(
            &CreateRequest::new(fixture.reference())
                .with_output_dir(mono.join("services"))
                .with_parameter("name", "api"),
        )
        .unwrap();
    commit_all(&mono, "Initial commit");
    evolve_template(&fixture);

    let outcome = UpgradeOrchestrator::new(&engine)
        .upgrade(&UpgradeRequest::new(&project))
        .unwrap();

    assert!(matches!(outcome, UpgradeOutcome::Merged { .. }));
    assert_eq!(
        fs::read_to_string(project.join("CHANGELOG.md")).unwrap(),
        "# Changes to api\n"
    );
    assert_eq!(fs::read_to_string(mono.join("other.txt")).unwrap(), "untouched\n");
    let changed = run_git(&mono, &["diff", "--name-only", "HEAD~1", "HEAD"]);
    assert!(changed.lines().all(|path| path.starts_with("services/api/")));
}
