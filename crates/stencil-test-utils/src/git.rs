use std::path::Path;
use std::process::Command;

/// Whether a usable `git` is on `PATH`; real-git tests return early without it
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Run git in `dir`, panicking on failure, and return trimmed stdout
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialise a repository on `main` with a local identity
pub fn init_repo(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    run_git(dir, &["init", "-q"]);
    run_git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    run_git(dir, &["config", "user.email", "stencil@example.com"]);
    run_git(dir, &["config", "user.name", "Stencil Tests"]);
    run_git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Stage everything and commit
pub fn commit_all(dir: &Path, message: &str) {
    run_git(dir, &["add", "-A", "."]);
    run_git(dir, &["commit", "-q", "-m", message]);
}
