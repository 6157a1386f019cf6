//! Testing utilities for the stencil workspace
//!
//! Shared fakes, template fixtures and real-git helpers.

#![allow(missing_docs)]

mod fake;
mod fixture;
mod git;

pub use fake::{FakeRunner, RecordedCall};
pub use fixture::TemplateFixture;
pub use git::{commit_all, git_available, init_repo, run_git};
