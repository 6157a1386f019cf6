use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use stencil_vcs::{CommandOutput, CommandRunner};

type Responder = Box<dyn Fn(&[String], &Path) -> CommandOutput + Send + Sync>;

struct Rule {
    prefix: Vec<String>,
    respond: Responder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl RecordedCall {
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.args.len() >= prefix.len() && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }
}

/// Scripted [`CommandRunner`]
///
/// Calls are matched against argument prefixes, the most recently added
/// rule first. Unmatched calls succeed with empty output. Every call is
/// recorded.
#[derive(Default)]
pub struct FakeRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl std::fmt::Debug for FakeRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeRunner")
            .field("rules", &self.rules.lock().len())
            .field("calls", &self.calls.lock().len())
            .finish()
    }
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer calls starting with `prefix` with `output`
    pub fn on(&self, prefix: &[&str], output: CommandOutput) -> &Self {
        self.on_with(prefix, move |_, _| output.clone())
    }

    /// Answer calls starting with `prefix` by running `respond`
    pub fn on_with<F>(&self, prefix: &[&str], respond: F) -> &Self
    where
        F: Fn(&[String], &Path) -> CommandOutput + Send + Sync + 'static,
    {
        self.rules.lock().push(Rule {
            prefix: prefix.iter().map(|s| (*s).to_string()).collect(),
            respond: Box::new(respond),
        });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Recorded argument lists joined with spaces
    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.args.join(" ")).collect()
    }

    pub fn called_with(&self, prefix: &[&str]) -> bool {
        self.position(prefix).is_some()
    }

    /// Index of the first call starting with `prefix`
    pub fn position(&self, prefix: &[&str]) -> Option<usize> {
        self.calls.lock().iter().position(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput> {
        self.calls.lock().push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        });

        let rules = self.rules.lock();
        let output = rules
            .iter()
            .rev()
            .find(|rule| {
                args.len() >= rule.prefix.len() && args.iter().zip(&rule.prefix).all(|(a, p)| a == p)
            })
            .map_or_else(|| CommandOutput::ok(""), |rule| (rule.respond)(args, cwd));
        Ok(output)
    }
}
