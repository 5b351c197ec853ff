//! Test harness invocation.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::surefire::SurefireParser;
use super::TestOutcome;

/// Exit code reported when the harness was killed at the deadline.
pub const EXIT_TIMEOUT: i32 = 124;
/// Exit code reported when the harness could not be started.
pub const EXIT_SPAWN_FAILURE: i32 = 127;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs a workspace's test suite.
pub trait TestRunner: Send + Sync {
    /// Never fails: harness problems are encoded in the outcome's exit code.
    fn run_tests(&self, workspace: &Path, timeout: Duration) -> TestOutcome;
}

/// `mvn -q test` followed by Surefire report parsing.
pub struct MavenTestRunner {
    command: String,
    reports: SurefireParser,
}

impl Default for MavenTestRunner {
    fn default() -> Self {
        Self::new("mvn")
    }
}

impl MavenTestRunner {
    pub fn new(command: impl Into<String>) -> Self {
        let mut command = command.into();
        if cfg!(windows) && !command.ends_with(".cmd") {
            command.push_str(".cmd");
        }
        Self {
            command,
            reports: SurefireParser::new(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl TestRunner for MavenTestRunner {
    fn run_tests(&self, workspace: &Path, timeout: Duration) -> TestOutcome {
        let start = Instant::now();
        let mut cmd = Command::new(&self.command);
        cmd.args(["-q", "test"])
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut outcome = execute_with_timeout(&mut cmd, timeout);
        outcome.duration_ms = start.elapsed().as_millis() as u64;
        if outcome.timed_out || outcome.exit_code == EXIT_SPAWN_FAILURE {
            return outcome;
        }

        let reports = workspace.join("target").join("surefire-reports");
        match self.reports.parse_dir(&reports) {
            Ok(summary) => {
                outcome.tests_run = summary.tests_run;
                outcome.failures = summary.failures;
                outcome.errors = summary.errors;
                outcome.skipped = summary.skipped;
                outcome.failed_test_ids = summary.failed_test_ids;
            }
            Err(e) => {
                outcome
                    .output
                    .push_str(&format!("\n\nSurefire report parsing failed: {e}"));
            }
        }
        outcome.all_passed =
            outcome.exit_code == 0 && outcome.failures == 0 && outcome.errors == 0;
        outcome
    }
}

/// Run `cmd` to completion or kill it at `timeout`.
///
/// Output is drained on background threads so a chatty child cannot block
/// on a full pipe. Output of a timed-out run is discarded.
fn execute_with_timeout(cmd: &mut Command, timeout: Duration) -> TestOutcome {
    let start = Instant::now();

    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            return TestOutcome {
                exit_code: EXIT_SPAWN_FAILURE,
                output: format!("failed to start test harness: {e}"),
                ..TestOutcome::default()
            }
        }
    };
    let readers = spawn_readers(&mut child);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return TestOutcome {
                    exit_code: status.code().unwrap_or(1),
                    all_passed: status.success(),
                    output: join_readers(readers),
                    ..TestOutcome::default()
                };
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    // forked JVMs can outlive the harness and hold the pipes
                    // open, so the readers are left detached
                    drop(readers);
                    return TestOutcome {
                        exit_code: EXIT_TIMEOUT,
                        timed_out: true,
                        output: format!(
                            "Test execution timed out after {} seconds.",
                            timeout.as_secs()
                        ),
                        ..TestOutcome::default()
                    };
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                return TestOutcome {
                    exit_code: 10,
                    output: format!("failed to wait for test harness: {e}"),
                    ..TestOutcome::default()
                };
            }
        }
    }
}

fn spawn_readers(child: &mut Child) -> Vec<JoinHandle<String>> {
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(std::thread::spawn(move || drain(stdout)));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(std::thread::spawn(move || drain(stderr)));
    }
    readers
}

fn drain(mut pipe: impl Read) -> String {
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn join_readers(readers: Vec<JoinHandle<String>>) -> String {
    readers
        .into_iter()
        .filter_map(|h| h.join().ok())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
