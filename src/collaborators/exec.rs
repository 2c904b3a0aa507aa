//! Subprocess execution for demo programs and linters
//!
//! Every child runs with piped output, `kill_on_drop`, and a wall-clock
//! timeout. A child that outlives its timeout is killed and reported as
//! timed out; it never blocks the scoring request.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Result from running an external process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Whether the process launched and exited (any exit code)
    pub completed: bool,
    pub stdout: String,
    pub stderr: String,
    pub return_code: Option<i32>,
    pub timed_out: bool,
    /// Launch or wait error
    pub error: Option<String>,
}

impl ProcessOutput {
    fn exited(stdout: String, stderr: String, return_code: Option<i32>) -> Self {
        Self {
            completed: true,
            stdout,
            stderr,
            return_code,
            ..Default::default()
        }
    }

    fn failure(error: String) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    fn timeout(label: &str, after: Duration) -> Self {
        Self {
            timed_out: true,
            error: Some(format!("{} timed out after {}s", label, after.as_secs())),
            ..Default::default()
        }
    }

    /// Exited with status 0
    pub fn succeeded(&self) -> bool {
        self.completed && self.return_code == Some(0)
    }

    /// Short human-readable reason for a failed run
    pub fn failure_reason(&self) -> String {
        if let Some(err) = &self.error {
            return err.clone();
        }
        let tail = self
            .stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .trim();
        match self.return_code {
            Some(code) if tail.is_empty() => format!("exited with status {code}"),
            Some(code) => format!("exited with status {code}: {tail}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Run `cmd` (program followed by arguments) with a timeout
pub async fn run_process(
    cmd: &[String],
    label: &str,
    timeout: Duration,
    cwd: Option<&Path>,
) -> ProcessOutput {
    run_process_with_env(cmd, label, timeout, cwd, &[]).await
}

/// [`run_process`] with extra environment variables for the child.
/// Values never appear in the child's argument list or in logs.
pub async fn run_process_with_env(
    cmd: &[String],
    label: &str,
    timeout: Duration,
    cwd: Option<&Path>,
    env: &[(String, String)],
) -> ProcessOutput {
    let Some((program, args)) = cmd.split_first() else {
        return ProcessOutput::failure("Empty command".to_string());
    };

    debug!("Running {}: {} {:?}", label, program, args);

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .envs(env.iter().map(|(k, v)| (k, v)));
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ProcessOutput::failure(format!("{} not found", program));
        }
        Err(e) => return ProcessOutput::failure(format!("Failed to run {}: {}", label, e)),
    };

    // Dropping the future on timeout drops the child, which kills it.
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => ProcessOutput::exited(
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code(),
        ),
        Ok(Err(e)) => ProcessOutput::failure(format!("Failed to wait for {}: {}", label, e)),
        Err(_) => {
            warn!("{} timed out after {}s", label, timeout.as_secs());
            ProcessOutput::timeout(label, timeout)
        }
    }
}

/// Interpreter command prefix for a demo file, chosen by extension.
/// `None` for files that cannot be executed.
pub fn interpreter_for(path: &Path, python: &str) -> Option<Vec<String>> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let prefix: Vec<&str> = match ext.as_str() {
        "py" => vec![python],
        "sh" => vec!["sh"],
        "js" | "mjs" => vec!["node"],
        "ipynb" => vec!["jupyter", "nbconvert", "--to", "notebook", "--execute", "--stdout"],
        _ => return None,
    };
    Some(prefix.into_iter().map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_interpreter_selection() {
        assert_eq!(
            interpreter_for(&PathBuf::from("demo.py"), "python3"),
            Some(vec!["python3".to_string()])
        );
        assert_eq!(
            interpreter_for(&PathBuf::from("run.SH"), "python3"),
            Some(vec!["sh".to_string()])
        );
        assert_eq!(
            interpreter_for(&PathBuf::from("nb/tour.ipynb"), "python3").map(|c| c[0].clone()),
            Some("jupyter".to_string())
        );
        assert_eq!(interpreter_for(&PathBuf::from("README.md"), "python3"), None);
        assert_eq!(interpreter_for(&PathBuf::from("Makefile"), "python3"), None);
    }

    #[tokio::test]
    async fn test_empty_command() {
        let out = run_process(&[], "nothing", Duration::from_secs(1), None).await;
        assert!(!out.succeeded());
        assert_eq!(out.error.as_deref(), Some("Empty command"));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let cmd = vec!["definitely-not-a-real-binary-7f3a".to_string()];
        let out = run_process(&cmd, "missing", Duration::from_secs(1), None).await;
        assert!(!out.completed);
        assert!(out.failure_reason().contains("not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_and_timeout() {
        let ok = vec!["sh".to_string(), "-c".to_string(), "exit 0".to_string()];
        assert!(run_process(&ok, "sh", Duration::from_secs(5), None).await.succeeded());

        let bad = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo boom >&2; exit 3".to_string(),
        ];
        let out = run_process(&bad, "sh", Duration::from_secs(5), None).await;
        assert!(out.completed);
        assert!(!out.succeeded());
        assert_eq!(out.failure_reason(), "exited with status 3: boom");

        let slow = vec!["sh".to_string(), "-c".to_string(), "sleep 5".to_string()];
        let out = run_process(&slow, "sleepy", Duration::from_millis(100), None).await;
        assert!(out.timed_out);
        assert!(!out.succeeded());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extra_environment() {
        let cmd = vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf %s \"$TRUSTCARD_TEST_VALUE\"".to_string(),
        ];
        let env = vec![("TRUSTCARD_TEST_VALUE".to_string(), "secret".to_string())];
        let out = run_process_with_env(&cmd, "sh", Duration::from_secs(5), None, &env).await;
        assert!(out.succeeded());
        assert_eq!(out.stdout, "secret");
    }
}
