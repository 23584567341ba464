//! Server health probes.
//!
//! A probe starts a server in the background, waits a fixed grace period,
//! issues a single health request and then stops the server. The server is
//! owned by a [`BackgroundProcess`] guard so it is stopped on every path,
//! including when the probe future is dropped mid-flight.

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::command::CommandSpec;
use crate::error::{RunnerError, RunnerResult};

/// Configuration of one server probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSpec {
    /// Server command
    pub command: CommandSpec,
    /// Host the health request is sent to
    pub host: String,
    /// Port the server listens on
    pub port: u16,
    /// Health endpoint path
    pub path: String,
    /// How long the server gets to start before the request
    pub grace: Duration,
    /// Timeout of the health request
    pub request_timeout: Duration,
    /// How long the server gets to exit after SIGTERM
    pub shutdown_grace: Duration,
}

impl ProbeSpec {
    pub fn new(command: CommandSpec, port: u16) -> Self {
        Self {
            command,
            host: "localhost".to_string(),
            port,
            path: "/healthz".to_string(),
            grace: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(5),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// The health check URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Outcome of a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Whether the endpoint answered with a 2xx status
    pub healthy: bool,
    /// HTTP status, if a response arrived
    pub status: Option<u16>,
    /// Human-readable explanation
    pub detail: String,
    /// PID of the server process that was started
    pub pid: Option<u32>,
}

impl ProbeResult {
    pub fn healthy(status: u16) -> Self {
        Self {
            healthy: true,
            status: Some(status),
            detail: format!("responded with {}", status),
            pid: None,
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            healthy: false,
            status: None,
            detail: detail.into(),
            pid: None,
        }
    }
}

/// A server process running for the duration of a probe.
///
/// The process runs in its own process group on Unix so that wrappers such
/// as `uv run` are stopped together with the server they launched. Dropping
/// the guard without calling [`shutdown`](Self::shutdown) kills the group.
pub struct BackgroundProcess {
    child: Child,
    pid: Option<u32>,
    command: String,
    stopped: bool,
}

impl BackgroundProcess {
    /// Spawn a command in the background with its output discarded.
    pub fn spawn(spec: &CommandSpec) -> RunnerResult<Self> {
        if spec.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }

        let mut cmd = Command::new(spec.resolved_program());
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            command: spec.to_string(),
            source,
        })?;
        let pid = child.id();
        debug!("Started background process {:?}: {}", pid, spec);

        Ok(Self {
            child,
            pid,
            command: spec.to_string(),
            stopped: false,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit code if the process has already exited.
    pub fn exit_code(&mut self) -> RunnerResult<Option<i32>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| status.code().unwrap_or(-1)))
    }

    /// Stop the process: SIGTERM to the group, then SIGKILL once
    /// `grace` has elapsed. Waits for the child before returning.
    pub async fn shutdown(mut self, grace: Duration) -> RunnerResult<()> {
        self.stopped = true;

        if self.child.try_wait()?.is_none() {
            if !self.signal("TERM").await {
                warn!(
                    "Could not signal the process group of {}, killing the server only",
                    self.command
                );
                self.child.start_kill()?;
            }
            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(status) => {
                    debug!("Background process exited: {:?}", status?);
                }
                Err(_) => {
                    warn!(
                        "{} did not exit within {:?}, killing it",
                        self.command, grace
                    );
                    self.child.kill().await?;
                }
            }
        }

        // Leftover children of the server share its process group.
        self.signal("KILL").await;
        Ok(())
    }

    /// Send `signal` to the whole process group.
    ///
    /// Goes through the `kill` utility, so it needs `kill` on PATH. Returns
    /// false when the group could not be signalled, in which case only the
    /// direct child can be stopped and its own children may outlive it.
    #[cfg(unix)]
    async fn signal(&self, signal: &str) -> bool {
        let Some(pid) = self.pid else {
            return false;
        };
        Command::new("kill")
            .arg(format!("-{}", signal))
            .arg("--")
            .arg(format!("-{}", pid))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    async fn signal(&self, _signal: &str) -> bool {
        false
    }
}

impl Drop for BackgroundProcess {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        warn!("Background process {} dropped while running, killing it", self.command);
        // Drop cannot await; `kill -KILL` returns immediately.
        #[cfg(unix)]
        if let Some(pid) = self.pid {
            let killed = std::process::Command::new("kill")
                .arg("-KILL")
                .arg("--")
                .arg(format!("-{}", pid))
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false);
            if !killed {
                warn!(
                    "Could not kill the process group of {}; processes it started may still be running",
                    self.command
                );
            }
        }
        // kill_on_drop takes care of the child itself
    }
}

/// Runs server probes.
#[derive(Clone)]
pub struct ServerProbe {
    client: reqwest::Client,
}

impl ServerProbe {
    pub fn new() -> RunnerResult<Self> {
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self { client })
    }

    /// Start the server, check it once, and stop it.
    pub async fn run(&self, spec: &ProbeSpec) -> RunnerResult<ProbeResult> {
        info!("Starting server briefly: {}", spec.command);
        let mut process = BackgroundProcess::spawn(&spec.command)?;
        let pid = process.pid();

        tokio::time::sleep(spec.grace).await;
        let mut result = self.check(&mut process, spec).await;
        result.pid = pid;

        process.shutdown(spec.shutdown_grace).await?;
        Ok(result)
    }

    async fn check(&self, process: &mut BackgroundProcess, spec: &ProbeSpec) -> ProbeResult {
        match process.exit_code() {
            Ok(Some(code)) => {
                return ProbeResult::unhealthy(format!(
                    "server exited with code {} before the health check",
                    code
                ))
            }
            Ok(None) => {}
            Err(e) => return ProbeResult::unhealthy(format!("cannot inspect server: {}", e)),
        }

        let url = spec.url();
        debug!("GET {}", url);
        match self
            .client
            .get(&url)
            .timeout(spec.request_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                ProbeResult::healthy(response.status().as_u16())
            }
            Ok(response) => ProbeResult {
                status: Some(response.status().as_u16()),
                ..ProbeResult::unhealthy(format!("{} responded with {}", url, response.status()))
            },
            Err(e) => ProbeResult::unhealthy(format!("{} unreachable: {}", url, e)),
        }
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    /// Whether a process is alive (zombies count as gone).
    fn is_running(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .and_then(|rest| rest.split_whitespace().next())
                .map(|state| state != "Z" && state != "X")
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn quick(spec: ProbeSpec) -> ProbeSpec {
        spec.host("127.0.0.1")
            .grace(Duration::from_millis(200))
            .request_timeout(Duration::from_secs(1))
            .shutdown_grace(Duration::from_secs(2))
    }

    #[test]
    fn test_url() {
        let spec = ProbeSpec::new(CommandSpec::parse("server"), 18080);
        assert_eq!(spec.url(), "http://localhost:18080/healthz");
    }

    #[tokio::test]
    async fn test_unhealthy_probe_stops_server() {
        let spec = quick(ProbeSpec::new(CommandSpec::parse("sleep 30"), free_port()));

        let result = ServerProbe::new().unwrap().run(&spec).await.unwrap();

        assert!(!result.healthy);
        assert!(result.detail.contains("unreachable"));
        let pid = result.pid.expect("pid recorded");
        assert!(!is_running(pid), "server {} still running", pid);
    }

    #[tokio::test]
    async fn test_server_exiting_early() {
        let spec = quick(ProbeSpec::new(CommandSpec::parse("false"), free_port()));

        let result = ServerProbe::new().unwrap().run(&spec).await.unwrap();

        assert!(!result.healthy);
        assert!(result.detail.contains("exited with code 1"));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let spec = quick(ProbeSpec::new(
            CommandSpec::parse("stencil-no-such-server --port 1"),
            free_port(),
        ));

        let err = ServerProbe::new().unwrap().run(&spec).await.unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_dropped_guard_kills_process() {
        let process = BackgroundProcess::spawn(&CommandSpec::parse("sleep 30")).unwrap();
        let pid = process.pid().unwrap();
        assert!(is_running(pid));

        drop(process);

        let mut gone = false;
        for _ in 0..50 {
            if !is_running(pid) {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(gone, "process {} survived its guard", pid);
    }

    async fn wait_until_gone(pid: u32) -> bool {
        for _ in 0..50 {
            if !is_running(pid) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    /// Start a script that backgrounds `sleep` and records its pid.
    async fn spawn_with_grandchild(dir: &std::path::Path) -> (BackgroundProcess, u32) {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("server.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 30 &\necho $! > grandchild.pid\nwait\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let process =
            BackgroundProcess::spawn(&CommandSpec::parse("./server.sh").cwd(dir)).unwrap();
        let pid_file = dir.join("grandchild.pid");
        for _ in 0..50 {
            if let Ok(pid) = std::fs::read_to_string(&pid_file) {
                if let Ok(pid) = pid.trim().parse() {
                    return (process, pid);
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("server.sh never recorded its child");
    }

    #[tokio::test]
    async fn test_dropped_guard_kills_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let (process, grandchild) = spawn_with_grandchild(dir.path()).await;
        assert!(is_running(grandchild));

        drop(process);

        assert!(
            wait_until_gone(grandchild).await,
            "grandchild {} survived its guard",
            grandchild
        );
    }

    #[tokio::test]
    async fn test_shutdown_stops_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let (process, grandchild) = spawn_with_grandchild(dir.path()).await;
        let pid = process.pid().unwrap();

        process.shutdown(Duration::from_secs(2)).await.unwrap();

        assert!(!is_running(pid));
        assert!(
            wait_until_gone(grandchild).await,
            "grandchild {} survived shutdown",
            grandchild
        );
    }
}
