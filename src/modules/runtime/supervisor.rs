//! Worker supervision for development mode
//!
//! The supervisor runs the server in a child process (the worker) and
//! relaunches it whenever the worker asks for a restart or dies. Exactly one
//! worker runs at a time.

use mock_api_core::MockApiError;
use mock_api_types::StreamLine;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

/// Environment variable telling a worker whether it is the first launch
pub const INITIAL_ENV: &str = "MOCK_API_INITIAL";

/// Default time a worker gets to exit after its stdin is closed
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// How to launch a worker process
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerLauncher {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Relaunch the running executable with `args`
    pub fn current_exe(args: Vec<String>) -> Result<Self, MockApiError> {
        let program = std::env::current_exe().map_err(|e| {
            MockApiError::Supervisor(format!("Cannot locate the running executable: {}", e))
        })?;
        Ok(Self::new(program, args))
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn spawn(&self, initial: bool) -> Result<Child, MockApiError> {
        Command::new(&self.program)
            .args(&self.args)
            .env(INITIAL_ENV, initial.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MockApiError::Supervisor(format!(
                    "Failed to launch worker '{}': {}",
                    self.program.display(),
                    e
                ))
            })
    }
}

/// How a worker ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerExit {
    /// The worker asked for the restart
    pub requested: bool,
    pub uptime: Duration,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

/// Delay before relaunching a worker
///
/// Requested restarts and exits after a stable run use the base delay and
/// reset the backoff. Early unrequested exits double it up to a cap.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    base: Duration,
    max: Duration,
    stable_uptime: Duration,
    current: Duration,
}

impl RestartPolicy {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            max: Duration::from_secs(10),
            stable_uptime: Duration::from_secs(10),
            current: base,
        }
    }

    pub fn with_max(mut self, max: Duration) -> Self {
        self.max = max;
        self
    }

    pub fn with_stable_uptime(mut self, stable_uptime: Duration) -> Self {
        self.stable_uptime = stable_uptime;
        self
    }

    /// Delay to wait after `exit`
    pub fn next_delay(&mut self, exit: &WorkerExit) -> Duration {
        if exit.requested || exit.uptime >= self.stable_uptime {
            self.current = self.base;
            return self.base;
        }

        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

struct Worker {
    child: Child,
    started: Instant,
}

impl Worker {
    /// Ask the worker to exit
    fn close_stdin(&mut self) {
        drop(self.child.stdin.take());
    }

    /// Wait for the worker, killing it once `grace` has passed
    async fn wait_or_kill(&mut self, grace: Duration) -> Result<std::process::ExitStatus, MockApiError> {
        match time::timeout(grace, self.child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!("Worker did not exit within {:?}, killing it", grace);
                self.child.start_kill()?;
                Ok(self.child.wait().await?)
            }
        }
    }
}

/// Keeps one worker running and relaunches it on exit
pub struct Supervisor {
    launcher: WorkerLauncher,
    policy: RestartPolicy,
    grace: Duration,
    base_url: String,
}

impl Supervisor {
    pub fn new(launcher: WorkerLauncher, base_url: impl Into<String>) -> Self {
        Self {
            launcher,
            policy: RestartPolicy::default(),
            grace: DEFAULT_GRACE_PERIOD,
            base_url: base_url.into(),
        }
    }

    pub fn with_policy(mut self, policy: RestartPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Supervise workers until `shutdown` resolves
    pub async fn run_with_shutdown<F>(mut self, shutdown: F) -> Result<(), MockApiError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut initial = true;

        loop {
            let mut worker = self.launch(initial)?;
            initial = false;

            let exit = tokio::select! {
                exit = self.supervise(&mut worker) => exit?,
                _ = &mut shutdown => {
                    self.stop(&mut worker).await;
                    return Ok(());
                }
            };

            let delay = self.policy.next_delay(&exit);
            if exit.requested {
                debug!("Worker restarting in {:?}", delay);
            } else {
                warn!(
                    "Worker exited (code {:?}) after {:?}, relaunching in {:?}",
                    exit.code, exit.uptime, delay
                );
            }

            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = &mut shutdown => return Ok(()),
            }
        }
    }

    fn launch(&self, initial: bool) -> Result<Worker, MockApiError> {
        debug!("Launching worker (initial: {})", initial);
        let child = self.launcher.spawn(initial)?;
        Ok(Worker {
            child,
            started: Instant::now(),
        })
    }

    /// Pass worker output through until it exits or asks for a restart
    async fn supervise(&self, worker: &mut Worker) -> Result<WorkerExit, MockApiError> {
        let stdout = worker
            .child
            .stdout
            .take()
            .ok_or_else(|| MockApiError::Supervisor("Worker stdout is not captured".to_string()))?;
        if let Some(stderr) = worker.child.stderr.take() {
            tokio::spawn(report_stderr(stderr, self.base_url.clone()));
        }

        let mut lines = BufReader::new(stdout).lines();
        let mut requested = false;

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match StreamLine::parse(&line) {
                    StreamLine::Control(message) => {
                        debug!("Worker requested {:?}", message);
                        requested = true;
                        break;
                    }
                    StreamLine::Log(line) => println!("{}", line),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read worker output: {}", e);
                    break;
                }
            }
        }

        let status = if requested {
            tokio::spawn(pass_through(lines));
            worker.close_stdin();
            worker.wait_or_kill(self.grace).await?
        } else {
            worker.child.wait().await?
        };

        Ok(WorkerExit {
            requested,
            uptime: worker.started.elapsed(),
            code: status.code(),
        })
    }

    async fn stop(&self, worker: &mut Worker) {
        info!("Stopping Mock API server");
        worker.close_stdin();
        if let Err(e) = worker.child.start_kill() {
            debug!("Worker already gone: {}", e);
        }
        let _ = worker.child.wait().await;
    }
}

async fn pass_through(mut lines: Lines<BufReader<ChildStdout>>) {
    while let Ok(Some(line)) = lines.next_line().await {
        if let StreamLine::Log(line) = StreamLine::parse(&line) {
            println!("{}", line);
        }
    }
}

async fn report_stderr(stderr: ChildStderr, base_url: String) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        error!("> Mock API server crashed on ... {}\n{}", base_url, line);
    }
}
