//! Subprocess execution with captured output, timeouts and cancellation.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long output is still collected after killing a process. Grandchildren
/// may keep the pipes open well past that.
const KILL_GRACE: Duration = Duration::from_secs(1);

/// Shared flag telling running work to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a process was stopped before it exited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Cancelled,
    TimedOut,
}

/// Result of running a process to completion or interruption.
#[derive(Debug, Clone)]
pub struct Captured {
    /// Exit code; `None` when killed by a signal or interrupted.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub interrupted: Option<Interrupt>,
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string_lossy().into_owned()));
        self
    }

    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn get_program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    /// Run to completion, capturing both output streams.
    ///
    /// The process is killed when `cancel` fires or `timeout` elapses; what it
    /// wrote until then is still returned.
    pub fn exec(
        &self,
        cancel: Option<&CancelToken>,
        timeout: Option<Duration>,
    ) -> Result<Captured> {
        let mut child = self
            .build_command()
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        let stdout = child.stdout.take().map(|s| Drain::spawn(s, "stdout"));
        let stderr = child.stderr.take().map(|s| Drain::spawn(s, "stderr"));

        let started = Instant::now();
        let mut interrupted = None;
        let status = loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("failed to wait for `{}`", self.program.display()))?
            {
                break Some(status);
            }
            if cancel.is_some_and(CancelToken::is_cancelled) {
                interrupted = Some(Interrupt::Cancelled);
            } else if timeout.is_some_and(|t| started.elapsed() >= t) {
                interrupted = Some(Interrupt::TimedOut);
            }
            if interrupted.is_some() {
                kill(&mut child, &self.program);
                break None;
            }
            thread::sleep(POLL_INTERVAL);
        };

        let deadline = interrupted.map(|_| Instant::now() + KILL_GRACE);
        Ok(Captured {
            code: status.and_then(|s| s.code()),
            stdout: stdout.map(|d| d.collect(deadline)).unwrap_or_default(),
            stderr: stderr.map(|d| d.collect(deadline)).unwrap_or_default(),
            interrupted,
        })
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Output stream read on its own thread into a shared buffer.
struct Drain {
    buffer: Arc<Mutex<Vec<u8>>>,
    /// Disconnects when the reading thread ends.
    done: mpsc::Receiver<()>,
}

impl Drain {
    fn spawn<R: Read + Send + 'static>(mut stream: R, label: &'static str) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done) = mpsc::channel::<()>();
        let shared = Arc::clone(&buffer);
        thread::spawn(move || {
            let _done = done_tx;
            let mut chunk = [0u8; 8192];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => lock(&shared).extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::debug!("failed to read {}: {}", label, e);
                        break;
                    }
                }
            }
        });
        Drain { buffer, done }
    }

    /// Wait for the stream to close, or until `deadline`, and return what
    /// was read.
    fn collect(self, deadline: Option<Instant>) -> String {
        match deadline {
            // Nothing is ever sent, so both waits end on disconnect.
            None => {
                let _ = self.done.recv();
            }
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if let Err(RecvTimeoutError::Timeout) = self.done.recv_timeout(left) {
                    tracing::debug!("output still open after kill, keeping what was read");
                }
            }
        }
        String::from_utf8_lossy(&lock(&self.buffer)).into_owned()
    }
}

fn lock(buffer: &Mutex<Vec<u8>>) -> std::sync::MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn kill(child: &mut Child, program: &Path) {
    if let Err(e) = child.kill() {
        tracing::warn!("failed to kill `{}`: {}", program.display(), e);
    }
    if let Err(e) = child.wait() {
        tracing::debug!("failed to reap `{}`: {}", program.display(), e);
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
