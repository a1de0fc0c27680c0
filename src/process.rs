//! # Process Runner
//!
//! Executes an assembled argv either synchronously or on a tokio runtime and
//! captures both output streams into fixed-capacity buffers.
//!
//! A non-zero exit status is never an error here: it is reported in
//! [`ProcessResult::status`] for the caller to inspect. The synchronous path
//! returns [`Error::Spawn`] when the executable cannot be started at all; the
//! asynchronous path records the same failure in [`ProcessResult::error`].
//!
//! Captured output beyond the configured ceiling is dropped, keeping the
//! first `max_buffer` bytes of each stream. The child is still drained to
//! completion so that it never blocks on a full pipe.

use std::borrow::Cow;
use std::cell::OnceCell;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::defaults::DEFAULT_MAX_BUFFER;
use crate::error::{Error, Result};

const CHUNK_SIZE: usize = 8 * 1024;

/// Owned byte buffer that stops growing at a fixed capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundedBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    truncated: bool,
}

impl BoundedBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            capacity,
            truncated: false,
        }
    }

    /// Append a chunk, keeping only what still fits.
    pub fn push(&mut self, chunk: &[u8]) {
        let room = self.capacity.saturating_sub(self.bytes.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether any output was dropped because the buffer was full.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Options shared by the synchronous and asynchronous runners.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Capture ceiling in bytes, applied to each stream separately.
    pub max_buffer: usize,
    /// Working directory for the child. Inherits the caller's when unset.
    pub cwd: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_buffer: DEFAULT_MAX_BUFFER,
            cwd: None,
        }
    }
}

impl RunOptions {
    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Which stream a chunk was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Read-only snapshot of a finished (or never started) child process.
#[derive(Debug)]
pub struct ProcessResult {
    pid: Option<u32>,
    stdout: BoundedBuffer,
    stderr: BoundedBuffer,
    status: Option<i32>,
    signal: Option<i32>,
    error: Option<io::Error>,
    sanitized_stdout: OnceCell<Vec<String>>,
    sanitized_stderr: OnceCell<Vec<String>>,
    sanitized_output: OnceCell<Vec<String>>,
}

impl ProcessResult {
    fn new(
        pid: Option<u32>,
        stdout: BoundedBuffer,
        stderr: BoundedBuffer,
        exit: Option<ExitStatus>,
        error: Option<io::Error>,
    ) -> Self {
        let (status, signal) = exit.map(exit_parts).unwrap_or((None, None));
        Self {
            pid,
            stdout,
            stderr,
            status,
            signal,
            error,
            sanitized_stdout: OnceCell::new(),
            sanitized_stderr: OnceCell::new(),
            sanitized_output: OnceCell::new(),
        }
    }

    /// Build a result for a process that exited normally.
    ///
    /// Used by tool adapters' test doubles, which never spawn anything.
    pub fn from_output(status: i32, stdout: &str, stderr: &str) -> Self {
        let mut out = BoundedBuffer::new(stdout.len());
        out.push(stdout.as_bytes());
        let mut err = BoundedBuffer::new(stderr.len());
        err.push(stderr.as_bytes());

        let mut result = Self::new(None, out, err, None, None);
        result.status = Some(status);
        result
    }

    /// Build a result for a process that could not be started.
    pub fn from_error(error: io::Error) -> Self {
        Self::new(None, BoundedBuffer::default(), BoundedBuffer::default(), None, Some(error))
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit code, `None` when the process was terminated by a signal or
    /// never started.
    pub fn status(&self) -> Option<i32> {
        self.status
    }

    /// Terminating signal, if the process did not exit normally.
    pub fn signal(&self) -> Option<i32> {
        self.signal
    }

    pub fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    pub fn success(&self) -> bool {
        self.status == Some(0) && self.error.is_none()
    }

    pub fn stdout(&self) -> &[u8] {
        self.stdout.as_bytes()
    }

    pub fn stderr(&self) -> &[u8] {
        self.stderr.as_bytes()
    }

    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.stdout.as_bytes())
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.stderr.as_bytes())
    }

    pub fn is_truncated(&self) -> bool {
        self.stdout.is_truncated() || self.stderr.is_truncated()
    }

    /// Stdout split into trimmed, non-empty lines. Computed once.
    pub fn sanitized_stdout(&self) -> &[String] {
        self.sanitized_stdout
            .get_or_init(|| sanitize(&self.stdout_text()))
    }

    /// Stderr split into trimmed, non-empty lines. Computed once.
    pub fn sanitized_stderr(&self) -> &[String] {
        self.sanitized_stderr
            .get_or_init(|| sanitize(&self.stderr_text()))
    }

    /// Stdout followed by stderr.
    pub fn output(&self) -> String {
        let mut text = self.stdout_text().into_owned();
        text.push_str(&self.stderr_text());
        text
    }

    /// Sanitized stdout lines followed by sanitized stderr lines.
    pub fn sanitized_output(&self) -> &[String] {
        self.sanitized_output.get_or_init(|| {
            self.sanitized_stdout()
                .iter()
                .chain(self.sanitized_stderr())
                .cloned()
                .collect()
        })
    }
}

/// Split text on newlines, trim every line, and drop the empty ones.
pub fn sanitize(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(unix)]
fn exit_parts(status: ExitStatus) -> (Option<i32>, Option<i32>) {
    use std::os::unix::process::ExitStatusExt;
    (status.code(), status.signal())
}

#[cfg(not(unix))]
fn exit_parts(status: ExitStatus) -> (Option<i32>, Option<i32>) {
    (status.code(), None)
}

fn empty_command() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "empty command")
}

/// Run `argv` to completion, blocking the calling thread.
pub fn run_sync(argv: &[String], options: &RunOptions) -> Result<ProcessResult> {
    let command = argv.join(" ");
    let (program, args) = argv.split_first().ok_or_else(|| Error::Spawn {
        command: command.clone(),
        source: empty_command(),
    })?;

    let mut cmd = std::process::Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    let mut child = cmd.spawn().map_err(|source| Error::Spawn {
        command: command.clone(),
        source,
    })?;
    let pid = child.id();
    debug!("Spawned pid {} for: {}", pid, command);

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let max_buffer = options.max_buffer;

    let (stdout, stderr) = std::thread::scope(|scope| {
        let stdout_reader = scope.spawn(move || drain(stdout_pipe, max_buffer));
        let stderr = drain(stderr_pipe, max_buffer);
        let stdout = stdout_reader
            .join()
            .unwrap_or_else(|_| BoundedBuffer::new(max_buffer));
        (stdout, stderr)
    });

    let exit = child.wait()?;
    Ok(ProcessResult::new(Some(pid), stdout, stderr, Some(exit), None))
}

fn drain<R: Read>(pipe: Option<R>, capacity: usize) -> BoundedBuffer {
    let mut buffer = BoundedBuffer::new(capacity);
    let Some(mut pipe) = pipe else {
        return buffer;
    };

    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        match pipe.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buffer.push(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Failed reading child output: {}", e);
                break;
            }
        }
    }
    buffer
}

/// Spawn `argv` on the current tokio runtime.
///
/// Never fails: a spawn error is carried by the handle and surfaces as
/// [`ProcessResult::error`] once the handle is awaited.
///
/// # Panics
///
/// Must be called from within a tokio runtime.
pub fn spawn(argv: &[String], options: &RunOptions) -> ProcessHandle {
    let command = argv.join(" ");
    let Some((program, args)) = argv.split_first() else {
        return ProcessHandle::failed(command, empty_command(), options.max_buffer);
    };

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    match cmd.spawn() {
        Ok(child) => {
            let pid = child.id();
            debug!("Spawned pid {:?} for: {}", pid, command);
            ProcessHandle {
                command,
                pid,
                child: Some(child),
                error: None,
                max_buffer: options.max_buffer,
            }
        }
        Err(e) => ProcessHandle::failed(command, e, options.max_buffer),
    }
}

/// One in-flight child process started by [`spawn`].
#[derive(Debug)]
pub struct ProcessHandle {
    command: String,
    pid: Option<u32>,
    child: Option<tokio::process::Child>,
    error: Option<io::Error>,
    max_buffer: usize,
}

impl ProcessHandle {
    fn failed(command: String, error: io::Error, max_buffer: usize) -> Self {
        warn!("Failed to spawn '{}': {}", command, error);
        Self {
            command,
            pid: None,
            child: None,
            error: Some(error),
            max_buffer,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// The spawn error, if the child never started.
    pub fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    /// Ask the OS to terminate the child. A no-op if it never started.
    pub fn kill(&mut self) -> io::Result<()> {
        match self.child.as_mut() {
            Some(child) => child.start_kill(),
            None => Ok(()),
        }
    }

    /// Wait for the child to finish and return its snapshot.
    pub async fn wait(self) -> ProcessResult {
        self.wait_with(|_, _| {}).await
    }

    /// Wait for the child, handing each output chunk to `on_chunk` as it
    /// arrives.
    pub async fn wait_with<F>(mut self, mut on_chunk: F) -> ProcessResult
    where
        F: FnMut(OutputStream, &[u8]),
    {
        let mut stdout = BoundedBuffer::new(self.max_buffer);
        let mut stderr = BoundedBuffer::new(self.max_buffer);

        let Some(mut child) = self.child.take() else {
            return ProcessResult::new(self.pid, stdout, stderr, None, self.error.take());
        };

        let mut out = child.stdout.take();
        let mut err = child.stderr.take();
        let mut out_chunk = [0u8; CHUNK_SIZE];
        let mut err_chunk = [0u8; CHUNK_SIZE];
        let mut error = None;

        while out.is_some() || err.is_some() {
            tokio::select! {
                read = read_chunk(&mut out, &mut out_chunk), if out.is_some() => match read {
                    Ok(0) => out = None,
                    Ok(n) => {
                        on_chunk(OutputStream::Stdout, &out_chunk[..n]);
                        stdout.push(&out_chunk[..n]);
                    }
                    Err(e) => {
                        error = Some(e);
                        out = None;
                    }
                },
                read = read_chunk(&mut err, &mut err_chunk), if err.is_some() => match read {
                    Ok(0) => err = None,
                    Ok(n) => {
                        on_chunk(OutputStream::Stderr, &err_chunk[..n]);
                        stderr.push(&err_chunk[..n]);
                    }
                    Err(e) => {
                        error = Some(e);
                        err = None;
                    }
                },
            }
        }

        let exit = match child.wait().await {
            Ok(exit) => Some(exit),
            Err(e) => {
                error.get_or_insert(e);
                None
            }
        };

        ProcessResult::new(self.pid, stdout, stderr, exit, error)
    }
}

async fn read_chunk<R>(reader: &mut Option<R>, chunk: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader.as_mut() {
        Some(reader) => reader.read(chunk).await,
        None => Ok(0),
    }
}
