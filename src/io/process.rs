//! Bounded subprocess execution for the external toolchain.
//!
//! Both collaborators (compiler and VM interpreter) run through here: spawn,
//! drain stdout/stderr on reader threads, wait with a wall-clock limit, kill
//! on overrun.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// What came back from one toolchain invocation.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes dropped past the capture limit, per stream.
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Lossy stderr text, for error reporting.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Spawn `cmd`, capture both output streams, and wait up to `timeout`.
///
/// The streams are drained concurrently so a chatty child cannot deadlock on
/// a full pipe. At most `output_limit_bytes` per stream is kept; the rest is
/// read and counted but discarded. On timeout the child is killed and
/// `timed_out` is set rather than returning an error, so callers decide what
/// an overrun means for them.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs()))]
pub fn run_command(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().context("spawn command")?;

    let out_pipe = child.stdout.take().context("stdout was not piped")?;
    let err_pipe = child.stderr.take().context("stderr was not piped")?;
    let out_reader = thread::spawn(move || drain(out_pipe, output_limit_bytes));
    let err_reader = thread::spawn(move || drain(err_pipe, output_limit_bytes));

    let (status, timed_out) = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => (status, false),
        None => {
            warn!(timeout_secs = timeout.as_secs(), "killing timed-out child");
            child.kill().context("kill command")?;
            (child.wait().context("reap killed command")?, true)
        }
    };

    let (stdout, stdout_truncated) = finish(out_reader).context("collect stdout")?;
    let (stderr, stderr_truncated) = finish(err_reader).context("collect stderr")?;
    if stdout_truncated + stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "capture limit reached");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

/// Read a pipe to EOF, keeping at most `limit` bytes. Returns the kept bytes
/// and the count of discarded ones.
fn drain<R: Read>(mut pipe: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut kept = Vec::new();
    let mut dropped = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = pipe.read(&mut chunk).context("read child output")?;
        if n == 0 {
            return Ok((kept, dropped));
        }
        let room = limit.saturating_sub(kept.len());
        let take = n.min(room);
        kept.extend_from_slice(&chunk[..take]);
        dropped += n - take;
    }
}

fn finish(reader: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    reader
        .join()
        .map_err(|_| anyhow!("output reader thread panicked"))?
}
