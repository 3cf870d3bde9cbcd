//! Default channel backed by the local toolset.
//!
//! Mutating kinds shell out to the classic tools (`rm`, `mkdir`, `mv`,
//! `cp`, `ln`, `chmod`, `mount`); read-only kinds are answered in-process
//! from `fs::meta`. Stderr text and errno values are mapped onto the raw
//! `ChannelError` vocabulary here; classification into the public taxonomy
//! stays with the broker.

use std::ffi::OsString;
use std::io;
use std::io::Read as _;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use log::debug;

use crate::constants::{CMD_POLL_MS, DEFAULT_CMD_TIMEOUT_MS};
use crate::fs::meta;
use crate::types::{ExecUnit, UnitOutput};

use super::{AllocationError, Channel, ChannelError, ChannelProvider};

/// Channel that realizes the operation catalog against the local system.
pub struct LocalShellChannel {
    timeout: Duration,
}

impl LocalShellChannel {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn run_tool(&self, tool: &str, args: Vec<OsString>) -> Result<(), ChannelError> {
        debug!("local channel: {tool} {args:?}");
        let mut child = Command::new(tool)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let mut detail = String::new();
                    if let Some(mut err) = child.stderr.take() {
                        let _ = err.read_to_string(&mut detail);
                    }
                    if status.success() {
                        return Ok(());
                    }
                    return Err(classify_stderr(detail.trim()));
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ChannelError::Timeout);
                    }
                    std::thread::sleep(Duration::from_millis(CMD_POLL_MS));
                }
                Err(e) => return Err(ChannelError::Failed(e.to_string())),
            }
        }
    }
}

impl Channel for LocalShellChannel {
    fn run(&mut self, unit: ExecUnit) -> Result<UnitOutput, ChannelError> {
        match unit {
            ExecUnit::DeleteFile { path } => self
                .run_tool("rm", vec![path.into_os_string()])
                .map(|()| UnitOutput::Done),
            ExecUnit::DeleteDir { path } => self
                .run_tool("rm", vec![OsString::from("-r"), path.into_os_string()])
                .map(|()| UnitOutput::Done),
            ExecUnit::CreateFile { path } => self
                .run_tool("touch", vec![path.into_os_string()])
                .map(|()| UnitOutput::Done),
            ExecUnit::CreateDir { path } => self
                .run_tool("mkdir", vec![path.into_os_string()])
                .map(|()| UnitOutput::Done),
            ExecUnit::CreateLink { target, link } => self
                .run_tool(
                    "ln",
                    vec![
                        OsString::from("-s"),
                        target.into_os_string(),
                        link.into_os_string(),
                    ],
                )
                .map(|()| UnitOutput::Done),
            ExecUnit::Move { src, dst } => self
                .run_tool("mv", vec![src.into_os_string(), dst.into_os_string()])
                .map(|()| UnitOutput::Done),
            ExecUnit::Copy { src, dst } => self
                .run_tool(
                    "cp",
                    vec![
                        OsString::from("-r"),
                        src.into_os_string(),
                        dst.into_os_string(),
                    ],
                )
                .map(|()| UnitOutput::Done),
            ExecUnit::ChangePerms { path, mode } => self
                .run_tool(
                    "chmod",
                    vec![OsString::from(format!("{mode:o}")), path.into_os_string()],
                )
                .map(|()| UnitOutput::Done),
            ExecUnit::Remount { mount, mode } => self
                .run_tool(
                    "mount",
                    vec![
                        OsString::from("-o"),
                        OsString::from(format!("remount,{}", mode.as_option())),
                        OsString::from(mount.device),
                        mount.path.into_os_string(),
                    ],
                )
                .map(|()| UnitOutput::Done),
            ExecUnit::List { dir } => meta::list_dir(&dir)
                .map(UnitOutput::Listing)
                .map_err(|e| classify_io(&e)),
            ExecUnit::Info {
                path,
                follow_symlinks,
            } => meta::stat_fso(&path, follow_symlinks)
                .map(UnitOutput::Entry)
                .map_err(|e| classify_io(&e)),
            ExecUnit::ResolveLink { path } => meta::resolve_link(&path)
                .map(UnitOutput::Entry)
                .map_err(|e| classify_io(&e)),
        }
    }
}

fn spawn_error(err: io::Error) -> ChannelError {
    if err.kind() == io::ErrorKind::NotFound {
        ChannelError::Unsupported
    } else {
        ChannelError::Failed(err.to_string())
    }
}

fn classify_stderr(detail: &str) -> ChannelError {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("read-only file system") {
        ChannelError::ReadOnly
    } else if lower.contains("permission denied")
        || lower.contains("operation not permitted")
        || lower.contains("must be superuser")
        || lower.contains("only root")
    {
        ChannelError::PermissionDenied
    } else if lower.contains("no such file or directory") {
        ChannelError::NotFound
    } else {
        ChannelError::Failed(detail.to_string())
    }
}

fn classify_io(err: &io::Error) -> ChannelError {
    match err.raw_os_error() {
        Some(libc::ENOENT) => ChannelError::NotFound,
        Some(libc::EACCES | libc::EPERM) => ChannelError::PermissionDenied,
        Some(libc::EROFS) => ChannelError::ReadOnly,
        Some(libc::ETIMEDOUT) => ChannelError::Timeout,
        _ => ChannelError::Failed(err.to_string()),
    }
}

/// Default provider: a local channel with the policy's command timeout.
#[derive(Debug, Clone)]
pub struct LocalChannelProvider {
    timeout: Duration,
}

impl LocalChannelProvider {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for LocalChannelProvider {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_CMD_TIMEOUT_MS))
    }
}

impl ChannelProvider for LocalChannelProvider {
    fn allocate(&self) -> Result<Box<dyn Channel>, AllocationError> {
        Ok(Box::new(LocalShellChannel::new(self.timeout)))
    }
}
