//! Shared test helpers for the drawbridge integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::Level;
use serde_json::Value;

use drawbridge::adapters::{BatchObserver, ElevationResolver};
use drawbridge::channel::{AllocationError, Channel, ChannelError, ChannelProvider};
use drawbridge::fs::mounts::MountRegistry;
use drawbridge::logging::{AuditSink, FactsEmitter};
use drawbridge::policy::Policy;
use drawbridge::types::{
    ExecError, ExecUnit, FsObject, FsoKind, MountMode, MountPoint, UnitOutput,
};
use drawbridge::{Drawbridge, Resolution, ResolutionTicket};

/// In-memory emitter capturing every fact row for assertions.
#[derive(Clone, Default, Debug)]
pub struct TestEmitter {
    pub events: Arc<Mutex<Vec<(String, String, String, Value)>>>,
}

impl FactsEmitter for TestEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        self.events
            .lock()
            .unwrap()
            .push((subsystem.into(), event.into(), decision.into(), fields));
    }
}

impl TestEmitter {
    /// Captured fact rows for one event name, in emission order.
    pub fn rows_for(&self, event: &str) -> Vec<(String, Value)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, e, _, _)| e == event)
            .map(|(_, _, d, f)| (d.clone(), f.clone()))
            .collect()
    }
}

/// Audit sink that swallows every line.
#[derive(Clone, Copy, Default)]
pub struct TestAudit;

impl AuditSink for TestAudit {
    fn log(&self, _level: Level, _msg: &str) {}
}

/// In-memory filesystem state driven through a fake channel.
///
/// Mutations honor two failure knobs: paths in `denied` refuse with a
/// permission error until `elevated` is set, and any target under a path
/// in `ro_mounts` refuses as read-only. Remount units edit `ro_mounts`,
/// so a granted elevation plus a replay restores the usual discipline.
#[derive(Default)]
pub struct FakeFs {
    pub present: HashSet<PathBuf>,
    pub denied: HashSet<PathBuf>,
    pub ro_mounts: HashSet<PathBuf>,
    /// Deletes of these paths report success without removing them.
    pub sticky: HashSet<PathBuf>,
    /// Fail the next remount-read-only once.
    pub fail_ro_once: bool,
    pub elevated: bool,
    pub log: Vec<ExecUnit>,
}

impl FakeFs {
    pub fn add_present(&mut self, path: &str) {
        self.present.insert(PathBuf::from(path));
    }

    pub fn deny(&mut self, path: &str) {
        self.denied.insert(PathBuf::from(path));
    }

    pub fn ro_mount(&mut self, path: &str) {
        self.ro_mounts.insert(PathBuf::from(path));
    }

    pub fn make_sticky(&mut self, path: &str) {
        self.sticky.insert(PathBuf::from(path));
    }

    pub fn has(&self, path: &str) -> bool {
        self.present.contains(Path::new(path))
    }

    /// Kind labels of every unit run so far, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.log.iter().map(ExecUnit::kind_name).collect()
    }

    /// Target paths of every unit run so far, in order.
    pub fn targets(&self) -> Vec<PathBuf> {
        self.log.iter().map(|u| u.target().to_path_buf()).collect()
    }

    fn check_mutation(&self, target: &Path) -> Result<(), ChannelError> {
        if self.denied.contains(target) && !self.elevated {
            return Err(ChannelError::PermissionDenied);
        }
        if self.ro_mounts.iter().any(|m| target.starts_with(m)) {
            return Err(ChannelError::ReadOnly);
        }
        Ok(())
    }

    fn delete(&mut self, path: &PathBuf) -> Result<UnitOutput, ChannelError> {
        self.check_mutation(path)?;
        if !self.present.contains(path) {
            return Err(ChannelError::NotFound);
        }
        if self.sticky.contains(path) {
            return Ok(UnitOutput::Done);
        }
        self.present.retain(|p| !p.starts_with(path));
        Ok(UnitOutput::Done)
    }

    fn snapshot(&self, path: &Path) -> FsObject {
        let is_dir = self
            .present
            .iter()
            .any(|p| p.as_path() != path && p.starts_with(path));
        FsObject {
            path: path.to_path_buf(),
            kind: if is_dir {
                FsoKind::Directory
            } else {
                FsoKind::File
            },
            size: 0,
            link_target: None,
        }
    }

    fn apply(&mut self, unit: ExecUnit) -> Result<UnitOutput, ChannelError> {
        self.log.push(unit.clone());
        match unit {
            ExecUnit::Remount { mount, mode } => {
                if self.denied.contains(&mount.path) && !self.elevated {
                    return Err(ChannelError::PermissionDenied);
                }
                match mode {
                    MountMode::ReadWrite => {
                        self.ro_mounts.remove(&mount.path);
                    }
                    MountMode::ReadOnly => {
                        if self.fail_ro_once {
                            self.fail_ro_once = false;
                            return Err(ChannelError::Failed("remount failed".to_string()));
                        }
                        self.ro_mounts.insert(mount.path);
                    }
                }
                Ok(UnitOutput::Done)
            }
            ExecUnit::DeleteFile { path } | ExecUnit::DeleteDir { path } => self.delete(&path),
            ExecUnit::CreateFile { path } | ExecUnit::CreateDir { path } => {
                self.check_mutation(&path)?;
                self.present.insert(path);
                Ok(UnitOutput::Done)
            }
            ExecUnit::CreateLink { link, .. } => {
                self.check_mutation(&link)?;
                self.present.insert(link);
                Ok(UnitOutput::Done)
            }
            ExecUnit::Move { src, dst } => {
                self.check_mutation(&dst)?;
                if !self.present.remove(&src) {
                    return Err(ChannelError::NotFound);
                }
                self.present.insert(dst);
                Ok(UnitOutput::Done)
            }
            ExecUnit::Copy { src, dst } => {
                self.check_mutation(&dst)?;
                if !self.present.contains(&src) {
                    return Err(ChannelError::NotFound);
                }
                self.present.insert(dst);
                Ok(UnitOutput::Done)
            }
            ExecUnit::ChangePerms { path, .. } => {
                self.check_mutation(&path)?;
                if !self.present.contains(&path) {
                    return Err(ChannelError::NotFound);
                }
                Ok(UnitOutput::Done)
            }
            ExecUnit::List { dir } => {
                let entries: Vec<FsObject> = self
                    .present
                    .iter()
                    .filter(|p| p.parent() == Some(dir.as_path()))
                    .map(|p| self.snapshot(p))
                    .collect();
                Ok(UnitOutput::Listing(entries))
            }
            ExecUnit::Info { path, .. } | ExecUnit::ResolveLink { path } => {
                if self.present.contains(&path) {
                    Ok(UnitOutput::Entry(self.snapshot(&path)))
                } else {
                    Err(ChannelError::NotFound)
                }
            }
        }
    }
}

/// Channel over shared [`FakeFs`] state.
pub struct FakeChannel {
    state: Arc<Mutex<FakeFs>>,
}

impl FakeChannel {
    pub fn new() -> (Self, Arc<Mutex<FakeFs>>) {
        let state = Arc::new(Mutex::new(FakeFs::default()));
        let channel = Self {
            state: Arc::clone(&state),
        };
        (channel, state)
    }

    pub fn over(state: Arc<Mutex<FakeFs>>) -> Self {
        Self { state }
    }
}

impl Channel for FakeChannel {
    fn run(&mut self, unit: ExecUnit) -> Result<UnitOutput, ChannelError> {
        self.state.lock().unwrap().apply(unit)
    }
}

/// Provider handing out channels over one shared state, counting
/// allocations.
#[derive(Clone)]
pub struct CountingProvider {
    pub state: Arc<Mutex<FakeFs>>,
    pub allocations: Arc<Mutex<usize>>,
}

impl CountingProvider {
    pub fn new(state: Arc<Mutex<FakeFs>>) -> Self {
        Self {
            state,
            allocations: Arc::new(Mutex::new(0)),
        }
    }
}

impl ChannelProvider for CountingProvider {
    fn allocate(&self) -> Result<Box<dyn Channel>, AllocationError> {
        *self.allocations.lock().unwrap() += 1;
        Ok(Box::new(FakeChannel::over(Arc::clone(&self.state))))
    }
}

/// Provider that never yields a channel.
pub struct FailingProvider;

impl ChannelProvider for FailingProvider {
    fn allocate(&self) -> Result<Box<dyn Channel>, AllocationError> {
        Err(AllocationError("no session".to_string()))
    }
}

/// Registry over a fixed table, longest mount path wins.
pub struct FakeRegistry {
    pub table: Vec<MountPoint>,
}

impl MountRegistry for FakeRegistry {
    fn mount_points(&self) -> Vec<MountPoint> {
        self.table.clone()
    }

    fn mount_for(&self, path: &Path) -> Option<MountPoint> {
        let mut best: Option<&MountPoint> = None;
        for mp in &self.table {
            let better = best.map_or(true, |b| mp.path.as_os_str().len() > b.path.as_os_str().len());
            if path.starts_with(&mp.path) && better {
                best = Some(mp);
            }
        }
        best.cloned()
    }
}

pub fn mount_at(path: &str, mode: MountMode, remount_allowed: bool) -> MountPoint {
    MountPoint {
        device: "/dev/fake".to_string(),
        path: PathBuf::from(path),
        fstype: "ext4".to_string(),
        mode,
        remount_allowed,
    }
}

pub fn file_at(path: &str) -> FsObject {
    FsObject {
        path: PathBuf::from(path),
        kind: FsoKind::File,
        size: 0,
        link_target: None,
    }
}

pub fn dir_at(path: &str) -> FsObject {
    FsObject {
        path: PathBuf::from(path),
        kind: FsoKind::Directory,
        size: 0,
        link_target: None,
    }
}

/// Observer recording callbacks in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObserverEvent {
    Progress(PathBuf),
    Complete,
    Failure(String),
}

#[derive(Clone, Default)]
pub struct RecordingObserver {
    pub events: Arc<Mutex<Vec<ObserverEvent>>>,
}

impl BatchObserver for RecordingObserver {
    fn on_progress(&self, finished: &Path) {
        self.events
            .lock()
            .unwrap()
            .push(ObserverEvent::Progress(finished.to_path_buf()));
    }

    fn on_complete(&self) {
        self.events.lock().unwrap().push(ObserverEvent::Complete);
    }

    fn on_failure(&self, cause: &ExecError) {
        self.events
            .lock()
            .unwrap()
            .push(ObserverEvent::Failure(cause.to_string()));
    }
}

/// Resolver that flips the fake filesystem to elevated and grants.
pub struct GrantResolver {
    pub state: Arc<Mutex<FakeFs>>,
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl GrantResolver {
    pub fn new(state: Arc<Mutex<FakeFs>>) -> Self {
        Self {
            state,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ElevationResolver for GrantResolver {
    fn resolve(&self, denied: &ExecUnit, ticket: ResolutionTicket) {
        self.seen.lock().unwrap().push(denied.kind_name().to_string());
        self.state.lock().unwrap().elevated = true;
        ticket.fire(Resolution::Resolved);
    }
}

/// Resolver that declines every request with a carried cause.
pub struct FailResolver;

impl ElevationResolver for FailResolver {
    fn resolve(&self, _denied: &ExecUnit, ticket: ResolutionTicket) {
        ticket.fire(Resolution::Failed(ExecError::ExecutionFailed(
            "resolver declined".to_string(),
        )));
    }
}

/// Resolver that walks away without firing the ticket.
pub struct DropResolver;

impl ElevationResolver for DropResolver {
    fn resolve(&self, _denied: &ExecUnit, ticket: ResolutionTicket) {
        drop(ticket);
    }
}

/// A facade over a fake channel and a fixed mount table, plus handles on
/// the shared state and the captured facts.
pub fn rig(
    table: Vec<MountPoint>,
) -> (
    Drawbridge<TestEmitter, TestAudit>,
    Arc<Mutex<FakeFs>>,
    TestEmitter,
) {
    let facts = TestEmitter::default();
    let (channel, state) = FakeChannel::new();
    let api = Drawbridge::new(facts.clone(), TestAudit, Policy::default())
        .with_channel(Box::new(channel))
        .with_mount_registry(Box::new(FakeRegistry { table }));
    (api, state, facts)
}
