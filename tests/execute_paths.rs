//! Plain-execute behavior: classification, the read-only recode, and
//! channel allocation.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{
    rig, CountingProvider, FailingProvider, FakeChannel, FakeFs, FakeRegistry, TestAudit,
    TestEmitter,
};
use drawbridge::policy::Policy;
use drawbridge::types::{ExecError, ExecUnit, UnitOutput};
use drawbridge::Drawbridge;

#[test]
fn execute_returns_outputs_and_classified_errors() {
    let (api, state, _) = rig(vec![]);
    state.lock().unwrap().add_present("/data/a.txt");

    let out = api.execute(ExecUnit::info("/data/a.txt", false)).unwrap();
    match out {
        UnitOutput::Entry(fso) => assert_eq!(fso.path(), Path::new("/data/a.txt")),
        other => panic!("expected an entry, got {other:?}"),
    }

    let err = api.execute(ExecUnit::info("/data/missing", false));
    assert!(matches!(err, Err(ExecError::NotFound)));
}

#[test]
fn execute_recodes_read_only_but_the_writable_path_does_not() {
    // Same state, both entry points: a read-only refusal is recoverable
    // only on the writable path.
    let (api, state, _) = rig(vec![]);
    state.lock().unwrap().ro_mount("/media");

    let plain = api.execute(ExecUnit::create_file("/media/x"));
    match plain {
        Err(ExecError::ExecutionFailed(msg)) => {
            assert!(msg.contains("read-only"), "unexpected message: {msg}")
        }
        other => panic!("expected an execution failure, got {other:?}"),
    }

    // Empty mount table: the guard has nothing to remount and the raw
    // refusal surfaces unchanged.
    let writable = api.writable_execute(api.writable(ExecUnit::create_file("/media/x")));
    assert!(matches!(writable, Err(ExecError::ReadOnlyFilesystem)));
}

#[test]
fn first_dispatch_allocates_once_and_reuses_the_channel() {
    let state = Arc::new(std::sync::Mutex::new(FakeFs::default()));
    state.lock().unwrap().add_present("/data/a.txt");
    let provider = CountingProvider::new(Arc::clone(&state));
    let allocations = Arc::clone(&provider.allocations);

    let api = Drawbridge::new(TestEmitter::default(), TestAudit, Policy::default())
        .with_channel_provider(Box::new(provider))
        .with_mount_registry(Box::new(FakeRegistry { table: vec![] }));

    for _ in 0..3 {
        api.execute(ExecUnit::info("/data/a.txt", false)).unwrap();
    }
    assert_eq!(*allocations.lock().unwrap(), 1);
}

#[test]
fn allocation_failure_is_its_own_error_kind() {
    let api = Drawbridge::new(TestEmitter::default(), TestAudit, Policy::default())
        .with_channel_provider(Box::new(FailingProvider))
        .with_mount_registry(Box::new(FakeRegistry { table: vec![] }));

    let err = api.execute(ExecUnit::list("/anything"));
    match err {
        Err(ExecError::AllocationFailed(msg)) => assert_eq!(msg, "no session"),
        other => panic!("expected allocation failure, got {other:?}"),
    }
}

#[test]
fn installing_a_provider_resets_an_installed_channel() {
    let (old_channel, old_state) = FakeChannel::new();
    old_state.lock().unwrap().add_present("/data/a.txt");
    let fresh = Arc::new(std::sync::Mutex::new(FakeFs::default()));
    let provider = CountingProvider::new(Arc::clone(&fresh));

    let api = Drawbridge::new(TestEmitter::default(), TestAudit, Policy::default())
        .with_channel(Box::new(old_channel))
        .with_channel_provider(Box::new(provider))
        .with_mount_registry(Box::new(FakeRegistry { table: vec![] }));

    // The provider's empty state answers, not the replaced channel.
    let err = api.execute(ExecUnit::info("/data/a.txt", false));
    assert!(matches!(err, Err(ExecError::NotFound)));
}

#[test]
fn execute_emits_success_and_failure_facts() {
    let (api, state, facts) = rig(vec![]);
    state.lock().unwrap().add_present("/data/a.txt");

    api.execute(ExecUnit::info("/data/a.txt", false)).unwrap();
    let _ = api.execute(ExecUnit::info("/data/missing", false));

    let rows = facts.rows_for("execute");
    assert_eq!(rows.len(), 2);
    let (decision, fields) = &rows[0];
    assert_eq!(decision, "success");
    assert_eq!(fields.get("unit").unwrap(), "info");
    assert_eq!(fields.get("path").unwrap(), "/data/a.txt");
    assert_eq!(fields.get("schema_version").unwrap(), 1);
    let (decision, fields) = &rows[1];
    assert_eq!(decision, "failure");
    assert_eq!(fields.get("error_id").unwrap(), "E_NOT_FOUND");
    assert_eq!(fields.get("exit_code").unwrap(), 10);
}
