//! Scheduler scenarios through the runtime surface.

use std::thread;
use std::time::{Duration, SystemTime};

use opal_abi::{AsyncRequest, FsOperation, FsResult, OplError, Response, ResponseValue, SchedulerFault};
use opal_lib::RuntimeConfig;

use crate::fixtures::{MemoryFs, test_config, test_runtime};

#[test]
fn interrupt_returns_before_pending_timer() {
    let t = test_runtime(test_config(), MemoryFs::default());
    let rt = &t.runtime;
    rt.async_request(7, AsyncRequest::After(Duration::from_millis(50))).unwrap();
    thread::sleep(Duration::from_millis(10));
    rt.interrupt();

    assert!(rt.wait_for_any_request().is_interrupt());
    assert!(rt.scheduler().is_pending(7));
    assert_eq!(
        rt.wait_for_any_request(),
        Response {
            handle: 7,
            value: ResponseValue::Completed
        }
    );
}

#[test]
fn timer_in_the_past_fires_at_once() {
    let t = test_runtime(test_config(), MemoryFs::default());
    let past = SystemTime::now() - Duration::from_secs(5);
    t.runtime.async_request(3, AsyncRequest::At(past)).unwrap();
    let res = t.runtime.scheduler().wait_for_any_request_timeout(Duration::from_secs(5));
    assert_eq!(res.map(|r| r.handle), Some(3));
}

#[test]
fn input_waits_are_exclusive() {
    let t = test_runtime(test_config(), MemoryFs::default());
    let rt = &t.runtime;
    rt.async_request(1, AsyncRequest::GetEvent).unwrap();
    assert_eq!(
        rt.async_request(2, AsyncRequest::GetEvent),
        Err(SchedulerFault::ExclusiveRequestPending(2))
    );
    assert_eq!(
        rt.async_request(3, AsyncRequest::KeyWait),
        Err(SchedulerFault::ExclusiveRequestPending(3))
    );
    assert_eq!(
        rt.async_request(1, AsyncRequest::After(Duration::from_secs(60))),
        Err(SchedulerFault::DuplicateRequest(1))
    );

    // once collected the slot is free again
    rt.cancel_request(1);
    assert_eq!(rt.any_request().map(|r| r.value), Some(ResponseValue::Cancelled));
    rt.async_request(4, AsyncRequest::KeyWait).unwrap();
}

#[test]
fn cancel_of_unknown_or_completed_handle_is_a_no_op() {
    let t = test_runtime(test_config(), MemoryFs::default());
    let rt = &t.runtime;
    rt.cancel_request(99);
    assert_eq!(rt.scheduler().pending_count(), 0);
    assert!(rt.any_request().is_none());

    rt.async_request(5, AsyncRequest::PlaySound(vec![1, 2])).unwrap();
    assert!(t.sound.finish(0, Ok(())));
    rt.cancel_request(5);
    assert!(!t.sound.stopped(0));
    assert_eq!(
        rt.any_request(),
        Some(Response {
            handle: 5,
            value: ResponseValue::Completed
        })
    );
    assert!(rt.any_request().is_none());
}

#[test]
fn cancelled_sound_stops_playback() {
    let t = test_runtime(test_config(), MemoryFs::default());
    let rt = &t.runtime;
    rt.async_request(6, AsyncRequest::PlaySound(vec![9; 16])).unwrap();
    assert_eq!(t.sound.played(), vec![vec![9; 16]]);
    rt.cancel_request(6);
    assert!(t.sound.stopped(0));

    // a late completion loses to the cancellation
    t.sound.finish(0, Ok(()));
    assert_eq!(rt.any_request().map(|r| r.value), Some(ResponseValue::Cancelled));
    assert!(rt.any_request().is_none());
}

#[test]
fn sound_failure_is_delivered_as_error() {
    let t = test_runtime(test_config(), MemoryFs::default());
    t.runtime.async_request(8, AsyncRequest::PlaySound(Vec::new())).unwrap();
    t.sound.finish(0, Err(OplError::InUse));
    assert_eq!(
        t.runtime.any_request().map(|r| r.value),
        Some(ResponseValue::Error(OplError::InUse))
    );
}

#[test]
fn read_only_storage_refuses_writes() {
    let config = RuntimeConfig {
        fs_writable: false,
        ..test_config()
    };
    let t = test_runtime(config, MemoryFs::default().with_file("app.dat", b"abc"));
    let rt = &t.runtime;
    assert_eq!(
        rt.fs_op(&FsOperation::Read("app.dat".into())),
        Ok(FsResult::Data(b"abc".to_vec()))
    );
    assert_eq!(
        rt.fs_op(&FsOperation::Write {
            path: "app.dat".into(),
            data: Vec::new()
        }),
        Err(OplError::AccessDenied)
    );
    assert_eq!(rt.fs_op(&FsOperation::Delete("app.dat".into())), Err(OplError::AccessDenied));
    assert_eq!(t.fs.contents("app.dat"), Some(b"abc".to_vec()));
}

#[test]
fn writable_storage_passes_through() {
    let t = test_runtime(test_config(), MemoryFs::default());
    t.runtime
        .fs_op(&FsOperation::Write {
            path: "notes.txt".into(),
            data: b"hi".to_vec(),
        })
        .unwrap();
    assert_eq!(
        t.runtime.fs_op(&FsOperation::Exists("notes.txt".into())),
        Ok(FsResult::Exists(true))
    );
}
