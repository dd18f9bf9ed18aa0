// SIGTERM is process-wide, so this test lives in its own binary.
mod common;

use common::{options, recording_sink, IdleEngine};
use h3c_daemon::worker::run_session;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sigterm_logs_off_once_and_stops_dispatching() {
    let (engine, calls) = IdleEngine::new();
    let (sink, _) = recording_sink();
    let options = options("alice");

    let session = tokio::spawn(async move { run_session(&options, engine, sink).await });

    while calls.count("dispatch") < 3 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    unsafe { libc::kill(libc::getpid(), libc::SIGTERM) };

    let result = tokio::time::timeout(Duration::from_secs(5), session).await.unwrap().unwrap();
    assert!(result.is_ok());

    let calls = calls.snapshot();
    let logoff = calls.iter().position(|c| *c == "logoff").expect("logoff called");
    assert_eq!(&calls[logoff..], &["logoff", "cleanup"]);
    assert_eq!(calls.iter().filter(|c| **c == "logoff").count(), 1);
    assert_eq!(calls.iter().filter(|c| **c == "cleanup").count(), 1);
}
