#![allow(dead_code)]

use h3c_core::{EapHandler, Engine, EngineError, LogLevel, StatusCode, StatusSink, Verdict};
use h3c_daemon::config::Options;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct Calls(Mutex<Vec<&'static str>>);

impl Calls {
    pub fn push(&self, call: &'static str) {
        self.0.lock().unwrap().push(call);
    }

    pub fn snapshot(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|c| **c == call).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ending {
    Reject,
    Fault,
}

// Idle engine: every dispatch waits briefly for a frame that never comes,
// until the optional ending fires on the given dispatch.
pub struct IdleEngine {
    calls: Arc<Calls>,
    handler: Option<Box<dyn EapHandler>>,
    ending: Option<(usize, Ending)>,
    dispatched: usize,
}

impl IdleEngine {
    pub fn new() -> (Self, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let engine = IdleEngine { calls: calls.clone(), handler: None, ending: None, dispatched: 0 };
        (engine, calls)
    }

    pub fn ending_after(mut self, dispatches: usize, ending: Ending) -> Self {
        self.ending = Some((dispatches, ending));
        self
    }
}

impl Engine for IdleEngine {
    fn init(&mut self, _interface: &str, handler: Box<dyn EapHandler>) -> Result<(), EngineError> {
        self.calls.push("init");
        self.handler = Some(handler);
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.calls.push("start");
        Ok(())
    }

    fn dispatch(&mut self) -> Result<(), EngineError> {
        self.calls.push("dispatch");
        self.dispatched += 1;
        match self.ending {
            Some((n, Ending::Reject)) if n == self.dispatched => {
                let handler = self.handler.as_mut().expect("handler registered");
                if handler.on_failure() == Verdict::Terminate {
                    return Err(EngineError::AuthFailure);
                }
            }
            Some((n, Ending::Fault)) if n == self.dispatched => {
                return Err(EngineError::Dispatch("socket closed".to_string()));
            }
            _ => {}
        }
        std::thread::sleep(Duration::from_millis(5));
        Ok(())
    }

    fn logoff(&mut self) {
        self.calls.push("logoff");
    }

    fn cleanup(&mut self) {
        self.calls.push("cleanup");
    }
}

pub fn options(username: &str) -> Options {
    Options {
        interface: "eth0".to_string(),
        username: username.to_string(),
        password: "test".to_string(),
        daemon: false,
        log_level: LogLevel::Info,
        log_file: None,
    }
}

pub fn recording_sink() -> (StatusSink, Arc<Mutex<Vec<StatusCode>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    (Arc::new(move |code: StatusCode| sink_seen.lock().unwrap().push(code)), seen)
}
