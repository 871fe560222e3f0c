//! In-memory LMS for local testing
//!
//! Stands in for the host page plus LMS: stores data-model elements in a map
//! and answers every correlated call by pushing a wire-format reply straight
//! into the shared [`ReplyQueue`]. Nothing is persisted and only the one
//! error the real runtime produces for an unknown element (`401`) is modeled.
//!
//! Replies here are pushed synchronously from the calling thread; a real host
//! delivers them later, on the main context. The bridge handles both because
//! the queue is the only delivery path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::bridge::{CorrelationKey, ReplyQueue};
use crate::host::HostChannel;

/// SCORM error for a data-model element the LMS does not know
const ERR_UNDEFINED_ELEMENT: &str = "401";

/// Host channel backed by an in-memory key/value map
pub struct SimulatorHost {
    queue: Arc<ReplyQueue>,
    data: Mutex<HashMap<String, String>>,

    /// Error injected into the next get/set reply, then cleared
    fail_next: Mutex<Option<(String, String)>>,

    /// Variant reported by the version probe
    scorm_2004: bool,

    commits: AtomicUsize,
    terminates: AtomicUsize,
}

impl SimulatorHost {
    /// Create a simulator that replies into the given queue
    pub fn new(queue: Arc<ReplyQueue>) -> Self {
        Self {
            queue,
            data: Mutex::new(HashMap::new()),
            fail_next: Mutex::new(None),
            scorm_2004: true,
            commits: AtomicUsize::new(0),
            terminates: AtomicUsize::new(0),
        }
    }

    /// Report SCORM 1.2 instead of 2004 from the version probe
    pub fn with_scorm_1_2(mut self) -> Self {
        self.scorm_2004 = false;
        self
    }

    /// Seed a data-model element
    pub fn with_value(self, identifier: impl Into<String>, value: impl Into<String>) -> Self {
        self.lock_data().insert(identifier.into(), value.into());
        self
    }

    /// Make the next get/set reply carry this error
    pub fn fail_next(&self, code: impl Into<String>, description: impl Into<String>) {
        *self
            .fail_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((code.into(), description.into()));
    }

    /// Current value of an element, bypassing the wire
    pub fn value(&self, identifier: &str) -> Option<String> {
        self.lock_data().get(identifier).cloned()
    }

    /// How many commits the host has seen
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// How many terminates the host has seen
    pub fn terminate_count(&self) -> usize {
        self.terminates.load(Ordering::SeqCst)
    }

    fn lock_data(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_forced_error(&self) -> Option<(String, String)> {
        self.fail_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn reply(&self, value: &str, code: &str, description: &str, key: CorrelationKey) {
        self.queue.push(format!("{value}|{code}|{description}|{key}"));
    }
}

impl HostChannel for SimulatorHost {
    fn get_value(&self, identifier: &str, _obj: &str, _func: &str, key: CorrelationKey) {
        if let Some((code, description)) = self.take_forced_error() {
            self.reply("", &code, &description, key);
            return;
        }
        match self.lock_data().get(identifier) {
            Some(value) => {
                debug!(identifier, key, "SimulatorHost::get_value: hit");
                self.reply(value, "", "", key);
            }
            None => {
                debug!(identifier, key, "SimulatorHost::get_value: undefined element");
                self.reply("", ERR_UNDEFINED_ELEMENT, "Undefined data model element", key);
            }
        }
    }

    fn set_value(&self, identifier: &str, value: &str, _obj: &str, _func: &str, key: CorrelationKey) {
        if let Some((code, description)) = self.take_forced_error() {
            self.reply("false", &code, &description, key);
            return;
        }
        debug!(identifier, value, key, "SimulatorHost::set_value");
        self.lock_data().insert(identifier.to_string(), value.to_string());
        self.reply("true", "", "", key);
    }

    fn version_probe(&self, _obj: &str, _func: &str, key: CorrelationKey) {
        self.reply(if self.scorm_2004 { "true" } else { "false" }, "", "", key);
    }

    fn commit(&self) {
        self.commits.fetch_add(1, Ordering::SeqCst);
    }

    fn terminate(&self) {
        self.terminates.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_known_element_replies_value() {
        let queue = Arc::new(ReplyQueue::new());
        let sim = SimulatorHost::new(Arc::clone(&queue)).with_value("cmi.completion_status", "incomplete");
        sim.get_value("cmi.completion_status", "ScormManager", "ScormValueCallback", 7);
        assert_eq!(queue.pop().as_deref(), Some("incomplete|||7"));
    }

    #[test]
    fn test_get_unknown_element_replies_401() {
        let queue = Arc::new(ReplyQueue::new());
        let sim = SimulatorHost::new(Arc::clone(&queue));
        sim.get_value("cmi.nope", "ScormManager", "ScormValueCallback", 8);
        let raw = queue.pop().unwrap();
        assert_eq!(raw, "|401|Undefined data model element|8");
    }

    #[test]
    fn test_set_stores_and_acknowledges() {
        let queue = Arc::new(ReplyQueue::new());
        let sim = SimulatorHost::new(Arc::clone(&queue));
        sim.set_value("cmi.score.raw", "85", "ScormManager", "ScormValueCallback", 9);
        assert_eq!(queue.pop().as_deref(), Some("true|||9"));
        assert_eq!(sim.value("cmi.score.raw").as_deref(), Some("85"));
    }

    #[test]
    fn test_forced_error_applies_once() {
        let queue = Arc::new(ReplyQueue::new());
        let sim = SimulatorHost::new(Arc::clone(&queue));
        sim.fail_next("401", "Undefined data model element");
        sim.set_value("cmi.score.raw", "abc", "ScormManager", "ScormValueCallback", 1);
        assert_eq!(queue.pop().as_deref(), Some("false|401|Undefined data model element|1"));

        sim.set_value("cmi.score.raw", "85", "ScormManager", "ScormValueCallback", 2);
        assert_eq!(queue.pop().as_deref(), Some("true|||2"));
    }

    #[test]
    fn test_version_probe_variants() {
        let queue = Arc::new(ReplyQueue::new());
        SimulatorHost::new(Arc::clone(&queue)).version_probe("ScormManager", "ScormValueCallback", 3);
        assert_eq!(queue.pop().as_deref(), Some("true|||3"));

        SimulatorHost::new(Arc::clone(&queue))
            .with_scorm_1_2()
            .version_probe("ScormManager", "ScormValueCallback", 4);
        assert_eq!(queue.pop().as_deref(), Some("false|||4"));
    }

    #[test]
    fn test_commit_and_terminate_counters() {
        let queue = Arc::new(ReplyQueue::new());
        let sim = SimulatorHost::new(queue);
        sim.commit();
        sim.commit();
        sim.terminate();
        assert_eq!(sim.commit_count(), 2);
        assert_eq!(sim.terminate_count(), 1);
    }
}
