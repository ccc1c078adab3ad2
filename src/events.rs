use log::warn;
use serde::Serialize;
use serde_json::Value;

pub const WORKSPACES_CHANGED: &str = "workspaces-changed";
pub const UNIFY_STATE_CHANGED: &str = "unify-state-changed";
pub const UNIFY_ANALYSIS_COMPLETE: &str = "unify-analysis-complete";
pub const UNIFY_STEP_CHANGED: &str = "unify-step-changed";
pub const GENERATE_STATE_CHANGED: &str = "generate-state-changed";
pub const CHAT_MESSAGE_ADDED: &str = "chat-message-added";

/// Where controllers push state snapshots. The desktop shell forwards them
/// to the webview; tests record them.
pub trait EventEmitter: Send + Sync {
    fn emit_json(&self, event: &str, payload: Value);
}

/// Serializes `payload` and hands it to `emitter`. Serialization failures are
/// logged and dropped; a missed UI refresh is not worth failing the caller.
pub fn emit_event<T: Serialize>(emitter: &dyn EventEmitter, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => emitter.emit_json(event, value),
        Err(err) => warn!("failed to serialize {event} payload: {err}"),
    }
}

/// Discards everything; for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmitter;

impl EventEmitter for NoopEmitter {
    fn emit_json(&self, _event: &str, _payload: Value) {}
}

#[cfg(feature = "desktop")]
impl EventEmitter for tauri::AppHandle {
    fn emit_json(&self, event: &str, payload: Value) {
        use tauri::Emitter;

        if let Err(err) = self.emit(event, payload) {
            warn!("failed to emit {event}: {err}");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every emitted event in order.
    #[derive(Default)]
    pub struct RecordingEmitter {
        events: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingEmitter {
        pub fn names(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }

        pub fn payloads(&self, event: &str) -> Vec<Value> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, payload)| payload.clone())
                .collect()
        }
    }

    impl EventEmitter for RecordingEmitter {
        fn emit_json(&self, event: &str, payload: Value) {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), payload));
        }
    }
}
