//! Compositor event model

use serde::Serialize;

/// A single event received from the Hyprland event socket
///
/// `kind` is the text before the first `>>` of a protocol line (e.g.
/// `"activewindow"`), `payload` is everything after it, unparsed. The
/// structure of the payload depends on the kind and is left to handlers.
///
/// Events produced by the listener always have a non-empty `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Event {
    pub kind: String,
    pub payload: String,
}

impl Event {
    pub fn new(kind: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }
}
