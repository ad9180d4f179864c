//! Logs window focus changes

use anyhow::Context;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::event::Event;
use crate::loader::HandlerModule;

/// Handles `activewindow>>CLASS,TITLE`
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveWindow;

impl ActiveWindow {
    pub const NAME: &'static str = "active-window";
    pub const KIND: &'static str = "activewindow";
}

impl HandlerModule for ActiveWindow {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register(&self, dispatcher: &mut Dispatcher) {
        dispatcher.register(Self::KIND, handle_active_window);
    }
}

/// Split an `activewindow` payload into window class and title
///
/// Only the first comma separates them; titles may contain commas.
pub fn parse_active_window(payload: &str) -> anyhow::Result<(&str, &str)> {
    payload
        .split_once(',')
        .with_context(|| format!("activewindow payload has no ',' separator: {:?}", payload))
}

fn handle_active_window(event: &Event) -> anyhow::Result<()> {
    let (class, title) = parse_active_window(&event.payload)?;

    if class.is_empty() && title.is_empty() {
        info!("No window focused");
    } else {
        info!(class = class, title = title, "Window focus changed");
    }

    Ok(())
}
