//! Logs workspace switches

use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::event::Event;
use crate::loader::HandlerModule;

/// Handles `workspace>>NAME`
#[derive(Debug, Clone, Copy, Default)]
pub struct Workspace;

impl Workspace {
    pub const NAME: &'static str = "workspace";
    pub const KIND: &'static str = "workspace";
}

impl HandlerModule for Workspace {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register(&self, dispatcher: &mut Dispatcher) {
        dispatcher.register(Self::KIND, |event: &Event| {
            if event.payload.is_empty() {
                anyhow::bail!("workspace event without a workspace name");
            }
            info!(workspace = %event.payload, "Workspace changed");
            Ok(())
        });
    }
}
