//! Hyprland event dispatcher
//!
//! Listens on the Hyprland event socket and fans each event out to the
//! handlers registered for its kind.
//!
//! ```ignore
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("workspace", |event: &Event| {
//!     println!("now on workspace {}", event.payload);
//!     Ok(())
//! });
//!
//! let socket_path = get_socket_path(&default_socket_base())?;
//! EventListener::connect(socket_path).await?.run(&dispatcher).await?;
//! ```

pub mod dispatcher;
pub mod event;
pub mod handlers;
pub mod hypr_ipc;
pub mod loader;
pub mod startup;

pub use dispatcher::{DispatchError, Dispatcher, Handler};
pub use event::Event;
pub use hypr_ipc::{
    default_socket_base, get_socket_path, EventListener, HyprError, ReconnectPolicy,
};
pub use loader::{HandlerLoader, HandlerModule, LoadError};
