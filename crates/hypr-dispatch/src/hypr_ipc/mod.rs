//! Hyprland event socket integration
//!
//! This module connects to the compositor's event socket and turns its
//! line protocol into [`crate::Event`] values:
//!
//! - `socket`: locating `.socket2.sock` from `$HYPRLAND_INSTANCE_SIGNATURE`
//! - `frame`: splitting the byte stream into `KIND>>PAYLOAD` lines
//! - `listener`: the read loop feeding a [`crate::Dispatcher`]
//! - `error`: error types for the above
//!
//! ## Protocol
//!
//! Hyprland exposes the event socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket2.sock`.
//! Clients only read from it; every event is one `KIND>>PAYLOAD\n` line.

mod error;
mod frame;
mod listener;
mod socket;

pub use error::{FrameError, HyprError};
pub use frame::{parse_message, FrameDecoder, DELIMITER};
pub use listener::{EventListener, ReconnectPolicy, READ_BUFFER_SIZE};
pub use socket::{
    default_socket_base, get_socket_path, socket_path_for, EVENT_SOCKET_NAME,
    INSTANCE_SIGNATURE_ENV,
};
