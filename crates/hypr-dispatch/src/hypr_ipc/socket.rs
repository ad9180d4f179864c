//! Event socket discovery
//!
//! Hyprland creates one directory per running instance under its socket
//! base directory, named after `$HYPRLAND_INSTANCE_SIGNATURE`. The event
//! socket inside it is `.socket2.sock`.

use std::path::{Path, PathBuf};

use super::HyprError;

/// Environment variable holding the running Hyprland instance signature
pub const INSTANCE_SIGNATURE_ENV: &str = "HYPRLAND_INSTANCE_SIGNATURE";

/// File name of the event socket inside the instance directory
pub const EVENT_SOCKET_NAME: &str = ".socket2.sock";

/// Default directory holding Hyprland instance directories
///
/// Uses `$XDG_RUNTIME_DIR/hypr`, falling back to `/run/user/$UID/hypr` when
/// `XDG_RUNTIME_DIR` is not set.
pub fn default_socket_base() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir).join("hypr")
    } else {
        let uid = nix::unistd::getuid();
        tracing::debug!("XDG_RUNTIME_DIR not set, using /run/user/{}/hypr", uid);
        PathBuf::from(format!("/run/user/{}/hypr", uid))
    }
}

/// Build the event socket path for an instance signature
///
/// # Errors
///
/// Returns `HyprError::SignatureNotSet` if `signature` is `None` or empty.
pub fn socket_path_for(base: &Path, signature: Option<&str>) -> Result<PathBuf, HyprError> {
    match signature {
        Some(signature) if !signature.is_empty() => {
            Ok(base.join(signature).join(EVENT_SOCKET_NAME))
        }
        _ => Err(HyprError::SignatureNotSet),
    }
}

/// Discover the event socket path from the environment
///
/// Reads `$HYPRLAND_INSTANCE_SIGNATURE` and joins it onto `base`. The path
/// is not checked for existence here; see `EventListener::connect`.
///
/// # Errors
///
/// Returns `HyprError::SignatureNotSet` if the variable is unset or empty.
///
/// # Example
///
/// ```ignore
/// let socket_path = get_socket_path(&default_socket_base())?;
/// println!("Event socket at: {}", socket_path.display());
/// ```
pub fn get_socket_path(base: &Path) -> Result<PathBuf, HyprError> {
    let signature = std::env::var(INSTANCE_SIGNATURE_ENV).ok();
    socket_path_for(base, signature.as_deref())
}
