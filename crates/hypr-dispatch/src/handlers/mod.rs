//! Built-in handler modules

mod active_window;
mod print_json;
mod workspace;

pub use active_window::ActiveWindow;
pub use print_json::PrintJson;
pub use workspace::Workspace;
