//! Prints selected events as JSON lines

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crate::dispatcher::Dispatcher;
use crate::event::Event;
use crate::loader::HandlerModule;

/// Writes `{"kind":"...","payload":"..."}` lines for the configured kinds
///
/// Useful for piping compositor events into scripts, e.g.
/// `hypr-dispatchd | jq -r .payload`.
pub struct PrintJson {
    kinds: Vec<String>,
    out: Rc<RefCell<dyn Write>>,
}

impl PrintJson {
    pub const NAME: &'static str = "print-json";

    pub fn new(kinds: Vec<String>, out: Rc<RefCell<dyn Write>>) -> Self {
        Self { kinds, out }
    }

    pub fn stdout(kinds: Vec<String>) -> Self {
        Self::new(kinds, Rc::new(RefCell::new(io::stdout())))
    }
}

impl HandlerModule for PrintJson {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register(&self, dispatcher: &mut Dispatcher) {
        for kind in &self.kinds {
            let out = Rc::clone(&self.out);
            dispatcher.register(kind.as_str(), move |event: &Event| {
                write_event(&mut *out.borrow_mut(), event)
            });
        }
    }
}

fn write_event(out: &mut dyn Write, event: &Event) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
