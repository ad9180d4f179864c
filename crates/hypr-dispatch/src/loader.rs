//! Handler module loading
//!
//! Handler modules are collected into a `HandlerLoader` in an explicit order
//! and registered into a [`Dispatcher`] in that same order before the
//! listener starts. The loader can be built in code with [`HandlerLoader::with`]
//! or from the `handlers` block of the configuration file.

use hypr_dispatch_config::HandlerSpec;
use thiserror::Error;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::handlers::{ActiveWindow, PrintJson, Workspace};

/// Names of the handler modules that can be selected from configuration
pub const BUILTIN_HANDLERS: &[&str] = &[ActiveWindow::NAME, Workspace::NAME, PrintJson::NAME];

/// A named bundle of handler registrations
pub trait HandlerModule {
    /// Name used in configuration and logs
    fn name(&self) -> &str;

    /// Register this module's handlers
    fn register(&self, dispatcher: &mut Dispatcher);
}

/// Errors raised while building a loader from configuration
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unknown handler module '{name}' (available: {})", BUILTIN_HANDLERS.join(", "))]
    UnknownHandler { name: String },

    #[error("Handler module '{name}' needs at least one event kind argument")]
    MissingArguments { name: String },

    #[error("Handler module '{name}' takes no arguments, got {count}")]
    UnexpectedArguments { name: String, count: usize },
}

/// Ordered list of handler modules waiting to be registered
#[derive(Default)]
pub struct HandlerLoader {
    modules: Vec<Box<dyn HandlerModule>>,
}

impl HandlerLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The modules loaded when the configuration has no `handlers` block
    pub fn defaults() -> Self {
        Self::new().with(ActiveWindow).with(Workspace)
    }

    /// Append a module; modules register in the order they were added
    pub fn with(mut self, module: impl HandlerModule + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Build a loader from configuration entries, keeping their order
    ///
    /// # Errors
    ///
    /// Returns `LoadError` for unknown module names or bad arguments.
    pub fn from_specs(specs: &[HandlerSpec]) -> Result<Self, LoadError> {
        let mut loader = Self::new();
        for spec in specs {
            loader.modules.push(builtin(spec)?);
        }
        Ok(loader)
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Register every module into `dispatcher`, returning their names in order
    pub fn load_into(self, dispatcher: &mut Dispatcher) -> Vec<String> {
        self.modules
            .into_iter()
            .map(|module| {
                module.register(dispatcher);
                info!(module = module.name(), "Registered handler module");
                module.name().to_string()
            })
            .collect()
    }
}

fn builtin(spec: &HandlerSpec) -> Result<Box<dyn HandlerModule>, LoadError> {
    match spec.name.as_str() {
        ActiveWindow::NAME => without_args(spec, Box::new(ActiveWindow)),
        Workspace::NAME => without_args(spec, Box::new(Workspace)),
        PrintJson::NAME => {
            if spec.args.is_empty() {
                return Err(LoadError::MissingArguments {
                    name: spec.name.clone(),
                });
            }
            Ok(Box::new(PrintJson::stdout(spec.args.clone())))
        }
        _ => Err(LoadError::UnknownHandler {
            name: spec.name.clone(),
        }),
    }
}

fn without_args(
    spec: &HandlerSpec,
    module: Box<dyn HandlerModule>,
) -> Result<Box<dyn HandlerModule>, LoadError> {
    if !spec.args.is_empty() {
        return Err(LoadError::UnexpectedArguments {
            name: spec.name.clone(),
            count: spec.args.len(),
        });
    }
    Ok(module)
}
