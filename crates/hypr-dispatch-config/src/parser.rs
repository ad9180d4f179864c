//! KDL configuration parser

use std::path::Path;

use crate::error::ConfigError;
use crate::model::*;

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so we need to extract offset/len manually
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "reconnect" => {
                config.reconnect = parse_reconnect(node)?;
            }
            "handlers" => {
                config.handlers = Some(parse_handlers(node)?);
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    let val = first_string(child, "global.log-level")?;
                    global.log_level = val
                        .parse()
                        .map_err(|e| ConfigError::Invalid { message: e })?;
                }
                "socket-base" => {
                    let val = first_string(child, "global.socket-base")?;
                    global.socket_base = Some(shellexpand::tilde(val).into_owned().into());
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_reconnect(node: &kdl::KdlNode) -> Result<ReconnectConfig, ConfigError> {
    let mut reconnect = ReconnectConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "max-retries" => {
                    let val = first_unsigned(child, "reconnect.max-retries")?;
                    reconnect.max_retries =
                        u32::try_from(val).map_err(|_| ConfigError::Invalid {
                            message: format!("reconnect.max-retries is too large: {}", val),
                        })?;
                }
                "initial-delay-ms" => {
                    reconnect.initial_delay_ms =
                        first_unsigned(child, "reconnect.initial-delay-ms")?;
                }
                "max-delay-ms" => {
                    reconnect.max_delay_ms = first_unsigned(child, "reconnect.max-delay-ms")?;
                }
                name => {
                    tracing::warn!("Unknown reconnect option: {}", name);
                }
            }
        }
    }

    if reconnect.initial_delay_ms > reconnect.max_delay_ms {
        return Err(ConfigError::Invalid {
            message: format!(
                "reconnect.initial-delay-ms ({}) must not exceed reconnect.max-delay-ms ({})",
                reconnect.initial_delay_ms, reconnect.max_delay_ms
            ),
        });
    }

    Ok(reconnect)
}

/// Each child node of `handlers` names one handler module; its string
/// arguments are passed to the module unchanged.
fn parse_handlers(node: &kdl::KdlNode) -> Result<Vec<HandlerSpec>, ConfigError> {
    let mut handlers = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let name = child.name().value().to_string();
            let mut args = Vec::with_capacity(child.entries().len());

            for entry in child.entries() {
                match entry.value().as_string() {
                    Some(arg) => args.push(arg.to_string()),
                    None => {
                        return Err(ConfigError::Invalid {
                            message: format!(
                                "Handler '{}' arguments must be strings, got {}",
                                name,
                                entry.value()
                            ),
                        });
                    }
                }
            }

            handlers.push(HandlerSpec { name, args });
        }
    }

    Ok(handlers)
}

fn first_string<'a>(node: &'a kdl::KdlNode, field: &str) -> Result<&'a str, ConfigError> {
    let entry = node.entries().first().ok_or_else(|| ConfigError::MissingValue {
        field: field.to_string(),
    })?;

    entry.value().as_string().ok_or_else(|| ConfigError::Invalid {
        message: format!("{} must be a string", field),
    })
}

fn first_unsigned(node: &kdl::KdlNode, field: &str) -> Result<u64, ConfigError> {
    let entry = node.entries().first().ok_or_else(|| ConfigError::MissingValue {
        field: field.to_string(),
    })?;

    let val = entry.value().as_i64().ok_or_else(|| ConfigError::Invalid {
        message: format!("{} must be an integer", field),
    })?;

    u64::try_from(val).map_err(|_| ConfigError::Invalid {
        message: format!("{} must not be negative, got {}", field, val),
    })
}
