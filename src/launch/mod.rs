//! Launch sequencing and operator-facing error translation.
//!
//! Discovery and configuration merge must both have completed before
//! anything here runs; `launch` consumes their results and hands the
//! resolved runtime to the built-in server.

mod pidfile;

pub use pidfile::Pidfile;

use crate::config::Config;
use crate::discovery::{SettingsRef, SETTINGS_ENV_VAR};
use crate::error::{Error, Result, ServerError};
use crate::server::App;

/// Operator-facing messages for OS-level bind failure codes.
const BIND_ERRORS: &[(i32, &str)] = &[
    (13, "You don't have permission to access that port."),
    (98, "That port is already in use."),
    (99, "That IP address can't be assigned-to."),
];

/// Effective process name: the `proc_name` setting when set, otherwise the
/// discovered settings module.
#[must_use]
pub fn process_name(config: &Config, settings: &SettingsRef) -> String {
    config
        .proc_name()
        .map_or_else(|| settings.module_name.clone(), str::to_string)
}

/// Translate an error into the message shown to the operator.
///
/// Known bind-failure codes map to fixed messages; everything else falls
/// back to the error's own text.
#[must_use]
pub fn operator_message(err: &Error) -> String {
    if let Error::Server(ServerError::Bind {
        code: Some(code), ..
    }) = err
    {
        if let Some((_, message)) = BIND_ERRORS.iter().find(|(known, _)| known == code) {
            return (*message).to_string();
        }
    }
    err.to_string()
}

/// Run the resolved runtime: write the pid file if configured, then serve.
///
/// # Errors
///
/// Propagates pid-file I/O failures and any [`ServerError`] from the
/// built-in application.
pub async fn launch(config: Config, settings: SettingsRef) -> Result<()> {
    let proc_name = process_name(&config, &settings);
    tracing::info!(
        proc_name = %proc_name,
        module = %settings.module_name,
        kind = settings.kind.as_str(),
        "launching"
    );

    // The resolved identifier travels as explicit context, not by mutating
    // the launcher's own environment.
    let inherited = std::env::var("PYTHONPATH").ok();
    for (key, value) in settings.env_exports(SETTINGS_ENV_VAR, inherited.as_deref()) {
        tracing::debug!(%key, %value, "application host environment");
    }

    let _pidfile = match config.pidfile() {
        Some(path) => Some(Pidfile::create(path)?),
        None => None,
    };

    App::new(config, settings).run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::discovery::SettingsKind;

    fn module_settings() -> SettingsRef {
        SettingsRef {
            kind: SettingsKind::Module,
            module_name: "myproj.settings".to_string(),
            search_paths: Vec::new(),
        }
    }

    fn bind_error(code: Option<i32>) -> Error {
        Error::Server(ServerError::Bind {
            address: "127.0.0.1:8000".to_string(),
            code,
            reason: "bind failed".to_string(),
        })
    }

    #[test]
    fn test_known_bind_codes_translate() {
        assert_eq!(
            operator_message(&bind_error(Some(13))),
            "You don't have permission to access that port."
        );
        assert_eq!(
            operator_message(&bind_error(Some(98))),
            "That port is already in use."
        );
        assert_eq!(
            operator_message(&bind_error(Some(99))),
            "That IP address can't be assigned-to."
        );
    }

    #[test]
    fn test_unknown_bind_code_falls_back_to_raw_text() {
        assert_eq!(
            operator_message(&bind_error(Some(4242))),
            "failed to bind to 127.0.0.1:8000: bind failed"
        );
        assert_eq!(
            operator_message(&bind_error(None)),
            "failed to bind to 127.0.0.1:8000: bind failed"
        );
    }

    #[test]
    fn test_non_bind_errors_use_their_own_text() {
        let err = Error::Discovery(crate::error::DiscoveryError::NotFound {
            argument: "ghost".to_string(),
        });
        assert_eq!(
            operator_message(&err),
            "cannot find settings file or module 'ghost'"
        );
    }

    #[test]
    fn test_process_name_prefers_the_setting() {
        let mut options = Options::new();
        options.insert(
            "proc_name".to_string(),
            Some(toml::Value::String("web-1".to_string())),
        );
        let config = Config::merge(None, &options).unwrap();
        assert_eq!(process_name(&config, &module_settings()), "web-1");
    }

    #[test]
    fn test_process_name_falls_back_to_module() {
        let config = Config::defaults();
        assert_eq!(process_name(&config, &module_settings()), "myproj.settings");
    }
}
