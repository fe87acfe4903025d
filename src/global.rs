//! Process-wide default executor.
//!
//! Optional: `BaseDao::new()` reads from here, everything else takes an
//! executor explicitly. Set once at startup; there is no teardown.

use crate::config::{DaoConfig, DaoSettings};
use crate::connection::connect;
use crate::dao::SharedExecutor;
use crate::executor::{DaoError, MayPostgresExecutor};
use once_cell::sync::OnceCell;
use std::sync::Arc;

struct GlobalDefaults {
    executor: SharedExecutor,
    settings: DaoSettings,
}

static DEFAULTS: OnceCell<GlobalDefaults> = OnceCell::new();

/// Install `executor` with default settings
///
/// # Errors
///
/// Returns `DaoError::Config` if a default executor is already installed.
pub fn init(executor: SharedExecutor) -> Result<(), DaoError> {
    init_with(executor, DaoSettings::default())
}

/// Install `executor` together with `settings`
///
/// # Errors
///
/// Returns `DaoError::Config` if a default executor is already installed.
pub fn init_with(executor: SharedExecutor, settings: DaoSettings) -> Result<(), DaoError> {
    log::debug!(
        "installing default executor (batch size {}, primary key {})",
        settings.default_batch_size,
        settings.default_primary_key
    );
    DEFAULTS
        .set(GlobalDefaults { executor, settings })
        .map_err(|_| DaoError::Config("default executor already initialized".to_string()))
}

/// Connect with `config.url` and install the connection as the default executor
///
/// # Errors
///
/// Returns `DaoError::Config` for a malformed URL or a second initialization,
/// `DaoError::Postgres` if the connection cannot be opened.
pub fn init_from_config(config: &DaoConfig) -> Result<(), DaoError> {
    if is_initialized() {
        return Err(DaoError::Config(
            "default executor already initialized".to_string(),
        ));
    }
    let client = connect(&config.url)?;
    init_with(
        Arc::new(MayPostgresExecutor::new(client)),
        config.dao_settings(),
    )
}

pub fn is_initialized() -> bool {
    DEFAULTS.get().is_some()
}

/// The installed executor and settings
///
/// # Errors
///
/// Returns `DaoError::Config` if nothing has been installed yet.
pub fn default_executor() -> Result<(SharedExecutor, DaoSettings), DaoError> {
    DEFAULTS
        .get()
        .map(|d| (Arc::clone(&d.executor), d.settings.clone()))
        .ok_or_else(|| {
            DaoError::Config(
                "no default executor; call daoguard::global::init first".to_string(),
            )
        })
}
