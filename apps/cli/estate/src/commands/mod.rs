//! Command execution. Each command returns the text to print on stdout.

pub mod export;
pub mod request;
pub mod session;

use crate::cli::{Command, NotifyTargetsCommand};
use crate::error::EstateError;
use crate::navigator::TerminalNavigator;

use estate_client::config::EstateConfig;
use estate_client::storage::FileStorage;
use estate_client::{ApiClient, Session};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

const APP_DIR_NAME: &str = "estate";

/// Everything a command needs, loaded once per invocation.
pub struct Context {
    pub config_dir: PathBuf,
    pub config: EstateConfig,
    pub session: Session,
}

impl Context {
    pub fn load(config_dir: &Path) -> Result<Self, EstateError> {
        let config = EstateConfig::load(config_dir)?;
        let storage = FileStorage::open(config.storage_path(config_dir))?;
        debug!("Session storage at {}", storage.path().display());

        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            config,
            session: Session::new(Arc::new(storage)),
        })
    }

    pub fn client(&self) -> Result<ApiClient, EstateError> {
        Ok(ApiClient::new(
            &self.config,
            self.session.clone(),
            Arc::new(TerminalNavigator),
        )?)
    }

    /// Configured download directory, else the user's, else the config dir.
    pub fn download_dir(&self) -> PathBuf {
        self.config
            .export
            .download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| self.config_dir.join("downloads"))
    }
}

pub fn default_config_dir() -> Result<PathBuf, EstateError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| EstateError::estate("Could not determine a config directory, pass --config-dir"))
}

pub async fn execute(context: &Context, command: Command) -> Result<String, EstateError> {
    match command {
        Command::Login { token } => session::login(context, &token),
        Command::Logout => session::logout(context),
        Command::Status => session::status(context),
        Command::Get(args) => request::get(context, &args.path, args.query).await,
        Command::Delete { paths } => request::delete_all(context, paths).await,
        Command::Export(args) => export::export(context, args).await,
        Command::NotifyTargets(NotifyTargetsCommand::Store { user_ids }) => {
            session::store_targets(context, &user_ids)
        }
        Command::NotifyTargets(NotifyTargetsCommand::Take) => session::take_targets(context),
    }
}
