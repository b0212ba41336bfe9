//! CLI mode
//!
//! Commands that run without starting the HTTP server.

use std::fmt;
use std::path::Path;

use colored::Colorize;

use crate::api::jwt::get_jwt_service;
use crate::cli::{Commands, ConfigCommands};
use crate::config::{StaticConfig, get_config};

const DEFAULT_SAMPLE_CONFIG_PATH: &str = "config.example.toml";

#[derive(Debug)]
pub enum CliError {
    ConfigError(String),
    CommandError(String),
}

impl CliError {
    pub fn format_simple(&self) -> String {
        match self {
            CliError::ConfigError(msg) => format!("Config error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    pub fn format_colored(&self) -> String {
        match self {
            CliError::ConfigError(msg) => {
                format!("{} {}", "Config error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

/// Run a CLI command
pub async fn run_cli(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Token { user_id, minutes } => issue_token(&user_id, minutes).map(|token| {
            println!("{}", token);
        }),
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force),
        Commands::Serve => Err(CliError::CommandError(
            "serve is handled by server mode".to_string(),
        )),
    }
}

/// 为用户签发 bearer token
///
/// 未配置 `auth.jwt_secret` 时拒绝签发：随机密钥签出的 token 服务端无法校验。
pub fn issue_token(user_id: &str, minutes: Option<u64>) -> Result<String, CliError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(CliError::CommandError("user_id must not be empty".to_string()));
    }

    let config = get_config();
    if config.auth.jwt_secret.is_empty() {
        return Err(CliError::ConfigError(
            "auth.jwt_secret is not set; the server could not verify this token".to_string(),
        ));
    }

    let minutes = minutes.unwrap_or(config.auth.access_token_minutes);
    if minutes == 0 {
        return Err(CliError::CommandError("--minutes must be positive".to_string()));
    }

    eprintln!(
        "{} {} {}",
        "Issuing token for".green(),
        user_id.blue(),
        format!("(valid {} minutes)", minutes).dimmed()
    );

    get_jwt_service()
        .generate_access_token_for(user_id, minutes)
        .map_err(|e| CliError::CommandError(format!("Failed to sign token: {}", e)))
}

/// 生成示例配置文件
pub fn config_generate(output_path: Option<String>, force: bool) -> Result<(), CliError> {
    let path = output_path.unwrap_or_else(|| DEFAULT_SAMPLE_CONFIG_PATH.to_string());

    if !force && Path::new(&path).exists() {
        return Err(CliError::CommandError(format!(
            "{} already exists, pass --force to overwrite",
            path
        )));
    }

    println!(
        "{} {}",
        "Generating configuration file...".yellow(),
        path.blue()
    );

    StaticConfig::default().save_to_file(&path).map_err(|e| {
        CliError::CommandError(format!("Unable to write configuration file: {}", e))
    })?;

    println!(
        "  {} {}",
        "Configuration file generated successfully".green(),
        path.blue()
    );
    println!(
        "  {}",
        "Set auth.jwt_secret before issuing tokens".yellow()
    );
    Ok(())
}
