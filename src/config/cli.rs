use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "mini-module")]
#[command(about = "Authentication form web module")]
pub struct ServerConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Socket address to bind, e.g. 127.0.0.1:8080
    #[arg(long)]
    pub listen: Option<String>,

    /// Directory whose `<name>.html` files override the built-in templates
    #[arg(long)]
    pub template_dir: Option<String>,

    /// Path the login form posts to
    #[arg(long)]
    pub form_action: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl ServerConfig {
    /// 載入設定檔（若有），再套用命令列覆蓋設定
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
        if let Some(action) = &self.form_action {
            config.server.form_action = action.clone();
        }
        if let Some(dir) = &self.template_dir {
            config.templates = Some(crate::config::toml_config::TemplatesSection {
                directory: Some(dir.clone()),
            });
        }
        if self.json_logs {
            config.server.json_logs = Some(true);
        }
    }
}
