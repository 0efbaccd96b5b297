use crate::core::form::validate_definition;
use crate::domain::model::FormSpec;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub const DEFAULT_FORM_ACTION: &str = "/form";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub templates: Option<TemplatesSection>,
    #[serde(default = "FormSpec::authentication")]
    pub form: FormSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_form_action")]
    pub form_action: String,
    pub json_logs: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesSection {
    pub directory: Option<String>,
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_form_action() -> String {
    DEFAULT_FORM_ACTION.to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            form_action: default_form_action(),
            json_logs: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            templates: None,
            form: FormSpec::authentication(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LISTEN_ADDR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        validation::validate_socket_addr("server.listen", &self.server.listen)
    }

    pub fn form_action(&self) -> &str {
        &self.server.form_action
    }

    pub fn template_dir(&self) -> Option<PathBuf> {
        self.templates
            .as_ref()
            .and_then(|t| t.directory.as_ref())
            .map(PathBuf::from)
    }

    pub fn json_logs(&self) -> bool {
        self.server.json_logs.unwrap_or(false)
    }

    pub fn validate_config(&self) -> Result<()> {
        self.listen_addr()?;

        validation::validate_route_path("server.form_action", &self.server.form_action)?;
        if self.server.form_action == "/" {
            return Err(AppError::InvalidConfigValueError {
                field: "server.form_action".to_string(),
                value: self.server.form_action.clone(),
                reason: "'/' is reserved for the index page".to_string(),
            });
        }

        if let Some(templates) = &self.templates {
            let directory = validation::validate_required_field(
                "templates.directory",
                &templates.directory,
            )?;
            validation::validate_path("templates.directory", directory)?;
        }

        validate_definition(&self.form)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
