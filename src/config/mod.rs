//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::{
    application::docs::DEFAULT_ALLOWED_EXTENSIONS,
    domain::docs::{DocCatalog, DocEntry},
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "diagram-docs";
const ENV_PREFIX: &str = "DIAGRAM_DOCS";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_TABLE_CLASS: &str = "table";
pub(crate) const DEFAULT_MERMAID_SCRIPT_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/mermaid/8.7.0/mermaid.min.js";

/// Command-line arguments for the diagram-docs binary.
#[derive(Debug, Parser)]
#[command(
    name = "diagram-docs",
    version,
    about = "Markdown documentation server with mermaid diagrams"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "DIAGRAM_DOCS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the configured documentation over HTTP.
    Serve(Box<ServeArgs>),
    /// Render a single markdown file to HTML on stdout.
    Render(RenderArgs),
    /// Print the documentation navigation tree as JSON.
    Navigation,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Markdown file to render.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Emit plain code blocks instead of syntax-highlighted ones.
    #[arg(long = "no-highlight", action = clap::ArgAction::SetTrue)]
    pub no_highlight: bool,

    /// Leave mermaid fences as ordinary code blocks.
    #[arg(long = "no-diagrams", action = clap::ArgAction::SetTrue)]
    pub no_diagrams: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Toggle syntax highlighting of fenced code.
    #[arg(
        long = "render-highlight",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub highlight: Option<bool>,

    /// Toggle mermaid diagram containers.
    #[arg(
        long = "render-diagrams",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub diagrams: Option<bool>,

    /// Override the script URL used to load mermaid in the browser.
    #[arg(long = "render-mermaid-script-url", value_name = "URL")]
    pub mermaid_script_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub render: RenderOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub docs: DocsSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub highlight: bool,
    pub diagrams: bool,
    /// `None` when configured as an empty string.
    pub table_class: Option<String>,
    pub mermaid_script_url: String,
}

#[derive(Debug, Clone)]
pub struct DocsSettings {
    pub catalog: DocCatalog,
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Render(args)) => raw.apply_render_args(args),
        Some(Command::Navigation) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    docs: RawDocsSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }

        self.apply_render_overrides(&overrides.render);
    }

    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(highlight) = overrides.highlight {
            self.render.highlight = Some(highlight);
        }
        if let Some(diagrams) = overrides.diagrams {
            self.render.diagrams = Some(diagrams);
        }
        if let Some(url) = overrides.mermaid_script_url.as_ref() {
            self.render.mermaid_script_url = Some(url.clone());
        }
    }

    fn apply_render_args(&mut self, args: &RenderArgs) {
        if args.no_highlight {
            self.render.highlight = Some(false);
        }
        if args.no_diagrams {
            self.render.diagrams = Some(false);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            render,
            docs,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let render = build_render_settings(render)?;
        let docs = build_docs_settings(docs)?;

        Ok(Self {
            server,
            logging,
            render,
            docs,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let table_class = match render.table_class {
        Some(class) => {
            let trimmed = class.trim();
            if trimmed.contains(char::is_whitespace) {
                return Err(LoadError::invalid(
                    "render.table_class",
                    "must be a single class name",
                ));
            }
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        None => Some(DEFAULT_TABLE_CLASS.to_string()),
    };

    let mermaid_script_url = render
        .mermaid_script_url
        .unwrap_or_else(|| DEFAULT_MERMAID_SCRIPT_URL.to_string());
    if mermaid_script_url.trim().is_empty() {
        return Err(LoadError::invalid(
            "render.mermaid_script_url",
            "url must not be empty",
        ));
    }

    Ok(RenderSettings {
        highlight: render.highlight.unwrap_or(true),
        diagrams: render.diagrams.unwrap_or(true),
        table_class,
        mermaid_script_url,
    })
}

fn build_docs_settings(docs: RawDocsSettings) -> Result<DocsSettings, LoadError> {
    for entry in &docs.entries {
        if entry.name.trim().is_empty() {
            return Err(LoadError::invalid(
                "docs.entries",
                "document name must not be empty",
            ));
        }
        if entry.path.as_os_str().is_empty() {
            return Err(LoadError::invalid(
                "docs.entries",
                format!("path of `{}` must not be empty", entry.name),
            ));
        }
    }

    let catalog = DocCatalog::from_entries(docs.entries)
        .map_err(|err| LoadError::invalid("docs.entries", err.to_string()))?;

    let allowed_extensions = match docs.allowed_extensions {
        Some(extensions) => {
            if let Some(bad) = extensions
                .iter()
                .find(|ext| !ext.starts_with('.') || ext.len() < 2)
            {
                return Err(LoadError::invalid(
                    "docs.allowed_extensions",
                    format!("`{bad}` must start with a dot"),
                ));
            }
            extensions
        }
        None => DEFAULT_ALLOWED_EXTENSIONS
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
    };

    Ok(DocsSettings {
        catalog,
        allowed_extensions,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    highlight: Option<bool>,
    diagrams: Option<bool>,
    table_class: Option<String>,
    mermaid_script_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDocsSettings {
    entries: Vec<DocEntry>,
    allowed_extensions: Option<Vec<String>>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
