use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "paddock", about = "Racer profiles and race videos service")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
    pub community: CommunityConfig,
    pub races: RacesConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the public site, used for profile links and QR codes
    pub public_base_url: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub pool_size: u32,
    pub connection_timeout_secs: u64,
    pub busy_timeout_ms: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MediaConfig {
    pub default_avatar_url: String,
    pub default_cover_url: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CommunityConfig {
    /// Member every new racer follows (and is followed by) on first login
    pub founder_member_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RacesConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: 8,
            connection_timeout_secs: 5,
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            default_avatar_url: "/media/default-avatar.png".to_string(),
            default_cover_url: "/media/default-cover.jpg".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "paddock_session".to_string(),
            session_hours: 720,
        }
    }
}

impl Default for RacesConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081/races".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("paddock.db"));
        }

        // An empty founder id in the file means "none"
        if config
            .community
            .founder_member_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            config.community.founder_member_id = None;
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".paddock")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("paddock.db"))
    }

    /// Public profile page for a handle
    pub fn profile_url(&self, handle_lower: &str) -> String {
        format!(
            "{}/profile/{}",
            self.server.public_base_url.trim_end_matches('/'),
            handle_lower
        )
    }
}
