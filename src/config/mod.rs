use mongodb::{bson::doc, Client, Database};
use std::env;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

const DEFAULT_CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base: Url,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub frontend_url: String,
    pub cloudinary: Option<CloudinaryConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        Ok(AppConfig {
            host: vars.or("HOST", "127.0.0.1"),
            port: vars.parsed("PORT", 8080)?,
            mongodb_uri: vars.required("MONGODB_URI")?,
            database_name: vars.required("DATABASE_NAME")?,
            jwt_secret: vars.required("JWT_SECRET")?,
            jwt_ttl_hours: vars.parsed("JWT_EXPIRES_IN_HOURS", 24)?,
            bcrypt_cost: vars.parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            frontend_url: vars.or("FRONTEND_URL", "http://localhost:3000"),
            cloudinary: cloudinary_from(&vars)?,
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<'a, F> Vars<'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(name) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value }),
            None => Ok(default),
        }
    }
}

fn cloudinary_from<F>(vars: &Vars<'_, F>) -> Result<Option<CloudinaryConfig>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let cloud_name = match vars.get("CLOUDINARY_CLOUD_NAME") {
        Some(name) => name,
        None => return Ok(None),
    };

    let raw_base = vars.or("CLOUDINARY_API_BASE", DEFAULT_CLOUDINARY_API);
    // Url::join drops the last segment unless the base ends with a slash
    let normalized = if raw_base.ends_with('/') {
        raw_base.clone()
    } else {
        format!("{}/", raw_base)
    };
    let api_base = Url::parse(&normalized).map_err(|_| ConfigError::Invalid {
        name: "CLOUDINARY_API_BASE",
        value: raw_base,
    })?;

    Ok(Some(CloudinaryConfig {
        cloud_name,
        api_key: vars.required("CLOUDINARY_API_KEY")?,
        api_secret: vars.required("CLOUDINARY_API_SECRET")?,
        folder: vars.or("CLOUDINARY_FOLDER", "luxury-cars"),
        api_base,
    }))
}

pub async fn init_database(config: &AppConfig) -> mongodb::error::Result<Database> {
    log::info!("Connecting to MongoDB database: {}", config.database_name);

    let client = Client::with_uri_str(&config.mongodb_uri).await?;
    let database = client.database(&config.database_name);

    // Test the connection
    match database.run_command(doc! { "ping": 1 }, None).await {
        Ok(_) => log::info!("Successfully connected to MongoDB"),
        Err(e) => log::error!("Failed to ping MongoDB: {}", e),
    }

    Ok(database)
}
