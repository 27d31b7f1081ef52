// src/config.rs

use dotenvy::dotenv;
use std::env;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub api_token: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let api_base_url = env::var("API_BASE_URL")
            .expect("API_BASE_URL must be set");
        let mut api_base_url = Url::parse(&api_base_url)
            .expect("API_BASE_URL must be a valid URL");

        // Relative endpoint paths join against the base, which only
        // works when the base path ends in a slash.
        if !api_base_url.path().ends_with('/') {
            let path = format!("{}/", api_base_url.path());
            api_base_url.set_path(&path);
        }

        let api_token = env::var("API_TOKEN")
            .expect("API_TOKEN must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            api_base_url,
            api_token,
            rust_log,
        }
    }
}
