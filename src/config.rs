//!
//! memberportal configuration
//! --------------------------
//! Relay settings come from environment variables, optionally overridden by CLI flags in
//! the server binary. Image-storage credentials are the exception: only the variable
//! names live here, their values are read when an upload request arrives.

use std::env;

use crate::error::{AppError, AppResult};

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.tanvirmern.com";
pub const DEFAULT_IMAGES_API_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_IMAGES_ACCOUNT_VAR: &str = "CF_IMAGES_ACCOUNT_ID";
pub const DEFAULT_IMAGES_TOKEN_VAR: &str = "CF_IMAGES_TOKEN";

pub fn parse_port_env(name: &str) -> Option<u16> {
    match env::var(name) {
        Ok(val) => val.parse::<u16>().ok(),
        Err(_) => None,
    }
}

pub fn parse_bool_env(name: &str) -> Option<bool> {
    match env::var(name) {
        Ok(v) => parse_bool(&v),
        Err(_) => None,
    }
}

pub fn parse_bool(v: &str) -> Option<bool> {
    match v.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Society-wide image storage account. Holds env var names, not secrets.
#[derive(Debug, Clone)]
pub struct ImagesConfig {
    pub api_base: String,
    pub account_var: String,
    pub token_var: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_IMAGES_API_URL.to_string(),
            account_var: DEFAULT_IMAGES_ACCOUNT_VAR.to_string(),
            token_var: DEFAULT_IMAGES_TOKEN_VAR.to_string(),
        }
    }
}

impl ImagesConfig {
    /// Resolve (account id, access token) from the process environment at request time.
    pub fn credentials(&self) -> AppResult<(String, String)> {
        let account = env::var(&self.account_var).ok().filter(|s| !s.is_empty());
        let token = env::var(&self.token_var).ok().filter(|s| !s.is_empty());
        match (account, token) {
            (Some(a), Some(t)) => Ok((a, t)),
            _ => Err(AppError::config(
                "images_not_configured",
                "Cloudflare Images credentials are not configured on the server.",
            )),
        }
    }

    pub fn upload_url(&self, account: &str) -> String {
        format!("{}/accounts/{}/images/v1", self.api_base.trim_end_matches('/'), account)
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: String,
    pub http_port: u16,
    /// Base URL of the upstream identity/profile API.
    pub upstream_base: String,
    pub images: ImagesConfig,
    /// Emit the `Secure` attribute on relay cookies. Disable only for plain-HTTP development.
    pub cookie_secure: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            upstream_base: DEFAULT_UPSTREAM_URL.to_string(),
            images: ImagesConfig::default(),
            cookie_secure: true,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(p) = parse_port_env("PORTAL_HTTP_PORT") { cfg.http_port = p; }
        if let Ok(b) = env::var("PORTAL_BIND") { cfg.bind = b; }
        if let Ok(u) = env::var("PORTAL_UPSTREAM_URL") { cfg.upstream_base = u; }
        if let Ok(u) = env::var("PORTAL_IMAGES_API_URL") { cfg.images.api_base = u; }
        if let Ok(v) = env::var("PORTAL_IMAGES_ACCOUNT_VAR") { cfg.images.account_var = v; }
        if let Ok(v) = env::var("PORTAL_IMAGES_TOKEN_VAR") { cfg.images.token_var = v; }
        if let Some(s) = parse_bool_env("PORTAL_COOKIE_SECURE") { cfg.cookie_secure = s; }
        cfg
    }

    /// Apply `--http-port`, `--bind`, `--upstream` and `--insecure-cookies` flags on top of env.
    pub fn apply_args(mut self, args: &[String]) -> Self {
        if let Some(p) = arg_value(args, "--http-port").and_then(|s| s.parse::<u16>().ok()) { self.http_port = p; }
        if let Some(b) = arg_value(args, "--bind") { self.bind = b; }
        if let Some(u) = arg_value(args, "--upstream") { self.upstream_base = u; }
        if args.iter().any(|a| a == "--insecure-cookies") { self.cookie_secure = false; }
        self
    }

    pub fn upstream_url(&self, path: &str) -> String {
        format!("{}{}", self.upstream_base.trim_end_matches('/'), path)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.http_port)
    }
}

pub fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}
