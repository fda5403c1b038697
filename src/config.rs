//! Configuration for Homefront
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Homefront - workforce task and emergency coordination API
#[derive(Parser, Debug, Clone)]
#[command(name = "homefront")]
#[command(about = "Workforce task and emergency coordination API")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "homefront")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds (30 days by default, matching client sessions)
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "2592000")]
    pub jwt_expiry_seconds: u64,

    /// Enable development mode (error details in responses, default JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Directory for uploaded note attachments
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Seed the emergency task catalog on startup if the collection is empty
    #[arg(long, env = "SEED_EMERGENCY_TASKS", default_value = "true")]
    pub seed_emergency_tasks: bool,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        if self.dev_mode {
            self.jwt_secret
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-secret".to_string())
        } else {
            self.jwt_secret
                .clone()
                .expect("JWT_SECRET is required in production mode")
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            listen: "127.0.0.1:8080".parse().unwrap(),
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_db: "homefront".into(),
            jwt_secret: None,
            jwt_expiry_seconds: 3600,
            dev_mode: false,
            upload_dir: "uploads".into(),
            log_level: "info".into(),
            seed_emergency_tasks: true,
        }
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let args = base_args();
        assert!(args.validate().is_err());

        let mut with_secret = base_args();
        with_secret.jwt_secret = Some("secret".into());
        assert!(with_secret.validate().is_ok());
    }

    #[test]
    fn test_dev_mode_fallback_secret() {
        let mut args = base_args();
        args.dev_mode = true;
        assert!(args.validate().is_ok());
        assert_eq!(args.jwt_secret(), "dev-only-insecure-secret");
    }

    #[test]
    fn test_zero_expiry_rejected() {
        let mut args = base_args();
        args.dev_mode = true;
        args.jwt_expiry_seconds = 0;
        assert!(args.validate().is_err());
    }
}
