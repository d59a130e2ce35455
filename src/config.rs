// src/config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    // Bootstrap admin account, created on first start when the store is empty
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl Config {
    pub fn init() -> Config {
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");

        let port = std::env::var("PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(8000);

        let admin_name =
            std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());
        let admin_email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@helpdesk.local".to_string());
        let admin_password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "changeme123".to_string());

        Config {
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port,
            admin_name,
            admin_email,
            admin_password,
        }
    }
}
