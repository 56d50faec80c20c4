use config::{Config, ConfigError, Environment};
use lazy_static::lazy_static;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub base_url: String,
    pub service_name: String,
    pub listen_port: String,
    pub database_url: String,
    pub database_pool_max_connections: u32,
    //email
    pub from_email: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_server: String,
    //lookup function
    pub lookup_url: String,
    #[serde(default)]
    pub lookup_key: String,
    //storage
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub s3_bucket_name: String,
    #[serde(default)]
    pub storage_public_url: String,
    //review
    #[serde(default)]
    pub reviewer_emails: String,
    #[serde(default)]
    pub membership_url: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .set_default("database_pool_max_connections", 10)?
            .add_source(Environment::default())
            .build()?;
        let mut s: Settings = conf.try_deserialize()?;
        if s.storage_public_url.is_empty() {
            s.storage_public_url = format!("{}/storage/v1/object/public", s.s3_endpoint.trim_end_matches('/'));
        }
        s.base_url = s.base_url.trim_end_matches('/').to_string();
        Ok(s)
    }

    pub fn reviewers(&self) -> Vec<String> {
        parse_email_list(&self.reviewer_emails)
    }

    pub fn is_reviewer(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.reviewers().iter().any(|r| r == &email)
    }
}

pub fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

lazy_static! {
    pub static ref settings: Settings = Settings::new().expect("improperly configured");
}
