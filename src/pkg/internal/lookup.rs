use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use standard_error::{Interpolate, StandardError};

use crate::{pkg::internal::adaptors::jobs::spec::Submitter, prelude::Result};

/// identity record returned by the lookup function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupRecord {
    #[serde(default)]
    pub found: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub date_of_birth: Option<String>,
    pub employer: Option<String>,
    pub member_id: Option<String>,
    pub donor_id: Option<String>,
    pub subscriber_id: Option<String>,
}

impl LookupRecord {
    /// submitter fields to start the form with; only the phone when nothing matched
    pub fn prefill(&self, phone: &str) -> Submitter {
        if !self.found {
            return Submitter {
                phone: Some(phone.to_string()),
                ..Default::default()
            };
        }
        Submitter {
            name: self.name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            phone: Some(phone.to_string()),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            date_of_birth: self.date_of_birth.clone(),
            employer: self.employer.clone(),
            organization: None,
            member_id: self.member_id.clone(),
            donor_id: self.donor_id.clone(),
            subscriber_id: self.subscriber_id.clone(),
        }
    }
}

/// digits only, dropping a leading US country code
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.strip_prefix('1') {
        Some(rest) if digits.len() == 11 => rest.to_string(),
        _ => digits,
    }
}

#[derive(Debug)]
pub struct LookupClient {
    http: Client,
    url: String,
    key: String,
}

impl LookupClient {
    pub fn new(url: &str, key: &str) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| StandardError::new("ERR-LOOKUP-000").interpolate_err(e.to_string()))?;
        Ok(LookupClient {
            http,
            url: url.to_string(),
            key: key.to_string(),
        })
    }

    /// Never fails: any error is logged and reads as "not found".
    pub async fn lookup(&self, phone: &str) -> LookupRecord {
        let phone = normalize_phone(phone);
        if phone.is_empty() {
            return LookupRecord::default();
        }
        match self.try_lookup(&phone).await {
            Ok(record) => {
                tracing::debug!("lookup for {} found: {}", &phone, record.found);
                record
            }
            Err(e) => {
                tracing::warn!("phone lookup failed, continuing without prefill: {:?}", e);
                LookupRecord::default()
            }
        }
    }

    async fn try_lookup(&self, phone: &str) -> Result<LookupRecord> {
        let mut request = self.http.post(&self.url).json(&json!({ "action": "lookup", "phone": phone }));
        if !self.key.is_empty() {
            request = request.bearer_auth(&self.key);
        }
        let record = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StandardError::new("ERR-LOOKUP-001").interpolate_err(e.to_string()))?
            .json::<LookupRecord>()
            .await
            .map_err(|e| StandardError::new("ERR-LOOKUP-001").interpolate_err(e.to_string()))?;
        Ok(record)
    }
}
