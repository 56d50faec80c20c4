use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use standard_error::{Interpolate, StandardError, Status};
use validator::{Validate, ValidationErrors};

use crate::{
    pkg::internal::{
        adaptors::jobs::spec::{JobDetails, JobType, LocationType, Submitter},
        lookup::normalize_phone,
        questions::{CustomQuestion, validate_questions},
    },
    prelude::Result,
};

/// html checkboxes are either absent or carry a value such as "on"
pub fn checkbox<'de, D: Deserializer<'de>>(d: D) -> core::result::Result<bool, D::Error> {
    let value = Option::<String>::deserialize(d)?;
    Ok(matches!(
        value.as_deref().map(str::trim),
        Some("on" | "true" | "1" | "yes")
    ))
}

pub fn blank_as_none<'de, D: Deserializer<'de>>(d: D) -> core::result::Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(d)?;
    Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}

pub fn trimmed<'de, D: Deserializer<'de>>(d: D) -> core::result::Result<String, D::Error> {
    Ok(String::deserialize(d)?.trim().to_string())
}

pub fn validation_error(errors: ValidationErrors) -> StandardError {
    StandardError::new("ERR-VALIDATION")
        .code(StatusCode::BAD_REQUEST)
        .interpolate_err(errors.to_string())
}

/// Accepts a plain date (the posting stays up through that day) or a full
/// RFC 3339 timestamp.
pub fn parse_expiry(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(end_of_day) = date.and_hms_opt(23, 59, 59) {
            return Ok(end_of_day.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| {
            StandardError::new("ERR-VALIDATION")
                .code(StatusCode::BAD_REQUEST)
                .interpolate_err(format!("expires_at: {}", e))
        })
}

/// the writable posting fields, shared by submission and editing
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JobForm {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "organization is required"))]
    pub organization: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[serde(default)]
    pub job_type: JobType,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub location_type: LocationType,
    #[serde(default, deserialize_with = "checkbox")]
    pub is_paid: bool,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub salary_range: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub hourly_rate: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub requirements: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub qualifications: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub contact_name: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "contact email must be a valid email address"))]
    pub contact_email: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub contact_phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "application link must be a URL"))]
    pub application_url: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub application_instructions: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub expires_at: Option<String>,
    /// committed builder questions as JSON
    #[serde(default)]
    pub custom_questions: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub require_resume: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub require_cover_letter: bool,
}

impl JobForm {
    /// Resolves the form into storable details. An expiry must lie in the
    /// future unless it names the same day as `current_expiry`.
    pub fn into_details(self, now: DateTime<Utc>, current_expiry: Option<DateTime<Utc>>) -> Result<JobDetails> {
        let expires_at = match self.expires_at.as_deref() {
            Some(raw) => {
                let at = parse_expiry(raw)?;
                let unchanged = current_expiry.map(|c| c.date_naive() == at.date_naive()).unwrap_or(false);
                if at <= now && !unchanged {
                    return Err(StandardError::new("ERR-JOB-002").code(StatusCode::BAD_REQUEST));
                }
                Some(if unchanged { current_expiry.unwrap_or(at) } else { at })
            }
            None => None,
        };
        let questions: Vec<CustomQuestion> = if self.custom_questions.trim().is_empty() {
            vec![]
        } else {
            serde_json::from_str(&self.custom_questions).map_err(|e| {
                StandardError::new("ERR-QUESTION-001")
                    .code(StatusCode::BAD_REQUEST)
                    .interpolate_err(e.to_string())
            })?
        };
        let custom_questions = validate_questions(questions).map_err(|mut e| e.code(StatusCode::BAD_REQUEST))?;
        let (salary_range, hourly_rate) = if self.is_paid {
            (self.salary_range, self.hourly_rate)
        } else {
            (None, None)
        };
        Ok(JobDetails {
            title: self.title,
            organization: self.organization,
            description: self.description,
            job_type: self.job_type,
            location: self.location,
            location_type: self.location_type,
            is_paid: self.is_paid,
            salary_range,
            hourly_rate,
            requirements: self.requirements,
            qualifications: self.qualifications,
            contact_name: self.contact_name,
            contact_email: self.contact_email.to_lowercase(),
            contact_phone: self.contact_phone,
            application_url: self.application_url,
            application_instructions: self.application_instructions,
            expires_at,
            custom_questions,
            require_resume: self.require_resume,
            require_cover_letter: self.require_cover_letter,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitInput {
    #[serde(flatten)]
    #[validate(nested)]
    pub job: JobForm,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "your name is required"))]
    pub submitter_name: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "your email must be a valid email address"))]
    pub submitter_email: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub submitter_phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub submitter_address: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub submitter_city: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub submitter_state: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub submitter_zip_code: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub submitter_date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub submitter_employer: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub submitter_organization: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub member_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub donor_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub subscriber_id: Option<String>,
}

impl SubmitInput {
    pub fn submitter(&self) -> Submitter {
        Submitter {
            name: self.submitter_name.clone(),
            email: self.submitter_email.to_lowercase(),
            phone: self.submitter_phone.as_deref().map(normalize_phone),
            address: self.submitter_address.clone(),
            city: self.submitter_city.clone(),
            state: self.submitter_state.clone(),
            zip_code: self.submitter_zip_code.clone(),
            date_of_birth: self.submitter_date_of_birth.clone(),
            employer: self.submitter_employer.clone(),
            organization: self.submitter_organization.clone(),
            member_id: self.member_id.clone(),
            donor_id: self.donor_id.clone(),
            subscriber_id: self.subscriber_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn submission() -> serde_json::Value {
        json!({
            "title": "  Field Organizer ",
            "organization": "Young Democrats of Missouri",
            "description": "Knock doors.",
            "job_type": "part-time",
            "location_type": "hybrid",
            "location": "",
            "is_paid": "on",
            "salary_range": "$20k",
            "contact_email": "Hiring@Example.org",
            "application_url": "",
            "expires_at": "",
            "custom_questions": "",
            "require_resume": "on",
            "submitter_name": "Jordan Poe",
            "submitter_email": "Jordan@Example.org",
            "submitter_phone": "+1 (573) 555-0199",
            "member_id": "M-42"
        })
    }

    #[test]
    fn test_submission_form_reads_checkboxes_and_blanks() {
        let input: SubmitInput = serde_json::from_value(submission()).unwrap();
        assert!(input.validate().is_ok());
        assert_eq!(input.job.title, "Field Organizer");
        assert_eq!(input.job.job_type, JobType::PartTime);
        assert_eq!(input.job.location_type, LocationType::Hybrid);
        assert!(input.job.is_paid);
        assert!(input.job.require_resume);
        assert!(!input.job.require_cover_letter);
        assert!(input.job.location.is_none());
        assert!(input.job.application_url.is_none());

        let submitter = input.submitter();
        assert_eq!(submitter.email, "jordan@example.org");
        assert_eq!(submitter.phone.as_deref(), Some("5735550199"));
        assert_eq!(submitter.member_id.as_deref(), Some("M-42"));
    }

    #[test]
    fn test_submission_validation_rejects_missing_and_malformed_fields() {
        let mut raw = submission();
        raw["title"] = json!("   ");
        raw["contact_email"] = json!("not-an-email");
        raw["application_url"] = json!("nope");
        let input: SubmitInput = serde_json::from_value(raw).unwrap();
        let errors = input.validate().unwrap_err().to_string();
        assert!(errors.contains("title"), "{}", errors);
        assert!(errors.contains("contact_email"), "{}", errors);
        assert!(errors.contains("application_url"), "{}", errors);
    }

    #[test]
    fn test_unpaid_postings_drop_pay_fields() {
        let mut raw = submission();
        raw["is_paid"] = json!(null);
        raw["hourly_rate"] = json!("$15");
        let input: SubmitInput = serde_json::from_value(raw).unwrap();
        let details = input.job.into_details(Utc::now(), None).unwrap();
        assert!(!details.is_paid);
        assert!(details.salary_range.is_none());
        assert!(details.hourly_rate.is_none());
        assert_eq!(details.contact_email, "hiring@example.org");
    }

    #[test]
    fn test_expiry_must_be_in_the_future() {
        let now = Utc::now();
        let mut raw = submission();
        raw["expires_at"] = json!((now - Duration::days(2)).format("%Y-%m-%d").to_string());
        let input: SubmitInput = serde_json::from_value(raw.clone()).unwrap();
        assert!(input.job.into_details(now, None).is_err());

        raw["expires_at"] = json!((now + Duration::days(10)).format("%Y-%m-%d").to_string());
        let input: SubmitInput = serde_json::from_value(raw).unwrap();
        let details = input.job.into_details(now, None).unwrap();
        assert!(details.expires_at.unwrap() > now);
    }

    #[test]
    fn test_unchanged_past_expiry_is_kept_on_edit() {
        let now = Utc::now();
        let current = now - Duration::days(3);
        let mut raw = submission();
        raw["expires_at"] = json!(current.format("%Y-%m-%d").to_string());
        let input: SubmitInput = serde_json::from_value(raw).unwrap();
        let details = input.job.into_details(now, Some(current)).unwrap();
        assert_eq!(details.expires_at, Some(current));
    }

    #[test]
    fn test_question_json_is_validated_and_renumbered() {
        let mut raw = submission();
        raw["custom_questions"] = json!(
            r#"[{"id":"b","question":"Pick","type":"radio","options":["x"," "],"order":4},
                {"id":"a","question":" Why? ","type":"text","options":["stray"],"order":1}]"#
        );
        let input: SubmitInput = serde_json::from_value(raw.clone()).unwrap();
        let questions = input.job.into_details(Utc::now(), None).unwrap().custom_questions;
        assert_eq!(questions[0].id, "a");
        assert_eq!(questions[0].question, "Why?");
        assert!(questions[0].options.is_empty());
        assert_eq!(questions[1].order, 1);
        assert_eq!(questions[1].options, vec!["x".to_string()]);

        raw["custom_questions"] = json!(r#"[{"id":"c","question":"Pick","type":"select","options":[]}]"#);
        let input: SubmitInput = serde_json::from_value(raw).unwrap();
        assert!(input.job.into_details(Utc::now(), None).is_err());
    }

    #[test]
    fn test_parse_expiry_accepts_dates_and_timestamps() {
        let at = parse_expiry("2030-05-01").unwrap();
        assert_eq!(at.to_rfc3339(), "2030-05-01T23:59:59+00:00");
        let at = parse_expiry("2030-05-01T12:00:00+02:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2030-05-01T10:00:00+00:00");
        assert!(parse_expiry("next week").is_err());
    }
}
