use askama::Template;

use super::{SendEmail, authtoken::link, send_email};

pub const JOB_ALERTS: &str = "job_alerts";

/// announcement of a newly approved posting to one subscribed member
#[derive(Template)]
#[template(path = "email/job_alert.html")]
pub struct JobAlert<'a> {
    pub first_name: &'a str,
    pub member_id: &'a str,
    pub title: &'a str,
    pub organization: &'a str,
    pub slug: &'a str,
    pub base_url: &'a str,
}

impl<'a> JobAlert<'a> {
    pub fn posting_link(&self) -> String {
        format!("{}/jobs/{}", self.base_url, self.slug)
    }

    pub fn unsubscribe_link(&self) -> String {
        link(self.base_url, "/unsubscribe", &[("member", self.member_id), ("type", JOB_ALERTS)])
    }
}

impl<'a> SendEmail for JobAlert<'a> {
    fn send(&self, email: &str) -> crate::prelude::Result<()> {
        send_email(email, &format!("New opportunity: {}", self.title), &self.render()?, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_links() {
        let alert = JobAlert {
            first_name: "",
            member_id: "5f1c7a52-94a1-4d8e-a1a4-0c1b9c1e2f3a",
            title: "Communications Intern",
            organization: "State Party",
            slug: "communications-intern-k3v9",
            base_url: "https://jobs.example.org",
        };
        assert_eq!(alert.posting_link(), "https://jobs.example.org/jobs/communications-intern-k3v9");
        assert_eq!(
            alert.unsubscribe_link(),
            "https://jobs.example.org/unsubscribe?member=5f1c7a52-94a1-4d8e-a1a4-0c1b9c1e2f3a&type=job_alerts"
        );
        let body = alert.render().unwrap();
        assert!(body.contains("Hi there"));
        assert!(body.contains("Unsubscribe"));
    }

    #[test]
    fn test_alert_escapes_posting_text() {
        let alert = JobAlert {
            first_name: "Ari",
            member_id: "5f1c7a52-94a1-4d8e-a1a4-0c1b9c1e2f3a",
            title: "<a href=\"https://phish.example\">Claim your stipend</a>",
            organization: "<img src=x>",
            slug: "claim-your-stipend-k3v9",
            base_url: "https://jobs.example.org",
        };
        let body = alert.render().unwrap();
        assert!(body.contains("&lt;a href="));
        assert!(body.contains("&lt;img src=x&gt;"));
        assert!(!body.contains("<a href=\"https://phish.example\">"));
        assert!(body.contains("href=\"https://jobs.example.org/jobs/claim-your-stipend-k3v9\""));
    }
}
