use askama::Template;

use super::{SendEmail, send_email};

/// confirmation for the person who submitted a posting
#[derive(Template)]
#[template(path = "email/submission_received.html")]
pub struct SubmissionReceived<'a> {
    pub name: &'a str,
    pub title: &'a str,
    pub organization: &'a str,
    pub base_url: &'a str,
}

impl<'a> SendEmail for SubmissionReceived<'a> {
    fn send(&self, email: &str) -> crate::prelude::Result<()> {
        send_email(email, "We received your job posting", &self.render()?, true)
    }
}

/// heads-up for reviewers that a posting waits for a decision
#[derive(Template)]
#[template(path = "email/pending_review.html")]
pub struct PendingReview<'a> {
    pub title: &'a str,
    pub organization: &'a str,
    pub submitter_name: &'a str,
    pub submitter_email: &'a str,
    pub base_url: &'a str,
}

impl<'a> SendEmail for PendingReview<'a> {
    fn send(&self, email: &str) -> crate::prelude::Result<()> {
        send_email(email, &format!("Pending review: {}", self.title), &self.render()?, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_templates_render() {
        let received = SubmissionReceived {
            name: "Sam",
            title: "Field Organizer",
            organization: "County Party",
            base_url: "https://jobs.example.org",
        }
        .render()
        .unwrap();
        assert!(received.contains("Thanks, Sam!"));
        assert!(received.contains("https://jobs.example.org/poster"));

        let pending = PendingReview {
            title: "Field Organizer",
            organization: "County Party",
            submitter_name: "Sam",
            submitter_email: "sam@example.org",
            base_url: "https://jobs.example.org",
        }
        .render()
        .unwrap();
        assert!(pending.contains("sam@example.org"));
        assert!(pending.contains("https://jobs.example.org/review"));
    }

    #[test]
    fn test_reviewer_notice_escapes_submitter_text() {
        let pending = PendingReview {
            title: "Organizer <script>alert(1)</script>",
            organization: "County & Party",
            submitter_name: "Sam",
            submitter_email: "sam@example.org",
            base_url: "https://jobs.example.org",
        }
        .render()
        .unwrap();
        assert!(pending.contains("&lt;script&gt;"));
        assert!(pending.contains("County &amp; Party"));
        assert!(!pending.contains("<script>"));
    }
}
