use askama::Template;

use super::{SendEmail, send_email};

/// tells a poster that someone applied
#[derive(Template)]
#[template(path = "email/new_applicant.html")]
pub struct NewApplicant<'a> {
    pub applicant_name: &'a str,
    pub title: &'a str,
    pub job_id: &'a str,
    pub base_url: &'a str,
}

impl<'a> SendEmail for NewApplicant<'a> {
    fn send(&self, email: &str) -> crate::prelude::Result<()> {
        send_email(email, &format!("New applicant for {}", self.title), &self.render()?, true)
    }
}
