use askama::Template;
use reqwest::Url;

use super::{SendEmail, send_email};

#[derive(Template)]
#[template(path = "email/authn_code.html")]
pub struct AuthnCodeTemplate<'a> {
    pub name: &'a str,
    pub code: &'a str,
    pub base_url: &'a str,
    pub email: &'a str,
    pub next: &'a str,
}

impl<'a> AuthnCodeTemplate<'a> {
    pub fn magic_link(&self) -> String {
        link(
            self.base_url,
            "/auth/callback",
            &[("email", self.email), ("code", self.code), ("next", self.next)],
        )
    }
}

pub fn link(base_url: &str, path: &str, params: &[(&str, &str)]) -> String {
    let base = format!("{}{}", base_url, path);
    match Url::parse_with_params(&base, params) {
        Ok(url) => url.to_string(),
        Err(_) => base,
    }
}

impl<'a> SendEmail for AuthnCodeTemplate<'a> {
    fn send(&self, email: &str) -> crate::prelude::Result<()> {
        send_email(email, "Your job board sign-in code", &self.render()?, true)?;
        Ok(())
    }
}
