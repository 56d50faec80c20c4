use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use standard_error::{Interpolate, StandardError};

pub mod application;
pub mod authtoken;
pub mod job_alert;
pub mod submission;

use crate::{conf::settings, prelude::Result};

pub trait SendEmail {
    fn send(&self, email: &str) -> Result<()>;
}

fn mailbox(name: &str, email: &str) -> Result<Mailbox> {
    format!("{} <{}>", name, email)
        .parse()
        .map_err(|e: lettre::address::AddressError| StandardError::new("ERR-EMAIL-001").interpolate_err(e.to_string()))
}

/// Queues an email; delivery happens on a blocking task and failures are
/// only logged.
pub fn send_email(email: &str, subject: &str, body: &str, is_html: bool) -> Result<()> {
    let (name, _) = email.split_once("@").unwrap_or(("unknown", ""));
    let from = mailbox(&settings.service_name, &settings.from_email)?;
    let to = mailbox(name, email)?;
    let subject = subject.to_string();
    let body = body.to_string();
    tracing::debug!("sending email to {}", &email);
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || {
            let content_type = if is_html {
                ContentType::TEXT_HTML
            } else {
                ContentType::TEXT_PLAIN
            };

            let message = Message::builder()
                .from(from)
                .to(to)
                .subject(subject)
                .header(content_type)
                .body(body)
                .map_err(|e| e.to_string())?;

            let creds = Credentials::new(settings.smtp_user.clone(), settings.smtp_pass.clone());

            let mailer = SmtpTransport::relay(&settings.smtp_server)
                .map_err(|e| e.to_string())?
                .credentials(creds)
                .build();

            mailer.send(&message).map(|_| ()).map_err(|e| e.to_string())
        })
        .await;

        match result {
            Ok(Ok(())) => tracing::debug!("email sent successfully"),
            Ok(Err(e)) => tracing::warn!("could not send email: {}", e),
            Err(e) => tracing::error!("email task failed to execute: {:?}", e),
        }
    });
    Ok(())
}

/// Sends to every recipient, logging instead of failing on a bad address.
pub fn send_all<T: SendEmail>(template: &T, recipients: &[String]) {
    for recipient in recipients {
        if let Err(e) = template.send(recipient) {
            tracing::warn!("skipping notification to {}: {:?}", recipient, e);
        }
    }
}
