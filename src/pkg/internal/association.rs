use std::collections::HashSet;

use crate::pkg::internal::adaptors::jobs::spec::JobEntry;

fn emails_of(job: &JobEntry) -> impl Iterator<Item = String> + '_ {
    [job.submitter_email.as_str(), job.contact_email.as_str()]
        .into_iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

/// Postings that belong to `email`: every posting sharing a submitter or
/// contact email with one of the postings where `email` is itself the
/// submitter or contact. Only one hop is followed; input order is kept.
pub fn associated_postings(email: &str, postings: Vec<JobEntry>) -> Vec<JobEntry> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return vec![];
    }
    let associated: HashSet<String> = postings
        .iter()
        .filter(|job| emails_of(job).any(|e| e == email))
        .flat_map(emails_of)
        .collect();
    tracing::debug!("{} is associated with {} addresses", &email, associated.len());
    if associated.is_empty() {
        return vec![];
    }
    postings
        .into_iter()
        .filter(|job| emails_of(job).any(|e| associated.contains(&e)))
        .collect()
}
