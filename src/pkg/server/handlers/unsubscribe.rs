use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    conf::settings,
    pkg::{
        internal::{adaptors::members::mutators::MemberMutator, email::job_alert::JOB_ALERTS},
        server::{
            state::{AppState, GetTxn},
            uispec::Unsubscribe,
        },
    },
    prelude::Result,
};

const INVALID_LINK: &str = "This unsubscribe link is invalid or incomplete.";
const UNKNOWN_TYPE: &str = "Unknown unsubscribe type";

#[derive(Debug, Deserialize)]
pub struct UnsubscribeQuery {
    pub member: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl UnsubscribeQuery {
    /// the member whose job alerts should stop, or the message to show instead
    pub fn job_alerts_member(&self) -> core::result::Result<Uuid, &'static str> {
        let (Some(member), Some(kind)) = (self.member.as_deref(), self.kind.as_deref()) else {
            return Err(INVALID_LINK);
        };
        if kind != JOB_ALERTS {
            return Err(UNKNOWN_TYPE);
        }
        member.trim().parse::<Uuid>().map_err(|_| INVALID_LINK)
    }
}

async fn stop_job_alerts(state: &AppState, member_id: Uuid) -> Result<bool> {
    let mut tx = state.db_pool.begin_txn().await?;
    let updated = MemberMutator::new(&mut *tx).set_job_alerts(member_id, false).await?;
    tx.commit().await?;
    Ok(updated)
}

pub async fn unsubscribe(State(state): State<AppState>, Query(query): Query<UnsubscribeQuery>) -> Result<Html<String>> {
    let (success, message) = match query.job_alerts_member() {
        Err(message) => (false, message.to_string()),
        Ok(member_id) => match stop_job_alerts(&state, member_id).await {
            Ok(true) => {
                tracing::info!("member {} unsubscribed from job alerts", member_id);
                (true, "You have been unsubscribed from job alert emails.".to_string())
            }
            Ok(false) => (false, INVALID_LINK.to_string()),
            Err(e) => {
                tracing::error!("unsubscribe for {} failed: {:?}", member_id, e);
                (false, "We could not update your preferences. Please try again later.".to_string())
            }
        },
    };
    let template = Unsubscribe {
        success,
        message,
        portal_url: settings.membership_url.clone(),
    };
    Ok(Html(template.render()?))
}
