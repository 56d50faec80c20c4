use axum::extract::State;
use sqlx::query;

use crate::{pkg::server::state::AppState, prelude::Result};

pub async fn livez() -> Result<()> {
    tracing::debug!("job board is live");
    Ok(())
}

/// ready once the database answers
pub async fn healthz(State(state): State<AppState>) -> Result<()> {
    query("select 1").execute(&*state.db_pool).await?;
    tracing::debug!("job board is healthy");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[tokio::test]
    #[traced_test]
    async fn test_livez_needs_nothing() {
        assert!(livez().await.is_ok());
        assert!(logs_contain("job board is live"));
    }
}
