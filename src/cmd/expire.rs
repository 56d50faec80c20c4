use chrono::Utc;

use crate::{
    pkg::{
        internal::adaptors::jobs::mutators::JobMutator,
        server::state::{GetTxn, db_pool},
    },
    prelude::Result,
};

pub async fn apply() -> Result<()> {
    let pool = db_pool()?;
    let mut tx = pool.begin_txn().await?;
    let expired = JobMutator::new(&mut *tx).expire_due(Utc::now()).await?;
    tx.commit().await?;
    tracing::info!("marked {} postings as expired", expired);
    Ok(())
}
