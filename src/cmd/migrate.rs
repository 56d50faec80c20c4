use crate::{
    conf::settings,
    pkg::{
        internal::minio::{create_bucket, s3_client},
        server::state::GetTxn,
    },
    prelude::Result,
};
use sqlx::{migrate::Migrator, postgres::PgPoolOptions};
use standard_error::{Interpolate, StandardError};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn apply() -> Result<()> {
    let pool = PgPoolOptions::new()
        .connect(&settings.database_url)
        .await
        .map_err(|e| StandardError::new("ERR-DB-000").interpolate_err(e.to_string()))?;

    tracing::debug!("connected to db");
    let mut tx = pool.begin_txn().await?;
    MIGRATOR
        .run(&mut *tx)
        .await
        .map_err(|e| StandardError::new("ERR-DB-000").interpolate_err(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| StandardError::new("ERR-DB-000").interpolate_err(e.to_string()))?;

    tracing::info!("migrations applied successfully");

    match create_bucket(&s3_client(), &settings.s3_bucket_name).await? {
        Some(_) => tracing::info!("created bucket {}", &settings.s3_bucket_name),
        None => tracing::debug!("bucket {} already exists", &settings.s3_bucket_name),
    }
    Ok(())
}
