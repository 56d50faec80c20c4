use aws_sdk_s3::Client as S3Client;
use sqlx::{PgPool, Pool, Postgres, Transaction, postgres::PgPoolOptions};
use std::{future::Future, sync::Arc};

use crate::{
    conf::settings,
    pkg::internal::{lookup::LookupClient, minio::s3_client},
    prelude::Result,
};

pub fn db_pool() -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_pool_max_connections)
        .connect_lazy(&settings.database_url)?;
    Ok(pool)
}

pub trait GetTxn {
    fn begin_txn(&self) -> impl Future<Output = Result<Transaction<'static, Postgres>>> + Send;
}

impl GetTxn for PgPool {
    async fn begin_txn(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.begin().await?)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: Arc<PgPool>,
    pub s3_client: Arc<S3Client>,
    pub lookup: Arc<LookupClient>,
}

impl AppState {
    pub async fn new() -> Result<AppState> {
        Ok(AppState {
            db_pool: Arc::new(db_pool()?),
            s3_client: Arc::new(s3_client()),
            lookup: Arc::new(LookupClient::new(&settings.lookup_url, &settings.lookup_key)?),
        })
    }
}
