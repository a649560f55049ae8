use std::ops::{Deref, DerefMut};

use error_stack::{Report, ResultExt};
use sqlx::{Error, PgConnection, Pool, Postgres};
use tracing::{error, warn};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::prelude::validation::VEHICLE_ALREADY_BOOKED;
use kernel::{ErrorReason, KernelError};

use crate::env;
use crate::error::ConvertError;

pub use self::{booking::*, vehicle::*};

mod booking;
mod vehicle;

static POSTGRES_URL: &str = "POSTGRES_URL";

const UNIQUE_VIOLATION: &str = "23505";
const EXCLUSION_VIOLATION: &str = "23P01";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
}

impl PostgresDatabase {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        let url = env(POSTGRES_URL)?;
        let pool = Pool::connect(&url).await.convert_error()?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> error_stack::Result<(), KernelError> {
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await
            .change_context_lazy(|| KernelError::Internal)
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let transaction = self.pool.begin().await.convert_error()?;
        Ok(PostgresTransaction(transaction))
    }
}

pub struct PostgresTransaction(sqlx::Transaction<'static, Postgres>);

#[async_trait::async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl Deref for PostgresTransaction {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PostgresTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: 'static> ConvertError for Result<T, Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| {
            let context = match &error {
                Error::PoolTimedOut => KernelError::Timeout,
                Error::Database(db) => match db.code().as_deref() {
                    Some(EXCLUSION_VIOLATION) => KernelError::Conflict,
                    Some(UNIQUE_VIOLATION | SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                        KernelError::Concurrency
                    }
                    _ => KernelError::Internal,
                },
                _ => KernelError::Internal,
            };
            match context {
                KernelError::Internal => error!(%error, "postgres query failed"),
                _ => warn!(%error, "postgres rejected a write"),
            }
            let report = Report::new(error).change_context(context);
            match context {
                KernelError::Conflict => {
                    report.attach_printable(ErrorReason::new(VEHICLE_ALREADY_BOOKED))
                }
                _ => report,
            }
        })
    }
}
