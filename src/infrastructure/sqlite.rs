use crate::config::DatabaseSettings;
use crate::domain::contract::{Contract, ContractDetails, ContractId};
use crate::domain::dataset::{Dataset, ImportSummary};
use crate::domain::job::{Job, JobDetails, JobId, PayableJob};
use crate::domain::money::Money;
use crate::domain::ports::{
    DatasetImporter, ReadStore, TransactionalStore, UnitOfWork, UnitOfWorkBox,
};
use crate::domain::profile::{Profile, ProfileId};
use crate::domain::report::{ClientSpending, DateRange, ProfessionEarnings};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Contract columns with both parties, aliased `contract_*`, `client_*` and `contractor_*`.
macro_rules! contract_details_columns {
    () => {
        "c.id AS contract_id, c.terms AS contract_terms, c.status AS contract_status,
         cl.id AS client_id, cl.first_name AS client_first_name, cl.last_name AS client_last_name,
         cl.profession AS client_profession, cl.balance_cents AS client_balance_cents,
         cl.kind AS client_kind,
         co.id AS contractor_id, co.first_name AS contractor_first_name,
         co.last_name AS contractor_last_name, co.profession AS contractor_profession,
         co.balance_cents AS contractor_balance_cents, co.kind AS contractor_kind"
    };
}

macro_rules! job_columns {
    () => {
        "j.id AS job_id, j.description AS job_description, j.price_cents AS job_price_cents,
         j.paid AS job_paid, j.payment_date AS job_payment_date"
    };
}

macro_rules! party_joins {
    () => {
        " JOIN profiles cl ON cl.id = c.client_id JOIN profiles co ON co.id = c.contractor_id"
    };
}

const CONTRACT_BY_ID: &str = concat!(
    "SELECT ",
    contract_details_columns!(),
    " FROM contracts c",
    party_joins!(),
    " WHERE c.id = ?"
);

const ACTIVE_CONTRACTS: &str = concat!(
    "SELECT ",
    contract_details_columns!(),
    " FROM contracts c",
    party_joins!(),
    " WHERE c.status <> 'terminated' AND (c.client_id = ? OR c.contractor_id = ?)",
    " ORDER BY c.id"
);

const UNPAID_JOBS: &str = concat!(
    "SELECT ",
    job_columns!(),
    ", ",
    contract_details_columns!(),
    " FROM jobs j JOIN contracts c ON c.id = j.contract_id",
    party_joins!(),
    " WHERE (j.paid IS NULL OR j.paid = 0) AND c.status = 'in_progress'",
    " AND (c.client_id = ? OR c.contractor_id = ?)",
    " ORDER BY j.id"
);

const PAYABLE_JOB: &str = concat!(
    "SELECT ",
    job_columns!(),
    ", c.id AS contract_id, c.terms AS contract_terms, c.status AS contract_status,
     c.client_id AS contract_client_id, c.contractor_id AS contract_contractor_id
     FROM jobs j JOIN contracts c ON c.id = j.contract_id WHERE j.id = ?"
);

const BEST_PROFESSION: &str = "
    SELECT p.profession AS profession, SUM(j.price_cents) AS total_cents
    FROM jobs j
    JOIN contracts c ON c.id = j.contract_id
    JOIN profiles p ON p.id = c.contractor_id
    WHERE j.paid = 1 AND j.payment_date BETWEEN ? AND ?
    GROUP BY p.profession
    ORDER BY total_cents DESC, p.profession ASC
    LIMIT 1";

const BEST_CLIENTS: &str = "
    SELECT p.id AS id, p.first_name || ' ' || p.last_name AS full_name,
           SUM(j.price_cents) AS paid_cents
    FROM jobs j
    JOIN contracts c ON c.id = j.contract_id
    JOIN profiles p ON p.id = c.client_id
    WHERE j.paid = 1 AND j.payment_date BETWEEN ? AND ?
    GROUP BY p.id, full_name
    ORDER BY paid_cents DESC, p.id ASC
    LIMIT ?";

const OUTSTANDING_FOR_CLIENT: &str = "
    SELECT COALESCE(SUM(j.price_cents), 0)
    FROM jobs j JOIN contracts c ON c.id = j.contract_id
    WHERE c.client_id = ? AND (j.paid IS NULL OR j.paid = 0)";

/// A persistent store implementation using SQLite through `sqlx`.
///
/// Units of work run on a dedicated pooled connection inside `BEGIN IMMEDIATE`, so a
/// second writer blocks (up to the configured busy timeout) until the first commits or
/// rolls back. This is what serialises concurrent payments for the same job.
///
/// This struct is thread-safe (`Clone` shares the underlying pool).
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database and applies pending migrations.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let url = settings.url.as_deref().ok_or_else(|| {
            PaymentError::ValidationError("Database URL is not configured".to_string())
        })?;
        info!(url, "connecting to SQLite");

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(settings.busy_timeout());
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("migrations applied");
        Ok(())
    }
}

#[async_trait]
impl ReadStore for SqliteStore {
    async fn profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, profession, balance_cents, kind
             FROM profiles WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| profile_from(&row, "")).transpose()
    }

    async fn contract(&self, id: ContractId) -> Result<Option<ContractDetails>> {
        let row = sqlx::query(CONTRACT_BY_ID)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| contract_details_from(&row)).transpose()
    }

    async fn active_contracts(&self, profile: ProfileId) -> Result<Vec<ContractDetails>> {
        let rows = sqlx::query(ACTIVE_CONTRACTS)
            .bind(profile.0)
            .bind(profile.0)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(contract_details_from).collect()
    }

    async fn unpaid_jobs(&self, profile: ProfileId) -> Result<Vec<JobDetails>> {
        let rows = sqlx::query(UNPAID_JOBS)
            .bind(profile.0)
            .bind(profile.0)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| -> Result<JobDetails> {
                let contract = contract_details_from(row)?;
                Ok(JobDetails {
                    job: job_from(row, contract.contract.id)?,
                    contract,
                })
            })
            .collect()
    }

    async fn best_profession(&self, range: DateRange) -> Result<Option<ProfessionEarnings>> {
        let row = sqlx::query(BEST_PROFESSION)
            .bind(range.start.timestamp_millis())
            .bind(range.end.timestamp_millis())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| -> Result<ProfessionEarnings> {
            Ok(ProfessionEarnings {
                profession: row.try_get("profession")?,
                total_earned: Money::from_minor_units(row.try_get("total_cents")?),
            })
        })
        .transpose()
    }

    async fn best_clients(&self, range: DateRange, limit: u32) -> Result<Vec<ClientSpending>> {
        let rows = sqlx::query(BEST_CLIENTS)
            .bind(range.start.timestamp_millis())
            .bind(range.end.timestamp_millis())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| -> Result<ClientSpending> {
                Ok(ClientSpending {
                    id: ProfileId(row.try_get("id")?),
                    full_name: row.try_get("full_name")?,
                    paid: Money::from_minor_units(row.try_get("paid_cents")?),
                })
            })
            .collect()
    }
}

#[async_trait]
impl TransactionalStore for SqliteStore {
    async fn begin(&self) -> Result<UnitOfWorkBox> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(Box::new(SqliteUnitOfWork { conn: Some(conn) }))
    }
}

#[async_trait]
impl DatasetImporter for SqliteStore {
    async fn import(&self, dataset: Dataset) -> Result<ImportSummary> {
        dataset.validate()?;
        let summary = dataset.summary();
        let mut tx = self.pool.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Err(PaymentError::ValidationError(
                "Store already contains data".to_string(),
            ));
        }

        for profile in &dataset.profiles {
            sqlx::query(
                "INSERT INTO profiles (id, first_name, last_name, profession, balance_cents, kind)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(profile.id.0)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.profession)
            .bind(profile.balance.minor_units()?)
            .bind(profile.kind.as_str())
            .execute(&mut *tx)
            .await?;
        }

        for contract in &dataset.contracts {
            sqlx::query(
                "INSERT INTO contracts (id, terms, status, client_id, contractor_id)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(contract.id.0)
            .bind(&contract.terms)
            .bind(contract.status.as_str())
            .bind(contract.client_id.0)
            .bind(contract.contractor_id.0)
            .execute(&mut *tx)
            .await?;
        }

        for job in &dataset.jobs {
            sqlx::query(
                "INSERT INTO jobs (id, description, price_cents, paid, payment_date, contract_id)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(job.id.0)
            .bind(&job.description)
            .bind(job.price.minor_units()?)
            .bind(job.paid.map(i64::from))
            .bind(job.payment_date.map(|at| at.timestamp_millis()))
            .bind(job.contract_id.0)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            profiles = summary.profiles,
            contracts = summary.contracts,
            jobs = summary.jobs,
            "imported dataset into SQLite"
        );
        Ok(summary)
    }
}

/// Transaction on a connection taken out of the pool.
///
/// If dropped while still open the connection is detached from the pool and closed,
/// which makes SQLite roll the transaction back.
pub struct SqliteUnitOfWork {
    conn: Option<PoolConnection<Sqlite>>,
}

impl SqliteUnitOfWork {
    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| PaymentError::internal("unit of work already finished"))
    }

    /// Returns the connection to the pool once no transaction is open on it.
    fn release(&mut self) {
        self.conn.take();
    }

    async fn end(&mut self, statement: &'static str) -> Result<()> {
        sqlx::query(statement).execute(self.conn()?).await?;
        self.release();
        Ok(())
    }
}

impl Drop for SqliteUnitOfWork {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!("unit of work dropped while open; closing its connection");
            drop(conn.detach());
        }
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn payable_job(&mut self, id: JobId) -> Result<Option<PayableJob>> {
        let row = sqlx::query(PAYABLE_JOB)
            .bind(id.0)
            .fetch_optional(self.conn()?)
            .await?;
        row.map(|row| -> Result<PayableJob> {
            let status: String = row.try_get("contract_status")?;
            let contract = Contract {
                id: ContractId(row.try_get("contract_id")?),
                terms: row.try_get("contract_terms")?,
                status: status.parse()?,
                client_id: ProfileId(row.try_get("contract_client_id")?),
                contractor_id: ProfileId(row.try_get("contract_contractor_id")?),
            };
            Ok(PayableJob {
                job: job_from(&row, contract.id)?,
                contract,
            })
        })
        .transpose()
    }

    async fn profile(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, profession, balance_cents, kind
             FROM profiles WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(self.conn()?)
        .await?;
        row.map(|row| profile_from(&row, "")).transpose()
    }

    async fn outstanding_for_client(&mut self, client: ProfileId) -> Result<Money> {
        let cents: i64 = sqlx::query_scalar(OUTSTANDING_FOR_CLIENT)
            .bind(client.0)
            .fetch_one(self.conn()?)
            .await?;
        Ok(Money::from_minor_units(cents))
    }

    async fn credit(&mut self, id: ProfileId, amount: Money) -> Result<Money> {
        let cents: Option<i64> = sqlx::query_scalar(
            "UPDATE profiles SET balance_cents = balance_cents + ? WHERE id = ?
             RETURNING balance_cents",
        )
        .bind(amount.minor_units()?)
        .bind(id.0)
        .fetch_optional(self.conn()?)
        .await?;
        cents
            .map(Money::from_minor_units)
            .ok_or_else(|| PaymentError::NotFound(format!("Profile {id} not found")))
    }

    async fn debit(&mut self, id: ProfileId, amount: Money) -> Result<Money> {
        let units = amount.minor_units()?;
        let cents: Option<i64> = sqlx::query_scalar(
            "UPDATE profiles SET balance_cents = balance_cents - ?
             WHERE id = ? AND balance_cents >= ?
             RETURNING balance_cents",
        )
        .bind(units)
        .bind(id.0)
        .bind(units)
        .fetch_optional(self.conn()?)
        .await?;
        if let Some(cents) = cents {
            return Ok(Money::from_minor_units(cents));
        }
        match self.profile(id).await? {
            Some(_) => Err(PaymentError::InsufficientFunds),
            None => Err(PaymentError::NotFound(format!("Profile {id} not found"))),
        }
    }

    async fn mark_paid(&mut self, id: JobId, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE jobs SET paid = 1, payment_date = ?
             WHERE id = ? AND (paid IS NULL OR paid = 0)",
        )
        .bind(at.timestamp_millis())
        .bind(id.0)
        .execute(self.conn()?)
        .await?;
        if result.rows_affected() == 0 {
            return Err(PaymentError::NotFound("Job already paid".to_string()));
        }
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        if let Err(e) = self.end("COMMIT").await {
            // A failed COMMIT can leave the transaction open on the connection.
            if let Err(rollback) = self.end("ROLLBACK").await {
                warn!(error = %rollback, "rollback after failed commit also failed");
            }
            return Err(e);
        }
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.end("ROLLBACK").await
    }
}

fn profile_from(row: &SqliteRow, prefix: &str) -> Result<Profile> {
    let column = |name: &str| format!("{prefix}{name}");
    let kind: String = row.try_get(column("kind").as_str())?;
    Ok(Profile {
        id: ProfileId(row.try_get(column("id").as_str())?),
        first_name: row.try_get(column("first_name").as_str())?,
        last_name: row.try_get(column("last_name").as_str())?,
        profession: row.try_get(column("profession").as_str())?,
        balance: Money::from_minor_units(row.try_get(column("balance_cents").as_str())?),
        kind: kind.parse()?,
    })
}

fn contract_details_from(row: &SqliteRow) -> Result<ContractDetails> {
    let client = profile_from(row, "client_")?;
    let contractor = profile_from(row, "contractor_")?;
    let status: String = row.try_get("contract_status")?;
    Ok(ContractDetails {
        contract: Contract {
            id: ContractId(row.try_get("contract_id")?),
            terms: row.try_get("contract_terms")?,
            status: status.parse()?,
            client_id: client.id,
            contractor_id: contractor.id,
        },
        client,
        contractor,
    })
}

fn job_from(row: &SqliteRow, contract_id: ContractId) -> Result<Job> {
    let paid: Option<i64> = row.try_get("job_paid")?;
    let payment_date: Option<i64> = row.try_get("job_payment_date")?;
    Ok(Job {
        id: JobId(row.try_get("job_id")?),
        description: row.try_get("job_description")?,
        price: Money::from_minor_units(row.try_get("job_price_cents")?),
        paid: paid.map(|flag| flag != 0),
        payment_date: payment_date.map(from_millis).transpose()?,
        contract_id,
    })
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| PaymentError::internal(format!("invalid payment timestamp {millis}")))
}
