use crate::domain::contract::{Contract, ContractId, ContractStatus};
use crate::domain::dataset::Dataset;
use crate::domain::job::{Job, JobId};
use crate::domain::money::Money;
use crate::domain::profile::{Profile, ProfileId, ProfileKind};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const PROFILES_FILE: &str = "profiles.csv";
pub const CONTRACTS_FILE: &str = "contracts.csv";
pub const JOBS_FILE: &str = "jobs.csv";

#[derive(Debug, Deserialize)]
struct ProfileRecord {
    id: i64,
    first_name: String,
    last_name: String,
    profession: String,
    balance: Decimal,
    #[serde(rename = "type")]
    kind: ProfileKind,
}

#[derive(Debug, Deserialize)]
struct ContractRecord {
    id: i64,
    terms: String,
    status: ContractStatus,
    client_id: i64,
    contractor_id: i64,
}

#[derive(Debug, Deserialize)]
struct JobRecord {
    id: i64,
    description: String,
    price: Decimal,
    paid: Option<String>,
    payment_date: Option<String>,
    contract_id: i64,
}

impl From<ProfileRecord> for Profile {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: ProfileId(record.id),
            first_name: record.first_name,
            last_name: record.last_name,
            profession: record.profession,
            balance: Money::new(record.balance),
            kind: record.kind,
        }
    }
}

impl From<ContractRecord> for Contract {
    fn from(record: ContractRecord) -> Self {
        Self {
            id: ContractId(record.id),
            terms: record.terms,
            status: record.status,
            client_id: ProfileId(record.client_id),
            contractor_id: ProfileId(record.contractor_id),
        }
    }
}

impl TryFrom<JobRecord> for Job {
    type Error = PaymentError;

    fn try_from(record: JobRecord) -> Result<Self> {
        let paid = match record.paid.as_deref() {
            None => None,
            Some("true" | "1") => Some(true),
            Some("false" | "0") => Some(false),
            Some(other) => {
                return Err(PaymentError::ValidationError(format!(
                    "job {}: invalid paid flag {other:?}",
                    record.id
                )));
            }
        };
        let payment_date = record
            .payment_date
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(|_| {
                        PaymentError::ValidationError(format!(
                            "job {}: invalid payment date {raw:?}",
                            record.id
                        ))
                    })
            })
            .transpose()?;
        Ok(Self {
            id: JobId(record.id),
            description: record.description,
            price: Money::new(record.price),
            paid,
            payment_date,
            contract_id: ContractId(record.contract_id),
        })
    }
}

/// Reads seed records from a CSV source.
///
/// This reader wraps `csv::Reader` and provides iterators over `Result<Profile>`,
/// `Result<Contract>` and `Result<Job>`. It trims whitespace and treats empty
/// optional fields as missing.
pub struct SeedReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> SeedReader<R> {
    /// Creates a new `SeedReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    pub fn profiles(self) -> impl Iterator<Item = Result<Profile>> {
        self.reader
            .into_deserialize::<ProfileRecord>()
            .map(|result| result.map(Profile::from).map_err(PaymentError::from))
    }

    pub fn contracts(self) -> impl Iterator<Item = Result<Contract>> {
        self.reader
            .into_deserialize::<ContractRecord>()
            .map(|result| result.map(Contract::from).map_err(PaymentError::from))
    }

    pub fn jobs(self) -> impl Iterator<Item = Result<Job>> {
        self.reader
            .into_deserialize::<JobRecord>()
            .map(|result| result.map_err(PaymentError::from).and_then(Job::try_from))
    }
}

fn open(dir: &Path, name: &str) -> Result<SeedReader<File>> {
    let path = dir.join(name);
    let file = File::open(&path).map_err(|e| {
        PaymentError::IoError(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })?;
    Ok(SeedReader::new(file))
}

/// Loads `profiles.csv`, `contracts.csv` and `jobs.csv` from `dir`.
pub fn load_dataset(dir: &Path) -> Result<Dataset> {
    let dataset = Dataset {
        profiles: open(dir, PROFILES_FILE)?.profiles().collect::<Result<_>>()?,
        contracts: open(dir, CONTRACTS_FILE)?.contracts().collect::<Result<_>>()?,
        jobs: open(dir, JOBS_FILE)?.jobs().collect::<Result<_>>()?,
    };
    debug!(dir = %dir.display(), summary = ?dataset.summary(), "loaded seed files");
    Ok(dataset)
}
