//! SQLite application log.
//!
//! Every scored application is appended to a single `applications` table,
//! keyed by a short content-derived id. Stored rows carry enough to rebuild
//! the full [`Assessment`], so reports can be regenerated later.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    Application, Assessment, ComponentScores, CreditAssessment, Decision, FraudAssessment,
    RiskLevel,
};
use crate::fraud::confidence_for;

static ID_COUNTER: AtomicU64 = AtomicU64::new(1);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id TEXT UNIQUE NOT NULL,
    created_at TEXT NOT NULL,
    customer_data TEXT,
    credit_score INTEGER,
    risk_level TEXT,
    default_probability REAL,
    fraud_detected INTEGER,
    fraud_score REAL,
    fraud_patterns TEXT,
    decision TEXT,
    business_impact TEXT,
    loan_amount REAL,
    component_scores TEXT,
    model_version TEXT,
    source TEXT
);
CREATE INDEX IF NOT EXISTS idx_applications_created_at ON applications(created_at);
";

const SELECT_COLUMNS: &str = "id, application_id, created_at, customer_data, credit_score, \
     risk_level, default_probability, fraud_detected, fraud_score, fraud_patterns, decision, \
     business_impact, component_scores, model_version, source";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("application not found: {0}")]
    NotFound(String),
    #[error("corrupt record {id}: {message}")]
    Corrupt { id: String, message: String },
}

/// A logged application with its stored metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredApplication {
    pub row_id: i64,
    pub application_id: String,
    pub created_at: DateTime<Utc>,
    /// `cli:score`, `tui:application` or `batch:<file name>`.
    pub source: String,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioStats {
    pub applications: usize,
    /// Percent of applications approved.
    pub approval_rate: f64,
    /// Percent of applications flagged as fraud.
    pub fraud_rate: f64,
    pub average_score: f64,
    /// Count per tier, best first, zero-filled.
    pub risk_distribution: Vec<(RiskLevel, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStats {
    /// `YYYY-MM`.
    pub month: String,
    pub applications: usize,
    pub approval_rate: f64,
    pub average_score: f64,
    /// 15% of loan amount over approved prime applications.
    pub revenue_impact: f64,
}

pub struct ApplicationStore {
    conn: Connection,
}

impl ApplicationStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        let store = Self::with_connection(conn)?;
        info!(path = %path.display(), "opened application store");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Log one assessment and return its application id.
    pub fn log_application(
        &self,
        assessment: &Assessment,
        source: &str,
    ) -> Result<String, StoreError> {
        self.log_application_at(assessment, source, Utc::now())
    }

    /// Log with an explicit timestamp (imports, backfills).
    pub fn log_application_at(
        &self,
        assessment: &Assessment,
        source: &str,
        at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let id = insert(&self.conn, assessment, source, at)?;
        debug!(application_id = %id, source, "logged application");
        Ok(id)
    }

    /// Log a batch in a single transaction. Ids are returned in input order.
    pub fn log_batch(
        &mut self,
        assessments: &[Assessment],
        source: &str,
    ) -> Result<Vec<String>, StoreError> {
        let tx = self.conn.transaction()?;
        let at = Utc::now();
        let ids = assessments
            .iter()
            .map(|a| insert(&tx, a, source, at))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        info!(count = ids.len(), source, "logged batch");
        Ok(ids)
    }

    pub fn get(&self, application_id: &str) -> Result<StoredApplication, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM applications WHERE application_id = ?1");
        let raw = self
            .conn
            .query_row(&sql, params![application_id], RawRecord::from_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(application_id.to_string()))?;
        raw.into_stored()
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredApplication>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM applications ORDER BY created_at DESC, id DESC LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raws = stmt
            .query_map(params![limit as i64], RawRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawRecord::into_stored).collect()
    }

    pub fn portfolio_stats(&self) -> Result<PortfolioStats, StoreError> {
        let (count, approved, fraud, avg): (i64, i64, i64, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN decision = 'Approved' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(fraud_detected), 0),
                    AVG(credit_score)
             FROM applications",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT risk_level, COUNT(*) FROM applications GROUP BY risk_level")?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut risk_distribution: Vec<(RiskLevel, usize)> =
            RiskLevel::ALL.iter().map(|&l| (l, 0)).collect();
        for (name, n) in counts {
            let level: RiskLevel = name.parse().map_err(|message| StoreError::Corrupt {
                id: "<aggregate>".to_string(),
                message,
            })?;
            if let Some(slot) = risk_distribution.iter_mut().find(|(l, _)| *l == level) {
                slot.1 = n as usize;
            }
        }

        Ok(PortfolioStats {
            applications: count as usize,
            approval_rate: percent(approved, count),
            fraud_rate: percent(fraud, count),
            average_score: avg.unwrap_or(0.0),
            risk_distribution,
        })
    }

    /// Last `months` months that have data, oldest first.
    pub fn monthly_stats(&self, months: usize) -> Result<Vec<MonthlyStats>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(created_at, 1, 7) AS month,
                    COUNT(*),
                    SUM(CASE WHEN decision = 'Approved' THEN 1 ELSE 0 END),
                    AVG(credit_score),
                    SUM(CASE WHEN decision = 'Approved' AND risk_level IN ('Excellent', 'Good')
                             THEN loan_amount * 0.15 ELSE 0 END)
             FROM applications
             GROUP BY month
             ORDER BY month DESC
             LIMIT ?1",
        )?;
        let mut rows = stmt
            .query_map(params![months as i64], |row| {
                let count: i64 = row.get(1)?;
                let approved: i64 = row.get(2)?;
                Ok(MonthlyStats {
                    month: row.get(0)?,
                    applications: count as usize,
                    approval_rate: percent(approved, count),
                    average_score: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                    revenue_impact: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.reverse();
        Ok(rows)
    }
}

fn percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn next_application_id(at: DateTime<Utc>, customer_json: &str) -> String {
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = at.timestamp_nanos_opt().unwrap_or_default();
    let digest = Sha256::digest(format!("{nanos}:{customer_json}:{counter}").as_bytes());
    let hex = format!("{digest:x}");
    hex[..12].to_string()
}

fn insert(
    conn: &Connection,
    assessment: &Assessment,
    source: &str,
    at: DateTime<Utc>,
) -> Result<String, StoreError> {
    let customer_json = serde_json::to_string(&assessment.application)?;
    let patterns_json = serde_json::to_string(&assessment.fraud.patterns)?;
    let components_json = serde_json::to_string(&assessment.credit.components)?;
    let application_id = next_application_id(at, &customer_json);
    let credit = &assessment.credit;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO applications (
            application_id, created_at, customer_data, credit_score, risk_level,
            default_probability, fraud_detected, fraud_score, fraud_patterns, decision,
            business_impact, loan_amount, component_scores, model_version, source
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
    )?;
    stmt.execute(params![
        application_id,
        at.to_rfc3339_opts(SecondsFormat::Micros, true),
        customer_json,
        credit.credit_score,
        credit.risk_level.display_name(),
        credit.default_probability,
        assessment.fraud.is_fraud,
        assessment.fraud.fraud_score,
        patterns_json,
        assessment.decision.display_name(),
        credit.business_impact,
        assessment.application.loan_amount,
        components_json,
        credit.model_version,
        source,
    ])?;
    Ok(application_id)
}

/// Column values as read, before JSON and enum decoding.
struct RawRecord {
    row_id: i64,
    application_id: String,
    created_at: String,
    customer_data: String,
    credit_score: i32,
    risk_level: String,
    default_probability: f64,
    fraud_detected: bool,
    fraud_score: f64,
    fraud_patterns: String,
    decision: String,
    business_impact: String,
    component_scores: String,
    model_version: String,
    source: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            row_id: row.get(0)?,
            application_id: row.get(1)?,
            created_at: row.get(2)?,
            customer_data: row.get(3)?,
            credit_score: row.get(4)?,
            risk_level: row.get(5)?,
            default_probability: row.get(6)?,
            fraud_detected: row.get(7)?,
            fraud_score: row.get(8)?,
            fraud_patterns: row.get(9)?,
            decision: row.get(10)?,
            business_impact: row.get(11)?,
            component_scores: row.get(12)?,
            model_version: row.get(13)?,
            source: row.get(14)?,
        })
    }

    fn into_stored(self) -> Result<StoredApplication, StoreError> {
        let corrupt = |message: String| StoreError::Corrupt {
            id: self.application_id.clone(),
            message,
        };

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt(format!("bad timestamp '{}': {e}", self.created_at)))?
            .with_timezone(&Utc);
        let risk_level: RiskLevel = self.risk_level.parse().map_err(corrupt)?;
        let decision: Decision = self.decision.parse().map_err(corrupt)?;
        let application: Application = serde_json::from_str(&self.customer_data)?;
        let components: ComponentScores = serde_json::from_str(&self.component_scores)?;
        let patterns: Vec<String> = serde_json::from_str(&self.fraud_patterns)?;

        let fraud = FraudAssessment {
            is_fraud: self.fraud_detected,
            fraud_score: self.fraud_score,
            indicators: patterns.len(),
            confidence: confidence_for(self.fraud_score),
            patterns,
        };
        let credit = CreditAssessment {
            credit_score: self.credit_score,
            risk_level,
            default_probability: self.default_probability,
            business_impact: self.business_impact,
            components,
            model_version: self.model_version,
        };

        Ok(StoredApplication {
            row_id: self.row_id,
            application_id: self.application_id,
            created_at,
            source: self.source,
            assessment: Assessment {
                application,
                credit,
                fraud,
                decision,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraud::{FraudConfig, FraudDetector, FraudNoise};
    use crate::scoring::{decide, ScoringEngine};
    use chrono::TimeZone;

    fn assess(app: Application) -> Assessment {
        let credit = ScoringEngine::default().score(&app);
        let fraud = FraudDetector::new(FraudConfig {
            noise: FraudNoise::Off,
            ..FraudConfig::default()
        })
        .unwrap()
        .detect(&app);
        let decision = decide(&credit, &fraud);
        Assessment {
            application: app,
            credit,
            fraud,
            decision,
        }
    }

    fn prime() -> Application {
        Application {
            credit_utilization: 0.1,
            income: 1_500_000.0,
            debt_to_income: 0.1,
            employment_length: 12.0,
            loan_amount: 1_000_000.0,
            ..Application::default()
        }
    }

    #[test]
    fn logged_application_round_trips() {
        let store = ApplicationStore::open_in_memory().unwrap();
        let original = assess(Application::default());
        let id = store.log_application(&original, "single").unwrap();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

        let stored = store.get(&id).unwrap();
        assert_eq!(stored.source, "single");
        assert_eq!(stored.assessment, original);
    }

    #[test]
    fn identical_applications_get_distinct_ids() {
        let store = ApplicationStore::open_in_memory().unwrap();
        let a = assess(Application::default());
        let first = store.log_application(&a, "single").unwrap();
        let second = store.log_application(&a, "single").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn missing_id_is_not_found() {
        let store = ApplicationStore::open_in_memory().unwrap();
        assert!(matches!(store.get("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn portfolio_stats_on_empty_store() {
        let store = ApplicationStore::open_in_memory().unwrap();
        let stats = store.portfolio_stats().unwrap();
        assert_eq!(stats.applications, 0);
        assert_eq!(stats.approval_rate, 0.0);
        assert_eq!(stats.risk_distribution.len(), 5);
    }

    #[test]
    fn portfolio_stats_aggregate_batch() {
        let mut store = ApplicationStore::open_in_memory().unwrap();
        let batch = vec![assess(prime()), assess(Application::default())];
        let ids = store.log_batch(&batch, "batch:test.csv").unwrap();
        assert_eq!(ids.len(), 2);

        let stats = store.portfolio_stats().unwrap();
        assert_eq!(stats.applications, 2);
        assert!((stats.approval_rate - 50.0).abs() < 1e-9);
        assert_eq!(stats.fraud_rate, 0.0);
        assert!((stats.average_score - 702.5).abs() < 1e-9);
        assert!(stats.risk_distribution.contains(&(RiskLevel::Good, 1)));
        assert!(stats.risk_distribution.contains(&(RiskLevel::Medium, 1)));
    }

    #[test]
    fn monthly_stats_keep_latest_months_oldest_first() {
        let store = ApplicationStore::open_in_memory().unwrap();
        for (month, app) in [(1, prime()), (2, Application::default()), (3, prime())] {
            let at = Utc.with_ymd_and_hms(2024, month, 15, 12, 0, 0).unwrap();
            store.log_application_at(&assess(app), "single", at).unwrap();
        }

        let stats = store.monthly_stats(2).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].month, "2024-02");
        assert_eq!(stats[1].month, "2024-03");
        assert_eq!(stats[0].revenue_impact, 0.0);
        assert!((stats[1].revenue_impact - 150_000.0).abs() < 1e-6);
        assert_eq!(stats[1].approval_rate, 100.0);
    }

    #[test]
    fn recent_is_newest_first() {
        let store = ApplicationStore::open_in_memory().unwrap();
        let old = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let a = store.log_application_at(&assess(prime()), "single", old).unwrap();
        let b = store.log_application_at(&assess(prime()), "single", new).unwrap();

        let recent = store.recent(10).unwrap();
        assert_eq!(recent[0].application_id, b);
        assert_eq!(recent[1].application_id, a);
        assert_eq!(store.recent(1).unwrap().len(), 1);
    }
}
