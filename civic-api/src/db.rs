//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling with deadpool-postgres and the
//! `ComplaintRepository` implementation on top of it. Every mutating
//! operation runs in a single transaction so a complaint and its ledger rows
//! are committed together.

use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;
use async_trait::async_trait;
use civic_core::{
    admit_feedback, apply_patch, submit, Category, CategoryId, CategoryWithCount, CivicError,
    CivicResult, Complaint, ComplaintFilter, ComplaintId, ComplaintPatch, ComplaintStatus,
    ConflictError, EntityIdType, EntityType, Feedback, FeedbackId, FeedbackSubmission, GeoPoint,
    HistoryEntryId, NewComplaint, PatchOutcome, Priority, PrincipalId, StatusHistoryEntry,
    StorageError, Submission, Timestamp, ValidationError,
};
use civic_storage::ComplaintRepository;
use deadpool_postgres::{Config, GenericClient, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_postgres::{error::SqlState, types::ToSql, NoTls, Row};

const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

const COMPLAINT_COLUMNS: &str = "complaint_id, reference_number, title, description, category_id, \
     citizen_name, citizen_email, citizen_phone, latitude, longitude, address, photo_ref, \
     status, priority, assigned_to, department, created_at, updated_at, resolved_at";

const CATEGORY_COLUMNS: &str = "c.category_id, c.name, c.description, c.icon, c.color, \
     c.department, c.created_at, \
     (SELECT COUNT(*) FROM civic_complaint x WHERE x.category_id = c.category_id) AS complaint_count";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "civic".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from `CIVIC_DB_*` variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("CIVIC_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("CIVIC_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("CIVIC_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("CIVIC_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("CIVIC_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("CIVIC_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("CIVIC_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(deadpool_postgres::PoolConfig::new(self.max_size));

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn is_unique_violation(e: &tokio_postgres::Error, constraint: &str) -> bool {
    e.as_db_error().is_some_and(|db| {
        db.code() == &SqlState::UNIQUE_VIOLATION && db.constraint() == Some(constraint)
    })
}

fn is_foreign_key_violation(e: &tokio_postgres::Error) -> bool {
    e.as_db_error()
        .is_some_and(|db| db.code() == &SqlState::FOREIGN_KEY_VIOLATION)
}

fn db_error(e: tokio_postgres::Error) -> CivicError {
    if e.is_closed() {
        return StorageError::Unavailable {
            reason: e.to_string(),
        }
        .into();
    }
    tracing::error!(error = ?e, "Database error");
    StorageError::TransactionFailed {
        reason: e.to_string(),
    }
    .into()
}

fn pool_error(e: deadpool_postgres::PoolError) -> CivicError {
    tracing::error!(error = ?e, "Connection pool error");
    StorageError::Unavailable {
        reason: e.to_string(),
    }
    .into()
}

fn corrupt(entity_type: EntityType, reason: impl std::fmt::Display) -> CivicError {
    StorageError::CorruptRow {
        entity_type,
        reason: reason.to_string(),
    }
    .into()
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn category_from_row(row: &Row) -> CivicResult<CategoryWithCount> {
    let map = |e: tokio_postgres::Error| corrupt(EntityType::Category, e);
    Ok(CategoryWithCount {
        category: Category {
            category_id: CategoryId::new(row.try_get("category_id").map_err(map)?),
            name: row.try_get("name").map_err(map)?,
            description: row.try_get("description").map_err(map)?,
            icon: row.try_get("icon").map_err(map)?,
            color: row.try_get("color").map_err(map)?,
            department: row.try_get("department").map_err(map)?,
            created_at: row.try_get("created_at").map_err(map)?,
        },
        complaint_count: row.try_get("complaint_count").map_err(map)?,
    })
}

fn complaint_from_row(row: &Row) -> CivicResult<Complaint> {
    let map = |e: tokio_postgres::Error| corrupt(EntityType::Complaint, e);
    let status: String = row.try_get("status").map_err(map)?;
    let priority: String = row.try_get("priority").map_err(map)?;
    let latitude: Option<f64> = row.try_get("latitude").map_err(map)?;
    let longitude: Option<f64> = row.try_get("longitude").map_err(map)?;
    let location = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        (None, None) => None,
        _ => return Err(corrupt(EntityType::Complaint, "half of a coordinate pair")),
    };

    Ok(Complaint {
        complaint_id: ComplaintId::new(row.try_get("complaint_id").map_err(map)?),
        reference_number: row.try_get("reference_number").map_err(map)?,
        title: row.try_get("title").map_err(map)?,
        description: row.try_get("description").map_err(map)?,
        category_id: CategoryId::new(row.try_get("category_id").map_err(map)?),
        citizen_name: row.try_get("citizen_name").map_err(map)?,
        citizen_email: row.try_get("citizen_email").map_err(map)?,
        citizen_phone: row.try_get("citizen_phone").map_err(map)?,
        location,
        address: row.try_get("address").map_err(map)?,
        photo_ref: row.try_get("photo_ref").map_err(map)?,
        status: ComplaintStatus::from_db_str(&status)
            .map_err(|e| corrupt(EntityType::Complaint, e))?,
        priority: Priority::from_db_str(&priority)
            .map_err(|e| corrupt(EntityType::Complaint, e))?,
        assigned_to: row.try_get("assigned_to").map_err(map)?,
        department: row.try_get("department").map_err(map)?,
        created_at: row.try_get("created_at").map_err(map)?,
        updated_at: row.try_get("updated_at").map_err(map)?,
        resolved_at: row.try_get("resolved_at").map_err(map)?,
    })
}

fn history_from_row(row: &Row) -> CivicResult<StatusHistoryEntry> {
    let map = |e: tokio_postgres::Error| corrupt(EntityType::StatusHistoryEntry, e);
    let old_status: Option<String> = row.try_get("old_status").map_err(map)?;
    let new_status: String = row.try_get("new_status").map_err(map)?;
    Ok(StatusHistoryEntry {
        entry_id: HistoryEntryId::new(row.try_get("entry_id").map_err(map)?),
        complaint_id: ComplaintId::new(row.try_get("complaint_id").map_err(map)?),
        old_status: old_status
            .filter(|s| !s.is_empty())
            .map(|s| ComplaintStatus::from_db_str(&s))
            .transpose()
            .map_err(|e| corrupt(EntityType::StatusHistoryEntry, e))?,
        new_status: ComplaintStatus::from_db_str(&new_status)
            .map_err(|e| corrupt(EntityType::StatusHistoryEntry, e))?,
        changed_by: row.try_get("changed_by").map_err(map)?,
        notes: row.try_get("notes").map_err(map)?,
        created_at: row.try_get("created_at").map_err(map)?,
    })
}

fn feedback_from_row(row: &Row) -> CivicResult<Feedback> {
    let map = |e: tokio_postgres::Error| corrupt(EntityType::Feedback, e);
    Ok(Feedback {
        feedback_id: FeedbackId::new(row.try_get("feedback_id").map_err(map)?),
        complaint_id: ComplaintId::new(row.try_get("complaint_id").map_err(map)?),
        rating: row.try_get("rating").map_err(map)?,
        comments: row.try_get("comments").map_err(map)?,
        would_recommend: row.try_get("would_recommend").map_err(map)?,
        created_at: row.try_get("created_at").map_err(map)?,
    })
}

async fn insert_history(
    tx: &deadpool_postgres::Transaction<'_>,
    entry: &StatusHistoryEntry,
) -> Result<u64, tokio_postgres::Error> {
    let old_status = entry.old_status.map(|s| s.as_db_str());
    tx.execute(
        "INSERT INTO civic_status_history \
         (entry_id, complaint_id, old_status, new_status, changed_by, notes, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            &entry.entry_id.as_uuid(),
            &entry.complaint_id.as_uuid(),
            &old_status,
            &entry.new_status.as_db_str(),
            &entry.changed_by,
            &entry.notes,
            &entry.created_at,
        ],
    )
    .await
}

// ============================================================================
// DATABASE CLIENT
// ============================================================================

/// PostgreSQL-backed complaint repository.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> CivicResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_error)
    }

    /// Apply the schema. Safe to run on every start.
    pub async fn migrate(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.batch_execute(SCHEMA_SQL).await?;
        tracing::info!("Database schema applied");
        Ok(())
    }

    /// Time an operation and record it in the database metrics.
    async fn timed<T, F>(&self, operation: &str, entity: &str, fut: F) -> CivicResult<T>
    where
        F: Future<Output = CivicResult<T>>,
    {
        let start = Instant::now();
        let result = fut.await;
        if let Ok(metrics) = METRICS.as_ref() {
            metrics.record_db_operation(
                operation,
                entity,
                result.is_ok(),
                start.elapsed().as_secs_f64(),
            );
        }
        result
    }

    async fn fetch_complaint<C: GenericClient>(
        conn: &C,
        id: ComplaintId,
        for_update: bool,
    ) -> CivicResult<Option<Complaint>> {
        let sql = format!(
            "SELECT {} FROM civic_complaint WHERE complaint_id = $1{}",
            COMPLAINT_COLUMNS,
            if for_update { " FOR UPDATE" } else { "" }
        );
        let row = conn
            .query_opt(&sql, &[&id.as_uuid()])
            .await
            .map_err(db_error)?;
        row.as_ref().map(complaint_from_row).transpose()
    }
}

#[async_trait]
impl ComplaintRepository for DbClient {
    async fn category_list(&self) -> CivicResult<Vec<CategoryWithCount>> {
        self.timed("list", "category", async {
            let conn = self.get_conn().await?;
            let sql = format!(
                "SELECT {} FROM civic_category c ORDER BY c.name",
                CATEGORY_COLUMNS
            );
            let rows = conn.query(&sql, &[]).await.map_err(db_error)?;
            rows.iter().map(category_from_row).collect()
        })
        .await
    }

    async fn category_get(&self, id: CategoryId) -> CivicResult<Option<CategoryWithCount>> {
        self.timed("get", "category", async {
            let conn = self.get_conn().await?;
            let sql = format!(
                "SELECT {} FROM civic_category c WHERE c.category_id = $1",
                CATEGORY_COLUMNS
            );
            let row = conn
                .query_opt(&sql, &[&id.as_uuid()])
                .await
                .map_err(db_error)?;
            row.as_ref().map(category_from_row).transpose()
        })
        .await
    }

    async fn category_insert(&self, category: &Category) -> CivicResult<()> {
        self.timed("create", "category", async {
            let conn = self.get_conn().await?;
            conn.execute(
                "INSERT INTO civic_category \
                 (category_id, name, description, icon, color, department, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &category.category_id.as_uuid(),
                    &category.name,
                    &category.description,
                    &category.icon,
                    &category.color,
                    &category.department,
                    &category.created_at,
                ],
            )
            .await
            .map_err(|e| {
                if e.as_db_error()
                    .is_some_and(|db| db.code() == &SqlState::UNIQUE_VIOLATION)
                {
                    ConflictError::CategoryNameTaken {
                        name: category.name.clone(),
                    }
                    .into()
                } else {
                    db_error(e)
                }
            })?;
            Ok(())
        })
        .await
    }

    async fn category_upsert(&self, category: &Category) -> CivicResult<bool> {
        self.timed("upsert", "category", async {
            let mut conn = self.get_conn().await?;
            let tx = conn.transaction().await.map_err(db_error)?;
            let updated = tx
                .execute(
                    "UPDATE civic_category \
                     SET description = $2, icon = $3, color = $4, department = $5 \
                     WHERE lower(name) = lower($1)",
                    &[
                        &category.name,
                        &category.description,
                        &category.icon,
                        &category.color,
                        &category.department,
                    ],
                )
                .await
                .map_err(db_error)?;
            if updated == 0 {
                tx.execute(
                    "INSERT INTO civic_category \
                     (category_id, name, description, icon, color, department, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    &[
                        &category.category_id.as_uuid(),
                        &category.name,
                        &category.description,
                        &category.icon,
                        &category.color,
                        &category.department,
                        &category.created_at,
                    ],
                )
                .await
                .map_err(db_error)?;
            }
            tx.commit().await.map_err(db_error)?;
            Ok(updated == 0)
        })
        .await
    }

    async fn category_delete(&self, id: CategoryId) -> CivicResult<()> {
        self.timed("delete", "category", async {
            let mut conn = self.get_conn().await?;
            let tx = conn.transaction().await.map_err(db_error)?;
            let complaints: i64 = tx
                .query_one(
                    "SELECT COUNT(*) FROM civic_complaint WHERE category_id = $1",
                    &[&id.as_uuid()],
                )
                .await
                .map_err(db_error)?
                .get(0);
            if complaints > 0 {
                return Err(ConflictError::CategoryInUse {
                    category_id: id.as_uuid(),
                    complaints,
                }
                .into());
            }
            let deleted = tx
                .execute(
                    "DELETE FROM civic_category WHERE category_id = $1",
                    &[&id.as_uuid()],
                )
                .await
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        ConflictError::CategoryInUse {
                            category_id: id.as_uuid(),
                            complaints: 1,
                        }
                        .into()
                    } else {
                        db_error(e)
                    }
                })?;
            if deleted == 0 {
                return Err(CivicError::not_found(EntityType::Category, id));
            }
            tx.commit().await.map_err(db_error)?;
            Ok(())
        })
        .await
    }

    async fn complaint_create(
        &self,
        input: NewComplaint,
        now: Timestamp,
    ) -> CivicResult<Submission> {
        self.timed("create", "complaint", async {
            let mut conn = self.get_conn().await?;
            let tx = conn.transaction().await.map_err(db_error)?;

            let sql = format!(
                "SELECT {} FROM civic_category c WHERE c.category_id = $1",
                CATEGORY_COLUMNS
            );
            let category = tx
                .query_opt(&sql, &[&input.category_id.as_uuid()])
                .await
                .map_err(db_error)?
                .as_ref()
                .map(category_from_row)
                .transpose()?
                .ok_or(ValidationError::UnknownCategory {
                    category_id: input.category_id.as_uuid(),
                })?;

            let submission = submit(input, &category.category, now)?;
            let complaint = &submission.complaint;
            let priority = complaint.priority.as_db_str();
            let status = complaint.status.as_db_str();
            let latitude = complaint.location.map(|p| p.latitude);
            let longitude = complaint.location.map(|p| p.longitude);

            tx.execute(
                &format!(
                    "INSERT INTO civic_complaint ({}) VALUES \
                     ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
                    COMPLAINT_COLUMNS
                ),
                &[
                    &complaint.complaint_id.as_uuid(),
                    &complaint.reference_number,
                    &complaint.title,
                    &complaint.description,
                    &complaint.category_id.as_uuid(),
                    &complaint.citizen_name,
                    &complaint.citizen_email,
                    &complaint.citizen_phone,
                    &latitude,
                    &longitude,
                    &complaint.address,
                    &complaint.photo_ref,
                    &status,
                    &priority,
                    &complaint.assigned_to,
                    &complaint.department,
                    &complaint.created_at,
                    &complaint.updated_at,
                    &complaint.resolved_at,
                ],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "civic_complaint_reference_number_key") {
                    ConflictError::ReferenceCollision {
                        reference_number: complaint.reference_number.clone(),
                    }
                    .into()
                } else {
                    db_error(e)
                }
            })?;

            insert_history(&tx, &submission.initial_entry)
                .await
                .map_err(db_error)?;
            tx.commit().await.map_err(db_error)?;
            Ok(submission)
        })
        .await
    }

    async fn complaint_get(&self, id: ComplaintId) -> CivicResult<Option<Complaint>> {
        self.timed("get", "complaint", async {
            let conn = self.get_conn().await?;
            Self::fetch_complaint(&conn, id, false).await
        })
        .await
    }

    async fn complaint_list(&self, filter: &ComplaintFilter) -> CivicResult<Vec<Complaint>> {
        self.timed("list", "complaint", async {
            let conn = self.get_conn().await?;

            // Indexed predicates run in SQL; search and ordering are applied
            // by the filter itself so both backends sort identically.
            let mut clauses: Vec<String> = Vec::new();
            let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();
            if let Some(scope) = &filter.scope_department {
                params.push(Box::new(scope.clone()));
                clauses.push(format!("department = ${}", params.len()));
            }
            if let Some(status) = filter.status {
                params.push(Box::new(status.as_db_str()));
                clauses.push(format!("status = ${}", params.len()));
            }
            if let Some(category_id) = filter.category_id {
                params.push(Box::new(category_id.as_uuid()));
                clauses.push(format!("category_id = ${}", params.len()));
            }
            if let Some(priority) = filter.priority {
                params.push(Box::new(priority.as_db_str()));
                clauses.push(format!("priority = ${}", params.len()));
            }
            if let Some(department) = &filter.department {
                params.push(Box::new(department.clone()));
                clauses.push(format!("department = ${}", params.len()));
            }

            let mut sql = format!("SELECT {} FROM civic_complaint", COMPLAINT_COLUMNS);
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            let refs: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                .collect();

            let rows = conn.query(&sql, &refs).await.map_err(db_error)?;
            let complaints = rows
                .iter()
                .map(complaint_from_row)
                .collect::<CivicResult<Vec<_>>>()?;
            Ok(filter.apply(complaints.iter()))
        })
        .await
    }

    async fn complaint_update(
        &self,
        id: ComplaintId,
        patch: &ComplaintPatch,
        changed_by: Option<&PrincipalId>,
        now: Timestamp,
    ) -> CivicResult<PatchOutcome> {
        self.timed("update", "complaint", async {
            let mut conn = self.get_conn().await?;
            let tx = conn.transaction().await.map_err(db_error)?;

            let current = Self::fetch_complaint(&tx, id, true)
                .await?
                .ok_or_else(|| CivicError::not_found(EntityType::Complaint, id))?;
            let outcome = apply_patch(&current, patch, changed_by, now)?;
            let updated = &outcome.complaint;

            tx.execute(
                "UPDATE civic_complaint \
                 SET status = $2, priority = $3, assigned_to = $4, department = $5, \
                     updated_at = $6, resolved_at = $7 \
                 WHERE complaint_id = $1",
                &[
                    &id.as_uuid(),
                    &updated.status.as_db_str(),
                    &updated.priority.as_db_str(),
                    &updated.assigned_to,
                    &updated.department,
                    &updated.updated_at,
                    &updated.resolved_at,
                ],
            )
            .await
            .map_err(db_error)?;

            if let Some(entry) = &outcome.entry {
                insert_history(&tx, entry).await.map_err(db_error)?;
            }
            tx.commit().await.map_err(db_error)?;
            Ok(outcome)
        })
        .await
    }

    async fn complaint_delete(&self, id: ComplaintId) -> CivicResult<()> {
        self.timed("delete", "complaint", async {
            let mut conn = self.get_conn().await?;
            let tx = conn.transaction().await.map_err(db_error)?;
            let deleted = tx
                .execute(
                    "DELETE FROM civic_complaint WHERE complaint_id = $1",
                    &[&id.as_uuid()],
                )
                .await
                .map_err(db_error)?;
            if deleted == 0 {
                return Err(CivicError::not_found(EntityType::Complaint, id));
            }
            tx.commit().await.map_err(db_error)?;
            Ok(())
        })
        .await
    }

    async fn history_list_for(&self, id: ComplaintId) -> CivicResult<Vec<StatusHistoryEntry>> {
        self.timed("list", "status_history", async {
            let conn = self.get_conn().await?;
            let rows = conn
                .query(
                    "SELECT entry_id, complaint_id, old_status, new_status, changed_by, notes, created_at \
                     FROM civic_status_history WHERE complaint_id = $1 \
                     ORDER BY created_at DESC, entry_id DESC",
                    &[&id.as_uuid()],
                )
                .await
                .map_err(db_error)?;
            rows.iter().map(history_from_row).collect()
        })
        .await
    }

    async fn feedback_get(&self, id: ComplaintId) -> CivicResult<Option<Feedback>> {
        self.timed("get", "feedback", async {
            let conn = self.get_conn().await?;
            let row = conn
                .query_opt(
                    "SELECT feedback_id, complaint_id, rating, comments, would_recommend, created_at \
                     FROM civic_feedback WHERE complaint_id = $1",
                    &[&id.as_uuid()],
                )
                .await
                .map_err(db_error)?;
            row.as_ref().map(feedback_from_row).transpose()
        })
        .await
    }

    async fn feedback_submit(
        &self,
        id: ComplaintId,
        submission: FeedbackSubmission,
        now: Timestamp,
    ) -> CivicResult<Feedback> {
        self.timed("create", "feedback", async {
            let mut conn = self.get_conn().await?;
            let tx = conn.transaction().await.map_err(db_error)?;

            let complaint = Self::fetch_complaint(&tx, id, true)
                .await?
                .ok_or_else(|| CivicError::not_found(EntityType::Complaint, id))?;
            let exists: bool = tx
                .query_one(
                    "SELECT EXISTS (SELECT 1 FROM civic_feedback WHERE complaint_id = $1)",
                    &[&id.as_uuid()],
                )
                .await
                .map_err(db_error)?
                .get(0);

            let feedback = admit_feedback(&complaint, exists, submission, now)?;
            tx.execute(
                "INSERT INTO civic_feedback \
                 (feedback_id, complaint_id, rating, comments, would_recommend, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &feedback.feedback_id.as_uuid(),
                    &feedback.complaint_id.as_uuid(),
                    &feedback.rating,
                    &feedback.comments,
                    &feedback.would_recommend,
                    &feedback.created_at,
                ],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "civic_feedback_complaint_key") {
                    ConflictError::FeedbackExists {
                        complaint_id: id.as_uuid(),
                    }
                    .into()
                } else {
                    db_error(e)
                }
            })?;
            tx.commit().await.map_err(db_error)?;
            Ok(feedback)
        })
        .await
    }

    async fn health_check(&self) -> CivicResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(db_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "civic");
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_schema_declares_constraints_used_for_conflicts() {
        assert!(SCHEMA_SQL.contains("civic_complaint_reference_number_key"));
        assert!(SCHEMA_SQL.contains("civic_feedback_complaint_key"));
        assert!(SCHEMA_SQL.contains("ON DELETE RESTRICT"));
        assert_eq!(SCHEMA_SQL.matches("ON DELETE CASCADE").count(), 2);
    }

    #[test]
    fn test_complaint_columns_match_insert_arity() {
        assert_eq!(COMPLAINT_COLUMNS.split(',').count(), 19);
    }

    #[tokio::test]
    async fn test_unreachable_database_reports_unavailable() -> ApiResult<()> {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            timeout: Duration::from_millis(200),
            ..DbConfig::default()
        };
        let client = DbClient::from_config(&config)?;
        let result = client.health_check().await;
        assert!(matches!(
            result,
            Err(CivicError::Storage(StorageError::Unavailable { .. }))
        ));
        Ok(())
    }
}
