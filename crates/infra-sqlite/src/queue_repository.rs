// SQLite QueueRepository Implementation
//
// The whole aggregate commits in one transaction: a compare-and-swap on the
// queue row's version column, then a rewrite of the customer rows. Readers
// therefore never observe a torn aggregate, and a lost update surfaces as
// AppError::Conflict with nothing written.

use async_trait::async_trait;
use sqlx::SqlitePool;

use waitline_core::domain::{CustomerStatus, Queue, QueueCustomer, QueueId, QueueSettings};
use waitline_core::error::{AppError, Result};
use waitline_core::port::QueueRepository;

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => {
                        // UNIQUE constraint failed (slug or token)
                        AppError::Conflict(format!(
                            "Unique constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "787" | "3850" => AppError::Database(format!(
                        "Foreign key constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Database(format!("Column not found: {col}")),
        _ => AppError::Database(err.to_string()),
    }
}

fn status_to_str(status: &CustomerStatus) -> String {
    status.to_string()
}

fn status_from_str(s: &str) -> Result<CustomerStatus> {
    match s {
        "WAITING" => Ok(CustomerStatus::Waiting),
        "CALLED" => Ok(CustomerStatus::Called),
        "ARRIVED" => Ok(CustomerStatus::Arrived),
        "SERVED" => Ok(CustomerStatus::Served),
        "NO_SHOW" => Ok(CustomerStatus::NoShow),
        "LEFT" => Ok(CustomerStatus::Left),
        other => Err(AppError::Database(format!(
            "unknown customer status: {other}"
        ))),
    }
}

#[derive(sqlx::FromRow)]
struct QueueRow {
    id: String,
    business_id: String,
    business_name: String,
    name: String,
    slug: String,
    is_active: bool,
    is_paused: bool,
    settings: String,
    version: i64,
}

impl QueueRow {
    fn into_queue(self, customers: Vec<QueueCustomer>) -> Result<Queue> {
        let settings: QueueSettings = serde_json::from_str(&self.settings)?;
        Ok(Queue::from_parts(
            self.id,
            self.business_id,
            self.business_name,
            self.name,
            self.slug,
            self.is_active,
            self.is_paused,
            settings,
            self.version,
            customers,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: String,
    queue_id: String,
    token: String,
    name: String,
    joined_at: i64,
    status: String,
    called_at: Option<i64>,
    grace_deadline: Option<i64>,
    left_at: Option<i64>,
    no_show_count: i32,
    near_front_notified_at: Option<i64>,
    push_subscription: Option<String>,
}

impl CustomerRow {
    fn into_customer(self) -> Result<QueueCustomer> {
        let status = status_from_str(&self.status)?;
        let mut customer =
            QueueCustomer::new(self.id, self.queue_id, self.token, self.name, self.joined_at);
        customer.status = status;
        customer.called_at = self.called_at;
        customer.grace_deadline = self.grace_deadline;
        customer.left_at = self.left_at;
        customer.no_show_count = self.no_show_count;
        customer.near_front_notified_at = self.near_front_notified_at;
        customer.push_subscription = self.push_subscription;
        Ok(customer)
    }
}

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_customers(&self, queue_id: &str) -> Result<Vec<QueueCustomer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, queue_id, token, name, joined_at, status, called_at, grace_deadline, \
             left_at, no_show_count, near_front_notified_at, push_subscription \
             FROM queue_customers WHERE queue_id = ? ORDER BY seq",
        )
        .bind(queue_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(CustomerRow::into_customer).collect()
    }

    async fn load_queue(&self, row: QueueRow) -> Result<Queue> {
        let customers = self.load_customers(&row.id).await?;
        row.into_queue(customers)
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn insert(&self, queue: &Queue) -> Result<()> {
        let settings_json = serde_json::to_string(&queue.settings)?;
        sqlx::query(
            "INSERT INTO queues (id, business_id, business_name, name, slug, is_active, \
             is_paused, settings, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&queue.id)
        .bind(&queue.business_id)
        .bind(&queue.business_name)
        .bind(&queue.name)
        .bind(&queue.slug)
        .bind(queue.is_active)
        .bind(queue.is_paused)
        .bind(settings_json)
        .bind(queue.version)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &QueueId) -> Result<Option<Queue>> {
        let row = sqlx::query_as::<_, QueueRow>("SELECT * FROM queues WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(Some(self.load_queue(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_slug(&self, business_id: &str, slug: &str) -> Result<Option<Queue>> {
        let row = sqlx::query_as::<_, QueueRow>(
            "SELECT * FROM queues WHERE business_id = ? AND slug = ?",
        )
        .bind(business_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(Some(self.load_queue(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_queue_id_by_token(&self, token: &str) -> Result<Option<QueueId>> {
        sqlx::query_scalar::<_, String>("SELECT queue_id FROM queue_customers WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn save(&self, queue: &Queue) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let new_version = queue.version + 1;
        let settings_json = serde_json::to_string(&queue.settings)?;

        // Compare-and-swap on the version column
        let result = sqlx::query(
            "UPDATE queues SET business_name = ?, name = ?, slug = ?, is_active = ?, \
             is_paused = ?, settings = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&queue.business_name)
        .bind(&queue.name)
        .bind(&queue.slug)
        .bind(queue.is_active)
        .bind(queue.is_paused)
        .bind(settings_json)
        .bind(new_version)
        .bind(&queue.id)
        .bind(queue.version)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queues WHERE id = ?")
                .bind(&queue.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            return Err(if exists == 0 {
                AppError::NotFound(format!("queue: {}", queue.id))
            } else {
                AppError::Conflict(format!(
                    "version mismatch for queue {}: expected {}",
                    queue.id, queue.version
                ))
            });
        }

        // Rewrite customer rows so the aggregate commits atomically
        sqlx::query("DELETE FROM queue_customers WHERE queue_id = ?")
            .bind(&queue.id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for (seq, customer) in queue.customers().iter().enumerate() {
            sqlx::query(
                "INSERT INTO queue_customers (id, queue_id, token, name, joined_at, status, \
                 called_at, grace_deadline, left_at, no_show_count, near_front_notified_at, \
                 push_subscription, seq) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&customer.id)
            .bind(&customer.queue_id)
            .bind(&customer.token)
            .bind(&customer.name)
            .bind(customer.joined_at)
            .bind(status_to_str(&customer.status))
            .bind(customer.called_at)
            .bind(customer.grace_deadline)
            .bind(customer.left_at)
            .bind(customer.no_show_count)
            .bind(customer.near_front_notified_at)
            .bind(&customer.push_subscription)
            .bind(seq as i64)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(new_version)
    }

    async fn delete(&self, id: &QueueId) -> Result<()> {
        // Customers cascade via the foreign key
        sqlx::query("DELETE FROM queues WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_auto_no_show_queues(&self) -> Result<Vec<QueueId>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT id, settings FROM queues WHERE is_active = 1",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut ids = Vec::new();
        for (id, settings_json) in rows {
            let settings: QueueSettings = serde_json::from_str(&settings_json)?;
            if settings.auto_no_show_enabled {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn prune_terminal_customers(&self, before_millis: i64) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM queue_customers WHERE status IN ('SERVED', 'NO_SHOW', 'LEFT') \
             AND left_at IS NOT NULL AND left_at < ?",
        )
        .bind(before_millis)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}
