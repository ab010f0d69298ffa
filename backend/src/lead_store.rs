//! Persistence for leads.
//!
//! Every statement carries the `created_by = owner` predicate: a lead that
//! belongs to someone else is indistinguishable from one that doesn't exist.

use chrono::Utc;
use common::{LeadDto, LeadFields};

use crate::db::Db;

const LEAD_COLUMNS: &str = "id, company, contact_person, email, phone, website, confidence, \
     estimated_value, status, priority, created_by, created_at, modified_at";

pub async fn create<'e, E>(executor: E, owner: i64, fields: &LeadFields) -> Result<LeadDto, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO leads (company, contact_person, email, phone, website, confidence,
                            estimated_value, status, priority, created_by, created_at, modified_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING {LEAD_COLUMNS}"
    );
    sqlx::query_as::<_, LeadDto>(&sql)
        .bind(&fields.company)
        .bind(&fields.contact_person)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.website)
        .bind(fields.confidence)
        .bind(fields.estimated_value)
        .bind(fields.status.as_str())
        .bind(fields.priority.as_str())
        .bind(owner)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
}

pub async fn list_owned<'e, E>(executor: E, owner: i64) -> Result<Vec<LeadDto>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE created_by = $1 ORDER BY id");
    sqlx::query_as::<_, LeadDto>(&sql)
        .bind(owner)
        .fetch_all(executor)
        .await
}

pub async fn find_owned<'e, E>(executor: E, owner: i64, id: i64) -> Result<Option<LeadDto>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE created_by = $1 AND id = $2");
    sqlx::query_as::<_, LeadDto>(&sql)
        .bind(owner)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Overwrites every client-writable column and bumps `modified_at`.
/// `created_by` and `created_at` are never touched.
pub async fn update_owned<'e, E>(
    executor: E,
    owner: i64,
    id: i64,
    fields: &LeadFields,
) -> Result<Option<LeadDto>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    let sql = format!(
        "UPDATE leads
         SET company = $1, contact_person = $2, email = $3, phone = $4, website = $5,
             confidence = $6, estimated_value = $7, status = $8, priority = $9, modified_at = $10
         WHERE created_by = $11 AND id = $12
         RETURNING {LEAD_COLUMNS}"
    );
    sqlx::query_as::<_, LeadDto>(&sql)
        .bind(&fields.company)
        .bind(&fields.contact_person)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.website)
        .bind(fields.confidence)
        .bind(fields.estimated_value)
        .bind(fields.status.as_str())
        .bind(fields.priority.as_str())
        .bind(Utc::now())
        .bind(owner)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn delete_owned<'e, E>(executor: E, owner: i64, id: i64) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    let result = sqlx::query("DELETE FROM leads WHERE created_by = $1 AND id = $2")
        .bind(owner)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Number of leads owned by `owner`, straight from the table.
pub async fn count_owned<'e, E>(executor: E, owner: i64) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Db>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE created_by = $1")
        .bind(owner)
        .fetch_one(executor)
        .await
}
