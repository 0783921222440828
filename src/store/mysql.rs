use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySql, MySqlPool, Transaction};

use super::{BalanceEffect, LeaveQuery, NewLeaveRequest, Store, StoreError, Transition};
use crate::import::resolve::CodeIndex;
use crate::model::reference::{ReferenceBatch, ReferenceRecord, ReferenceTable};
use crate::model::{
    AutoApprovalUpdate, BalanceEntry, BalanceKind, CompanyProfile, CompanySettings, Employee,
    EntryKind, LeaveRequest, Profile, UserRole,
};
use crate::utils::db_utils::{bind_values, build_insert_sql};

/// Rows per multi-row INSERT, well under MySQL's placeholder limit.
const INSERT_CHUNK: usize = 500;

const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, reason, status, \
     is_auto_approved, reviewed_by, reviewed_at, review_note, created_at";

const SETTINGS_COLUMNS: &str = "company_name, operating_name, country, time_zone, currency, \
     week_starts_on, default_language, hr_contact_email, auto_approve_enabled, \
     auto_approve_sick_threshold, auto_approve_personal_threshold";

#[derive(sqlx::FromRow)]
struct LeaveRequestRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
    is_auto_approved: bool,
    reviewed_by: Option<u64>,
    reviewed_at: Option<DateTime<Utc>>,
    review_note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: parse_column("leave_type", &row.leave_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status: parse_column("status", &row.status)?,
            is_auto_approved: row.is_auto_approved,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            review_note: row.review_note,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: u64,
    email: String,
    password_hash: String,
    role: String,
    employee_id: Option<u64>,
    is_active: bool,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role: parse_column::<UserRole>("role", &row.role)?,
            employee_id: row.employee_id,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BalanceEntryRow {
    leave_request_id: u64,
    employee_id: u64,
    balance_kind: String,
    entry_kind: String,
    days: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<BalanceEntryRow> for BalanceEntry {
    type Error = StoreError;

    fn try_from(row: BalanceEntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            leave_request_id: row.leave_request_id,
            employee_id: row.employee_id,
            balance_kind: parse_column("balance_kind", &row.balance_kind)?,
            entry_kind: parse_column("entry_kind", &row.entry_kind)?,
            days: row.days,
            created_at: row.created_at,
        })
    }
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("{column} = {value:?}")))
}

fn is_duplicate(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23000"),
        _ => false,
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_leave_request(
        tx: &mut Transaction<'_, MySql>,
        request_id: u64,
        lock: bool,
    ) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?{}",
            if lock { " FOR UPDATE" } else { "" }
        );
        sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(request_id)
            .fetch_optional(&mut **tx)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn apply_effect(
        tx: &mut Transaction<'_, MySql>,
        request_id: u64,
        employee_id: u64,
        effect: BalanceEffect,
    ) -> Result<(), StoreError> {
        let (balance_kind, entry_kind, days) = match effect {
            BalanceEffect::None => return Ok(()),
            BalanceEffect::Deduct { kind, days } => (kind, EntryKind::Deduction, days),
            BalanceEffect::RestoreDeduction => {
                let deduction = sqlx::query_as::<_, (String, f64)>(
                    r#"
                    SELECT balance_kind, days
                    FROM leave_balance_entries
                    WHERE leave_request_id = ? AND entry_kind = ?
                    "#,
                )
                .bind(request_id)
                .bind(EntryKind::Deduction.as_ref())
                .fetch_optional(&mut **tx)
                .await?;

                match deduction {
                    Some((kind, days)) => (
                        parse_column::<BalanceKind>("balance_kind", &kind)?,
                        EntryKind::Restoration,
                        days,
                    ),
                    None => return Ok(()),
                }
            }
        };

        sqlx::query(
            r#"
            INSERT INTO leave_balance_entries
                (leave_request_id, employee_id, balance_kind, entry_kind, days)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(request_id)
        .bind(employee_id)
        .bind(balance_kind.as_ref())
        .bind(entry_kind.as_ref())
        .bind(days)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if is_duplicate(&e) {
                StoreError::Conflict(format!(
                    "leave request {request_id} already has a {entry_kind} entry"
                ))
            } else {
                StoreError::from(e)
            }
        })?;

        let delta = match entry_kind {
            EntryKind::Deduction => -days,
            EntryKind::Restoration => days,
        };
        let column = balance_kind.remaining_column();
        let result = sqlx::query(&format!(
            "UPDATE employees SET {column} = {column} + ? WHERE id = ?"
        ))
        .bind(delta)
        .bind(employee_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("employee {employee_id}")));
        }
        Ok(())
    }

    async fn insert_rows<T: ReferenceRecord>(
        tx: &mut Transaction<'_, MySql>,
        rows: &[T],
        upsert: bool,
    ) -> Result<u64, StoreError> {
        let upsert_key = upsert.then(|| T::TABLE.code_column());
        for chunk in rows.chunks(INSERT_CHUNK) {
            let sql = build_insert_sql(T::TABLE.table_name(), T::COLUMNS, upsert_key, chunk.len());
            let values = chunk.iter().flat_map(ReferenceRecord::values).collect();
            bind_values(sqlx::query(&sql), values)
                .execute(&mut **tx)
                .await?;
        }
        Ok(rows.len() as u64)
    }

    async fn upsert<T: ReferenceRecord>(&self, rows: Vec<T>) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let written = Self::insert_rows(&mut tx, &rows, true).await?;
        tx.commit().await?;
        Ok(written)
    }

    async fn replace_role_permissions<T: ReferenceRecord>(
        &self,
        role_ids: &[u64],
        rows: Vec<T>,
    ) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        if !role_ids.is_empty() {
            let placeholders = vec!["?"; role_ids.len()].join(", ");
            let sql = format!("DELETE FROM role_permissions WHERE role_id IN ({placeholders})");
            let mut delete = sqlx::query(&sql);
            for role_id in role_ids {
                delete = delete.bind(*role_id);
            }
            delete.execute(&mut *tx).await?;
        }

        let written = Self::insert_rows(&mut tx, &rows, false).await?;
        tx.commit().await?;
        Ok(written)
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn find_profile(&self, user_id: u64) -> Result<Option<Profile>, StoreError> {
        sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, email, password_hash, role, employee_id, is_active
            FROM profiles
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Profile::try_from)
        .transpose()
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, email, password_hash, role, employee_id, is_active
            FROM profiles
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(Profile::try_from)
        .transpose()
    }

    async fn find_employee(&self, employee_id: u64) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT
                id,
                first_name,
                last_name,
                email,
                vacation_days_remaining,
                vacation_days_entitled,
                sick_days_remaining,
                sick_days_entitled
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn company_settings(&self) -> Result<CompanySettings, StoreError> {
        let settings = sqlx::query_as::<_, CompanySettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM company_settings ORDER BY id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or_default())
    }

    async fn update_auto_approval(
        &self,
        update: &AutoApprovalUpdate,
    ) -> Result<CompanySettings, StoreError> {
        sqlx::query(
            r#"
            UPDATE company_settings
            SET
                auto_approve_enabled = ?,
                auto_approve_sick_threshold = ?,
                auto_approve_personal_threshold = ?
            "#,
        )
        .bind(update.auto_approve_enabled)
        .bind(update.auto_approve_sick_threshold)
        .bind(update.auto_approve_personal_threshold)
        .execute(&self.pool)
        .await?;

        self.company_settings().await
    }

    async fn update_company_profile(&self, profile: &CompanyProfile) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE company_settings
            SET
                company_name = ?,
                operating_name = ?,
                country = ?,
                time_zone = ?,
                currency = ?,
                week_starts_on = ?,
                default_language = ?,
                hr_contact_email = ?
            "#,
        )
        .bind(&profile.company_name)
        .bind(&profile.operating_name)
        .bind(&profile.country)
        .bind(&profile.time_zone)
        .bind(&profile.currency)
        .bind(&profile.week_starts_on)
        .bind(&profile.default_language)
        .bind(&profile.hr_contact_email)
        .execute(&self.pool)
        .await?;

        tracing::debug!(rows = result.rows_affected(), "Updated company profile");
        Ok(())
    }

    async fn find_leave_request(
        &self,
        request_id: u64,
    ) -> Result<Option<LeaveRequest>, StoreError> {
        sqlx::query_as::<_, LeaveRequestRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?
        .map(LeaveRequest::try_from)
        .transpose()
    }

    async fn list_leave_requests(
        &self,
        query: &LeaveQuery,
    ) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        if let Some(status) = query.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.clone()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, LeaveRequestRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        let requests = data_q
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((requests, total))
    }

    async fn create_leave_request(
        &self,
        request: NewLeaveRequest,
        effect: BalanceEffect,
    ) -> Result<LeaveRequest, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, reason, status,
                 is_auto_approved, reviewed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.leave_type.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(request.status.as_ref())
        .bind(request.is_auto_approved)
        .bind(request.reviewed_at)
        .execute(&mut *tx)
        .await?;

        let request_id = result.last_insert_id();
        Self::apply_effect(&mut tx, request_id, request.employee_id, effect).await?;

        let created = Self::fetch_leave_request(&mut tx, request_id, false)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("leave request {request_id}")))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn transition_leave_request(
        &self,
        transition: Transition,
    ) -> Result<LeaveRequest, StoreError> {
        let request_id = transition.request_id;
        let mut tx = self.pool.begin().await?;

        let current = Self::fetch_leave_request(&mut tx, request_id, true)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("leave request {request_id}")))?;

        if !transition.from.contains(&current.status) {
            return Err(StoreError::Conflict(format!(
                "leave request {request_id} is {}",
                current.status
            )));
        }

        let result = match &transition.review {
            Some(review) => {
                sqlx::query(
                    r#"
                    UPDATE leave_requests
                    SET status = ?, reviewed_by = ?, reviewed_at = ?, review_note = ?
                    WHERE id = ? AND status = ?
                    "#,
                )
                .bind(transition.to.as_ref())
                .bind(review.reviewer_id)
                .bind(review.reviewed_at)
                .bind(&review.note)
                .bind(request_id)
                .bind(current.status.as_ref())
                .execute(&mut *tx)
                .await?
            }
            None => {
                sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ? AND status = ?")
                    .bind(transition.to.as_ref())
                    .bind(request_id)
                    .bind(current.status.as_ref())
                    .execute(&mut *tx)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "leave request {request_id} changed concurrently"
            )));
        }

        Self::apply_effect(&mut tx, request_id, current.employee_id, transition.effect).await?;

        let updated = Self::fetch_leave_request(&mut tx, request_id, false)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("leave request {request_id}")))?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn balance_entries(&self, request_id: u64) -> Result<Vec<BalanceEntry>, StoreError> {
        sqlx::query_as::<_, BalanceEntryRow>(
            r#"
            SELECT leave_request_id, employee_id, balance_kind, entry_kind, days, created_at
            FROM leave_balance_entries
            WHERE leave_request_id = ?
            ORDER BY id
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(BalanceEntry::try_from)
        .collect()
    }

    async fn code_index(&self, table: ReferenceTable) -> Result<CodeIndex, StoreError> {
        let sql = format!(
            "SELECT {} AS code, id FROM {}",
            table.code_column(),
            table.table_name()
        );
        let pairs = sqlx::query_as::<_, (String, u64)>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(CodeIndex::from_pairs(pairs))
    }

    async fn write_batch(&self, batch: ReferenceBatch) -> Result<u64, StoreError> {
        match batch {
            ReferenceBatch::Sites(rows) => self.upsert(rows).await,
            ReferenceBatch::Departments(rows) => self.upsert(rows).await,
            ReferenceBatch::JobRoles(rows) => self.upsert(rows).await,
            ReferenceBatch::SystemRoles(rows) => self.upsert(rows).await,
            ReferenceBatch::RolePermissions { role_ids, rows } => {
                self.replace_role_permissions(&role_ids, rows).await
            }
            ReferenceBatch::PtoTypes(rows) => self.upsert(rows).await,
            ReferenceBatch::PtoPolicies(rows) => self.upsert(rows).await,
            ReferenceBatch::PtoApprovalRules(rows) => self.upsert(rows).await,
            ReferenceBatch::Holidays(rows) => self.upsert(rows).await,
            ReferenceBatch::CalendarEvents(rows) => self.upsert(rows).await,
            ReferenceBatch::TrainingCourses(rows) => self.upsert(rows).await,
            ReferenceBatch::TrainingRequirements(rows) => self.upsert(rows).await,
            ReferenceBatch::Integrations(rows) => self.upsert(rows).await,
        }
    }
}
