//! In-process store with the same transactional guarantees as the MySQL one: every
//! operation validates first and mutates only once nothing can fail.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use super::{BalanceEffect, LeaveQuery, NewLeaveRequest, Store, StoreError, Transition};
use crate::import::resolve::CodeIndex;
use crate::model::reference::{ReferenceBatch, ReferenceRecord, ReferenceTable};
use crate::model::{
    AutoApprovalUpdate, BalanceEntry, CompanyProfile, CompanySettings, Employee, EntryKind,
    LeaveRequest, Profile,
};

#[derive(Debug, Clone)]
struct StoredRow {
    id: u64,
    code: String,
    data: Value,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    profiles: BTreeMap<u64, Profile>,
    employees: BTreeMap<u64, Employee>,
    settings: CompanySettings,
    leave_requests: BTreeMap<u64, LeaveRequest>,
    ledger: Vec<BalanceEntry>,
    tables: HashMap<ReferenceTable, Vec<StoredRow>>,
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn upsert<T: ReferenceRecord>(&mut self, rows: Vec<T>) -> Result<u64, StoreError> {
        let encoded = encode_rows(rows)?;
        let written = encoded.len() as u64;
        let State {
            next_id, tables, ..
        } = self;
        let table = tables.entry(T::TABLE).or_default();
        for (code, data) in encoded {
            match table.iter().position(|row| row.code == code) {
                Some(index) => table[index].data = data,
                None => {
                    *next_id += 1;
                    table.push(StoredRow {
                        id: *next_id,
                        code,
                        data,
                    });
                }
            }
        }
        Ok(written)
    }

    fn replace_role_permissions<T: ReferenceRecord>(
        &mut self,
        role_ids: &[u64],
        rows: Vec<T>,
    ) -> Result<u64, StoreError> {
        let encoded = encode_rows(rows)?;
        let written = encoded.len() as u64;
        let table = T::TABLE;
        if let Some(existing) = self.tables.get_mut(&table) {
            existing.retain(|row| {
                row.data
                    .get("role_id")
                    .and_then(Value::as_u64)
                    .is_none_or(|role_id| !role_ids.contains(&role_id))
            });
        }
        for (code, data) in encoded {
            let id = self.allocate_id();
            self.tables
                .entry(table)
                .or_default()
                .push(StoredRow { id, code, data });
        }
        Ok(written)
    }
}

fn encode_rows<T: ReferenceRecord>(rows: Vec<T>) -> Result<Vec<(String, Value)>, StoreError> {
    rows.into_iter()
        .map(|row| {
            let code = row.code().to_string();
            serde_json::to_value(&row)
                .map(|data| (code, data))
                .map_err(|e| StoreError::Corrupt(e.to_string()))
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// Adds a login profile, assigning its id.
    pub fn insert_profile(&self, mut profile: Profile) -> Result<Profile, StoreError> {
        let mut state = self.state()?;
        profile.id = state.allocate_id();
        state.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    /// Adds an employee record, assigning its id.
    pub fn insert_employee(&self, mut employee: Employee) -> Result<Employee, StoreError> {
        let mut state = self.state()?;
        employee.id = state.allocate_id();
        state.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    pub fn set_company_settings(&self, settings: CompanySettings) -> Result<(), StoreError> {
        self.state()?.settings = settings;
        Ok(())
    }

    /// Every stored row of `T`'s table with its internal id, in insertion order.
    pub fn records<T: ReferenceRecord>(&self) -> Result<Vec<(u64, T)>, StoreError> {
        let state = self.state()?;
        state
            .tables
            .get(&T::TABLE)
            .map(|rows| rows.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|row| {
                serde_json::from_value(row.data.clone())
                    .map(|record| (row.id, record))
                    .map_err(|e| StoreError::Corrupt(e.to_string()))
            })
            .collect()
    }

    pub fn row_count(&self, table: ReferenceTable) -> Result<usize, StoreError> {
        Ok(self.state()?.tables.get(&table).map_or(0, Vec::len))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_profile(&self, user_id: u64) -> Result<Option<Profile>, StoreError> {
        Ok(self.state()?.profiles.get(&user_id).cloned())
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self
            .state()?
            .profiles
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_employee(&self, employee_id: u64) -> Result<Option<Employee>, StoreError> {
        Ok(self.state()?.employees.get(&employee_id).cloned())
    }

    async fn company_settings(&self) -> Result<CompanySettings, StoreError> {
        Ok(self.state()?.settings.clone())
    }

    async fn update_auto_approval(
        &self,
        update: &AutoApprovalUpdate,
    ) -> Result<CompanySettings, StoreError> {
        let mut state = self.state()?;
        state.settings.auto_approve_enabled = update.auto_approve_enabled;
        state.settings.auto_approve_sick_threshold = update.auto_approve_sick_threshold;
        state.settings.auto_approve_personal_threshold = update.auto_approve_personal_threshold;
        Ok(state.settings.clone())
    }

    async fn update_company_profile(&self, profile: &CompanyProfile) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let settings = &mut state.settings;
        settings.company_name = profile.company_name.clone();
        settings.operating_name = profile.operating_name.clone();
        settings.country = profile.country.clone();
        settings.time_zone = profile.time_zone.clone();
        settings.currency = profile.currency.clone();
        settings.week_starts_on = profile.week_starts_on.clone();
        settings.default_language = profile.default_language.clone();
        settings.hr_contact_email = profile.hr_contact_email.clone();
        Ok(())
    }

    async fn find_leave_request(
        &self,
        request_id: u64,
    ) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self.state()?.leave_requests.get(&request_id).cloned())
    }

    async fn list_leave_requests(
        &self,
        query: &LeaveQuery,
    ) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        let state = self.state()?;
        let mut matching: Vec<&LeaveRequest> = state
            .leave_requests
            .values()
            .filter(|r| query.employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| query.status.is_none_or(|s| r.status == s))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn create_leave_request(
        &self,
        request: NewLeaveRequest,
        effect: BalanceEffect,
    ) -> Result<LeaveRequest, StoreError> {
        let mut state = self.state()?;
        if !state.employees.contains_key(&request.employee_id) {
            return Err(StoreError::NotFound(format!(
                "employee {}",
                request.employee_id
            )));
        }

        let now = Utc::now();
        let id = state.allocate_id();
        let created = LeaveRequest {
            id,
            employee_id: request.employee_id,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            status: request.status,
            is_auto_approved: request.is_auto_approved,
            reviewed_by: None,
            reviewed_at: request.reviewed_at,
            review_note: None,
            created_at: now,
        };

        apply_effect(&mut state, &created, effect)?;
        state.leave_requests.insert(id, created.clone());
        Ok(created)
    }

    async fn transition_leave_request(
        &self,
        transition: Transition,
    ) -> Result<LeaveRequest, StoreError> {
        let mut state = self.state()?;
        let current = state
            .leave_requests
            .get(&transition.request_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("leave request {}", transition.request_id)))?;

        if !transition.from.contains(&current.status) {
            return Err(StoreError::Conflict(format!(
                "leave request {} is {}",
                current.id, current.status
            )));
        }

        let mut updated = current;
        updated.status = transition.to;
        if let Some(review) = transition.review {
            updated.reviewed_by = Some(review.reviewer_id);
            updated.reviewed_at = Some(review.reviewed_at);
            updated.review_note = review.note;
        }

        apply_effect(&mut state, &updated, transition.effect)?;
        state.leave_requests.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn balance_entries(&self, request_id: u64) -> Result<Vec<BalanceEntry>, StoreError> {
        Ok(self
            .state()?
            .ledger
            .iter()
            .filter(|e| e.leave_request_id == request_id)
            .cloned()
            .collect())
    }

    async fn code_index(&self, table: ReferenceTable) -> Result<CodeIndex, StoreError> {
        let state = self.state()?;
        let rows = state.tables.get(&table).map(|rows| rows.as_slice()).unwrap_or_default();
        Ok(CodeIndex::from_pairs(
            rows.iter().map(|row| (row.code.clone(), row.id)),
        ))
    }

    async fn write_batch(&self, batch: ReferenceBatch) -> Result<u64, StoreError> {
        let mut state = self.state()?;
        match batch {
            ReferenceBatch::Sites(rows) => state.upsert(rows),
            ReferenceBatch::Departments(rows) => state.upsert(rows),
            ReferenceBatch::JobRoles(rows) => state.upsert(rows),
            ReferenceBatch::SystemRoles(rows) => state.upsert(rows),
            ReferenceBatch::RolePermissions { role_ids, rows } => {
                state.replace_role_permissions(&role_ids, rows)
            }
            ReferenceBatch::PtoTypes(rows) => state.upsert(rows),
            ReferenceBatch::PtoPolicies(rows) => state.upsert(rows),
            ReferenceBatch::PtoApprovalRules(rows) => state.upsert(rows),
            ReferenceBatch::Holidays(rows) => state.upsert(rows),
            ReferenceBatch::CalendarEvents(rows) => state.upsert(rows),
            ReferenceBatch::TrainingCourses(rows) => state.upsert(rows),
            ReferenceBatch::TrainingRequirements(rows) => state.upsert(rows),
            ReferenceBatch::Integrations(rows) => state.upsert(rows),
        }
    }
}

fn apply_effect(
    state: &mut State,
    request: &LeaveRequest,
    effect: BalanceEffect,
) -> Result<(), StoreError> {
    let (balance_kind, entry_kind, delta) = match effect {
        BalanceEffect::None => return Ok(()),
        BalanceEffect::Deduct { kind, days } => (kind, EntryKind::Deduction, -days),
        BalanceEffect::RestoreDeduction => {
            let deduction = state.ledger.iter().find(|e| {
                e.leave_request_id == request.id && e.entry_kind == EntryKind::Deduction
            });
            match deduction {
                Some(entry) => (entry.balance_kind, EntryKind::Restoration, entry.days),
                None => return Ok(()),
            }
        }
    };

    let duplicate = state
        .ledger
        .iter()
        .any(|e| e.leave_request_id == request.id && e.entry_kind == entry_kind);
    if duplicate {
        return Err(StoreError::Conflict(format!(
            "leave request {} already has a {} entry",
            request.id, entry_kind
        )));
    }

    let employee = state
        .employees
        .get_mut(&request.employee_id)
        .ok_or_else(|| StoreError::NotFound(format!("employee {}", request.employee_id)))?;
    employee.adjust(balance_kind, delta);

    state.ledger.push(BalanceEntry {
        leave_request_id: request.id,
        employee_id: request.employee_id,
        balance_kind,
        entry_kind,
        days: delta.abs(),
        created_at: Utc::now(),
    });
    Ok(())
}
