use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use actix_web::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use super::payload::{CompanyInput, ImportPayload, Section};
use super::resolve::References;
use super::transform::{self, Parsed, parse_rows};
use crate::model::reference::{ReferenceBatch, ReferenceTable};
use crate::settings::SettingsReader;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SectionResult {
    /// rows written, or that would be written on a dry run
    pub inserted: u64,
    pub errors: Vec<String>,
}

impl SectionResult {
    fn failed(message: String) -> Self {
        Self {
            inserted: 0,
            errors: vec![message],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "success": true,
    "dry_run": false,
    "import_id": "2026-q1-setup",
    "results": {
        "sites": { "inserted": 2, "errors": [] },
        "departments": { "inserted": 3, "errors": [] }
    }
}))]
pub struct ImportReport {
    pub success: bool,
    pub dry_run: bool,
    #[schema(value_type = Option<String>)]
    pub import_id: Option<Value>,
    pub results: BTreeMap<String, SectionResult>,
}

impl ImportReport {
    pub fn has_errors(&self) -> bool {
        self.results.values().any(|r| !r.errors.is_empty())
    }

    pub fn status_code(&self) -> StatusCode {
        if self.has_errors() {
            StatusCode::MULTI_STATUS
        } else {
            StatusCode::OK
        }
    }
}

/// A section's rows, mapped and resolved, ready to write.
struct Prepared {
    batch: ReferenceBatch,
    errors: Vec<String>,
}

impl Prepared {
    fn new<T>(parsed: Parsed<T>, wrap: fn(Vec<T>) -> ReferenceBatch) -> Self {
        Self {
            batch: wrap(parsed.rows),
            errors: parsed.errors,
        }
    }
}

/// Runs configuration uploads against the store, one section at a time.
#[derive(Clone)]
pub struct ConfigImporter {
    store: Arc<dyn Store>,
    settings: SettingsReader,
}

impl ConfigImporter {
    pub fn new(store: Arc<dyn Store>, settings: SettingsReader) -> Self {
        Self { store, settings }
    }

    /// Processes every present section in dependency order. Section failures are
    /// recorded in the report and never stop later sections.
    #[tracing::instrument(skip_all, fields(dry_run = payload.is_dry_run()))]
    pub async fn run(&self, mut payload: ImportPayload) -> ImportReport {
        let dry_run = payload.is_dry_run();
        let mut pass = ImportPass {
            store: self.store.as_ref(),
            refs: References::new(self.store.as_ref()),
            dry_run,
        };

        let mut results = BTreeMap::new();
        for section in Section::iter() {
            let Some(value) = payload.take(section) else {
                continue;
            };

            let result = match section {
                Section::Company => {
                    let result = pass.company(value).await;
                    if result.errors.is_empty() && !dry_run {
                        self.settings.invalidate().await;
                    }
                    result
                }
                _ => pass.section(section, value).await,
            };

            debug!(%section, inserted = result.inserted, errors = result.errors.len(), "Import section done");
            results.insert(section.to_string(), result);
        }

        let report = ImportReport {
            success: !results.values().any(|r| !r.errors.is_empty()),
            dry_run,
            import_id: payload.import_id.take(),
            results,
        };

        info!(
            success = report.success,
            sections = report.results.len(),
            "Configuration import finished"
        );
        report
    }
}

struct ImportPass<'a> {
    store: &'a dyn Store,
    refs: References<'a>,
    dry_run: bool,
}

impl ImportPass<'_> {
    async fn company(&mut self, value: Value) -> SectionResult {
        let profile = match serde_json::from_value::<CompanyInput>(value)
            .map_err(|e| e.to_string())
            .and_then(transform::company)
        {
            Ok(profile) => profile,
            Err(msg) => return SectionResult::failed(format!("{}: {msg}", Section::Company)),
        };

        if self.dry_run {
            return SectionResult {
                inserted: 1,
                errors: Vec::new(),
            };
        }

        match self.store.update_company_profile(&profile).await {
            Ok(()) => SectionResult {
                inserted: 1,
                errors: Vec::new(),
            },
            Err(e) => {
                error!(error = %e, "Failed to update company settings");
                SectionResult::failed(e.to_string())
            }
        }
    }

    async fn section(&mut self, section: Section, value: Value) -> SectionResult {
        let rows = match value {
            Value::Array(rows) => rows,
            _ => return SectionResult::failed(format!("{section}: expected an array of rows")),
        };

        let prepared = match self.prepare(section, rows).await {
            Ok(Some(prepared)) => prepared,
            Ok(None) => return SectionResult::failed(format!("{section}: not a row section")),
            Err(e) => {
                error!(error = %e, %section, "Failed to load reference codes");
                return SectionResult::failed(e.to_string());
            }
        };

        self.commit(section, prepared).await
    }

    async fn prepare(
        &mut self,
        section: Section,
        rows: Vec<Value>,
    ) -> Result<Option<Prepared>, StoreError> {
        use ReferenceTable as Table;

        let prepared = match section {
            Section::Company => return Ok(None),
            Section::Sites => Prepared::new(
                parse_rows(section, rows, transform::site),
                ReferenceBatch::Sites,
            ),
            Section::Departments => {
                let sites = self.refs.index(Table::Sites).await?;
                Prepared::new(
                    parse_rows(section, rows, |r| transform::department(r, &sites)),
                    ReferenceBatch::Departments,
                )
            }
            Section::JobsRoles => {
                let departments = self.refs.index(Table::Departments).await?;
                Prepared::new(
                    parse_rows(section, rows, |r| transform::job_role(r, &departments)),
                    ReferenceBatch::JobRoles,
                )
            }
            Section::Roles => Prepared::new(
                parse_rows(section, rows, transform::system_role),
                ReferenceBatch::SystemRoles,
            ),
            Section::RolePermissions => {
                let roles = self.refs.index(Table::SystemRoles).await?;
                let parsed = parse_rows(section, rows, |r| transform::role_permission(r, &roles));
                let submitted = parsed.rows.len();
                let rows: Vec<_> = parsed.rows.into_iter().flatten().collect();
                if rows.len() < submitted {
                    warn!(
                        dropped = submitted - rows.len(),
                        "Dropped role permissions whose role_code is unknown"
                    );
                }
                let role_ids: BTreeSet<u64> = rows.iter().map(|r| r.role_id).collect();
                Prepared {
                    batch: ReferenceBatch::RolePermissions {
                        role_ids: role_ids.into_iter().collect(),
                        rows,
                    },
                    errors: parsed.errors,
                }
            }
            Section::PtoTypes => Prepared::new(
                parse_rows(section, rows, transform::pto_type),
                ReferenceBatch::PtoTypes,
            ),
            Section::PtoPolicies => {
                let pto_types = self.refs.index(Table::PtoTypes).await?;
                let roles = self.refs.index(Table::SystemRoles).await?;
                Prepared::new(
                    parse_rows(section, rows, |r| transform::pto_policy(r, &pto_types, &roles)),
                    ReferenceBatch::PtoPolicies,
                )
            }
            Section::PtoApprovalRules => {
                let pto_types = self.refs.index(Table::PtoTypes).await?;
                Prepared::new(
                    parse_rows(section, rows, |r| transform::approval_rule(r, &pto_types)),
                    ReferenceBatch::PtoApprovalRules,
                )
            }
            Section::Holidays => {
                let sites = self.refs.index(Table::Sites).await?;
                Prepared::new(
                    parse_rows(section, rows, |r| transform::holiday(r, &sites)),
                    ReferenceBatch::Holidays,
                )
            }
            Section::Events => {
                let sites = self.refs.index(Table::Sites).await?;
                Prepared::new(
                    parse_rows(section, rows, |r| transform::event(r, &sites)),
                    ReferenceBatch::CalendarEvents,
                )
            }
            Section::TrainingCourses => Prepared::new(
                parse_rows(section, rows, transform::training_course),
                ReferenceBatch::TrainingCourses,
            ),
            Section::TrainingRequirements => {
                let courses = self.refs.index(Table::TrainingCourses).await?;
                let roles = self.refs.index(Table::SystemRoles).await?;
                let sites = self.refs.index(Table::Sites).await?;
                Prepared::new(
                    parse_rows(section, rows, |r| {
                        transform::training_requirement(r, &courses, &roles, &sites)
                    }),
                    ReferenceBatch::TrainingRequirements,
                )
            }
            Section::Integrations => Prepared::new(
                parse_rows(section, rows, transform::integration),
                ReferenceBatch::Integrations,
            ),
        };

        Ok(Some(prepared))
    }

    async fn commit(&mut self, section: Section, prepared: Prepared) -> SectionResult {
        let Prepared { batch, mut errors } = prepared;
        let table = batch.table();
        let would_write = batch.len() as u64;

        if batch.is_empty() {
            return SectionResult {
                inserted: 0,
                errors,
            };
        }

        if self.dry_run {
            // role permissions are owned by their role and never referenced by code
            if table != ReferenceTable::RolePermissions {
                if let Err(e) = self.refs.stage(table, batch.codes()).await {
                    error!(error = %e, %section, "Failed to load reference codes");
                    errors.push(e.to_string());
                }
            }
            return SectionResult {
                inserted: would_write,
                errors,
            };
        }

        let inserted = match self.store.write_batch(batch).await {
            Ok(written) => {
                self.refs.invalidate(table);
                written
            }
            Err(e) => {
                error!(error = %e, %section, "Import section write failed");
                errors.push(e.to_string());
                0
            }
        };

        SectionResult { inserted, errors }
    }
}
