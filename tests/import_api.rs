use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[macro_use]
mod common;

use common::TestContext;
use hris::model::UserRole;
use hris::model::reference::{
    DepartmentRecord, HolidayRecord, ReferenceTable, RolePermissionRecord, SiteRecord,
};
use hris::store::Store;

fn sites_and_departments() -> Value {
    json!({
        "import_id": "q1-setup",
        "sites": [
            { "site_id": "TOR", "site_name": "Toronto HQ", "is_active": "Y" },
            { "site_id": "VAN", "site_name": "Vancouver", "is_active": "N" }
        ],
        "departments": [
            { "dept_id": "ENG", "dept_name": "Engineering", "site_id": "TOR", "is_active": "Y" },
            { "dept_id": "OPS", "dept_name": "Operations", "site_id": "NOPE" }
        ]
    })
}

#[actix_web::test]
async fn sites_then_departments_resolve_by_code() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .insert_header(("Authorization", admin))
        .set_json(sites_and_departments())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["success"], true);
    assert_eq!(report["dry_run"], false);
    assert_eq!(report["import_id"], "q1-setup");
    assert_eq!(report["results"]["sites"], json!({ "inserted": 2, "errors": [] }));
    assert_eq!(report["results"]["departments"]["inserted"], 2);

    let sites = ctx.store.records::<SiteRecord>().unwrap();
    let (tor_id, tor) = sites.iter().find(|(_, s)| s.site_code == "TOR").unwrap();
    assert!(tor.is_active);
    assert_eq!(tor.country, "CA");

    let departments = ctx.store.records::<DepartmentRecord>().unwrap();
    let eng = departments.iter().find(|(_, d)| d.dept_code == "ENG").unwrap();
    let ops = departments.iter().find(|(_, d)| d.dept_code == "OPS").unwrap();
    assert_eq!(eng.1.site_id, Some(*tor_id));
    // unknown site code leaves the reference empty instead of failing the row
    assert_eq!(ops.1.site_id, None);
    assert!(!ops.1.is_active);
}

#[actix_web::test]
async fn reimporting_sites_updates_in_place() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    for name in ["Toronto HQ", "Toronto Head Office"] {
        let req = test::TestRequest::post()
            .uri("/api/import-config")
            .insert_header(("Authorization", admin.clone()))
            .set_json(json!({ "sites": [{ "site_id": "TOR", "site_name": name }] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let sites = ctx.store.records::<SiteRecord>().unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].1.site_name, "Toronto Head Office");
}

#[actix_web::test]
async fn dry_run_reports_counts_without_writing() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    let mut payload = sites_and_departments();
    payload["dry_run"] = json!(true);
    payload["company"] = json!({ "legal_name": "Maple Works Inc." });

    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .insert_header(("Authorization", admin))
        .set_json(payload)
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(report["dry_run"], true);
    assert_eq!(report["results"]["sites"]["inserted"], 2);
    assert_eq!(report["results"]["company"]["inserted"], 1);
    for table in [ReferenceTable::Sites, ReferenceTable::Departments] {
        assert_eq!(ctx.store.row_count(table).unwrap(), 0, "{table}");
    }
    let settings = ctx.store.company_settings().await.unwrap();
    assert_eq!(settings.company_name, "");
}

#[actix_web::test]
async fn bad_rows_fail_only_their_section() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .insert_header(("Authorization", admin))
        .set_json(json!({
            "sites": [{ "site_id": "TOR", "site_name": "Toronto HQ" }],
            "holidays": [
                { "holiday_id": "NYD", "holiday_name": "New Year", "date": "2026-01-01", "site_id": "TOR", "is_paid": "Y" },
                { "holiday_id": "BAD", "holiday_name": "Broken", "date": "01/13/2026" }
            ],
            "integrations": { "integration_id": "ADP" }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);

    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["success"], false);
    assert_eq!(report["results"]["sites"]["errors"], json!([]));
    assert_eq!(report["results"]["holidays"]["inserted"], 1);
    assert_eq!(report["results"]["holidays"]["errors"].as_array().unwrap().len(), 1);
    assert!(
        report["results"]["holidays"]["errors"][0]
            .as_str()
            .unwrap()
            .starts_with("holidays[1]")
    );
    assert_eq!(report["results"]["integrations"]["inserted"], 0);

    let holidays = ctx.store.records::<HolidayRecord>().unwrap();
    assert_eq!(holidays.len(), 1);
    assert!(holidays[0].1.is_paid);
    assert!(holidays[0].1.site_id.is_some());
}

#[actix_web::test]
async fn role_permissions_replace_the_roles_set() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    let first = json!({
        "roles": [{ "role_code": "MGR", "role_name": "Manager" }],
        "role_permissions": [
            { "role_code": "MGR", "permission_code": "leave.approve", "allowed": "Y" },
            { "role_code": "MGR", "permission_code": "leave.view", "allowed": "Y" },
            { "role_code": "GHOST", "permission_code": "leave.view", "allowed": "Y" }
        ]
    });
    let second = json!({
        "role_permissions": [
            { "role_code": "MGR", "permission_code": "leave.view", "allowed": "N" }
        ]
    });

    for payload in [first, second] {
        let req = test::TestRequest::post()
            .uri("/api/import-config")
            .insert_header(("Authorization", admin.clone()))
            .set_json(payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let permissions = ctx.store.records::<RolePermissionRecord>().unwrap();
    assert_eq!(permissions.len(), 1);
    assert_eq!(permissions[0].1.permission_code, "leave.view");
    assert!(!permissions[0].1.allowed);
}

#[actix_web::test]
async fn company_section_updates_settings() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    // prime the settings cache
    let req = test::TestRequest::get()
        .uri("/api/settings/company")
        .insert_header(("Authorization", admin.clone()))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .insert_header(("Authorization", admin.clone()))
        .set_json(json!({
            "company": { "legal_name": "Maple Works Inc.", "hr_contact_email": "hr@maple.ca" }
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/settings/company")
        .insert_header(("Authorization", admin))
        .to_request();
    let settings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settings["company_name"], "Maple Works Inc.");
    assert_eq!(settings["currency"], "CAD");
}

#[actix_web::test]
async fn import_requires_a_stored_admin() {
    let ctx = TestContext::new();
    let manager = ctx.manager();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .set_json(sites_and_departments())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .insert_header(("Authorization", manager))
        .set_json(sites_and_departments())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Admin access required");

    // a token claiming admin is not enough once the profile is gone
    let ghost = hris::model::Profile {
        id: 9999,
        email: "ghost@company.com".to_string(),
        password_hash: String::new(),
        role: UserRole::Admin,
        employee_id: None,
        is_active: true,
    };
    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .insert_header(("Authorization", ctx.token(&ghost)))
        .set_json(sites_and_departments())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(ctx.store.row_count(ReferenceTable::Sites).unwrap(), 0);
}

#[actix_web::test]
async fn non_object_body_is_rejected() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .insert_header(("Authorization", admin))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("\"not an object\"")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn dry_run_counts_permissions_of_roles_created_in_the_same_upload() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    let payload = |dry_run: bool| {
        json!({
            "dry_run": dry_run,
            "roles": [{ "role_code": "MGR", "role_name": "Manager" }],
            "role_permissions": [
                { "role_code": "MGR", "permission_code": "pto.approve", "allowed": "Y", "scope": "department" }
            ]
        })
    };

    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .insert_header(("Authorization", admin.clone()))
        .set_json(payload(true))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["results"]["roles"]["inserted"], 1);
    assert_eq!(
        report["results"]["role_permissions"],
        json!({ "inserted": 1, "errors": [] })
    );
    for table in [ReferenceTable::SystemRoles, ReferenceTable::RolePermissions] {
        assert_eq!(ctx.store.row_count(table).unwrap(), 0, "{table}");
    }

    let req = test::TestRequest::post()
        .uri("/api/import-config")
        .insert_header(("Authorization", admin))
        .set_json(payload(false))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(report["results"]["role_permissions"]["inserted"], 1);

    let permissions = ctx.store.records::<RolePermissionRecord>().unwrap();
    assert_eq!(permissions.len(), 1);
    assert_eq!(permissions[0].1.permission_code, "pto.approve");
    assert_eq!(permissions[0].1.scope, "department");
    assert!(permissions[0].1.allowed);
}

#[actix_web::test]
async fn real_run_after_dry_run_reports_the_same_counts() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    let sites: Vec<Value> = ["TOR", "VAN", "MTL", "CAL", "HFX"]
        .iter()
        .map(|code| json!({ "site_id": code, "site_name": format!("{code} office") }))
        .collect();

    for dry_run in [true, false] {
        let req = test::TestRequest::post()
            .uri("/api/import-config")
            .insert_header(("Authorization", admin.clone()))
            .set_json(json!({ "dry_run": dry_run, "sites": sites }))
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["dry_run"], dry_run);
        assert_eq!(report["results"]["sites"], json!({ "inserted": 5, "errors": [] }));

        let expected = if dry_run { 0 } else { 5 };
        assert_eq!(ctx.store.row_count(ReferenceTable::Sites).unwrap(), expected);
    }
}

#[actix_web::test]
async fn reimporting_events_and_requirements_keeps_row_counts() {
    let ctx = TestContext::new();
    let admin = ctx.admin();
    let app = app!(ctx);

    let payload = json!({
        "sites": [{ "site_id": "TOR", "site_name": "Toronto HQ" }],
        "roles": [{ "role_code": "MGR", "role_name": "Manager" }],
        "events": [
            { "event_type": "townhall", "title": "Q1 Town Hall", "date_ts": "2026-03-02T15:00:00Z" },
            { "event_type": "closure", "title": "Office move", "date_ts": "2026-04-10", "scope": "site", "site_id": "TOR" }
        ],
        "training_courses": [
            { "training_code": "WHMIS", "training_name": "WHMIS", "default_expiry_months": 12 }
        ],
        "training_requirements": [
            { "training_code": "WHMIS", "applies_to_role_code": "MGR", "required_by_days_from_hire": 30 },
            { "training_code": "WHMIS", "site_id": "TOR", "block_work_if_incomplete": "Y" }
        ]
    });

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/import-config")
            .insert_header(("Authorization", admin.clone()))
            .set_json(payload.clone())
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["results"]["events"]["inserted"], 2);
        assert_eq!(report["results"]["training_requirements"]["inserted"], 2);

        assert_eq!(ctx.store.row_count(ReferenceTable::CalendarEvents).unwrap(), 2);
        assert_eq!(ctx.store.row_count(ReferenceTable::TrainingRequirements).unwrap(), 2);
        assert_eq!(ctx.store.row_count(ReferenceTable::TrainingCourses).unwrap(), 1);
    }
}
