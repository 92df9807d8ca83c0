mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;

#[tokio::test]
async fn patient_crud() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let clinician = user_with_role(&app, &admin, "dr.ames", "clinician").await;

    let created = create_patient(&app, &clinician, "MRN-100").await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["is_active"], true);
    assert_eq!(created["comorbidities"], json!(["COPD", "type 2 diabetes"]));
    assert_eq!(created["current_medications"]["metformin"], "500mg BID");

    let fetched = get(&app, &format!("/api/patients/{id}"), &clinician).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, created);

    let updated = put(
        &app,
        &format!("/api/patients/{id}"),
        &clinician,
        json!({ "city": "Tacoma", "allergies": [] }),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["city"], "Tacoma");
    assert_eq!(updated.body["allergies"], json!([]));
    assert_eq!(updated.body["first_name"], "Walter");

    let deleted = send(&app, Method::DELETE, &format!("/api/patients/{id}"), Some(&clinician), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["is_active"], false);

    // Soft delete: still readable.
    let after = get(&app, &format!("/api/patients/{id}"), &clinician).await;
    assert_eq!(after.status, StatusCode::OK);
    assert_eq!(after.body["is_active"], false);
}

#[tokio::test]
async fn duplicate_mrn_conflicts() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    create_patient(&app, &admin, "MRN-1").await;
    let res = post(&app, "/api/patients", &admin, patient_body("MRN-1", "Other", "Person")).await;
    assert_envelope(&res, StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_patients_are_rejected() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;

    let mut body = patient_body("MRN-2", "Ada", "Stone");
    body["admission_date"] = json!("2024-03-02T10:00:00Z");
    body["discharge_date"] = json!("2024-03-01T10:00:00Z");
    assert_envelope(&post(&app, "/api/patients", &admin, body).await, StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = patient_body("MRN-3", "Ada", "Stone");
    body["gender"] = json!("unknown");
    assert_envelope(&post(&app, "/api/patients", &admin, body).await, StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = patient_body("", "Ada", "Stone");
    body["mrn"] = json!("   ");
    assert_envelope(&post(&app, "/api/patients", &admin, body).await, StatusCode::UNPROCESSABLE_ENTITY);

    let created = create_patient(&app, &admin, "MRN-4").await;
    let id = created["id"].as_str().unwrap();
    let bad_update = put(&app, &format!("/api/patients/{id}"), &admin, json!({ "email": "not-an-email" })).await;
    assert_envelope(&bad_update, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_patient_is_404() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let missing = "00000000-0000-4000-8000-000000000000";
    assert_envelope(&get(&app, &format!("/api/patients/{missing}"), &admin).await, StatusCode::NOT_FOUND);
    assert_envelope(
        &get(&app, &format!("/api/patients/{missing}/vitals"), &admin).await,
        StatusCode::NOT_FOUND,
    );
    assert_envelope(
        &post(&app, &format!("/api/patients/{missing}/vitals"), &admin, json!({ "heart_rate": 80 })).await,
        StatusCode::NOT_FOUND,
    );
}

#[tokio::test]
async fn listing_filters_and_pages() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    for (mrn, first, last) in [
        ("MRN-A", "Maria", "Lopez"),
        ("MRN-B", "Mario", "Rossi"),
        ("MRN-C", "Ken", "Watanabe"),
    ] {
        let res = post(&app, "/api/patients", &admin, patient_body(mrn, first, last)).await;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let all = get(&app, "/api/patients", &admin).await;
    assert_eq!(all.body["total"], 3);
    assert_eq!(all.body["items"][0]["last_name"], "Lopez");

    let search = get(&app, "/api/patients?search=MARI", &admin).await;
    assert_eq!(search.body["total"], 2);

    let by_mrn = get(&app, "/api/patients?search=mrn-c", &admin).await;
    assert_eq!(by_mrn.body["total"], 1);
    assert_eq!(by_mrn.body["items"][0]["first_name"], "Ken");

    let paged = get(&app, "/api/patients?page=2&per_page=2", &admin).await;
    assert_eq!(paged.body["page"], 2);
    assert_eq!(paged.body["per_page"], 2);
    assert_eq!(paged.body["pages"], 2);
    assert_eq!(paged.body["items"].as_array().unwrap().len(), 1);

    let ken = by_mrn.body["items"][0]["id"].as_str().unwrap().to_string();
    send(&app, Method::DELETE, &format!("/api/patients/{ken}"), Some(&admin), None).await;
    let active = get(&app, "/api/patients?active=true", &admin).await;
    assert_eq!(active.body["total"], 2);
    let inactive = get(&app, "/api/patients?active=false", &admin).await;
    assert_eq!(inactive.body["total"], 1);

    let bad = get(&app, "/api/patients?page=first", &admin).await;
    assert_envelope(&bad, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn viewers_read_but_do_not_write() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let viewer = user_with_role(&app, &admin, "auditor", "viewer").await;
    let patient = create_patient(&app, &admin, "MRN-V").await;
    let id = patient["id"].as_str().unwrap();

    assert_eq!(get(&app, &format!("/api/patients/{id}"), &viewer).await.status, StatusCode::OK);
    assert_envelope(
        &post(&app, "/api/patients", &viewer, patient_body("MRN-X", "No", "Way")).await,
        StatusCode::FORBIDDEN,
    );
    assert_envelope(
        &post(&app, &format!("/api/patients/{id}/vitals"), &viewer, json!({ "heart_rate": 70 })).await,
        StatusCode::FORBIDDEN,
    );
    assert_envelope(
        &send(&app, Method::DELETE, &format!("/api/patients/{id}"), Some(&viewer), None).await,
        StatusCode::FORBIDDEN,
    );
}

#[tokio::test]
async fn clinical_records_for_a_patient() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let clinician = user_with_role(&app, &admin, "dr.ng", "clinician").await;
    let patient = create_patient(&app, &clinician, "MRN-CR").await;
    let id = patient["id"].as_str().unwrap();

    let vital = post(
        &app,
        &format!("/api/patients/{id}/vitals"),
        &clinician,
        json!({ "heart_rate": 118, "systolic_bp": 92, "diastolic_bp": 58, "oxygen_saturation": 91.5 }),
    )
    .await;
    assert_eq!(vital.status, StatusCode::CREATED, "{}", vital.text);
    assert_eq!(vital.body["patient_id"], id);

    let impossible = post(
        &app,
        &format!("/api/patients/{id}/vitals"),
        &clinician,
        json!({ "heart_rate": 900 }),
    )
    .await;
    assert_envelope(&impossible, StatusCode::UNPROCESSABLE_ENTITY);

    let lab = post(
        &app,
        &format!("/api/patients/{id}/labs"),
        &clinician,
        json!({
            "test_name": "Lactate",
            "test_value": 4.2,
            "unit": "mmol/L",
            "reference_low": 0.5,
            "reference_high": 2.2,
            "test_date": "2024-06-01T06:30:00Z",
        }),
    )
    .await;
    assert_eq!(lab.status, StatusCode::CREATED, "{}", lab.text);
    assert_eq!(lab.body["out_of_range"], true);
    assert_eq!(lab.body["status"], "pending");

    let assessment = post(
        &app,
        &format!("/api/patients/{id}/risk-assessments"),
        &clinician,
        json!({
            "risk_score": 72.5,
            "risk_category": "high",
            "assessment_type": "readmission",
            "clinical_factors": { "prior_admissions": 3 },
        }),
    )
    .await;
    assert_eq!(assessment.status, StatusCode::CREATED, "{}", assessment.text);
    let assessment_id = assessment.body["id"].as_str().unwrap();
    let me = get(&app, "/api/auth/me", &clinician).await;
    assert_eq!(assessment.body["created_by"], me.body["id"]);

    let by_id = get(&app, &format!("/api/risk/assessments/{assessment_id}"), &clinician).await;
    assert_eq!(by_id.status, StatusCode::OK);
    assert_eq!(by_id.body["risk_score"], 72.5);

    let intervention = post(
        &app,
        &format!("/api/patients/{id}/interventions"),
        &clinician,
        json!({
            "intervention_type": "Fluid bolus",
            "intervention_date": "2024-06-01T07:00:00Z",
            "outcome": "ongoing",
        }),
    )
    .await;
    assert_eq!(intervention.status, StatusCode::CREATED, "{}", intervention.text);
    assert_eq!(intervention.body["clinician_id"], me.body["id"]);

    for (path, expected) in [("vitals", 1), ("labs", 1), ("risk-assessments", 1), ("interventions", 1)] {
        let list = get(&app, &format!("/api/patients/{id}/{path}"), &clinician).await;
        assert_eq!(list.status, StatusCode::OK, "{path}");
        assert_eq!(list.body["total"], expected, "{path}");
    }
}

#[tokio::test]
async fn inactive_patients_take_no_new_records() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let patient = create_patient(&app, &admin, "MRN-GONE").await;
    let id = patient["id"].as_str().unwrap();
    post(&app, &format!("/api/patients/{id}/vitals"), &admin, json!({ "heart_rate": 60 })).await;

    send(&app, Method::DELETE, &format!("/api/patients/{id}"), Some(&admin), None).await;

    let res = post(&app, &format!("/api/patients/{id}/vitals"), &admin, json!({ "heart_rate": 61 })).await;
    assert_envelope(&res, StatusCode::NOT_FOUND);

    let history = get(&app, &format!("/api/patients/{id}/vitals"), &admin).await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.body["total"], 1);
}

#[tokio::test]
async fn updates_are_normalized_like_creation() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let patient = create_patient(&app, &admin, "MRN-1").await;
    let id = patient["id"].as_str().unwrap();

    let updated = put(
        &app,
        &format!("/api/patients/{id}"),
        &admin,
        json!({ "mrn": "  MRN-2  ", "admission_date": "2024-03-01T10:00:00.123456789Z" }),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.text);
    assert_eq!(updated.body["mrn"], "MRN-2");
    assert_eq!(updated.body["admission_date"], "2024-03-01T10:00:00.123456Z");

    let fetched = get(&app, &format!("/api/patients/{id}"), &admin).await;
    assert_eq!(fetched.body, updated.body);

    let clash = post(&app, "/api/patients", &admin, patient_body("MRN-2", "Other", "Person")).await;
    assert_envelope(&clash, StatusCode::CONFLICT);
}

#[tokio::test]
async fn soft_deleted_patient_can_be_reactivated() {
    let app = test_app();
    let admin = bootstrap_admin(&app).await;
    let patient = create_patient(&app, &admin, "MRN-BACK").await;
    let id = patient["id"].as_str().unwrap();
    send(&app, Method::DELETE, &format!("/api/patients/{id}"), Some(&admin), None).await;

    let revived = put(&app, &format!("/api/patients/{id}"), &admin, json!({ "is_active": true })).await;
    assert_eq!(revived.status, StatusCode::OK, "{}", revived.text);
    assert_eq!(revived.body["is_active"], true);

    let vital = post(&app, &format!("/api/patients/{id}/vitals"), &admin, json!({ "heart_rate": 72 })).await;
    assert_eq!(vital.status, StatusCode::CREATED, "{}", vital.text);
}
