mod common;

use common::{patient_body, prescription, TestApp};
use serde_json::{json, Value};

#[tokio::test]
#[ignore = "Requires MongoDB at TEST_MONGODB_URI"]
async fn patient_lifecycle_against_mongodb() {
    let app = TestApp::spawn().await;

    let health = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(health.status().as_u16(), 200);

    let created: Value = app
        .client
        .post(app.url("/api/userDetails"))
        .json(&patient_body("Mongo Patient"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["user"]["_id"].as_str().unwrap().to_string();

    let updated: Value = app
        .client
        .put(app.url(&format!("/api/userDetails/{}", id)))
        .json(&json!({
            "prescription": [prescription("Metformin")],
            "newPrescription": [prescription("Glimepiride")]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["user"]["prescription"][0]["tablets"], "Metformin");
    assert_eq!(updated["user"]["newPrescription"][0]["tablets"], "Glimepiride");

    let completed = app
        .client
        .put(app.url(&format!("/api/userDetail/{}/complete", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(completed.status().as_u16(), 200);

    let fetched: Value = app
        .client
        .get(app.url(&format!("/api/userDetails/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["isCompleted"], true);
    assert_eq!(fetched["prescription"], updated["user"]["prescription"]);

    let list: Value = app
        .client
        .get(app.url("/api/userDetails"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "Requires MongoDB at TEST_MONGODB_URI"]
async fn reviews_and_admin_session_against_mongodb() {
    let app = TestApp::spawn().await;

    let created = app
        .client
        .post(app.url("/api/review"))
        .json(&json!({ "name": "Anil", "email": "anil@example.com", "rating": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);

    let listed: Value = app
        .client
        .get(app.url("/api/reviews"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let login = app
        .client
        .post(app.url("/adminlogin"))
        .json(&json!({ "userId": common::ADMIN_USER, "password": common::ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 200);

    let signin = app.client.get(app.url("/adminsignin")).send().await.unwrap();
    assert_eq!(signin.status().as_u16(), 200);

    app.client
        .post(app.url("/adminlogout"))
        .send()
        .await
        .unwrap();
    let signin = app.client.get(app.url("/adminsignin")).send().await.unwrap();
    assert_eq!(signin.status().as_u16(), 401);
}
