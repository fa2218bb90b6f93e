use holo_blobstore::{BlobStore, MemoryBlobStore};
use holo_gateway::{routes, AppState, ErrorBody, GatewayConfig};
use reqwest::{multipart, Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Helper to spawn a gateway on a random port in front of a mock FHIR backend
async fn spawn_server(fhir: &MockServer) -> (String, MemoryBlobStore) {
    spawn_server_for(&format!("{}/fhir", fhir.uri())).await
}

async fn spawn_server_for(fhir_url: &str) -> (String, MemoryBlobStore) {
    let config = GatewayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        fhir_url: fhir_url.to_string(),
        ..Default::default()
    };
    let blobs = MemoryBlobStore::default();

    let state = Arc::new(AppState::with_blob_store(config, Arc::new(blobs.clone())).unwrap());
    let app = routes::create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api/v1", addr), blobs)
}

fn document_reference(hid: &str, title: &str, pid: &str) -> Value {
    json!({
        "resourceType": "DocumentReference",
        "id": hid,
        "status": "current",
        "type": {"text": "UPLOAD_EXISTING_MODEL"},
        "subject": {"reference": format!("Patient/{pid}")},
        "author": [{"reference": "Practitioner/a1"}],
        "content": [{
            "attachment": {
                "contentType": "model/gltf-binary",
                "title": title,
                "size": 4096
            }
        }]
    })
}

async fn error_body(response: reqwest::Response) -> ErrorBody {
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_create_then_download() {
    let fhir = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/fhir/Practitioner/a1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"resourceType": "Practitioner", "id": "a1"})))
        .expect(1)
        .mount(&fhir)
        .await;
    Mock::given(method("PUT"))
        .and(path("/fhir/Patient/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resourceType": "Patient", "id": "p1"})))
        .expect(1)
        .mount(&fhir)
        .await;
    Mock::given(method("POST"))
        .and(path("/fhir/DocumentReference"))
        .respond_with(ResponseTemplate::new(201).set_body_json(document_reference("h1", "Heart", "p1")))
        .expect(1)
        .mount(&fhir)
        .await;
    Mock::given(method("PUT"))
        .and(path("/fhir/DocumentReference/h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_reference("h1", "Heart", "p1")))
        .expect(1)
        .mount(&fhir)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/DocumentReference/h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_reference("h1", "Heart", "p1")))
        .mount(&fhir)
        .await;

    let (base_url, blobs) = spawn_server(&fhir).await;
    let client = Client::new();

    // 1. Upload
    let form = multipart::Form::new()
        .text("author", r#"{"aid":"a1","name":{"full":"Dr Who"}}"#)
        .text("patient", r#"{"pid":"p1","gender":"female"}"#)
        .text("title", "Heart")
        .text("creationMode", "UPLOAD_EXISTING_MODEL")
        .part(
            "hologramFile",
            multipart::Part::bytes(vec![1u8; 4096])
                .file_name("heart.glb")
                .mime_str("model/gltf-binary")
                .unwrap(),
        );
    let res = client
        .post(format!("{}/holograms", base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["hid"], "h1");
    assert_eq!(created["pid"], "p1");
    assert_eq!(created["storageUrl"], "memory://holograms/h1.glb");

    // 2. The binary is stored under the new id
    assert!(blobs.contains("h1.glb"));
    assert_eq!(blobs.content_type("h1.glb").as_deref(), Some("model/gltf-binary"));

    // 3. Download
    let res = client
        .get(format!("{}/holograms/h1/download", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=\"Heart.glb\""
    );
    assert_eq!(res.headers()["content-type"], "model/gltf-binary");
    assert_eq!(res.bytes().await.unwrap().len(), 4096);
}

#[tokio::test]
async fn test_create_rejects_incomplete_upload() {
    let fhir = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fhir)
        .await;

    let (base_url, blobs) = spawn_server(&fhir).await;
    let form = multipart::Form::new()
        .text("author", r#"{"aid":"a1"}"#)
        .text("patient", r#"{"pid":"p1"}"#)
        .text("title", "Heart");

    let res = Client::new()
        .post(format!("{}/holograms", base_url))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(res).await.error_message, "hologramFile is required");
    assert!(blobs.is_empty());
}

#[tokio::test]
async fn test_hologram_mass_lookup() {
    let fhir = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/DocumentReference/h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_reference("h1", "Heart", "p1")))
        .mount(&fhir)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/DocumentReference/h2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fhir)
        .await;

    let (base_url, _) = spawn_server(&fhir).await;
    let res = Client::new()
        .get(format!("{}/holograms?hids=h1,h2", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["h1"][0]["title"], "Heart");
    assert_eq!(body["h1"][0]["fileSizeInKb"], 4);
    assert_eq!(body["h2"], json!([]));
}

#[tokio::test]
async fn test_patient_holograms_with_partial_page() {
    let fhir = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/DocumentReference"))
        .and(query_param("subject", "p1"))
        .and(query_param("type:text", "UPLOAD_EXISTING_MODEL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "Bundle",
            "link": [{"relation": "next", "url": format!("{}/fhir/page-2", fhir.uri())}],
            "entry": [{"resource": document_reference("h1", "Heart", "p1")}]
        })))
        .mount(&fhir)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/page-2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fhir)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/DocumentReference"))
        .and(query_param("subject", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "Bundle",
            "entry": [{"resource": document_reference("h2", "Lung", "p2")}]
        })))
        .mount(&fhir)
        .await;

    let (base_url, _) = spawn_server(&fhir).await;
    let res = Client::new()
        .get(format!(
            "{}/holograms?pids=p1,p2&creationmode=UPLOAD_EXISTING_MODEL",
            base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-holo-partial-ids"], "p1");

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["p1"].as_array().unwrap().len(), 1);
    assert_eq!(body["p2"][0]["hid"], "h2");
}

#[tokio::test]
async fn test_delete_hologram() {
    let fhir = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/DocumentReference/h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_reference("h1", "Heart", "p1")))
        .mount(&fhir)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/fhir/DocumentReference/h1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&fhir)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/DocumentReference/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&fhir)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/fhir/DocumentReference/gone"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fhir)
        .await;

    let (base_url, blobs) = spawn_server(&fhir).await;
    blobs
        .put("h1.glb", bytes::Bytes::from_static(b"glTF"), "model/gltf-binary")
        .await
        .unwrap();
    let client = Client::new();

    let res = client
        .delete(format!("{}/holograms/h1", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"success": "Deleted hid 'h1'"}));
    assert!(!blobs.contains("h1.glb"));

    let res = client
        .delete(format!("{}/holograms/gone", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let error = error_body(res).await;
    assert_eq!(error.error_code, "404");
    assert_eq!(error.error_message, "id 'gone' cannot be found");
}

#[tokio::test]
async fn test_patient_upsert() {
    let fhir = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/fhir/Patient/p1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"resourceType": "Patient", "id": "p1"})))
        .expect(1)
        .mount(&fhir)
        .await;

    let (base_url, _) = spawn_server(&fhir).await;
    let client = Client::new();

    let res = client
        .put(format!("{}/patients/p1", base_url))
        .json(&json!({"pid": "p1", "gender": "female", "birthDate": "1970-01-01"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["gender"], "female");

    // Mismatched ids never reach the backend
    let res = client
        .put(format!("{}/patients/p1", base_url))
        .json(&json!({"pid": "p2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(res).await.error_message,
        "pid in param and body do not match"
    );

    let res = client
        .put(format!("{}/patients/p1", base_url))
        .header("content-type", "text/plain")
        .body(r#"{"pid":"p1"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_backend_unreachable() {
    // Nothing listens on port 1
    let (base_url, _) = spawn_server_for("http://127.0.0.1:1/fhir").await;

    let res = Client::new()
        .get(format!("{}/authors/a1", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(res).await.error_code, "500");
}
