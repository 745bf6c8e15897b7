//! Upload, progress and delete integration tests.
//!
//! Run with: `cargo test -p bazaar-api --test uploads_test`

mod helpers;

use bazaar_api::ProcessEvent;
use helpers::fixtures::{create_corrupt_image, create_test_jpeg, create_test_png};
use helpers::storage::GatedStorage;
use helpers::{
    api_path, image_part, setup_test_app, setup_test_app_with, setup_test_app_with_storage,
    upload_form,
};
use serde_json::Value;
use std::future::IntoFuture;
use std::time::Duration;

#[tokio::test]
async fn test_upload_image_is_processed_and_stored() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(vec![image_part(
        create_test_png(1200, 800),
        "couch.png",
        "image/png",
    )]);
    let response = client
        .post(&api_path("/uploads/listing/42"))
        .add_query_param("token", "tok-success")
        .add_query_param("echo", "client-1")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["successful"], true);
    assert!(body.get("error").is_none());
    assert_eq!(body["failed_images"].as_array().map(Vec::len), Some(0));

    let images = body["images"].as_array().expect("images array");
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["name"], "couch.png");
    let id = images[0]["id"].as_str().expect("id").to_string();
    let target = images[0]["target"].as_str().expect("target").to_string();
    assert_eq!(target, format!("{}_listing_42", id));

    let events = app.notifier.wait_for(1).await;
    let (recipient, event) = &events[0];
    assert_eq!(recipient, "client-1");
    match event {
        ProcessEvent::Done {
            name,
            id: event_id,
            url,
            thumbnail_url,
        } => {
            assert_eq!(name, "couch.png");
            assert_eq!(event_id, &id);
            assert_eq!(url, &format!("{}/{}.jpg", helpers::TEST_BASE_URL, target));
            assert_eq!(
                thumbnail_url,
                &format!("{}/{}_thumb.jpg", helpers::TEST_BASE_URL, target)
            );
        }
        other => panic!("Expected IM_PROCESS_DONE, got {:?}", other),
    }

    let full = image::open(app.object_path(&format!("{}.jpg", target))).expect("full size");
    assert_eq!((full.width(), full.height()), (600, 400));
    let thumb = image::open(app.object_path(&format!("{}_thumb.jpg", target))).expect("thumb");
    assert_eq!((thumb.width(), thumb.height()), (150, 100));

    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_exact_size_limit_accepted_and_one_over_rejected() {
    let png = create_test_png(40, 30);
    let limit = png.len();
    let mut oversized = png.clone();
    oversized.push(0);

    let app = setup_test_app_with(|config| config.max_file_size_bytes = limit).await;
    let client = app.client();

    let form = upload_form(vec![
        image_part(png, "exact.png", "image/png"),
        image_part(oversized, "over.png", "image/png"),
    ]);
    let response = client
        .post(&api_path("/uploads/listing/7"))
        .add_query_param("token", "tok-limit")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let images = body["images"].as_array().expect("images array");
    assert_eq!(images.len(), 1);
    assert_eq!(images[0]["name"], "exact.png");

    let failed = body["failed_images"].as_array().expect("failed array");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["name"], "over.png");
    assert_eq!(
        failed[0]["error"],
        format!("file too large: exceeds {} bytes", limit)
    );

    app.notifier.wait_for(1).await;
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_excess_parts_are_dropped() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(vec![
        image_part(create_test_png(32, 32), "one.png", "image/png"),
        image_part(create_test_jpeg(32, 32), "two.jpg", "image/jpeg"),
        image_part(create_test_png(32, 32), "three.png", "image/png"),
    ]);
    let response = client
        .post(&api_path("/uploads/listing/9"))
        .add_query_param("token", "tok-budget")
        .add_query_param("remaining", "2")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["successful"], true);
    let names: Vec<&str> = body["images"]
        .as_array()
        .expect("images array")
        .iter()
        .filter_map(|image| image["name"].as_str())
        .collect();
    assert_eq!(names, vec!["one.png", "two.jpg"]);
    assert_eq!(body["failed_images"].as_array().map(Vec::len), Some(0));

    let events = app.notifier.wait_for(2).await;
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_remaining_is_capped_by_config() {
    let app = setup_test_app_with(|config| config.max_listing_images = 1).await;
    let client = app.client();

    let form = upload_form(vec![
        image_part(create_test_png(16, 16), "a.png", "image/png"),
        image_part(create_test_png(16, 16), "b.png", "image/png"),
    ]);
    let response = client
        .post(&api_path("/uploads/listing/9"))
        .add_query_param("token", "tok-cap")
        .add_query_param("remaining", "10")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["images"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_unsupported_content_type_is_rejected() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(vec![image_part(
        b"BM not really a bitmap".to_vec(),
        "scan.bmp",
        "image/bmp",
    )]);
    let response = client
        .post(&api_path("/uploads/listing/3"))
        .add_query_param("token", "tok-type")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["images"].as_array().map(Vec::len), Some(0));
    let failed = body["failed_images"].as_array().expect("failed array");
    assert_eq!(failed.len(), 1);
    assert!(failed[0]["error"]
        .as_str()
        .is_some_and(|e| e.contains("unsupported content type")));
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_corrupt_image_fails_asynchronously() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(vec![image_part(
        create_corrupt_image(),
        "broken.png",
        "image/png",
    )]);
    let response = client
        .post(&api_path("/uploads/listing/5"))
        .add_query_param("token", "tok-corrupt")
        .add_query_param("echo", "client-2")
        .multipart(form)
        .await;

    // Processing errors never reach the upload response.
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let target = body["images"][0]["target"]
        .as_str()
        .expect("target")
        .to_string();

    let events = app.notifier.wait_for(1).await;
    assert_eq!(
        events[0],
        (
            "client-2".to_string(),
            ProcessEvent::Failed {
                name: "broken.png".to_string(),
                media: "listing".to_string(),
                media_id: "5".to_string(),
            }
        )
    );
    assert!(!app.object_path(&format!("{}.jpg", target)).exists());
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_token_collision_leaves_first_upload_running() {
    let mut gate = None;
    let app = setup_test_app_with_storage(
        |config| {
            config.image_worker_count = 1;
            config.image_queue_capacity = 1;
        },
        |inner| {
            let (storage, release) = GatedStorage::wrap(inner);
            gate = Some(release);
            storage
        },
    )
    .await;
    let gate = gate.expect("storage gate");
    let client = app.client();
    let progress = app.state.ingestion.progress();

    // With storage parked, the third submit of the first upload waits for queue
    // space, so its session keeps the token until the gate opens.
    let first = client
        .post(&api_path("/uploads/listing/1"))
        .add_query_param("token", "shared-token")
        .add_query_param("echo", "first-client")
        .multipart(upload_form(vec![
            image_part(create_test_png(16, 16), "a.png", "image/png"),
            image_part(create_test_png(16, 16), "b.png", "image/png"),
            image_part(create_test_png(16, 16), "c.png", "image/png"),
        ]))
        .into_future();

    let second = async {
        tokio::time::timeout(Duration::from_secs(10), async {
            while progress.get("shared-token").is_err() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("first upload never opened its session");

        let response = client
            .post(&api_path("/uploads/listing/1"))
            .add_query_param("token", "shared-token")
            .add_query_param("echo", "second-client")
            .multipart(upload_form(vec![image_part(
                create_test_png(16, 16),
                "late.png",
                "image/png",
            )]))
            .await;

        let current = progress.get("shared-token").expect("first session entry");
        assert_eq!(current.echo_self, "first-client");

        gate.add_permits(64);
        response
    };

    let (first, second) = tokio::join!(first, second);

    assert_eq!(second.status_code(), 409);
    let body: Value = second.json();
    assert_eq!(body["code"], "TOKEN_COLLISION");
    assert_eq!(body["error"], "Token is taken");

    assert_eq!(first.status_code(), 200);
    let body: Value = first.json();
    assert_eq!(body["successful"], true);
    assert_eq!(body["images"].as_array().map(Vec::len), Some(3));

    let events = app.notifier.wait_for(3).await;
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|(recipient, event)| {
        recipient == "first-client" && matches!(event, ProcessEvent::Done { .. })
    }));
    assert!(progress.get("shared-token").is_err());
}

#[tokio::test]
async fn test_zero_remaining_is_rejected() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(vec![image_part(
        create_test_png(16, 16),
        "a.png",
        "image/png",
    )]);
    let response = client
        .post(&api_path("/uploads/listing/8"))
        .add_query_param("token", "tok-full")
        .add_query_param("remaining", "0")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(app.state.ingestion.progress().get("tok-full").is_err());
    assert!(app.notifier.events().await.is_empty());
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_progress_is_gone_after_session() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(vec![image_part(
        create_test_png(16, 16),
        "tiny.png",
        "image/png",
    )]);
    let response = client
        .post(&api_path("/uploads/listing/2"))
        .add_query_param("token", "tok-progress")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 200);

    let response = client
        .get(&api_path("/uploads/progress/tok-progress"))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["successful"], false);
    assert_eq!(body["error"], "token invalid");
    assert!(body.get("upload_progress").is_none());
}

#[tokio::test]
async fn test_progress_reports_live_session() {
    let app = setup_test_app().await;
    let client = app.client();

    let guard = app
        .state
        .ingestion
        .progress()
        .begin("tok-live", "watcher")
        .expect("session");
    guard.update("sofa.jpg", 8192, bazaar_api::FileStatus::Uploading);

    let response = client.get(&api_path("/uploads/progress/tok-live")).await;
    let body: Value = response.json();
    assert_eq!(body["successful"], true);
    assert_eq!(body["upload_progress"]["echo_self"], "watcher");
    assert_eq!(
        body["upload_progress"]["files"]["sofa.jpg"]["bytes_read"],
        8192
    );
    assert_eq!(
        body["upload_progress"]["files"]["sofa.jpg"]["status"],
        "Uploading"
    );
}

#[tokio::test]
async fn test_missing_token_is_bad_request() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(vec![image_part(
        create_test_png(16, 16),
        "a.png",
        "image/png",
    )]);
    let response = client
        .post(&api_path("/uploads/listing/2"))
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(app.notifier.events().await.is_empty());
}

#[tokio::test]
async fn test_delete_removes_both_objects() {
    let app = setup_test_app().await;
    let client = app.client();

    let form = upload_form(vec![image_part(
        create_test_jpeg(300, 200),
        "lamp.jpg",
        "image/jpeg",
    )]);
    let response = client
        .post(&api_path("/uploads/listing/11"))
        .add_query_param("token", "tok-delete")
        .multipart(form)
        .await;
    let body: Value = response.json();
    let target = body["images"][0]["target"]
        .as_str()
        .expect("target")
        .to_string();
    app.notifier.wait_for(1).await;

    let full = app.object_path(&format!("{}.jpg", target));
    let thumb = app.object_path(&format!("{}_thumb.jpg", target));
    assert!(full.exists());
    assert!(thumb.exists());

    let response = client
        .delete(&api_path(&format!("/images/{}", target)))
        .await;
    assert_eq!(response.status_code(), 204);
    assert!(!full.exists());
    assert!(!thumb.exists());

    // Deleting again is still a success.
    let response = client
        .delete(&api_path(&format!("/images/{}", target)))
        .await;
    assert_eq!(response.status_code(), 204);
}

#[tokio::test]
async fn test_health() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "alive");
    assert_eq!(body["storage"], "local");
    assert_eq!(body["queued_jobs"], 0);
}
