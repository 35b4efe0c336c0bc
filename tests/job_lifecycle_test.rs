//! Job lifecycle integration tests.
//!
//! Drives jobs end to end through an app assembled by [`build_app`] with a
//! memory datastore and the real image collaborators.

use std::io::Cursor;
use std::sync::Arc;

use af_core::Error;
use af_job::{params, App, Job, JobState, Recipe};
use assert_matches::assert_matches;
use assetforge::app::build_app;
use assetforge::config::{Config, DatastoreBackend};
use bytes::Bytes;
use image::{GenericImageView, ImageFormat};
use serde_json::json;

fn memory_app() -> Arc<App> {
    let mut config = Config::default();
    config.datastore.backend = DatastoreBackend::Memory;
    build_app(&config).unwrap()
}

fn png(width: u32, height: u32) -> Bytes {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 200, 30]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    Bytes::from(buf.into_inner())
}

async fn stored_png(app: &Arc<App>, width: u32, height: u32) -> String {
    app.datastore().store(png(width, height)).await.unwrap()
}

// ---------------------------------------------------------------------------
// Fetch -> process -> encode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn thumbnail_then_jpeg() {
    let app = memory_app();
    let uid = stored_png(&app, 400, 200).await;

    let mut job = app
        .fetch(&uid)
        .process("thumbnail", params![100, 100])
        .encode("jpg", params![]);
    assert_eq!(job.state(), JobState::Empty);

    let data = job.data().await.unwrap();
    assert_eq!(job.state(), JobState::FullyApplied);
    assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Jpeg);
    let img = image::load_from_memory(&data).unwrap();
    assert_eq!(img.dimensions(), (100, 50));
}

#[tokio::test]
async fn steps_added_after_apply_run_incrementally() {
    let app = memory_app();
    let uid = stored_png(&app, 64, 64).await;

    let mut job = app.fetch(&uid).process("resize", params![32, 16]);
    job.apply().await.unwrap();
    assert_eq!(job.applied_steps(), 2);

    job.push_process("rotate", params![90]);
    assert_eq!(job.state(), JobState::PartiallyApplied);
    assert_eq!(job.pending_steps().len(), 1);

    let img = image::load_from_memory(&job.data().await.unwrap()).unwrap();
    assert_eq!(img.dimensions(), (16, 32));
}

#[tokio::test]
async fn analysers_see_the_processed_artifact() {
    let app = memory_app();
    let uid = stored_png(&app, 300, 100).await;

    let mut job = app.fetch(&uid).process("crop", params![0, 0, 50, 25]);
    assert_eq!(job.analyse("width", &[]).await.unwrap(), json!(50));
    assert_eq!(
        job.analyse("dimensions", &[]).await.unwrap(),
        json!({ "width": 50, "height": 25 })
    );
    assert_eq!(job.analyse("format", &[]).await.unwrap(), json!("png"));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_uid_propagates_not_found() {
    let app = memory_app();
    let mut job = app.fetch("does-not-exist").encode("png", params![]);
    assert_matches!(job.data().await, Err(Error::NotFound { .. }));
    assert_eq!(job.applied_steps(), 0);
}

#[tokio::test]
async fn process_without_fetch_is_rejected() {
    let app = memory_app();
    let mut job = Job::new(app).process("greyscale", params![]);
    assert_matches!(job.apply().await, Err(Error::NothingToProcess));
}

#[tokio::test]
async fn bad_parameters_leave_earlier_steps_applied() {
    let app = memory_app();
    let uid = stored_png(&app, 20, 20).await;

    let mut job = app
        .fetch(&uid)
        .process("greyscale", params![])
        .process("rotate", params![45]);
    assert_matches!(job.apply().await, Err(Error::InvalidParams { .. }));
    assert_eq!(job.applied_steps(), 2);
    assert!(job.current_artifact().is_some());
}

#[tokio::test]
async fn analyse_without_source_is_rejected() {
    let app = memory_app();
    let mut job = app.new_job();
    assert_matches!(
        job.analyse("width", &[]).await,
        Err(Error::NothingToAnalyse)
    );
}

// ---------------------------------------------------------------------------
// Combination and recipes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn combined_jobs_run_in_order() {
    let app = memory_app();
    let uid = stored_png(&app, 80, 40).await;

    let left = app.fetch(&uid).process("resize", params![40, 20]);
    let right = app.new_job().encode("bmp", params![]);
    let mut combined = left.combine(&right).unwrap();

    let data = combined.data().await.unwrap();
    assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Bmp);
    assert_eq!(
        image::load_from_memory(&data).unwrap().dimensions(),
        (40, 20)
    );
}

#[tokio::test]
async fn combining_jobs_from_different_apps_fails() {
    let a = memory_app();
    let b = memory_app();
    assert_matches!(
        a.new_job().combine(&b.new_job()),
        Err(Error::AppMismatch { .. })
    );
}

#[tokio::test]
async fn recipe_replays_on_another_job() {
    let app = memory_app();
    let uid = stored_png(&app, 50, 50).await;

    let mut original = app
        .fetch(&uid)
        .process("thumbnail", params![10, 10])
        .encode("gif", params![]);
    let recipe = Recipe::from_json(&original.recipe().to_json().unwrap()).unwrap();
    assert_eq!(recipe.signature(), original.recipe().signature());

    let mut replay = Job::from_recipe(Arc::clone(&app), recipe);
    assert_eq!(
        replay.data().await.unwrap(),
        original.data().await.unwrap()
    );
}
