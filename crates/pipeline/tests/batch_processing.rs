//! Integration tests for the enhancement processor: sequential batch
//! dispatch, deletion while a call is in flight, and job events.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kana_core::error::CoreError;
use kana_core::generation::{
    ContentGenerator, GeneratedContent, GeneratedImage, Language, Platform, VisualStyle,
};
use kana_core::job::JobStatus;
use kana_core::settings::{AspectRatio, EnhanceSettings, UpdateEnhanceSettings};
use kana_core::types::SourceFile;
use kana_pipeline::{EnhanceProcessor, JobEventBus, JobOutcome, JobStore, SettingsHandle};
use tokio::sync::{Mutex, Notify};

// ---------------------------------------------------------------------------
// Mock generators
// ---------------------------------------------------------------------------

/// Tracks how many enhancement calls overlap.
#[derive(Default)]
struct CountingGenerator {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl ContentGenerator for CountingGenerator {
    async fn generate_caption(
        &self,
        _: &SourceFile,
        _: &str,
        _: Platform,
        _: Language,
    ) -> Result<GeneratedContent, CoreError> {
        Err(CoreError::Remote("unused".into()))
    }

    async fn generate_visual(
        &self,
        _: &[Arc<SourceFile>],
        _: &str,
        _: VisualStyle,
        _: Language,
    ) -> Result<GeneratedImage, CoreError> {
        Err(CoreError::Remote("unused".into()))
    }

    async fn enhance_image(
        &self,
        image: &SourceFile,
        _: &EnhanceSettings,
    ) -> Result<GeneratedImage, CoreError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(10)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(GeneratedImage {
            mime_type: "image/png".into(),
            bytes: image.bytes.clone(),
        })
    }
}

/// Blocks every enhancement call until released.
#[derive(Default)]
struct GatedGenerator {
    entered: Notify,
    release: Notify,
    seen_ratios: Mutex<Vec<AspectRatio>>,
}

#[async_trait]
impl ContentGenerator for GatedGenerator {
    async fn generate_caption(
        &self,
        _: &SourceFile,
        _: &str,
        _: Platform,
        _: Language,
    ) -> Result<GeneratedContent, CoreError> {
        Err(CoreError::Remote("unused".into()))
    }

    async fn generate_visual(
        &self,
        _: &[Arc<SourceFile>],
        _: &str,
        _: VisualStyle,
        _: Language,
    ) -> Result<GeneratedImage, CoreError> {
        Err(CoreError::Remote("unused".into()))
    }

    async fn enhance_image(
        &self,
        image: &SourceFile,
        settings: &EnhanceSettings,
    ) -> Result<GeneratedImage, CoreError> {
        self.seen_ratios.lock().await.push(settings.aspect_ratio);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(GeneratedImage {
            mime_type: "image/png".into(),
            bytes: image.bytes.clone(),
        })
    }
}

fn processor(generator: Arc<dyn ContentGenerator>) -> Arc<EnhanceProcessor> {
    Arc::new(EnhanceProcessor::new(
        Arc::new(JobStore::default()),
        Arc::new(SettingsHandle::default()),
        generator,
    ))
}

fn file(name: &str) -> Arc<SourceFile> {
    SourceFile::new(name, "image/png", name.as_bytes().to_vec()).shared()
}

// ---------------------------------------------------------------------------
// Test: batch runs never overlap remote calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_issues_one_call_at_a_time() {
    let generator = Arc::new(CountingGenerator::default());
    let p = processor(generator.clone());
    for name in ["a.png", "b.png", "c.png", "d.png"] {
        p.jobs().create(file(name)).await;
    }

    let report = p.process_all().await.unwrap();

    assert_eq!(report.completed, 4);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 4);
    assert_eq!(generator.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(p.jobs().status_counts().await.completed, 4);
}

// ---------------------------------------------------------------------------
// Test: a settings change mid-batch applies only to jobs not yet started
// ---------------------------------------------------------------------------

#[tokio::test]
async fn settings_are_captured_per_dispatch() {
    let generator = Arc::new(GatedGenerator::default());
    let p = processor(generator.clone());
    p.jobs().create(file("a.png")).await;
    p.jobs().create(file("b.png")).await;

    let run = p.begin_batch().await.unwrap();
    let handle = tokio::spawn(run.run());

    generator.entered.notified().await;
    p.settings()
        .update(UpdateEnhanceSettings {
            aspect_ratio: Some(AspectRatio::Wide16x9),
            ..Default::default()
        })
        .await
        .unwrap();
    generator.release.notify_one();
    generator.entered.notified().await;
    generator.release.notify_one();

    let report = handle.await.unwrap();
    assert_eq!(report.completed, 2);
    assert_eq!(
        *generator.seen_ratios.lock().await,
        vec![AspectRatio::Square, AspectRatio::Wide16x9]
    );
    assert!(!p.is_batch_running());
}

// ---------------------------------------------------------------------------
// Test: deleting a job while its call is in flight discards the result
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_mid_flight_discards_result() {
    let generator = Arc::new(GatedGenerator::default());
    let p = processor(generator.clone());
    let job = p.jobs().create(file("a.png")).await;

    let worker = {
        let p = Arc::clone(&p);
        tokio::spawn(async move { p.process_one(job.id).await })
    };

    generator.entered.notified().await;
    p.jobs().remove(job.id).await.unwrap();
    generator.release.notify_one();

    assert_eq!(worker.await.unwrap().unwrap(), JobOutcome::Discarded);
    assert!(!p.jobs().contains(job.id).await);
    assert!(p.jobs().is_empty().await);
}

// ---------------------------------------------------------------------------
// Test: a job deleted before its turn is skipped by the batch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_skips_jobs_deleted_before_their_turn() {
    let generator = Arc::new(GatedGenerator::default());
    let p = processor(generator.clone());
    p.jobs().create(file("a.png")).await;
    let second = p.jobs().create(file("b.png")).await;

    let run = p.begin_batch().await.unwrap();
    assert_eq!(run.snapshot().len(), 2);
    let handle = tokio::spawn(run.run());

    generator.entered.notified().await;
    p.jobs().remove(second.id).await.unwrap();
    generator.release.notify_one();

    let report = handle.await.unwrap();
    assert_eq!((report.completed, report.skipped), (1, 1));
}

// ---------------------------------------------------------------------------
// Test: status transitions are published on the event bus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transitions_are_published() {
    let events = Arc::new(JobEventBus::default());
    let mut rx = events.subscribe();
    let p = Arc::new(EnhanceProcessor::new(
        Arc::new(JobStore::new(events)),
        Arc::new(SettingsHandle::default()),
        Arc::new(CountingGenerator::default()),
    ));
    let job = p.jobs().create(file("a.png")).await;

    p.process_one(job.id).await.unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.job_id, job.id);
    assert_eq!(first.status, JobStatus::Processing);

    let second = rx.recv().await.unwrap();
    assert!(second.status.is_completed());
}
