use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dinoqode_core::{Batch, FailureKind, PrintMode};
use dinoqode_engine::{
    BatchStore, Clock, GenerationError, GenerationReport, Generator, Orchestrator,
    SubmissionError,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    input: PathBuf,
    print_mode: PrintMode,
    content: String,
}

/// Records each call together with the batch file content it saw.
#[derive(Default)]
struct RecordingGenerator {
    calls: Mutex<Vec<Call>>,
    delay: Duration,
    fail_with_code: Option<i32>,
}

impl RecordingGenerator {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Generator for RecordingGenerator {
    async fn generate(
        &self,
        input: &Path,
        print_mode: PrintMode,
    ) -> Result<GenerationReport, GenerationError> {
        let content = fs::read_to_string(input).unwrap_or_default();
        tokio::time::sleep(self.delay).await;
        // The file must not change while the generator works on it.
        let after = fs::read_to_string(input).unwrap_or_default();
        assert_eq!(content, after, "batch file changed during generation");

        self.calls.lock().unwrap().push(Call {
            input: input.to_path_buf(),
            print_mode,
            content,
        });
        match self.fail_with_code {
            Some(code) => Err(GenerationError::ExitStatus { code }),
            None => Ok(GenerationReport {
                output_lines: 0,
                elapsed: self.delay,
            }),
        }
    }
}

fn counting_clock() -> Clock {
    let tick = Arc::new(AtomicUsize::new(0));
    Arc::new(move || {
        let n = tick.fetch_add(1, Ordering::SeqCst);
        format!("2024-05-01T00:00:{n:02}.000Z")
    })
}

fn orchestrator(temp: &TempDir, generator: Arc<RecordingGenerator>) -> Orchestrator {
    let store = BatchStore::new(
        temp.path().join("tmp/cards.txt"),
        temp.path().join("tmp/_archive"),
    );
    Orchestrator::with_clock(store, generator, counting_clock())
}

const LINE: &str = "spotify:album:123|Test Album|Test Artist|http://x/img.png";

#[tokio::test]
async fn duplex_submission_reaches_ready_with_flag() {
    dinoqode_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    let generator = Arc::new(RecordingGenerator::default());
    let orch = orchestrator(&temp, generator.clone());

    let outcome = orch
        .submit(Batch::new(LINE, PrintMode::from_form_value(Some("dublex"))))
        .await
        .expect("submission succeeds");

    assert_eq!(outcome.summary.cards, 1);
    assert_eq!(outcome.archived, None);
    assert_eq!(
        generator.calls(),
        vec![Call {
            input: temp.path().join("tmp/cards.txt"),
            print_mode: PrintMode::Duplex,
            content: LINE.to_string(),
        }]
    );
}

#[tokio::test]
async fn second_submission_archives_the_first() {
    let temp = TempDir::new().unwrap();
    let generator = Arc::new(RecordingGenerator::default());
    let orch = orchestrator(&temp, generator.clone());

    orch.submit(Batch::new("b1-line", PrintMode::Simplex))
        .await
        .unwrap();
    let outcome = orch
        .submit(Batch::new("b2-line", PrintMode::Simplex))
        .await
        .unwrap();

    let archived = outcome.archived.expect("first batch archived");
    assert_eq!(fs::read_to_string(archived).unwrap(), "b1-line");
    assert_eq!(orch.store().archived().unwrap().len(), 1);
    assert_eq!(
        fs::read_to_string(orch.store().input_path()).unwrap(),
        "b2-line"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_are_serialized() {
    let temp = TempDir::new().unwrap();
    let generator = Arc::new(RecordingGenerator {
        delay: Duration::from_millis(100),
        ..RecordingGenerator::default()
    });
    let orch = Arc::new(orchestrator(&temp, generator.clone()));

    let a = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.submit(Batch::new("batch-a", PrintMode::Simplex)).await })
    };
    let b = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.submit(Batch::new("batch-b", PrintMode::Duplex)).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    let mut seen: Vec<&str> = calls.iter().map(|c| c.content.as_str()).collect();
    seen.sort();
    assert_eq!(seen, vec!["batch-a", "batch-b"]);

    let archived = orch.store().archived().unwrap();
    assert_eq!(archived.len(), 1);
    let first = &calls[0].content;
    let last = &calls[1].content;
    assert_eq!(&fs::read_to_string(&archived[0]).unwrap(), first);
    assert_eq!(&fs::read_to_string(orch.store().input_path()).unwrap(), last);
}

#[tokio::test]
async fn persistence_failure_skips_generation() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tmp"), "blocks the input directory").unwrap();
    let generator = Arc::new(RecordingGenerator::default());
    let orch = orchestrator(&temp, generator.clone());

    let err = orch
        .submit(Batch::new(LINE, PrintMode::Simplex))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Persistence(_)), "{err:?}");
    assert_eq!(err.kind(), FailureKind::Persistence);
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn generator_failure_is_reported() {
    let temp = TempDir::new().unwrap();
    let generator = Arc::new(RecordingGenerator {
        fail_with_code: Some(1),
        ..RecordingGenerator::default()
    });
    let orch = orchestrator(&temp, generator.clone());

    let err = orch
        .submit(Batch::new(LINE, PrintMode::Simplex))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Generation);
    assert_eq!(generator.calls().len(), 1);
}

#[tokio::test]
async fn blank_batch_is_rejected_without_archiving() {
    let temp = TempDir::new().unwrap();
    let generator = Arc::new(RecordingGenerator::default());
    let orch = orchestrator(&temp, generator.clone());
    orch.submit(Batch::new(LINE, PrintMode::Simplex))
        .await
        .unwrap();

    let err = orch
        .submit(Batch::new("  \n\n", PrintMode::Simplex))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::EmptyBatch));
    assert!(orch.store().archived().unwrap().is_empty());
    assert_eq!(fs::read_to_string(orch.store().input_path()).unwrap(), LINE);
}
