#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use dinoqode_core::PrintMode;
use dinoqode_engine::{GenerationError, Generator, GeneratorSettings, ProcessGenerator};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Settings that run `script` through `sh` inside `dir`.
fn sh_settings(dir: &Path, script: &str) -> GeneratorSettings {
    let script_path = dir.join("fake_gen.sh");
    fs::write(&script_path, script).unwrap();
    GeneratorSettings {
        program: "sh".to_string(),
        args: vec![script_path.display().to_string()],
        working_dir: dir.to_path_buf(),
        timeout: Duration::from_secs(10),
        ..GeneratorSettings::default()
    }
}

const RECORDING_SCRIPT: &str = r#"
mkdir -p out
printf '%s\n' "$@" > out/args.txt
echo "<html>cards</html>" > out/index.html
echo "rendered"
echo "warning" 1>&2
"#;

#[test]
fn default_arguments_match_the_card_generator() {
    let settings = GeneratorSettings::default();
    let input = PathBuf::from("tmp/cards.txt");
    assert_eq!(
        settings.command_args(&input, PrintMode::Simplex),
        vec!["./qrgen.py", "--input=tmp/cards.txt"]
    );
    assert_eq!(
        settings.command_args(&input, PrintMode::Duplex),
        vec!["./qrgen.py", "--input=tmp/cards.txt", "--print-dublex"]
    );

    let separate = GeneratorSettings {
        input_flag: "--input".into(),
        images_flag: Some("--generate-images".into()),
        ..GeneratorSettings::default()
    };
    assert_eq!(
        separate.command_args(&input, PrintMode::Simplex),
        vec!["./qrgen.py", "--input", "tmp/cards.txt", "--generate-images"]
    );
}

#[tokio::test]
async fn successful_run_passes_duplex_flag_and_counts_output() {
    let temp = TempDir::new().unwrap();
    let generator = ProcessGenerator::new(sh_settings(temp.path(), RECORDING_SCRIPT));

    let report = generator
        .generate(Path::new("tmp/cards.txt"), PrintMode::Duplex)
        .await
        .expect("generation succeeds");
    assert_eq!(report.output_lines, 2);

    let args = fs::read_to_string(temp.path().join("out/args.txt")).unwrap();
    assert_eq!(
        args.lines().collect::<Vec<_>>(),
        vec!["--input=tmp/cards.txt", "--print-dublex"]
    );
}

#[tokio::test]
async fn non_zero_exit_is_a_failure_even_with_output() {
    let temp = TempDir::new().unwrap();
    let script = "mkdir -p out\necho ok > out/index.html\necho 'boom' 1>&2\nexit 3\n";
    let generator = ProcessGenerator::new(sh_settings(temp.path(), script));

    let err = generator
        .generate(Path::new("tmp/cards.txt"), PrintMode::Simplex)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::ExitStatus { code: 3 }), "{err:?}");
}

#[tokio::test]
async fn missing_output_is_a_failure() {
    let temp = TempDir::new().unwrap();
    let generator = ProcessGenerator::new(sh_settings(temp.path(), "echo nothing\n"));

    let err = generator
        .generate(Path::new("tmp/cards.txt"), PrintMode::Simplex)
        .await
        .unwrap_err();
    match err {
        GenerationError::MissingOutput(path) => assert!(path.ends_with("out/index.html")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn slow_generator_times_out() {
    let temp = TempDir::new().unwrap();
    let settings = GeneratorSettings {
        timeout: Duration::from_millis(200),
        ..sh_settings(temp.path(), "sleep 5\n")
    };
    let generator = ProcessGenerator::new(settings);

    let err = generator
        .generate(Path::new("tmp/cards.txt"), PrintMode::Simplex)
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "{err:?}");
}

#[tokio::test]
async fn background_helper_holding_output_open_does_not_stall_completion() {
    let temp = TempDir::new().unwrap();
    let script = "mkdir -p out\necho ok > out/index.html\necho started\nsleep 8 &\nexit 0\n";
    let generator = ProcessGenerator::new(sh_settings(temp.path(), script));

    let started = Instant::now();
    let report = generator
        .generate(Path::new("tmp/cards.txt"), PrintMode::Simplex)
        .await
        .expect("generator exited cleanly");
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "waited {:?} for inherited output pipes",
        started.elapsed()
    );
    assert_eq!(report.output_lines, 1);
}

#[tokio::test]
async fn output_wait_never_exceeds_the_timeout() {
    let temp = TempDir::new().unwrap();
    let settings = GeneratorSettings {
        timeout: Duration::from_millis(500),
        ..sh_settings(temp.path(), "mkdir -p out\necho ok > out/index.html\nsleep 8 &\nexit 0\n")
    };

    let started = Instant::now();
    ProcessGenerator::new(settings)
        .generate(Path::new("tmp/cards.txt"), PrintMode::Simplex)
        .await
        .expect("generator exited cleanly");
    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
}

#[tokio::test]
async fn missing_program_is_a_spawn_failure() {
    let temp = TempDir::new().unwrap();
    let settings = GeneratorSettings {
        program: "definitely-not-a-real-generator".into(),
        working_dir: temp.path().to_path_buf(),
        ..GeneratorSettings::default()
    };
    let err = ProcessGenerator::new(settings)
        .generate(Path::new("tmp/cards.txt"), PrintMode::Simplex)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Spawn { .. }), "{err:?}");
}
