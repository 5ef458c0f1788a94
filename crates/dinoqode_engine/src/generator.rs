use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dinoqode_core::PrintMode;
use dinoqode_logging::{dq_debug, dq_info, dq_warn};
use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, LinesCodec};

const MAX_LOGGED_LINE: usize = 64 * 1024;
/// How long output is still drained after the generator exits. Processes it
/// left running may hold the pipes open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Executable to start, e.g. `python3`.
    pub program: String,
    /// Arguments placed before the generated flags, e.g. `["./qrgen.py"]`.
    pub args: Vec<String>,
    /// Flag carrying the input path. A trailing `=` joins flag and path into
    /// one argument; otherwise the path follows as its own argument.
    pub input_flag: String,
    pub duplex_flag: String,
    /// Extra flag asking the generator for one PNG per card, if enabled.
    pub images_flag: Option<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
    /// File that must exist (relative to `working_dir`) after a successful run.
    pub expected_output: Option<PathBuf>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["./qrgen.py".to_string()],
            input_flag: "--input=".to_string(),
            duplex_flag: "--print-dublex".to_string(),
            images_flag: None,
            working_dir: PathBuf::from("."),
            timeout: Duration::from_secs(300),
            expected_output: Some(PathBuf::from("out/index.html")),
        }
    }
}

impl GeneratorSettings {
    /// Full argument list for one run.
    pub fn command_args(&self, input: &Path, print_mode: PrintMode) -> Vec<String> {
        let mut args = self.args.clone();
        let input = input.display().to_string();
        if self.input_flag.ends_with('=') {
            args.push(format!("{}{}", self.input_flag, input));
        } else {
            if !self.input_flag.is_empty() {
                args.push(self.input_flag.clone());
            }
            args.push(input);
        }
        if print_mode.is_duplex() {
            args.push(self.duplex_flag.clone());
        }
        if let Some(flag) = &self.images_flag {
            args.push(flag.clone());
        }
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub output_lines: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("cannot start generator {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("generator exited with status {code}")]
    ExitStatus { code: i32 },
    #[error("generator was terminated by a signal")]
    Terminated,
    #[error("generator did not finish within {0:?}")]
    Timeout(Duration),
    #[error("generator finished without producing {0}")]
    MissingOutput(PathBuf),
    #[error("waiting for generator failed: {0}")]
    Wait(#[source] io::Error),
}

impl GenerationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout(_))
    }
}

/// Renders a persisted batch into card artifacts.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        input: &Path,
        print_mode: PrintMode,
    ) -> Result<GenerationReport, GenerationError>;
}

/// Runs the external generator as a child process.
///
/// Completion is the child's exit status, not the closing of its output
/// streams. Output is logged line by line at debug level and otherwise ignored.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    settings: GeneratorSettings,
}

impl ProcessGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl Generator for ProcessGenerator {
    async fn generate(
        &self,
        input: &Path,
        print_mode: PrintMode,
    ) -> Result<GenerationReport, GenerationError> {
        let settings = &self.settings;
        let args = settings.command_args(input, print_mode);
        dq_info!("Starting generator: {} {}", settings.program, args.join(" "));

        let started = Instant::now();
        let mut child = Command::new(&settings.program)
            .args(&args)
            .current_dir(&settings.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GenerationError::Spawn {
                program: settings.program.clone(),
                source,
            })?;

        let lines = Arc::new(AtomicUsize::new(0));
        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(drain(out, "stdout", lines.clone())));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(drain(err, "stderr", lines.clone())));

        let waited = tokio::time::timeout(settings.timeout, child.wait()).await;
        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => {
                stop_draining([&stdout, &stderr]);
                return Err(GenerationError::Wait(err));
            }
            Err(_) => {
                dq_warn!("Generator exceeded {:?}, killing it", settings.timeout);
                let _ = child.kill().await;
                stop_draining([&stdout, &stderr]);
                return Err(GenerationError::Timeout(settings.timeout));
            }
        };

        let grace = settings
            .timeout
            .saturating_sub(started.elapsed())
            .min(DRAIN_GRACE);
        let drain_deadline = tokio::time::Instant::now() + grace;
        for mut handle in [stdout, stderr].into_iter().flatten() {
            if tokio::time::timeout_at(drain_deadline, &mut handle).await.is_err() {
                dq_debug!("Generator output still open after exit, no longer reading it");
                handle.abort();
            }
        }
        let output_lines = lines.load(Ordering::Relaxed);

        if !status.success() {
            return Err(match status.code() {
                Some(code) => GenerationError::ExitStatus { code },
                None => GenerationError::Terminated,
            });
        }

        if let Some(expected) = &settings.expected_output {
            let path = settings.working_dir.join(expected);
            if !path.is_file() {
                return Err(GenerationError::MissingOutput(path));
            }
        }

        let elapsed = started.elapsed();
        dq_info!("Generator finished in {:?} ({} output lines)", elapsed, output_lines);
        Ok(GenerationReport {
            output_lines,
            elapsed,
        })
    }
}

fn stop_draining(handles: [&Option<JoinHandle<()>>; 2]) {
    for handle in handles.into_iter().flatten() {
        handle.abort();
    }
}

async fn drain<R>(reader: R, stream: &'static str, count: Arc<AtomicUsize>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LOGGED_LINE));
    while let Some(line) = lines.next().await {
        match line {
            Ok(line) => {
                count.fetch_add(1, Ordering::Relaxed);
                dq_debug!("generator {}: {}", stream, line);
            }
            Err(err) => {
                dq_debug!("generator {} no longer line-readable: {}", stream, err);
                let mut rest = lines.into_inner();
                let _ = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await;
                break;
            }
        }
    }
}
