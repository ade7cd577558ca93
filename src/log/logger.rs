use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver, TrySendError},
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

/// Flush to disk every 50 lines when debugging, so a crash still leaves the tail on disk.
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 50;

#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 500;

const DEFAULT_APP_NAME: &str = "rustycall";
const LOGGING_SECTION: &str = "Logging";

/// Bounded, non-blocking logger writing to a per-process file.
///
/// Producers enqueue through a [`LoggerHandle`]; a background thread owns the
/// file. Warn/Error lines plus one in `sample_every` of the rest are also
/// forwarded to a small UI queue read with [`Logger::try_recv_ui`].
pub struct Logger {
    handle: LoggerHandle,
    ui_log_rx: Receiver<String>,
    _thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Starts the logger using the `[Logging]` section of `config`
    /// (`log_filename`, `log_path`). Without a path, logs go to `logs/`
    /// next to the executable.
    #[must_use]
    pub fn start(config: &Config, cap: usize, ui_cap: usize, sample_every: u32) -> Self {
        let app_name = config.get_non_empty_or_default(LOGGING_SECTION, "log_filename", DEFAULT_APP_NAME);
        let dir = config
            .get_non_empty(LOGGING_SECTION, "log_path")
            .map_or_else(|| exe_dir_fallback_cwd().join("logs"), expand_path);
        Self::start_in_dir(dir, app_name, cap, ui_cap, sample_every)
    }

    /// Starts the logger in `dir`, creating it if missing.
    ///
    /// * `cap` - capacity of the main queue; lines beyond it are dropped.
    /// * `ui_cap` - capacity of the UI tail queue.
    /// * `sample_every` - forward 1 out of N Trace..Info lines to the UI.
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: &str,
        cap: usize,
        ui_cap: usize,
        sample_every: u32,
    ) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);
        let sample_every = sample_every.max(1);

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let file_path = dir.join(format!("{app_name}-{secs}-pid{}.log", std::process::id()));

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap);
        let (ui_tx, ui_rx) = mpsc::sync_channel::<String>(ui_cap);

        let worker_path = file_path.clone();
        let _thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || {
                let writer: Box<dyn Write + Send> = match OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&worker_path)
                {
                    Ok(f) => Box::new(f),
                    Err(_) => Box::new(io::sink()),
                };
                let mut out = BufWriter::new(writer);
                let mut lines_written: u32 = 0;
                let mut sampled: u32 = 0;

                while let Ok(m) = rx.recv() {
                    let _ = writeln!(&mut out, "{}", m.render());
                    lines_written = lines_written.wrapping_add(1);
                    if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) {
                        let _ = out.flush();
                    }

                    let forward = m.level >= LogLevel::Warn || {
                        sampled = sampled.wrapping_add(1);
                        sampled.is_multiple_of(sample_every)
                    };
                    if forward {
                        // UI tail is best effort.
                        let _ = ui_tx.try_send(format!("[{}] {}", m.level, m.text));
                    }
                }

                let _ = out.flush();
            })
            .ok();

        Self {
            handle: LoggerHandle { tx },
            ui_log_rx: ui_rx,
            _thread,
            file_path,
        }
    }

    /// Enqueues a line without blocking; a full queue drops it.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), TrySendError<LogMsg>> {
        self.handle.try_log(level, text, target)
    }

    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    /// Pops one sampled line for the UI, if any.
    #[must_use]
    pub fn try_recv_ui(&self) -> Option<String> {
        self.ui_log_rx.try_recv().ok()
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Expands a leading `~` to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(PathBuf::from);

    match (path_str, home) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") || p.starts_with("~\\") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}
