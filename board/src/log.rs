use std::{
    fs::File,
    io::Write,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use conquer_once::spin::OnceCell;
use crossbeam_queue::{ArrayQueue, PushError};
use log::{Level, LevelFilter, Log};
use spin::Mutex;

static LOGGER: OnceCell<Logger> = OnceCell::uninit();

/// A log file and the most verbose level written to it.
pub struct FileSink {
    pub file: File,
    pub max_level: LevelFilter,
}

/// Initialize the `log` crate backend.
///
/// Must be called **exactly once**, before the board is brought up.
pub fn init(stderr_max_level: LevelFilter, file: Option<FileSink>, capacity: usize) {
    let logger = LOGGER.get_or_init(|| Logger::new(stderr_max_level, file, capacity));

    log::set_logger(logger).expect("`board::log::init()` called more than once");
    log::set_max_level(logger.max_level());
}

/// Sets whether or not to write log messages out as soon as they are logged.
pub fn set_auto_flush(auto_flush: bool) {
    if let Some(logger) = LOGGER.get() {
        logger.auto_flush.store(auto_flush, Ordering::Release);
    }
}

/// Acts as a backend for the `log` crate. Sends logs to stderr and/or to a log file.
///
/// Records are queued and written out on flush, so a burst of logging during bring-up does not
/// interleave with partially written lines.
struct Logger {
    stderr_max_level: LevelFilter,
    file_max_level: LevelFilter,
    file: Option<Mutex<File>>,

    auto_flush: AtomicBool,

    log_queue: ArrayQueue<(String, Level)>,
    /// Records lost because the queue was full even after a flush
    dropped: AtomicUsize,
}

impl Logger {
    fn new(stderr_max_level: LevelFilter, file: Option<FileSink>, capacity: usize) -> Self {
        let (file_max_level, file) = match file {
            Some(sink) => (sink.max_level, Some(Mutex::new(sink.file))),
            None => (LevelFilter::Off, None),
        };
        Logger {
            stderr_max_level,
            file_max_level,
            file,

            auto_flush: AtomicBool::new(true),

            log_queue: ArrayQueue::new(capacity),
            dropped: AtomicUsize::new(0),
        }
    }

    fn max_level(&self) -> LevelFilter {
        self.stderr_max_level.max(self.file_max_level)
    }

    fn write_line(&self, file: Option<&mut File>, line: &str, level: Level) {
        if level <= self.stderr_max_level {
            eprintln!("{}", line);
        }
        if let Some(file) = file {
            if level <= self.file_max_level {
                let _ = writeln!(file, "{}", line);
            }
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.stderr_max_level || metadata.level() <= self.file_max_level
    }
    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let message = format!(
                "[{}] {} - {}",
                record.level(),
                record.metadata().target(),
                record.args()
            );
            if let Err(PushError(record)) = self.log_queue.push((message, record.level())) {
                self.flush();
                // Another thread may have refilled the queue; drop the record rather than spin.
                if self.log_queue.push(record).is_err() {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        if self.auto_flush.load(Ordering::Acquire) {
            self.flush();
        }
    }
    fn flush(&self) {
        let mut file = self.file.as_ref().map(|f| f.lock());
        while let Ok((record, level)) = self.log_queue.pop() {
            self.write_line(file.as_deref_mut(), &record, level);
        }
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            let marker = format!("[WARN] {} - {dropped} log records dropped", module_path!());
            self.write_line(file.as_deref_mut(), &marker, Level::Warn);
        }
        if let Some(file) = file.as_mut() {
            let _ = file.flush();
        }
    }
}

pub fn flush() {
    ::log::logger().flush();
}
