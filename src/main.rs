#[macro_use]
extern crate log;

use std::env::consts::{
    ARCH, DLL_EXTENSION, DLL_PREFIX, DLL_SUFFIX, EXE_EXTENSION, EXE_SUFFIX, FAMILY, OS,
};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Error;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, TermLogger, TerminalMode, WriteLogger,
};

use ninegag_downloader::gag::io::{ConfigManager, Logging, CONFIG_NAME};

use crate::program::Program;

mod program;

/// Log lines written between forced flushes.
const FLUSH_EVERY_LINES: usize = 50;

/// A file writer that buffers log output and flushes it periodically.
struct BufferedFileWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
    line_count: Arc<Mutex<usize>>,
}

impl BufferedFileWriter {
    fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(64 * 1024, file))),
            line_count: Arc::new(Mutex::new(0)),
        })
    }
}

impl Write for BufferedFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire lock"))?;

        let size = writer.write(buf)?;

        if let Ok(mut count) = self.line_count.lock() {
            let lines = buf.iter().filter(|&&b| b == b'\n').count();
            if lines > 0 {
                let before = *count / FLUSH_EVERY_LINES;
                *count += lines;
                if *count / FLUSH_EVERY_LINES != before {
                    writer.flush()?;
                }
            }
        }

        Ok(size)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire lock"))?;
        writer.flush()
    }
}

impl Drop for BufferedFileWriter {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.inner.lock() {
            let _ = writer.flush();
        }
    }
}

fn main() -> Result<(), Error> {
    let config_manager = match ConfigManager::load(CONFIG_NAME) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Failed to load {}: {}. Using default settings.", CONFIG_NAME, e);
            ConfigManager::with_defaults(CONFIG_NAME)
        }
    };

    initialize_logger(&config_manager.config().logging);
    log_system_information();
    if let Some(backup) = config_manager.backup_path() {
        warn!(
            "{} could not be read and was moved to {}; continuing with default settings.",
            CONFIG_NAME,
            backup.display()
        );
    }

    Program::new(config_manager).run()
}

fn terminal_only() {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

/// Initializes the terminal logger and, when enabled, the log file.
fn initialize_logger(logging: &Logging) {
    if !logging.log_to_file {
        terminal_only();
        return;
    }

    let file_level = match logging.level_filter() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}. Logging to file at info level.", e);
            LevelFilter::Info
        }
    };

    let mut config = ConfigBuilder::new();
    config.add_filter_allow_str("ninegag_downloader");

    let buffered_file_writer = match BufferedFileWriter::new(&logging.log_file) {
        Ok(writer) => writer,
        Err(e) => {
            eprintln!(
                "Failed to open {}: {}. Logging will only output to terminal.",
                logging.log_file, e
            );
            terminal_only();
            return;
        }
    };

    if let Err(e) = CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(file_level, config.build(), buffered_file_writer),
    ]) {
        eprintln!("Failed to initialize combined logger: {}. Falling back to terminal-only logging.", e);
        terminal_only();
    }
}

/// Logs important information about the system being used.
fn log_system_information() {
    trace!("Printing system information out into log for debug purposes...");
    trace!("ARCH:           \"{}\"", ARCH);
    trace!("DLL_EXTENSION:  \"{}\"", DLL_EXTENSION);
    trace!("DLL_PREFIX:     \"{}\"", DLL_PREFIX);
    trace!("DLL_SUFFIX:     \"{}\"", DLL_SUFFIX);
    trace!("EXE_EXTENSION:  \"{}\"", EXE_EXTENSION);
    trace!("EXE_SUFFIX:     \"{}\"", EXE_SUFFIX);
    trace!("FAMILY:         \"{}\"", FAMILY);
    trace!("OS:             \"{}\"", OS);
}
