use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::Context as AnyhowContext;
use clap::{Parser, Subcommand};
use flexi_logger::{FileSpec, LevelFilter, LogSpecification, Logger, LoggerHandle, WriteMode};

use rcvscan::DefaultContext;

mod parsers;
mod printer;

mod receivers;
use receivers::{CheckAdb, CheckFile};

mod check;
use check::RunCheck;

const SIMPLE_VERSION_STRING: &'static str =
    include!(concat!(env!("OUT_DIR"), "/simple_version_string"));
const VERSION_STRING: &'static str = include!(concat!(env!("OUT_DIR"), "/version_string"));

#[derive(Parser)]
#[command(name = "rcvscan")]
#[command(version(SIMPLE_VERSION_STRING))]
#[command(long_version(VERSION_STRING))]
struct Cli {
    /// `-e`, `--log-stderr`: Flag value, when enabled will cause logs to be output to `stderr`
    /// instead of a log file. Disabled by default (logs go to a file when one is known)
    #[arg(short = 'e', long, help = "Log to stderr instead of a file", action = clap::ArgAction::SetTrue, default_value_t = false)]
    log_stderr: bool,

    /// `-f`, `--log-file`: Path to desired log output file location. Optional, defaults to
    /// `rcvscan.log` in the `--output` directory of the command
    #[arg(short = 'f', long, help = "Send log output to the given file")]
    log_file: Option<PathBuf>,

    /// `-s`, `--log-spec`: Log specification for [flexi_logger](https://docs.rs/flexi_logger/latest/flexi_logger/struct.LogSpecification.html)
    #[arg(short = 's', long, help = "Log spec for flexi_logger")]
    log_spec: Option<String>,

    /// `-l`, `--log-level`: Set the desired log verbosity. Defaults to 0, all values are listed
    /// below:
    ///
    /// | Value | Log Level |
    /// | ----- | --------- |
    /// | **0** | **Warn** |
    /// | 1 | Info |
    /// | 2 | Debug |
    /// | 3 | Trace |
    #[arg(
        short = 'l',
        long,
        help = "Set the log level, 0 = warn, 1 = info, etc",
        long_help = None,
        default_value_t = 0
    )]
    log_level: u8,

    /// `-c`, `--config`: Project config file. Defaults to `$RCVSCAN_CONFIG` or
    /// `./rcvscan.toml` when that exists
    #[arg(short = 'c', long, help = "Path to the rcvscan.toml config file")]
    config: Option<PathBuf>,

    /// The command being called. See [Commands] for the implemented options
    #[command(subcommand)]
    command: Commands,
}

/// The currently implemented commands
#[derive(Subcommand)]
enum Commands {
    /// Display the full version string and exit
    #[command()]
    Version,

    /// Pull `dumpsys package` from a device over adb and check the receivers
    /// registered for SMS and call related intents
    #[command()]
    CheckAdb(CheckAdb),

    /// Check the receivers in a saved `dumpsys package` output
    #[command()]
    CheckFile(CheckFile),

    /// Check to see if you are able to use `rcvscan`
    #[command()]
    RunCheck(RunCheck),
}

impl Cli {
    fn output_dir(&self) -> Option<&PathBuf> {
        match &self.command {
            Commands::CheckAdb(c) => c.output_dir(),
            Commands::CheckFile(c) => c.output_dir(),
            _ => None,
        }
    }

    fn configure_loggers(&self) -> anyhow::Result<LoggerHandle> {
        let log_spec = match &self.log_spec {
            Some(s) => {
                LogSpecification::parse(s).with_context(|| format!("parsing log spec {}", s))?
            }
            None => {
                if self.log_level > 0 {
                    let lvl = if self.log_level == 1 {
                        LevelFilter::Info
                    } else if self.log_level == 2 {
                        LevelFilter::Debug
                    } else {
                        LevelFilter::Trace
                    };
                    LogSpecification::builder().module("rcvscan", lvl).build()
                } else {
                    LogSpecification::env().with_context(|| "getting log spec from env")?
                }
            }
        };

        let mut logger = Logger::with(log_spec);

        if !self.log_stderr {
            let path = match &self.log_file {
                Some(v) => {
                    if v.is_absolute() {
                        Some(Cow::Borrowed(v))
                    } else {
                        let full_path = std::env::current_dir()?.join(v);
                        Some(Cow::Owned(full_path))
                    }
                }
                None => self.output_dir().map(|it| Cow::Owned(it.join("rcvscan.log"))),
            };

            if let Some(p) = &path {
                logger = logger
                    .log_to_file(
                        FileSpec::try_from(p.as_ref()).with_context(|| "creating filespec")?,
                    )
                    .append()
                    .write_mode(WriteMode::BufferAndFlush);
            }
        }

        Ok(logger.start().with_context(|| "starting logger")?)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = &cli.command {
        println!("{}", VERSION_STRING);
        return Ok(());
    }

    if let Some(dir) = cli.output_dir() {
        rcvscan::utils::ensure_dir_exists(dir)
            .with_context(|| format!("creating output dir {}", dir.to_string_lossy()))?;
    }

    let log_handle = cli.configure_loggers()?;

    let ctx = match &cli.config {
        Some(path) => DefaultContext::new().with_config_file(path.clone()),
        None => DefaultContext::new(),
    };

    let res = match &cli.command {
        Commands::CheckAdb(c) => c.run(&ctx),
        Commands::CheckFile(c) => c.run(&ctx),
        Commands::RunCheck(c) => c.run(&ctx),

        Commands::Version => unreachable!(),
    };

    log_handle.flush();
    res
}
