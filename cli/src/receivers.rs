use std::io::{stdout, Write};
use std::path::PathBuf;

use anyhow::Context as AnyhowContext;
use clap::{self, Args};

use rcvscan::adb::ExecAdb;
use rcvscan::output::save_results;
use rcvscan::{Context, DumpsysReceivers, Indicators, MatchMode};

use crate::parsers::ExistingFileValueParser;
use crate::printer::Printer;

/// Options shared by every receiver check
#[derive(Args)]
pub struct ScanArgs {
    /// STIX2 indicator file to check receiver packages against, can be given
    /// multiple times. Added to the `iocs` from the config file
    #[arg(short = 'i', long = "iocs", value_parser = ExistingFileValueParser)]
    iocs: Vec<PathBuf>,

    /// Directory to write the JSON results to
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Check every receiver of an intent instead of only the last one listed
    #[arg(long, action = clap::ArgAction::SetTrue, default_value_t = false)]
    every_receiver: bool,

    /// Only check the last receiver listed for an intent, even if the config
    /// file sets `check-every-receiver`
    #[arg(
        long,
        action = clap::ArgAction::SetTrue,
        default_value_t = false,
        conflicts_with = "every_receiver"
    )]
    last_receiver: bool,

    /// Print the detections as JSON instead of text
    #[arg(long, action = clap::ArgAction::SetTrue, default_value_t = false)]
    json: bool,
}

#[derive(Args)]
pub struct CheckAdb {
    /// Serial of the device to use, overrides the config and `ANDROID_SERIAL`
    #[arg(long)]
    serial: Option<String>,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(Args)]
pub struct CheckFile {
    /// File holding the output of `adb shell dumpsys package`
    #[arg(value_parser = ExistingFileValueParser)]
    dumpsys: PathBuf,

    #[command(flatten)]
    scan: ScanArgs,
}

impl CheckAdb {
    pub fn output_dir(&self) -> Option<&PathBuf> {
        self.scan.output.as_ref()
    }

    pub fn run(&self, ctx: &dyn Context) -> anyhow::Result<()> {
        let mut adb = ExecAdb::new(ctx).context("setting up adb")?;
        if let Some(serial) = &self.serial {
            adb = adb.with_serial(serial.clone());
        }

        let mut module = self.scan.new_module(ctx)?;
        module
            .run(&adb)
            .context("getting receivers from the device")?;
        self.scan.check(ctx, &mut module)
    }
}

impl CheckFile {
    pub fn output_dir(&self) -> Option<&PathBuf> {
        self.scan.output.as_ref()
    }

    pub fn run(&self, ctx: &dyn Context) -> anyhow::Result<()> {
        let mut module = self.scan.new_module(ctx)?;
        module
            .run_from_file(&self.dumpsys)
            .with_context(|| format!("parsing {}", self.dumpsys.to_string_lossy()))?;
        self.scan.check(ctx, &mut module)
    }
}

impl ScanArgs {
    /// Mode picked on the command line, if any
    fn mode_flag(&self) -> Option<MatchMode> {
        if self.every_receiver {
            Some(MatchMode::EveryReceiver)
        } else if self.last_receiver {
            Some(MatchMode::LastReceiver)
        } else {
            None
        }
    }

    fn mode(&self, ctx: &dyn Context) -> anyhow::Result<MatchMode> {
        if let Some(mode) = self.mode_flag() {
            return Ok(mode);
        }

        let every = ctx
            .get_project_config()
            .context("loading project config")?
            .map(|it| it.receivers.check_every_receiver)
            .unwrap_or(false);

        Ok(if every {
            MatchMode::EveryReceiver
        } else {
            MatchMode::LastReceiver
        })
    }

    fn new_module(&self, ctx: &dyn Context) -> anyhow::Result<DumpsysReceivers> {
        Ok(DumpsysReceivers::new().with_mode(self.mode(ctx)?))
    }

    fn load_indicators(&self, ctx: &dyn Context) -> anyhow::Result<Indicators> {
        let mut files = match ctx.get_project_config().context("loading project config")? {
            Some(cfg) => cfg.receivers.iocs.clone(),
            None => Vec::new(),
        };
        files.extend(self.iocs.iter().cloned());

        let mut iocs = Indicators::new();
        for f in &files {
            iocs.load_stix2(f)
                .with_context(|| format!("loading indicators from {}", f.to_string_lossy()))?;
        }
        if files.is_empty() {
            log::warn!("no indicator files given, receivers will only be listed");
        } else {
            log::info!(
                "loaded {} app id indicators from {} files",
                iocs.total_app_ids(),
                files.len()
            );
        }
        Ok(iocs)
    }

    fn check(&self, ctx: &dyn Context, module: &mut DumpsysReceivers) -> anyhow::Result<()> {
        let iocs = self.load_indicators(ctx)?;
        module
            .check_indicators(&iocs)
            .context("checking receivers against indicators")?;

        if self.json {
            let mut out = stdout();
            serde_json::to_writer_pretty(&mut out, module.detected())?;
            writeln!(out)?;
        } else {
            Printer::new().print_report(module);
        }

        if let Some(dir) = &self.output {
            save_results(dir, module)
                .with_context(|| format!("saving results to {}", dir.to_string_lossy()))?;
        }
        Ok(())
    }
}
