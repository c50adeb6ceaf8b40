use std::io;

use lazy_static::lazy_static;
use regex::Regex;

use crate::command::{run_cmd, CmdOutput};
use crate::config::{AdbConfig, ProjectConfig};
use crate::Context;

lazy_static! {
    static ref DEVICE_NOT_FOUND: Regex =
        Regex::new(r"device\s+'([^']+)'\s+not\s+found").expect("invalid regex");
}

/// The Adb trait abstracts the few `adb` commands needed to pull diagnostic
/// output off of a device
pub trait Adb: Send + Sync {
    /// Serials of all attached devices (similar to `adb devices -l`)
    fn get_connected_devices(&self) -> crate::Result<Vec<String>>;

    /// Essentially the same as running `adb shell '...'`
    fn shell(&self, shell_cmd: &str) -> io::Result<CmdOutput>;

    /// Make sure there is a device to talk to
    fn connect(&self) -> crate::Result<()> {
        let devices = self.get_connected_devices()?;
        log::debug!("adb devices: {}", devices.join(", "));
        Ok(())
    }

    /// Nothing is held open between commands, this only exists to pair with
    /// [Adb::connect]
    fn disconnect(&self) {
        log::trace!("adb disconnect");
    }

    /// Output of `dumpsys <service>` on the device
    fn dumpsys(&self, service: &str) -> crate::Result<String> {
        let cmd = format!("dumpsys {}", service);
        let output = self.shell(&cmd)?;
        if !output.ok() {
            let stderr = output.stderr_utf8_lossy();
            if let Some(err) = adb_stderr_error(&stderr) {
                return Err(err);
            }
        }
        let output = output.err_on_status()?;
        Ok(output.stdout_utf8_lossy().into_owned())
    }
}

/// Map the errors `adb` itself prints to stderr
pub fn adb_stderr_error(stderr: &str) -> Option<crate::Error> {
    if stderr.contains("no devices/emulators") {
        return Some(crate::Error::NoAdbDevice);
    }
    let caps = DEVICE_NOT_FOUND.captures(stderr)?;
    let serial = caps
        .get(1)
        .map(|m| String::from(m.as_str()))
        .unwrap_or_else(|| "?".into());
    Some(crate::Error::AdbDeviceNotFound(serial))
}

#[derive(Clone, Debug)]
/// An `Adb` implementation that just invokes the external `adb` command.
pub struct ExecAdb {
    bin: String,
    serial: Option<String>,
}

impl ExecAdb {
    /// Creates a new `ExecAdb` from the given context.
    ///
    /// The project config is checked first:
    ///
    /// [adb]
    /// serial = "..."
    /// executable = "..."
    ///
    /// Anything missing there is pulled from the environment. If the config
    /// sets `can-adb = false` this function fails.
    pub fn new(ctx: &dyn Context) -> crate::Result<Self> {
        match ctx.get_project_config()? {
            Some(cfg) => Self::try_from_project_config(ctx, cfg),
            None => Self::from_env(ctx),
        }
    }

    pub fn from_env(ctx: &dyn Context) -> crate::Result<Self> {
        let bin = ctx.get_bin("adb")?;
        let serial = ctx.maybe_get_env("ANDROID_SERIAL");

        Ok(Self { bin, serial })
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    pub fn with_serial(mut self, serial: String) -> Self {
        self.serial = Some(serial);
        self
    }

    fn try_from_project_config(ctx: &dyn Context, cfg: &ProjectConfig) -> crate::Result<Self> {
        if !cfg.can_adb {
            return Err(crate::Error::AdbDisabled);
        }
        Self::try_from_adb_config(ctx, &cfg.adb)
    }

    pub fn try_from_adb_config(ctx: &dyn Context, cfg: &AdbConfig) -> crate::Result<Self> {
        let bin = cfg.get_executable(ctx)?.into_owned();
        let serial = cfg.get_serial(ctx).map(|it| it.into_owned());
        Ok(Self { bin, serial })
    }
}

macro_rules! adb_cmd {
    ($adb:ident, $cmd:literal, $($args:expr),*) => {
        if let Some(ref serial) = $adb.serial {
            run_cmd(&$adb.bin, &["-s", serial, $cmd, $($args),*])
        } else {
            run_cmd(&$adb.bin, &[$cmd, $($args),*])
        }
    }
}

/// Pull the serials out of `adb devices -l` output
pub(crate) fn parse_devices_output(output: &str) -> Vec<String> {
    output
        .split('\n')
        // Skip the `List of devices attached` header
        .skip(1)
        .filter(|l| !l.is_empty() && l.contains("device"))
        .filter_map(|l| l.split_ascii_whitespace().next())
        .map(String::from)
        .collect()
}

impl Adb for ExecAdb {
    fn get_connected_devices(&self) -> crate::Result<Vec<String>> {
        let output = run_cmd(&self.bin, &["devices", "-l"])?.err_on_status()?;
        let device_list = parse_devices_output(&output.stdout_utf8_lossy());

        if device_list.is_empty() {
            return Err(crate::Error::NoAdbDevice);
        }

        Ok(device_list)
    }

    fn connect(&self) -> crate::Result<()> {
        let devices = self.get_connected_devices()?;
        match &self.serial {
            Some(serial) if !devices.iter().any(|it| it == serial) => {
                Err(crate::Error::AdbDeviceNotFound(serial.clone()))
            }
            Some(serial) => {
                log::info!("using adb device {}", serial);
                Ok(())
            }
            // adb itself complains if more than one is attached
            None => {
                if let Some(first) = devices.first() {
                    log::info!("using adb device {}", first);
                }
                Ok(())
            }
        }
    }

    fn shell(&self, shell_cmd: &str) -> io::Result<CmdOutput> {
        adb_cmd!(self, "shell", shell_cmd)
    }
}
