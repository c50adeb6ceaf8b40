use std::fmt;

use clap::{self, Args};
use rcvscan::adb::{Adb, ExecAdb};
use rcvscan::Context;

#[derive(Args)]
pub struct RunCheck {
    /// Also try to list the devices attached over adb
    #[arg(long, action = clap::ArgAction::SetTrue, default_value_t = false)]
    devices: bool,
}

enum Importance {
    Optional,
    Required,
}

enum Status {
    Missing,
    Exists(String),
}

struct Info {
    name: String,
    status: Status,
    importance: Importance,
}

fn check_bin(ctx: &dyn Context, bin: &str, importance: Importance) -> Info {
    let status = match ctx.maybe_get_bin(bin) {
        None => Status::Missing,
        Some(path) => Status::Exists(path),
    };

    Info {
        name: bin.into(),
        status,
        importance,
    }
}

fn check_env(ctx: &dyn Context, env: &str, importance: Importance) -> Info {
    let status = match ctx.maybe_get_env(env) {
        None => Status::Missing,
        Some(env) => Status::Exists(env),
    };

    Info {
        name: env.into(),
        status,
        importance,
    }
}

#[cfg(feature = "emoji")]
mod status {
    pub const FAIL: &'static str = "💩";
    pub const OK: &'static str = "🚀";
    pub const MEH: &'static str = "😒";
}

#[cfg(not(feature = "emoji"))]
mod status {
    pub const FAIL: &'static str = "Fail";
    pub const OK: &'static str = "Ok";
    pub const MEH: &'static str = "Meh";
}

use status::*;

impl RunCheck {
    pub fn run(&self, ctx: &dyn Context) -> anyhow::Result<()> {
        println!("External programs:");
        #[cfg(feature = "emoji")]
        {
            println!("\n{} = Program present in PATH", OK);
            println!("{} = Required and missing", FAIL);
            println!("{} = Optional and missing\n", MEH);
        }
        println!("{}\n", check_bin(ctx, "adb", Importance::Required));

        println!("Environmental variables:\n");
        println!("{}", check_env(ctx, "ANDROID_SERIAL", Importance::Optional));
        println!(
            "{}\n",
            check_env(ctx, rcvscan::context::CONFIG_ENV, Importance::Optional)
        );

        let cfg_file = ctx.get_project_config_file();
        match ctx.get_project_config() {
            Ok(Some(cfg)) => {
                println!("{} config: {}", OK, cfg.path.to_string_lossy());
                if !cfg.can_adb {
                    println!("{} adb disabled by config", MEH);
                }
                for ioc in &cfg.receivers.iocs {
                    let mark = if ioc.exists() { OK } else { FAIL };
                    println!("{} indicators: {}", mark, ioc.to_string_lossy());
                }
            }
            Ok(None) => println!("{} no config at {}", MEH, cfg_file.to_string_lossy()),
            Err(e) => println!("{} config {}: {}", FAIL, cfg_file.to_string_lossy(), e),
        }

        if self.devices {
            let devices = ExecAdb::new(ctx)
                .and_then(|adb| Ok((adb.get_connected_devices()?, adb.serial().map(String::from))));
            match devices {
                Ok((devs, selected)) => {
                    for d in &devs {
                        let mark = if selected.as_deref() == Some(d.as_str()) {
                            " (selected)"
                        } else {
                            ""
                        };
                        println!("{} device: {}{}", OK, d, mark);
                    }
                    if let Some(serial) = selected.filter(|it| !devs.contains(it)) {
                        println!("{} device {} not attached", FAIL, serial);
                    }
                }
                Err(e) => println!("{} devices: {}", FAIL, e),
            }
        }

        Ok(())
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.status {
            Status::Missing => {
                write!(
                    f,
                    "{}: {}",
                    match self.importance {
                        Importance::Optional => MEH,
                        Importance::Required => FAIL,
                    },
                    self.name
                )
            }
            Status::Exists(path) => {
                write!(f, "{}: {} ({})", OK, self.name, path)
            }
        }
    }
}
