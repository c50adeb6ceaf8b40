use std::env::{self, VarError};
use std::fmt::Display;
use std::io::stdout;

use crossterm::style::{Color, Stylize};
use crossterm::tty::IsTty;

use rcvscan::DumpsysReceivers;

pub(crate) fn no_color_set() -> bool {
    match env::var("NO_COLOR") {
        Err(VarError::NotPresent) => false,
        _ => true,
    }
}

/// Prints the results of a receiver check to stdout
pub struct Printer {
    style_enabled: bool,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            style_enabled: stdout().is_tty() && !no_color_set(),
        }
    }

    fn println_colored(&self, content: impl Display, color: Color, bold: bool) {
        if !self.style_enabled {
            println!("{}", content);
            return;
        }
        let styled = content.to_string().with(color);
        if bold {
            println!("{}", styled.bold());
        } else {
            println!("{}", styled);
        }
    }

    pub fn print_report(&self, module: &DumpsysReceivers) {
        for finding in module.findings() {
            self.println_colored(finding.message(), Color::Yellow, false);
        }

        for det in module.detected() {
            let ioc = det.receiver.matched_indicator.as_ref();
            self.println_colored(
                format!(
                    "DETECTED: {} registered for {} matches {}",
                    det.receiver.receiver,
                    det.intent,
                    ioc.map(|it| it.name.as_str()).unwrap_or("?"),
                ),
                Color::Red,
                true,
            );
        }

        let receivers: usize = module.results().values().map(|it| it.len()).sum();
        println!(
            "{} intents, {} receivers, {} findings, {} detections",
            module.results().len(),
            receivers,
            module.findings().len(),
            module.detected().len()
        );
    }
}
