use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::utils::ensure_dir_exists;
use crate::DumpsysReceivers;

pub const RESULTS_FILE: &'static str = "dumpsys_receivers.json";
pub const DETECTED_FILE: &'static str = "dumpsys_receivers_detected.json";

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> crate::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write the parsed receivers, and the detections if there are any, to
/// `dir`. Returns the files that were written.
pub fn save_results(dir: &Path, module: &DumpsysReceivers) -> crate::Result<Vec<PathBuf>> {
    ensure_dir_exists(dir)?;
    let mut written = Vec::with_capacity(2);

    let results = dir.join(RESULTS_FILE);
    write_json(&results, module.results())?;
    log::info!("saved receivers to {}", results.to_string_lossy());
    written.push(results);

    if !module.detected().is_empty() {
        let detected = dir.join(DETECTED_FILE);
        write_json(&detected, module.detected())?;
        log::info!(
            "saved {} detections to {}",
            module.detected().len(),
            detected.to_string_lossy()
        );
        written.push(detected);
    }

    Ok(written)
}
