use std::borrow::Cow;
use std::{
    env,
    fs::File,
    io::{self, Write},
    path::Path,
    process::Command,
};

fn main() {
    match write_version_file() {
        Ok(_) => {}
        Err(e) => panic!("Failed to create a version file: {:?}", e),
    }
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=RCVSCAN_GIT_REVISION");
}

fn out_file(name: &str) -> io::Result<File> {
    let out_dir = env::var("OUT_DIR").map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
    File::create(Path::new(&out_dir).join(name))
}

fn write_version_file() -> io::Result<()> {
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());
    let mut simple_version_file = out_file("simple_version_string")?;
    write!(&mut simple_version_file, "\"{}\"", version)?;

    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".into());
    let git_rev = match get_git_rev() {
        Ok(v) if !v.trim().is_empty() => Cow::Owned(v),
        _ => Cow::Borrowed("unknown"),
    };
    let mut version_file = out_file("version_string")?;
    write!(
        &mut version_file,
        "r#\"{} ({})\nrev {}\"#",
        version,
        target,
        git_rev.trim(),
    )?;
    Ok(())
}

fn get_git_rev() -> io::Result<String> {
    if let Ok(rev) = env::var("RCVSCAN_GIT_REVISION") {
        return Ok(rev);
    }
    let out = Command::new("git").arg("rev-parse").arg("HEAD").output()?;
    if !out.status.success() {
        return Err(io::Error::new(io::ErrorKind::Other, "git rev-parse failed"));
    }
    String::from_utf8(out.stdout).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "git rev-parse HEAD output was not UTF-8",
        )
    })
}
