use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => String::from_utf8(output.stdout)
            .ok()
            .map(|s| s.trim().to_string()),
        _ => None,
    }
}

fn report_build_profile() {
    println!(
        "cargo:rustc-env=BUILD_PROFILE={}",
        env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string())
    );
}

fn report_repository_version() {
    let version = match env::var("CI_BUILD_REF") {
        Ok(val) if !val.is_empty() => val,
        _ => command_output("git", &["describe", "--always", "--dirty", "--long", "--tags"])
            .or_else(|| command_output("git", &["rev-parse", "--short", "HEAD"]))
            .unwrap_or_else(|| {
                env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string())
            }),
    };

    println!("cargo:rustc-env=REPO_VERSION={}", version);
}

fn report_build_timestamp() {
    let timestamp = chrono::Utc::now().to_rfc3339();
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", timestamp);
}

fn report_rust_version() {
    let rust_version =
        command_output("rustc", &["--version"]).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=RUST_VERSION={}", rust_version);
}

fn report_target_info() {
    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_else(|_| "unknown".to_string())
    );
}

fn find_lock_file() -> Option<PathBuf> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").ok()?);
    manifest_dir
        .ancestors()
        .map(|dir| dir.join("Cargo.lock"))
        .find(|path| path.exists())
}

fn locked_version(lock_file: &Path, package: &str) -> Option<String> {
    let lock: toml::Table = toml::from_str(&std::fs::read_to_string(lock_file).ok()?).ok()?;
    lock.get("package")?
        .as_array()?
        .iter()
        .find(|p| p.get("name").and_then(|n| n.as_str()) == Some(package))?
        .get("version")?
        .as_str()
        .map(str::to_string)
}

fn report_age_version() {
    let lock_file = find_lock_file();
    if let Some(path) = &lock_file {
        println!("cargo:rerun-if-changed={}", path.display());
    }
    let version = lock_file
        .and_then(|path| locked_version(&path, "age"))
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=AGE_VERSION={}", version);
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");

    report_build_profile();
    report_repository_version();
    report_build_timestamp();
    report_rust_version();
    report_target_info();
    report_age_version();
}
