use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("version.rs");

    let pkg_version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
    let git_hash = git(&["rev-parse", "--short", "HEAD"]);
    let release = describe_release(&pkg_version, git_hash.as_deref());
    let build_time = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let version_code = format!(
        r#"
/// Release string: a tag when built from one, otherwise the crate version plus commit
pub const RELEASE: &str = "{release}";

/// Short commit the binary was built from
pub const COMMIT: &str = "{commit}";

/// When the binary was built
pub const BUILT_AT: &str = "{build_time}";
"#,
        commit = git_hash.as_deref().unwrap_or("unknown"),
    );

    fs::write(&dest_path, version_code).unwrap();

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
}

/// Runs git and returns its trimmed stdout, or `None` outside a checkout.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

fn describe_release(pkg_version: &str, git_hash: Option<&str>) -> String {
    match git(&["describe", "--tags", "--dirty", "--always"]) {
        // A bare hash means no tag is reachable
        Some(described) if described.starts_with('v') || described.contains('-') => described,
        _ => match git_hash {
            Some(hash) => format!("{pkg_version}-g{hash}"),
            None => pkg_version.to_string(),
        },
    }
}
