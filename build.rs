use std::process::Command;

fn git_output(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
}

/// `branch hash` (or just `hash` on a detached HEAD), when building
/// from a git checkout.
fn dev_metadata() -> Option<String> {
    let hash = git_output(&["rev-parse", "--short", "HEAD"])?;
    match git_output(&["rev-parse", "--abbrev-ref", "HEAD"]) {
        Some(branch) if branch != "HEAD" => Some(format!("{branch} {hash}")),
        _ => Some(hash),
    }
}

fn main() {
    let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap();

    // ARBOR_VERSION: always clean, used by clap attributes.
    println!("cargo:rustc-env=ARBOR_VERSION={pkg_version}");

    // ARBOR_VERSION_DISPLAY: suffixed with branch/hash on dev builds.
    let display_version = if std::env::var("ARBOR_BUILD_RELEASE").is_ok() {
        pkg_version
    } else {
        match dev_metadata() {
            Some(meta) => format!("{pkg_version} (dev {meta})"),
            None => pkg_version,
        }
    };
    println!("cargo:rustc-env=ARBOR_VERSION_DISPLAY={display_version}");

    // The embedded branch/hash must refresh on checkout or commit even
    // when no tracked source file changed.
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=ARBOR_BUILD_RELEASE");
}
