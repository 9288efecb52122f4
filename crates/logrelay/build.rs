// Stamp build provenance for `logrelay version --extended`.
fn main() {
    for (from, to) in [
        ("TARGET", "LOGRELAY_BUILD_TARGET"),
        ("PROFILE", "LOGRELAY_BUILD_PROFILE"),
        ("GIT_HASH", "LOGRELAY_GIT_HASH"),
    ] {
        if let Ok(value) = std::env::var(from) {
            println!("cargo:rustc-env={to}={value}");
        }
        println!("cargo:rerun-if-env-changed={from}");
    }
}
