//! Build script for kmon-core
//!
//! This script checks build requirements before compilation:
//! - Minimum Rust version (inline `asm!` and `u64::div_ceil` need 1.73.0)
//! - Architecture support for live backtraces
//!
//! ## Requirements
//!
//! - **Rust**: 1.73.0 or newer
//! - **Architectures**: x86, x86_64 and aarch64 read the frame-pointer
//!   register; other targets build but only walk recorded stacks

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    // Check minimum Rust version
    match rustc_version::version() {
        Ok(rustc_version) => {
            let min_rust_version = rustc_version::Version::new(1, 73, 0);
            if rustc_version < min_rust_version {
                panic!(
                    "kmon-core requires Rust {} or newer, found {}",
                    min_rust_version, rustc_version
                );
            }
        }
        // If we can't get version (e.g., in some build environments), just warn
        Err(_) => println!("cargo:warning=could not verify Rust version"),
    }

    check_target_arch();
}

fn check_target_arch()
{
    // Cargo describes the target, not the host, through this variable
    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    if !matches!(arch.as_str(), "x86" | "x86_64" | "aarch64") {
        println!("cargo:warning=kmon-core: live backtraces are not supported on {arch}; only recorded stacks can be walked");
    }
}
