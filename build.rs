fn main() {
    if std::env::var("CARGO_FEATURE_HARDWARE").is_ok() {
        embuild::espidf::sysenv::output();
    }

    if std::env::var("CARGO_FEATURE_VENDOR_ALGO").is_ok() {
        // Find the C++ compiler in the Embuild toolchain directory
        // Typically: .embuild/espressif/tools/riscv32-esp-elf/esp-<VER>/riscv32-esp-elf/bin/riscv32-esp-elf-g++
        let compiler = find_compiler().unwrap_or_else(|| "riscv32-esp-elf-g++".into());
        std::env::set_var("CXX", &compiler); // Helpful for debugging
        build_vendor_algo(&compiler);
    }
}

fn find_compiler() -> Option<std::path::PathBuf> {
    use std::path::PathBuf;
    // Check local .embuild first, then global ~/.espressif
    let search_dirs = vec![
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap()).join(".embuild"),
        dirs::home_dir().map(|h| h.join(".espressif")).unwrap_or_default(),
    ];

    for root in search_dirs {
        let tools_dir = root.join("espressif/tools/riscv32-esp-elf");
        if tools_dir.exists() {
            // Find the versioned directory (e.g., esp-13.2.0_20240530)
            if let Ok(entries) = std::fs::read_dir(&tools_dir) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.is_dir() {
                        let candidate = path.join("riscv32-esp-elf/bin/riscv32-esp-elf-g++");
                        if candidate.exists() {
                            return Some(candidate);
                        }
                    }
                }
            }
        }
    }
    None
}

/// Compile the Maxim reference HR/SpO2 algorithm. The sources are not
/// checked in — drop `spo2_algorithm.{h,cpp}` from the sensor vendor's
/// reference design into `maxim-spo2/` before enabling `vendor-algo`.
fn build_vendor_algo(compiler_path: &std::path::Path) {
    let sdk_root = std::path::PathBuf::from("maxim-spo2");

    cc::Build::new()
        .cpp(true)
        .compiler(compiler_path)
        .flag("-std=c++14")
        .flag("-O2")
        .include(&sdk_root)
        .file(sdk_root.join("spo2_algorithm.cpp"))
        .compile("maxim-spo2");

    println!("cargo:rerun-if-changed=maxim-spo2");
}
