// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

// The driver is loaded at runtime through libloading, so nothing is linked
// here. ESPCAM_LIBRARY is only read at runtime but is tracked so that
// environment changes show up in `cargo build -vv` output.

fn main() {
    println!("cargo:rerun-if-env-changed=ESPCAM_LIBRARY");
    println!("cargo:rerun-if-changed=src/ffi.rs");
}
