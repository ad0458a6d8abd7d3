// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

// ESPCAM_BOARD is read with option_env! in src/board.rs, so a change must
// trigger a rebuild of this crate.

fn main() {
    println!("cargo:rerun-if-env-changed=ESPCAM_BOARD");
}
