//! Puts `memory.x` on the linker search path and links the range-processing
//! accelerator library.
//!
//! Set `RANGEPROC_LIB_DIR` to the directory holding `librangeproc.a`.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::copy("memory.x", out.join("memory.x")).expect("copy memory.x");
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");

    println!("cargo:rerun-if-env-changed=RANGEPROC_LIB_DIR");
    if let Some(dir) = env::var_os("RANGEPROC_LIB_DIR") {
        println!("cargo:rustc-link-search={}", PathBuf::from(dir).display());
    }
    println!("cargo:rustc-link-lib=static=rangeproc");
}
