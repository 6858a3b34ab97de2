// Build script for locating the Embree library.
//
// Only does anything when the `embree` feature is enabled; the extern block
// in src/embree.rs names the library itself (embree4).
//
// Install via: vcpkg install embree:x64-windows, or a system package, or
// point EMBREE_DIR at an Embree 4 install prefix.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=EMBREE_DIR");

    if std::env::var_os("CARGO_FEATURE_EMBREE").is_none() {
        return;
    }

    if let Ok(embree_dir) = std::env::var("EMBREE_DIR") {
        println!("cargo:rustc-link-search=native={}/lib", embree_dir);
    } else if let Ok(vcpkg_root) = std::env::var("VCPKG_ROOT") {
        let lib_path = format!("{}\\installed\\x64-windows\\lib", vcpkg_root);
        println!("cargo:rustc-link-search=native={}", lib_path);
    }
}
