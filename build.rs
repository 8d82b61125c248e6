fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/util_helpers.c");

    cc::Build::new()
        .file("src/util_helpers.c")
        .compile("util_helpers");
}
