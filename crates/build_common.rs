// Shared build script helpers: render a crate README into rustdoc.
// Include this in build.rs files with: include!("../build_common.rs");
//
// Required imports in the including file:
//   use std::env;
//   use std::fs;
//   use std::path::Path;

/// Copy the crate's README.md into `OUT_DIR/README_GENERATED.md` so that
/// `lib.rs` can pull it in with `include_str!`.
///
/// Links of the form `](src/foo.rs)` become `](foo)` so rustdoc resolves them
/// as module paths. A crate without a README gets a one-line placeholder
/// built from `CARGO_PKG_DESCRIPTION`.
fn render_readme_for_rustdoc(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");

    let readme_path = Path::new(crate_dir).join("README.md");
    let rendered = match fs::read_to_string(&readme_path) {
        Ok(content) => content.replace("](src/", "](").replace(".rs)", ")"),
        Err(_) => env::var("CARGO_PKG_DESCRIPTION").unwrap_or_default(),
    };

    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    let dest_path = Path::new(&out_dir).join("README_GENERATED.md");
    fs::write(dest_path, rendered).expect("OUT_DIR is writable");
}
