use std::env;
use std::fs;
use std::path::{Path, PathBuf};

// Embeds the prebuilt libraries for the compile target into the crate.
//
// The bundle directory holds `native/<os>-<arch>/lib<name>.<ext>` files, as
// produced by `turnkey bundle`. Only the target's own directory is embedded.
fn main() {
    println!("cargo:rerun-if-env-changed=SOLVER_TURNKEY_NATIVE_DIR");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let bundle_root = env::var_os("SOLVER_TURNKEY_NATIVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| manifest_dir.clone());
    let native_root = bundle_root.join("native");
    println!("cargo:rerun-if-changed={}", native_root.display());

    let entries = match target_directory() {
        Some(dir_name) => collect_libraries(&native_root, &dir_name),
        None => Vec::new(),
    };

    let mut generated = String::from(
        "/// Embedded native libraries as `(resource path, bytes)`.\n\
         pub static EMBEDDED_NATIVES: &[(&str, &[u8])] = &[\n",
    );
    for (resource, file) in &entries {
        println!("cargo:rerun-if-changed={}", file.display());
        generated.push_str(&format!(
            "    ({:?}, include_bytes!({:?}) as &[u8]),\n",
            resource,
            file.display().to_string()
        ));
    }
    generated.push_str("];\n");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("embedded_natives.rs"), generated)
        .expect("failed to write embedded_natives.rs");
}

/// The `<os>-<arch>` directory for the compile target, if it is supported.
fn target_directory() -> Option<String> {
    let os = match env::var("CARGO_CFG_TARGET_OS").ok()?.as_str() {
        "macos" => "osx",
        "linux" => "linux",
        "windows" => "windows",
        _ => return None,
    };
    let arch = match env::var("CARGO_CFG_TARGET_ARCH").ok()?.as_str() {
        "x86" => "x86",
        "x86_64" => "amd64",
        "aarch64" => "aarch64",
        _ => return None,
    };
    Some(format!("{os}-{arch}"))
}

fn collect_libraries(native_root: &Path, dir_name: &str) -> Vec<(String, PathBuf)> {
    let dir = native_root.join(dir_name);
    let Ok(read_dir) = fs::read_dir(&dir) else {
        return Vec::new();
    };

    let mut entries: Vec<(String, PathBuf)> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let file_name = path.file_name()?.to_str()?.to_string();
            if !file_name.starts_with("lib") {
                return None;
            }
            let absolute = fs::canonicalize(&path).ok()?;
            Some((format!("/native/{dir_name}/{file_name}"), absolute))
        })
        .collect();

    entries.sort();
    entries
}
