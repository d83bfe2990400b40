use std::path::{Path, PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the ffmpeg-backed encoder links against FFmpeg
    if std::env::var_os("CARGO_FEATURE_FFMPEG").is_none() {
        return;
    }

    #[cfg(target_os = "windows")]
    copy_ffmpeg_dlls(Path::new("third_party/ffmpeg/bin"));
}

/// Copy the FFmpeg runtime DLLs next to the built binary and point the linker at them
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn copy_ffmpeg_dlls(ffmpeg_bin: &Path) {
    println!("cargo:rerun-if-changed={}", ffmpeg_bin.display());

    if !ffmpeg_bin.exists() {
        println!(
            "cargo:warning=FFmpeg DLLs not found at {}",
            ffmpeg_bin.display()
        );
        return;
    }

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    // OUT_DIR is target/<profile>/build/<crate>/out
    let target_dir = out_dir
        .ancestors()
        .nth(3)
        .expect("Cannot resolve target dir");

    for entry in std::fs::read_dir(ffmpeg_bin).expect("Cannot read ffmpeg bin dir") {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if !is_required_ffmpeg_dll(&path) {
            continue;
        }

        let dest = target_dir.join(file_name);
        if !dest.exists() || file_modified(&path) > file_modified(&dest) {
            std::fs::copy(&path, &dest)
                .unwrap_or_else(|e| panic!("Failed to copy {:?} → {:?}: {}", path, dest, e));
            println!("cargo:warning=Copied {} to output dir", path.display());
        }
    }

    println!("cargo:rustc-link-search=native={}", ffmpeg_bin.display());
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn file_modified(path: &Path) -> std::time::SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn is_required_ffmpeg_dll(path: &Path) -> bool {
    const REQUIRED_DLL_PREFIXES: &[&str] = &["avcodec-", "avutil-", "swscale-"];

    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    let lower = file_name.to_ascii_lowercase();
    lower.ends_with(".dll") && REQUIRED_DLL_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}
