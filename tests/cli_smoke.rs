use std::path::PathBuf;

const DOC: &str = "\
```scene
kind: text
duration: 2
content: smoke test
```
";

fn bin_path() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_scenemark")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "scenemark.exe"
            } else {
                "scenemark"
            });
            p
        })
}

#[test]
fn cli_frame_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let doc_path = dir.join("doc.md");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);
    std::fs::write(&doc_path, DOC).unwrap();

    let doc_arg = doc_path.to_string_lossy().to_string();
    let out_arg = out_path.to_string_lossy().to_string();

    let status = std::process::Command::new(bin_path())
        .args([
            "frame",
            "--in",
            doc_arg.as_str(),
            "--time",
            "0.5",
            "--width",
            "64",
            "--height",
            "48",
            "--out",
        ])
        .arg(out_arg.as_str())
        .status()
        .unwrap();

    assert!(status.success());
    assert!(out_path.exists());
}

#[test]
fn cli_check_prints_timeline_json() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let doc_path = dir.join("check.md");
    std::fs::write(&doc_path, DOC).unwrap();

    let output = std::process::Command::new(bin_path())
        .args(["check", "--in", doc_path.to_string_lossy().as_ref()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let timeline: scenemark::Timeline = serde_json::from_str(&stdout).unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.total_duration(), 2.0);
}
