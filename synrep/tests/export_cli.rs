use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Context as _;

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn export(out_dir: &Path, extra: &[&str]) -> anyhow::Result<Output> {
    export_with_config(&fixture("metrics.yaml"), out_dir, extra)
}

fn export_with_config(config: &Path, out_dir: &Path, extra: &[&str]) -> anyhow::Result<Output> {
    let exe = env!("CARGO_BIN_EXE_synrep");
    Command::new(exe)
        .arg("export")
        .arg("--config")
        .arg(config)
        .arg("--out-dir")
        .arg(out_dir)
        .arg("--output")
        .arg("json")
        .args(extra)
        .env_remove("RUST_LOG")
        .env_remove("SYNREP_CONFIG")
        .output()
        .context("run synrep binary")
}

fn ensure_code(out: &Output, expected: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        status_code(out.status) == expected,
        "expected exit code {expected}, got {}\nstdout:\n{}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

fn summary_line(out: &Output) -> anyhow::Result<serde_json::Value> {
    let stdout = String::from_utf8(out.stdout.clone()).context("stdout is utf-8")?;
    let line = stdout.lines().last().context("no summary line")?;
    serde_json::from_str(line).context("parse summary line")
}

fn written_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).context("read out dir")? {
        files.push(entry?.path());
    }
    Ok(files)
}

#[test]
fn raw_export_writes_bom_prefixed_csv() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let out_dir = tmp.path().join("reports");
    let input = fixture("dataset.json");

    let out = export(
        &out_dir,
        &[
            "--input",
            &input.to_string_lossy(),
            "--start",
            "20240101",
            "--end",
            "20240107",
        ],
    )?;
    ensure_code(&out, 0)?;

    let summary = summary_line(&out)?;
    assert_eq!(summary["rows"], 3);
    assert_eq!(summary["mode"], "raw");
    assert_eq!(summary["start_utc"], "2023-12-31T15:00:00Z");
    assert_eq!(summary["end_utc"], "2024-01-07T14:59:59Z");

    let files = written_files(&out_dir)?;
    assert_eq!(files.len(), 1);
    let name = files[0]
        .file_name()
        .and_then(|n| n.to_str())
        .context("file name")?;
    assert!(name.starts_with("synthetic_metrics_20240101-20240107_"));
    assert!(name.ends_with(".csv"));

    let bytes = std::fs::read(&files[0])?;
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
    let text = String::from_utf8(bytes[3..].to_vec())?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("モニター名,"));
    assert!(lines[1].contains("可用性"));
    assert!(lines[2].contains("アクション時間（1）,1.5秒基準,"));
    assert!(lines[3].contains("アクション時間（2）,3秒基準,"));
    Ok(())
}

#[test]
fn evaluation_export_in_shift_jis() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = fixture("dataset.json");

    let out = export(
        tmp.path(),
        &[
            "--input",
            &input.to_string_lossy(),
            "--start",
            "20240101",
            "--end",
            "20240101",
            "--output-mode",
            "evaluation",
            "--encoding",
            "sjis",
            "--workers",
            "2",
        ],
    )?;
    ensure_code(&out, 0)?;

    let summary = summary_line(&out)?;
    assert_eq!(summary["rows"], 3);
    assert_eq!(summary["encoding"], "sjis");

    let files = written_files(tmp.path())?;
    assert_eq!(files.len(), 1);
    let bytes = std::fs::read(&files[0])?;
    let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(&bytes);
    assert!(!had_errors);

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("code,corporate,no,code_no,metric_full_name,evaluation"));
    assert!(lines[1].contains("可用性:Availability (%),1,"));
    assert!(lines[2].contains("アクション時間（1）:1.5秒基準,0,"));
    assert!(lines[3].contains("アクション時間（2）:3秒基準,1,"));
    Ok(())
}

#[test]
fn malformed_date_exits_30() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = fixture("dataset.json");

    let out = export(
        tmp.path(),
        &[
            "--input",
            &input.to_string_lossy(),
            "--start",
            "2024-01-01",
            "--end",
            "20240101",
        ],
    )?;
    ensure_code(&out, 30)?;
    assert!(written_files(tmp.path())?.is_empty());
    Ok(())
}

#[test]
fn reversed_range_exits_30() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = fixture("dataset.json");

    let out = export(
        tmp.path(),
        &[
            "--input",
            &input.to_string_lossy(),
            "--start",
            "20240110",
            "--end",
            "20240101",
        ],
    )?;
    ensure_code(&out, 30)
}

#[test]
fn missing_dataset_exits_30() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("nope.json");

    let out = export(
        tmp.path(),
        &[
            "--input",
            &input.to_string_lossy(),
            "--start",
            "20240101",
            "--end",
            "20240101",
        ],
    )?;
    ensure_code(&out, 30)?;
    assert!(String::from_utf8_lossy(&out.stderr).contains("nope.json"));
    Ok(())
}

#[test]
fn empty_dataset_exits_20() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let out_dir = tmp.path().join("reports");
    let input = fixture("empty.json");

    let out = export(
        &out_dir,
        &[
            "--input",
            &input.to_string_lossy(),
            "--start",
            "20240101",
            "--end",
            "20240101",
        ],
    )?;
    ensure_code(&out, 20)?;
    assert!(!out_dir.exists());
    Ok(())
}

#[test]
fn missing_config_falls_back_to_builtin_layout() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = fixture("dataset.json");
    let config = tmp.path().join("absent.yaml");

    let out = export_with_config(
        &config,
        tmp.path(),
        &[
            "--input",
            &input.to_string_lossy(),
            "--start",
            "20240101",
            "--end",
            "20240101",
        ],
    )?;
    ensure_code(&out, 0)?;

    let summary = summary_line(&out)?;
    assert_eq!(summary["rows"], 2);
    let warnings = summary["warnings"].as_array().context("warnings array")?;
    assert!(warnings.iter().any(|w| w["kind"] == "config_missing"));
    Ok(())
}

#[test]
fn unknown_flag_exits_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_synrep");
    let out = Command::new(exe)
        .arg("export")
        .arg("--pivot")
        .output()
        .context("run synrep binary")?;
    ensure_code(&out, 30)
}
