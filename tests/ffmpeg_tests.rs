#![cfg(unix)]

use bytes::Bytes;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tempfile::{tempdir, TempDir};
use vtx_sniff::config::VtxFfmpegSettings;
use vtx_sniff::runtime::ffmpeg::{Transcode, TranscodeError, TranscodeMode, VtxFfmpegManager};

fn e2e_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// Shell stand-in for ffmpeg; `remux_ok` / `reencode_ok` decide each stage's exit status.
fn write_fake_ffmpeg(dir: &Path, remux_ok: bool, reencode_ok: bool) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
if [ "$1" = "-version" ]; then
  echo "ffmpeg version 6.0-test Copyright (c) 2000-2023"
  exit 0
fi
for out; do :; done
case "$*" in
  *"-c copy"*)
    if [ "{remux}" = "1" ]; then printf remuxed > "$out"; exit 0; fi
    echo "remux unsupported" >&2; exit 1 ;;
  *)
    if [ "{reencode}" = "1" ]; then printf reencoded > "$out"; exit 0; fi
    echo "encoder missing" >&2; exit 2 ;;
esac
"#,
        remux = if remux_ok { 1 } else { 0 },
        reencode = if reencode_ok { 1 } else { 0 },
    );

    let path = dir.join("fake-ffmpeg.sh");
    std::fs::write(&path, script).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
    path
}

fn settings(binary: Option<PathBuf>, work_dir: &Path) -> VtxFfmpegSettings {
    VtxFfmpegSettings {
        binary_path: binary,
        use_system_binary: false,
        execution_timeout_secs: 10,
        max_convert_mb: 60,
        work_dir: work_dir.to_path_buf(),
    }
}

fn manager(remux_ok: bool, reencode_ok: bool) -> (VtxFfmpegManager, TempDir, PathBuf) {
    let temp = tempdir().expect("tempdir");
    let binary = write_fake_ffmpeg(temp.path(), remux_ok, reencode_ok);
    let work_dir = temp.path().join("work");
    let manager = VtxFfmpegManager::new(&settings(Some(binary), &work_dir)).expect("manager");
    (manager, temp, work_dir)
}

fn leftover_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn verifies_binary_banner() {
    let _lock = e2e_lock();
    let (manager, _temp, _work) = manager(true, true);

    assert_eq!(manager.binary().version, "6.0-test");
    assert_eq!(manager.binary().identity, "system-ffmpeg-6.0-test");
}

#[tokio::test]
async fn remux_succeeds_first() {
    let _lock = e2e_lock();
    let (manager, _temp, work_dir) = manager(true, true);

    let out = manager
        .transcode(Bytes::from_static(b"fake mov"))
        .await
        .expect("transcode");

    assert_eq!(out.mode, TranscodeMode::Remux);
    assert_eq!(out.bytes.as_ref(), b"remuxed");
    assert_eq!(leftover_files(&work_dir), 0);
}

#[tokio::test]
async fn remux_failure_falls_back_to_reencode() {
    let _lock = e2e_lock();
    let (manager, _temp, work_dir) = manager(false, true);

    let out = manager
        .transcode(Bytes::from_static(b"fake mov"))
        .await
        .expect("transcode");

    assert_eq!(out.mode, TranscodeMode::Reencode);
    assert_eq!(out.bytes.as_ref(), b"reencoded");
    assert_eq!(leftover_files(&work_dir), 0);
}

#[tokio::test]
async fn both_stages_failing_reports_last_error() {
    let _lock = e2e_lock();
    let (manager, _temp, work_dir) = manager(false, false);

    let err = manager
        .transcode(Bytes::from_static(b"fake mov"))
        .await
        .unwrap_err();

    match err {
        TranscodeError::Failed { code, stderr } => {
            assert_eq!(code, Some(2));
            assert!(stderr.contains("encoder missing"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(leftover_files(&work_dir), 0);
}

#[test]
fn missing_binary_is_an_environment_error() {
    let temp = tempdir().expect("tempdir");

    let missing = settings(Some(temp.path().join("nope")), temp.path());
    assert!(VtxFfmpegManager::new(&missing).is_err());

    let disabled = settings(None, temp.path());
    assert!(VtxFfmpegManager::new(&disabled).is_err());
}
