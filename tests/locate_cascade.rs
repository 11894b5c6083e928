//! Integration tests for configuration resolution across user, system and scratch roots.

use progconf::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PROGRAM: &str = "fonts";
const FILE: &str = "fonts.conf";

/// A fake filesystem layout: `etc/`, `tmp/` and `home/` under one temp dir.
struct Layout {
    _dir: TempDir,
    etc: PathBuf,
    tmp: PathBuf,
    home: PathBuf,
}

impl Layout {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let etc = dir.path().join("etc");
        let tmp = dir.path().join("tmp");
        let home = dir.path().join("home");
        for d in [&etc, &tmp, &home] {
            fs::create_dir_all(d).unwrap();
        }
        Self {
            _dir: dir,
            etc,
            tmp,
            home,
        }
    }

    fn locator(&self, env: StaticEnv) -> ConfigLocator {
        ConfigLocator::builder()
            .with_env(env)
            .with_system_root(&self.etc)
            .with_temp_root(&self.tmp)
            .build()
    }

    fn home_env(&self) -> StaticEnv {
        StaticEnv::new().with_var("HOME", self.home.to_str().unwrap())
    }
}

fn place(root: &Path, contents: &[u8]) -> PathBuf {
    let dir = root.join(PROGRAM);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(FILE);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_no_environment_and_no_system_config() {
    let layout = Layout::new();
    let err = layout
        .locator(StaticEnv::new())
        .locate(PROGRAM, FILE)
        .unwrap_err();

    match err {
        ConfigError::ResolutionError { program, file } => {
            assert_eq!(program, PROGRAM);
            assert_eq!(file, FILE);
        }
        other => panic!("expected resolution error, got {other:?}"),
    }
}

#[test]
fn test_system_config_without_user_root_is_copied_to_scratch() {
    let layout = Layout::new();
    place(&layout.etc, b"<fontconfig/>");

    let handle = layout
        .locator(StaticEnv::new().with_var("HOME", ""))
        .locate(PROGRAM, FILE)
        .unwrap();

    assert!(handle.is_temporary());
    assert_eq!(handle.root(), layout.tmp.as_path());
    assert_eq!(handle.read().unwrap(), b"<fontconfig/>");

    // The scratch copy is writable without touching the system file
    handle.write(b"<fontconfig><dir/></fontconfig>").unwrap();
    assert_eq!(
        fs::read(layout.etc.join(PROGRAM).join(FILE)).unwrap(),
        b"<fontconfig/>"
    );
}

#[test]
fn test_system_config_returned_when_scratch_is_unusable() {
    let layout = Layout::new();
    let system_path = place(&layout.etc, b"<fontconfig/>");

    // A regular file where the scratch directory should be
    let blocked = layout.home.join("blocked");
    fs::write(&blocked, b"").unwrap();

    let handle = ConfigLocator::builder()
        .with_env(StaticEnv::new())
        .with_system_root(&layout.etc)
        .with_temp_root(&blocked)
        .build()
        .locate(PROGRAM, FILE)
        .unwrap();

    assert!(!handle.is_temporary());
    assert_eq!(handle.path(), system_path);
}

#[test]
fn test_existing_user_config_is_returned_exactly() {
    let layout = Layout::new();
    let user_path = place(&layout.home.join(".config"), b"user");
    place(&layout.etc, b"system");

    let handle = layout.locator(layout.home_env()).locate(PROGRAM, FILE).unwrap();

    assert_eq!(handle.path(), user_path);
    assert!(!handle.is_temporary());
    assert_eq!(handle.read().unwrap(), b"user");
}

#[test]
fn test_xdg_config_home_takes_precedence_over_home() {
    let layout = Layout::new();
    let xdg = layout.home.join("xdg");
    place(&layout.home.join(".config"), b"home");
    let xdg_path = place(&xdg, b"xdg");

    let env = layout
        .home_env()
        .with_var("XDG_CONFIG_HOME", xdg.to_str().unwrap());
    let handle = layout.locator(env).locate(PROGRAM, FILE).unwrap();

    assert_eq!(handle.path(), xdg_path);
}

#[test]
fn test_missing_user_config_is_seeded_from_system() {
    let layout = Layout::new();
    place(&layout.etc, b"system defaults");

    let handle = layout.locator(layout.home_env()).locate(PROGRAM, FILE).unwrap();

    let expected = layout.home.join(".config").join(PROGRAM).join(FILE);
    assert_eq!(handle.path(), expected);
    assert!(!handle.is_temporary());
    assert_eq!(fs::read(&expected).unwrap(), b"system defaults");

    // A second lookup finds the seeded copy, including local edits
    handle.write(b"edited").unwrap();
    let again = layout.locator(layout.home_env()).locate(PROGRAM, FILE).unwrap();
    assert_eq!(again.path(), expected);
    assert_eq!(again.read().unwrap(), b"edited");
}

#[test]
fn test_unwritable_user_root_falls_back_to_scratch() {
    let layout = Layout::new();
    place(&layout.etc, b"system");

    // $XDG_CONFIG_HOME points at a regular file, so seeding fails
    let bogus = layout.home.join("not-a-dir");
    fs::write(&bogus, b"").unwrap();

    let env = StaticEnv::new().with_var("XDG_CONFIG_HOME", bogus.to_str().unwrap());
    let handle = layout.locator(env).locate(PROGRAM, FILE).unwrap();

    assert!(handle.is_temporary());
    assert_eq!(handle.read().unwrap(), b"system");
}

#[test]
fn test_write_then_read_round_trip() {
    let layout = Layout::new();
    place(&layout.home.join(".config"), b"");
    let handle = layout.locator(layout.home_env()).locate(PROGRAM, FILE).unwrap();

    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    assert_eq!(handle.write(&payload).unwrap(), payload.len());
    assert_eq!(handle.read().unwrap(), payload);
}
