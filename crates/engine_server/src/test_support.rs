//! Helpers shared by the crate's tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Behaviour of a scripted stand-in engine.
#[derive(Debug, Clone, Copy)]
pub enum FakeEngine {
    /// Answers the handshake and every `go` with a short fixed search
    Responsive,
    /// Identifies itself but never answers `isready`
    NeverReady,
    /// Never reads its stdin
    Deaf,
    /// Sends two different `id name` lines during the handshake
    Renamed,
}

const RESPONSIVE_SCRIPT: &str = r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    uci)
      echo "id name FakeFish 1.0"
      echo "id author Test Suite"
      echo "uciok"
      ;;
    isready)
      echo "readyok"
      ;;
    go*)
      echo "info depth 10 multipv 1 score cp 35 nodes 1200 pv e2e4 e7e5 g1f3"
      echo "info depth 10 multipv 2 score cp 20 nodes 1200 pv d2d4 d7d5"
      echo "bestmove e2e4 ponder e7e5"
      ;;
    quit)
      exit 0
      ;;
  esac
done
"#;

const NEVER_READY_SCRIPT: &str = r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    uci)
      echo "id name SleepyFish"
      echo "uciok"
      ;;
    quit)
      exit 0
      ;;
  esac
done
"#;

const DEAF_SCRIPT: &str = r#"#!/bin/sh
exec sleep 30
"#;

const RENAMED_SCRIPT: &str = r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    uci)
      echo "id name FirstFish 1.0"
      echo "id name SecondFish 2.0"
      echo "uciok"
      ;;
    isready)
      echo "readyok"
      ;;
    quit)
      exit 0
      ;;
  esac
done
"#;

/// Writes an executable fake engine into `dir` and returns its path.
pub fn fake_engine(dir: &Path, kind: FakeEngine) -> PathBuf {
    let (name, script) = match kind {
        FakeEngine::Responsive => ("fakefish.sh", RESPONSIVE_SCRIPT),
        FakeEngine::NeverReady => ("sleepyfish.sh", NEVER_READY_SCRIPT),
        FakeEngine::Deaf => ("deaffish.sh", DEAF_SCRIPT),
        FakeEngine::Renamed => ("renamedfish.sh", RENAMED_SCRIPT),
    };
    let path = dir.join(name);
    std::fs::write(&path, script).expect("write fake engine");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("make fake engine executable");
    path
}
