//! Stand-in exiftool scripts for exercising the process plumbing

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

/// One `{"SourceFile": arg}` record per non-flag argument
const ECHO_SUBJECTS: &str = r#"#!/bin/sh
out="["
sep=""
for a in "$@"; do
  case "$a" in
    -*) ;;
    *) out="$out$sep{\"SourceFile\":\"$a\"}"; sep="," ;;
  esac
done
printf '%s]' "$out"
"#;

/// Single record holding the full argv
const ECHO_ARGS: &str = r#"#!/bin/sh
out=""
sep=""
for a in "$@"; do
  out="$out$sep\"$a\""; sep=","
done
printf '[{"Args":[%s]}]' "$out"
"#;

/// Counts the bytes it was fed on stdin
const COUNT_STDIN: &str = r#"#!/bin/sh
n=$(wc -c | tr -d ' ')
printf '[{"SourceFile":"-","Bytes":%s}]' "$n"
"#;

/// Exits before reading stdin at all
const IGNORE_STDIN: &str = r#"#!/bin/sh
exec 0<&-
printf '[{"SourceFile":"-"}]'
"#;

/// One `{"Exists": bool}` record per non-flag argument
const CHECK_EXISTS: &str = r#"#!/bin/sh
out="["
sep=""
for a in "$@"; do
  case "$a" in
    -*) ;;
    *) if [ -e "$a" ]; then e=true; else e=false; fi
       out="$out$sep{\"Exists\":$e}"; sep="," ;;
  esac
done
printf '%s]' "$out"
"#;

const NOT_FOUND: &str = r#"#!/bin/sh
echo "Error: File not found - missing.jpg" >&2
exit 1
"#;

const GARBAGE: &str = r#"#!/bin/sh
printf 'not json at all'
"#;

const JSON_THEN_FAIL: &str = r#"#!/bin/sh
printf '[{"SourceFile":"a.jpg","Model":"X100V"}]'
echo "Warning: minor problem" >&2
exit 1
"#;

const VERSION: &str = r#"#!/bin/sh
[ "$1" = "-ver" ] && echo "12.76"
"#;

const SCRIPTS: [(&str, &str); 9] = [
    ("echo_subjects", ECHO_SUBJECTS),
    ("echo_args", ECHO_ARGS),
    ("count_stdin", COUNT_STDIN),
    ("ignore_stdin", IGNORE_STDIN),
    ("check_exists", CHECK_EXISTS),
    ("not_found", NOT_FOUND),
    ("garbage", GARBAGE),
    ("json_then_fail", JSON_THEN_FAIL),
    ("version", VERSION),
];

static TOOLS: OnceLock<TempDir> = OnceLock::new();

/// Path to a stand-in tool; every script is written before the first one is returned
pub fn tool(name: &str) -> PathBuf {
    let dir = TOOLS.get_or_init(|| {
        let dir = TempDir::new().expect("create tool dir");
        for (script, body) in SCRIPTS {
            write_script(dir.path(), script, body);
        }
        dir
    });
    dir.path().join(name)
}

fn write_script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
}
