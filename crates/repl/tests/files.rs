//! Session behaviour over real files and configuration files

use sky_reader::ReaderConfig;
use sky_repl::{EchoSummary, OnError, Session};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tempfile::TempDir;

fn echo_file(session: &mut Session, path: &Path) -> (String, String, EchoSummary) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let file = BufReader::new(File::open(path).unwrap());
    let summary = session
        .echo(file, &mut out, &mut err, OnError::SkipRest)
        .unwrap();
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
        summary,
    )
}

#[test]
fn test_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("input.sky");
    fs::write(
        &path,
        "; header comment\n(define (square x) (* x x))\n#\\space \"tab\\there\"\n#symbol \"two words\"\n",
    )
    .unwrap();

    let mut session = Session::default();
    let (out, err, summary) = echo_file(&mut session, &path);
    assert_eq!(
        out,
        "(define (square x) (* x x))\n#\\space\n\"tab\\there\"\n#symbol \"two words\"\n"
    );
    assert!(err.is_empty());
    assert_eq!(summary.values, 4);

    // Printed output reads back to the same text
    let again = dir.path().join("again.sky");
    fs::write(&again, &out).unwrap();
    let (out2, _, _) = echo_file(&mut session, &again);
    assert_eq!(out2, out);
}

#[test]
fn test_error_skips_rest_of_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.sky");
    fs::write(&path, "ok (1 2\n#\\bogus after\n").unwrap();

    let mut session = Session::default();
    let (out, err, summary) = echo_file(&mut session, &path);
    assert_eq!(out, "ok\n");
    assert_eq!(err, "Error: Invalid character literal: #\\bogus\n");
    assert_eq!(summary, EchoSummary { values: 1, errors: 1 });
}

#[test]
fn test_config_file_limits() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("sky.toml");
    fs::write(&config_path, "max_string_len = 4\n").unwrap();
    let config = ReaderConfig::from_file(&config_path).unwrap();
    assert_eq!(config.max_string_len, 4);
    assert_eq!(config.max_token_len, 127);

    let input = dir.path().join("strings.sky");
    fs::write(&input, "\"abcd\" \"abcde\" \"never\"").unwrap();

    let mut session = Session::new(config);
    let (out, err, _) = echo_file(&mut session, &input);
    assert_eq!(out, "\"abcd\"\n");
    assert_eq!(err, "Error: String literal too long\n");
}

#[test]
fn test_bad_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("sky.toml");
    fs::write(&config_path, "max_token_len = \"long\"\n").unwrap();
    let err = ReaderConfig::from_file(&config_path).unwrap_err();
    assert!(err.contains("Failed to parse reader config"), "{}", err);
}

#[test]
fn test_interning_across_files() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.sky");
    let b = dir.path().join("b.sky");
    fs::write(&a, "(alpha beta)").unwrap();
    fs::write(&b, "(beta gamma)").unwrap();

    let mut session = Session::default().with_interning();
    echo_file(&mut session, &a);
    echo_file(&mut session, &b);
    assert_eq!(session.symbols().unwrap().len(), 3);
}
