use std::fs;
use std::path::PathBuf;

use indoc::indoc;
use serde::Serialize;
use snapshoot_core::Value;
use tempfile::TempDir;

use crate::config::{Config, UpdateMode};
use crate::session::{Flushed, Outcome, Session};

const SPEC: &str = indoc! {r#"
    describe "math" do
      it "adds" do
        expect(2 + 2).to match_snapshot
        expect(3 + 3).to match_snapshot
      end
    end
"#};

fn spec_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("math_spec.rb");
    fs::write(&path, SPEC).unwrap();
    fs::canonicalize(path).unwrap()
}

#[test]
fn expected_values_are_compared() {
    let mut session = Session::new(Config::new()).unwrap();

    let matched = session.check("unused.rb", 1, Some(&Value::from(4)), Value::from(4));
    let mismatched = session.check("unused.rb", 1, Some(&Value::from(4)), Value::from(5));

    assert_eq!(matched.unwrap(), Outcome::Matched);
    assert_eq!(mismatched.unwrap(), Outcome::Mismatched);
    assert_eq!(session.pending(), 0);
}

#[test]
fn missing_snapshots_are_recorded_and_written() {
    let dir = TempDir::new().unwrap();
    let path = spec_file(&dir);
    let mut session = Session::new(Config::new()).unwrap();

    assert_eq!(
        session.check(&path, 3, None, Value::from(4)).unwrap(),
        Outcome::Recorded
    );
    assert_eq!(
        session.check(&path, 4, None, Value::from(6)).unwrap(),
        Outcome::Recorded
    );
    assert_eq!(session.pending(), 2);

    let flushed = session.flush().unwrap();

    assert_eq!(flushed, Flushed::Written(vec![path.clone()]));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        indoc! {r#"
            describe "math" do
              it "adds" do
                expect(2 + 2).to match_snapshot(4)
                expect(3 + 3).to match_snapshot(6)
              end
            end
        "#}
    );
}

#[test]
fn preview_mode_leaves_files_alone() {
    let dir = TempDir::new().unwrap();
    let path = spec_file(&dir);
    let mut session = Session::new(Config::new().update_mode(UpdateMode::Preview)).unwrap();

    session.check(&path, 3, None, Value::from(4)).unwrap();
    let flushed = session.flush().unwrap();

    let Flushed::Previewed(patch) = flushed else {
        panic!("expected a preview");
    };
    assert!(patch.contains("math_spec.rb"), "{patch}");
    assert!(patch.contains("match_snapshot(4)"), "{patch}");
    assert_eq!(session.pending(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), SPEC);
}

#[test]
fn never_mode_skips_missing_snapshots() {
    let dir = TempDir::new().unwrap();
    let path = spec_file(&dir);
    let mut session = Session::new(Config::new().update_mode(UpdateMode::Never)).unwrap();

    let outcome = session.check(&path, 3, None, Value::from(4)).unwrap();

    assert_eq!(outcome, Outcome::Skipped);
    assert_eq!(session.flush().unwrap(), Flushed::Written(vec![]));
    assert_eq!(fs::read_to_string(&path).unwrap(), SPEC);
}

#[test]
fn custom_matcher_and_indent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a_spec.rb");
    fs::write(&path, "assert_inline(result)\n").unwrap();
    let config = Config::new().matcher("assert_inline").indent("    ");
    let mut session = Session::new(config).unwrap();

    // Only a bare call qualifies; this one already has an argument.
    let err = session.check(&path, 1, None, Value::from(1)).unwrap_err();
    assert!(matches!(err, crate::Error::CallSiteNotFound { .. }));

    fs::write(&path, "x = assert_inline\n").unwrap();
    let mut session = Session::new(session.config().clone()).unwrap();
    let value = Value::from_pairs([(Value::symbol("a"), 1), (Value::symbol("b"), 2)]);
    session.check(&path, 1, None, value).unwrap();
    session.flush().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "x = assert_inline(\n    a: 1,\n    b: 2\n)\n"
    );
}

#[derive(Serialize)]
struct Point {
    x: i32,
    y: i32,
}

#[test]
fn serialize_values_are_captured() {
    let dir = TempDir::new().unwrap();
    let path = spec_file(&dir);
    let mut session = Session::new(Config::new()).unwrap();
    let expected = Value::from(4);

    assert_eq!(
        session.check_serialized(&path, 3, Some(&expected), &4).unwrap(),
        Outcome::Matched
    );
    assert_eq!(
        session
            .check_serialized(&path, 4, None, &Point { x: 1, y: 2 })
            .unwrap(),
        Outcome::Recorded
    );
    session.flush().unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("match_snapshot(Point.new("), "{written}");
    assert!(written.contains("x: 1"), "{written}");
}

#[test]
fn capture_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = spec_file(&dir);
    let mut session = Session::new(Config::new()).unwrap();

    let err = session.check_serialized(&path, 3, None, &u64::MAX).unwrap_err();

    assert!(matches!(err, crate::Error::Capture(_)));
    assert_eq!(session.pending(), 0);
}

#[test]
fn session_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<Session>();
}
