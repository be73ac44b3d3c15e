use std::io::Write;
use std::process::Command;

fn run(path: &str) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_skillit-bids"))
        .arg(path)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn accepted_bid_reports_single_grant() {
    let (stdout, stderr, success) = run("tests/fixtures/accept.jsonl");

    assert!(success);
    assert!(stderr.is_empty());

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "item,student,status,price,discount");
    assert_eq!(lines[1], "Watercolor Basics,Sam,accepted,600.0000,40");
    assert_eq!(lines[2], "grants,1");
}

#[test]
fn negotiation_round_trip() {
    let (stdout, stderr, success) = run("tests/fixtures/negotiation.jsonl");

    assert!(success);
    // the two malformed trailing lines warn but do not block the run
    assert!(stderr.contains("failed to parse scenario line"));
    assert!(stderr.contains("counter action requires a price"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "item,student,status,price,discount");
    // counter of 800 accepted by the student becomes the final price
    assert_eq!(lines[1], "Jazz Etudes,Sam,cancelled,500.0000,38");
    assert_eq!(lines[2], "Watercolor Basics,Sam,accepted,800.0000,20");
    assert_eq!(lines[3], "grants,1");
}

#[test]
fn out_of_range_submission_leaves_no_state() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"op":"user","id":"00000000-0000-0000-0000-000000000001","display_name":"Thea","role":"teacher"}}"#
    )
    .unwrap();
    writeln!(
        file,
        r#"{{"op":"user","id":"00000000-0000-0000-0000-000000000002","display_name":"Sam","role":"student"}}"#
    )
    .unwrap();
    writeln!(
        file,
        r#"{{"op":"session","id":"00000000-0000-0000-0000-000000000003","title":"Pottery","base_price":1000,"owner_id":"00000000-0000-0000-0000-000000000001"}}"#
    )
    .unwrap();
    // 350 is below the 40% floor of 400
    writeln!(
        file,
        r#"{{"op":"submit","student_id":"00000000-0000-0000-0000-000000000002","teacher_id":"00000000-0000-0000-0000-000000000001","session_id":"00000000-0000-0000-0000-000000000003","proposed_price":350}}"#
    )
    .unwrap();

    let (stdout, _stderr, success) = run(file.path().to_str().unwrap());

    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "item,student,status,price,discount");
    assert_eq!(lines[1], "grants,0");
}
