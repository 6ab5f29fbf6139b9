//! Unit tests for line segmentation

use echoflow::transfer::{join, LineEnding, LineSegmenter};

#[test]
fn test_detect_priority() {
    assert_eq!(LineEnding::detect("a\r\nb\rc\nd"), LineEnding::CrLf);
    assert_eq!(LineEnding::detect("a\rb\nc"), LineEnding::Lf);
    assert_eq!(LineEnding::detect("a\rb"), LineEnding::Cr);
    assert_eq!(LineEnding::detect("plain"), LineEnding::Cr);
}

#[test]
fn test_running_config_block() {
    let text = "hostname edge1\r\n!\r\ninterface Loopback0\r\n ip address 10.0.0.1 255.255.255.255\r\n";
    let seg = LineSegmenter::new(text);

    let lines: Vec<_> = seg.lines().collect();
    assert_eq!(
        lines,
        vec![
            "hostname edge1",
            "!",
            "interface Loopback0",
            " ip address 10.0.0.1 255.255.255.255",
            "",
        ]
    );
    assert_eq!(seg.line_count(), 5);
}

#[test]
fn test_interior_blank_lines_survive() {
    let seg = LineSegmenter::new("banner\n\n\nend");
    assert_eq!(seg.lines().collect::<Vec<_>>(), vec!["banner", "", "", "end"]);
}

#[test]
fn test_stray_cr_stays_in_lf_text() {
    let seg = LineSegmenter::new("line one\r\rstill one\nline two");
    assert_eq!(seg.ending(), LineEnding::Lf);
    assert_eq!(seg.lines().next(), Some("line one\r\rstill one"));
}

#[test]
fn test_join_with_other_ending() {
    let seg = LineSegmenter::new("a\nb\nc");
    assert_eq!(join(seg.lines(), LineEnding::CrLf), "a\r\nb\r\nc");
}

#[test]
fn test_ending_display() {
    assert_eq!(LineEnding::CrLf.to_string(), "CRLF");
    assert_eq!(LineEnding::Lf.to_string(), "LF");
    assert_eq!(LineEnding::Cr.to_string(), "CR");
}
