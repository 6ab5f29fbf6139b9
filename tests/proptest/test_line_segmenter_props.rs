//! Property-based tests for line segmentation and the screen model

use echoflow::session::TerminalScreen;
use echoflow::transfer::{join, LineEnding, LineSegmenter};
use proptest::prelude::*;

fn terminated(lines: &[String], ending: &str) -> String {
    lines.join(ending)
}

proptest! {
    #[test]
    fn test_crlf_text_round_trips(lines in prop::collection::vec("[a-z0-9 #!]{0,20}", 1..20)) {
        let text = terminated(&lines, "\r\n");
        let seg = LineSegmenter::new(&text);
        prop_assert_eq!(join(seg.lines(), seg.ending()), text.clone());
        prop_assert_eq!(seg.line_count(), lines.len());
    }

    #[test]
    fn test_lf_text_splits_into_its_lines(lines in prop::collection::vec("[a-z0-9 ]{0,10}(\\r[a-z0-9]{1,10})?", 2..20)) {
        let text = terminated(&lines, "\n");
        let seg = LineSegmenter::new(&text);
        prop_assert_eq!(seg.ending(), LineEnding::Lf);
        prop_assert_eq!(seg.lines().collect::<Vec<_>>(), lines.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_cr_text_round_trips(lines in prop::collection::vec("[a-z0-9 ]{0,20}", 1..20)) {
        let text = terminated(&lines, "\r");
        let seg = LineSegmenter::new(&text);
        prop_assert_eq!(join(seg.lines(), seg.ending()), text.clone());
    }

    #[test]
    fn test_segmenter_handles_any_text(text in "\\PC{0,500}") {
        let seg = LineSegmenter::new(&text);
        let lines: Vec<_> = seg.lines().collect();
        prop_assert!(!lines.is_empty());
        prop_assert!(lines.iter().all(|line| !line.contains(seg.ending().as_str())));
    }

    #[test]
    fn test_screen_handles_any_bytes(data in prop::collection::vec(any::<u8>(), 0..1000)) {
        let mut screen = TerminalScreen::new(24, 80);
        screen.feed(&data);
        let cursor = screen.cursor();
        prop_assert!(cursor.row < screen.rows());
        prop_assert!(cursor.col <= screen.cols());
    }
}
