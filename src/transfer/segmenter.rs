//! Line Segmenter
//!
//! Splits a block of text into logical lines. The line-ending convention is
//! detected once for the whole block, checked in priority order
//! CRLF > LF > CR, so mixed-ending input always segments the same way.

use std::fmt;

/// Line-ending convention detected in a block of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    CrLf,
    Lf,
    Cr,
}

impl LineEnding {
    /// Detect the convention used by `text`.
    ///
    /// Text without any terminator reports `Cr`, the last fallback; splitting
    /// it still yields the text as a single line.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else if text.contains('\n') {
            LineEnding::Lf
        } else {
            LineEnding::Cr
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineEnding::CrLf => "CRLF",
            LineEnding::Lf => "LF",
            LineEnding::Cr => "CR",
        };
        f.write_str(name)
    }
}

/// A block of text and its detected line ending.
///
/// `lines()` can be called any number of times; each call starts a fresh
/// lazy pass over the input text.
#[derive(Debug, Clone, Copy)]
pub struct LineSegmenter<'a> {
    text: &'a str,
    ending: LineEnding,
}

impl<'a> LineSegmenter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            ending: LineEnding::detect(text),
        }
    }

    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Lazily iterate the lines, terminators stripped, trailing empty
    /// segment preserved
    pub fn lines(&self) -> Lines<'a> {
        Lines {
            inner: self.text.split(self.ending.as_str()),
        }
    }

    /// Number of logical lines, including a trailing empty one
    pub fn line_count(&self) -> usize {
        self.lines().count()
    }
}

/// Iterator over the lines of a [`LineSegmenter`]
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    inner: std::str::Split<'a, &'static str>,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Re-join segmented lines with the given convention
pub fn join<'a, I>(lines: I, ending: LineEnding) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().collect::<Vec<_>>().join(ending.as_str())
}
