//! Output cleaning: resolve terminal control sequences, strip the command
//! echo, and trim prompt leakage.
//!
//! Raw bytes are replayed through a `vte` parser into a line buffer with a
//! cursor column, so the artifacts devices actually emit come out resolved
//! rather than stripped blindly: a backspace removes the character before
//! the cursor, a carriage return rewinds to column zero and later prints
//! overwrite (how `--More--` banners erase themselves), and CSI/OSC escape
//! sequences disappear entirely. The raw bytes are never modified; callers
//! keep them alongside the cleaned text.

use vte::{Parser, Perform};

/// Clean one command round-trip.
///
/// `echoed` is the command whose echo should be stripped from the first
/// line; `prompt` is trimmed off the tail when it leaked into the segment.
/// Lines come back joined with `\n`, without leading or trailing blanks.
pub fn clean_output(raw: &[u8], echoed: Option<&str>, prompt: Option<&str>) -> String {
    let mut lines = replay(raw);

    // Leading blank lines first, so the echo check sees the first real line.
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }

    if let Some(command) = echoed {
        let command = command.trim();
        if !command.is_empty()
            && let Some(first) = lines.first()
        {
            let first = first.trim_end();
            // Devices echo either the bare command or prompt + command.
            if first == command || first.ends_with(command) {
                lines.remove(0);
            }
        }
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    if let Some(prompt) = prompt {
        let prompt = prompt.trim();
        if !prompt.is_empty() && lines.last().is_some_and(|l| l.trim() == prompt) {
            lines.pop();
            while lines.last().is_some_and(|l| l.trim().is_empty()) {
                lines.pop();
            }
        }
    }

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.trim_end());
    }
    out
}

/// Resolve control sequences without any echo or prompt stripping.
///
/// Used for rendering buffered bytes in reports and for identification
/// scans over combined probe output.
pub fn strip_controls(raw: &[u8]) -> String {
    replay(raw).join("\n")
}

/// Replay raw bytes through a terminal parser into finished lines.
fn replay(raw: &[u8]) -> Vec<String> {
    let mut parser = Parser::new();
    let mut screen = LineReplay::default();
    parser.advance(&mut screen, raw);
    screen.finish()
}

/// Minimal line-oriented terminal: a cursor column over the current line.
#[derive(Default)]
struct LineReplay {
    lines: Vec<String>,
    current: Vec<char>,
    column: usize,
}

impl LineReplay {
    fn commit_line(&mut self) {
        let line: String = self.current.iter().collect();
        self.lines.push(line);
        self.current.clear();
        self.column = 0;
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() {
            self.commit_line();
        }
        self.lines
    }

    fn place(&mut self, c: char) {
        if self.column < self.current.len() {
            self.current[self.column] = c;
        } else {
            self.current.push(c);
        }
        self.column += 1;
    }
}

impl Perform for LineReplay {
    fn print(&mut self, c: char) {
        self.place(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' => self.commit_line(),
            b'\r' => self.column = 0,
            // Backspace removes the character before the cursor.
            0x08 => {
                if self.column > 0 {
                    self.column -= 1;
                    self.current.remove(self.column);
                }
            }
            // Tab advances to the next eight-column stop.
            b'\t' => {
                let stop = (self.column / 8 + 1) * 8;
                while self.column < stop {
                    self.place(' ');
                }
            }
            // NUL padding, bells and the rest vanish.
            _ => {}
        }
    }

    // CSI, OSC and escape dispatches keep their default no-op impls; the
    // sequences are consumed by the parser and never reach the line buffer.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_echo_and_normalizes_line_endings() {
        let raw = b"show ver\r\nCisco IOS Software, Version 15.2\r\nUptime is 3 weeks\r\n";
        let clean = clean_output(raw, Some("show ver"), None);
        assert_eq!(clean, "Cisco IOS Software, Version 15.2\nUptime is 3 weeks");
    }

    #[test]
    fn test_strips_echo_with_prompt_prefix() {
        let raw = b"Router#show clock\r\n10:02:11.419 UTC Tue Aug 5\r\n";
        let clean = clean_output(raw, Some("show clock"), None);
        assert_eq!(clean, "10:02:11.419 UTC Tue Aug 5");
    }

    #[test]
    fn test_keeps_first_line_when_nothing_echoed() {
        let raw = b"Cisco IOS Software\r\n";
        let clean = clean_output(raw, Some("show ver"), None);
        assert_eq!(clean, "Cisco IOS Software");
    }

    #[test]
    fn test_backspace_erases_preceding_character() {
        // A sentinel typed and erased: ZQZQ then four destructive rubouts.
        let raw = b"ZQZQ\x08 \x08\x08 \x08\x08 \x08\x08 \x08done\r\n";
        let clean = clean_output(raw, None, None);
        assert_eq!(clean, "done");
    }

    #[test]
    fn test_carriage_return_overwrite_erases_pagination() {
        // The classic --More-- erasure: print, return, overwrite with
        // spaces, return, print the real line.
        let raw = b" --More-- \r          \rreal output line\r\n";
        let clean = clean_output(raw, None, None);
        assert_eq!(clean, "real output line");
    }

    #[test]
    fn test_ansi_sequences_are_dropped() {
        let raw = b"\x1b[32mup\x1b[0m and \x1b[1mrunning\x1b[0m\r\n";
        let clean = clean_output(raw, None, None);
        assert_eq!(clean, "up and running");
    }

    #[test]
    fn test_trailing_prompt_is_trimmed() {
        let raw = b"interface up\r\nRouter>";
        let clean = clean_output(raw, None, Some("Router>"));
        assert_eq!(clean, "interface up");
    }

    #[test]
    fn test_blank_edges_are_trimmed() {
        let raw = b"\r\n\r\nbody\r\n\r\n";
        let clean = clean_output(raw, None, None);
        assert_eq!(clean, "body");
    }

    #[test]
    fn test_tabs_align_to_stops() {
        let clean = clean_output(b"ab\tcd\r\n", None, None);
        assert_eq!(clean, "ab      cd");
    }

    #[test]
    fn test_empty_input_cleans_to_empty() {
        assert_eq!(clean_output(b"", Some("show ver"), None), "");
    }
}
