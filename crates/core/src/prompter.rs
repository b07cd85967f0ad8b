//! Teleprompter session controller.
//!
//! Owns one user's scroll state and turns it into display frames: a
//! progress/elapsed header over the visible window while scrolling, a hold
//! on the final window once the end is reached, and a fixed banner after
//! the hold expires. All timing comes in as caller-supplied millisecond
//! timestamps so the controller stays clock-free.

use crate::scroll::{ScrollConfig, Scroller};

/// How long the final window stays up after reaching the end, before the
/// banner takes over.
pub const END_HOLD_MS: u64 = 10_000;
/// Re-render cadence once the end of the text has been reached.
pub const BANNER_REFRESH_INTERVAL_MS: u64 = 500;

pub const DEFAULT_LINE_WIDTH: usize = 38;
pub const DEFAULT_VISIBLE_LINES: usize = 4;
pub const DEFAULT_SCROLL_WPM: u32 = 120;
pub const DEFAULT_SCROLL_INTERVAL_MS: u64 = 500;

const END_BANNER: &str = "*** END OF TEXT ***";

/// Scrolling-text state machine for one user.
#[derive(Debug, Clone)]
pub struct Prompter {
    scroller: Scroller,
    text: String,
    line_width: usize,
    start_ms: u64,
    showing_banner: bool,
}

impl Prompter {
    /// Creates a prompter over `text` (the built-in welcome passage when
    /// empty), starting its elapsed clock at `now_ms`.
    pub fn new(text: &str, line_width: usize, config: ScrollConfig, now_ms: u64) -> Self {
        let text = effective_text(text);
        Self {
            scroller: Scroller::new(&text, line_width, config),
            text,
            line_width,
            start_ms: now_ms,
            showing_banner: false,
        }
    }

    /// The passage shown when no custom text is configured.
    pub fn default_text() -> &'static str {
        "Welcome to the teleprompter. This default text scrolls at your \
         configured speed; replace it with your own content through the \
         settings. Adjust the scroll speed in words per minute, the line \
         width, and the number of visible lines to match your delivery. \
         When the end of the text is reached the display holds the final \
         lines for a moment and then shows an end-of-text banner until \
         the teleprompter is restarted."
    }

    /// Advances one scroll interval and renders the resulting frame.
    ///
    /// Once the cursor is at the end, the end timestamp is recorded and
    /// the final window keeps rendering until the hold expires; after
    /// that the banner is shown and the cursor no longer moves.
    pub fn tick(&mut self, now_ms: u64) -> String {
        if !self.showing_banner {
            self.scroller.advance();
            if self.scroller.at_end() {
                self.scroller.mark_end_reached(now_ms);
                if let Some(end_ms) = self.scroller.end_reached_at_ms() {
                    if now_ms.saturating_sub(end_ms) >= END_HOLD_MS {
                        self.showing_banner = true;
                    }
                }
            }
        }
        self.frame(now_ms)
    }

    /// Renders the current state without advancing. Two calls with the
    /// same `now_ms` produce identical output.
    pub fn frame(&self, now_ms: u64) -> String {
        let header = format!(
            "[{}%] | {}",
            self.progress_percent(),
            format_elapsed(now_ms.saturating_sub(self.start_ms))
        );
        if self.showing_banner {
            return format!("{header}\n\n{END_BANNER}");
        }
        let window = self.scroller.visible_window();
        format!("{header}\n{}", window.join("\n"))
    }

    /// Rewinds to the top, clears the end state, and restarts the
    /// elapsed clock.
    pub fn reset(&mut self, now_ms: u64) {
        self.scroller.reset();
        self.showing_banner = false;
        self.start_ms = now_ms;
    }

    /// Replaces the text, rewrapping and rewinding. Empty text falls back
    /// to the default passage.
    pub fn set_text(&mut self, text: &str) {
        self.text = effective_text(text);
        self.scroller.set_text(&self.text, self.line_width);
        self.showing_banner = false;
    }

    /// Changes the scroll rate in place; the cursor keeps its position.
    pub fn set_wpm(&mut self, wpm: u32) {
        let config = self.scroller.config();
        let next = ScrollConfig::new(wpm, config.interval_ms(), config.visible_lines());
        self.scroller.set_config(next);
    }

    /// Changes the line width, which rewraps the document and rewinds.
    pub fn set_line_width(&mut self, width: usize) {
        self.line_width = width;
        let config = *self.scroller.config();
        self.scroller.reconfigure(&self.text, width, config);
        self.showing_banner = false;
    }

    /// Changes the visible line count, which rewinds the cursor.
    pub fn set_visible_lines(&mut self, lines: usize) {
        let config = self.scroller.config();
        let next = ScrollConfig::new(config.wpm(), config.interval_ms(), lines);
        self.scroller.reconfigure(&self.text, self.line_width, next);
        self.showing_banner = false;
    }

    pub fn is_showing_banner(&self) -> bool {
        self.showing_banner
    }

    pub fn at_end(&self) -> bool {
        self.scroller.at_end()
    }

    pub fn position(&self) -> usize {
        self.scroller.position()
    }

    /// The cadence the driving timer should use right now: the configured
    /// scroll interval while scrolling, the faster banner cadence once
    /// the end has been reached.
    pub fn refresh_interval_ms(&self) -> u64 {
        if self.scroller.at_end() {
            BANNER_REFRESH_INTERVAL_MS
        } else {
            self.scroller.config().interval_ms()
        }
    }

    fn progress_percent(&self) -> u32 {
        let ceiling = self.scroller.max_position();
        if ceiling == 0 {
            return 100;
        }
        let percent = (self.scroller.position() as f64 / ceiling as f64 * 100.0).round() as u32;
        percent.min(100)
    }
}

fn effective_text(text: &str) -> String {
    if text.trim().is_empty() {
        Prompter::default_text().to_string()
    } else {
        text.to_string()
    }
}

fn format_elapsed(elapsed_ms: u64) -> String {
    let total_seconds = elapsed_ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScrollConfig {
        ScrollConfig::new(DEFAULT_SCROLL_WPM, DEFAULT_SCROLL_INTERVAL_MS, 4)
    }

    fn long_text() -> String {
        std::iter::repeat("word")
            .take(500)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn empty_text_falls_back_to_the_default_passage() {
        let prompter = Prompter::new("", DEFAULT_LINE_WIDTH, config(), 0);
        assert!(prompter.frame(0).contains("Welcome to the teleprompter"));
    }

    #[test]
    fn frame_carries_progress_and_elapsed_header() {
        let prompter = Prompter::new(&long_text(), DEFAULT_LINE_WIDTH, config(), 0);
        let frame = prompter.frame(65_000);
        assert!(frame.starts_with("[0%] | 01:05"), "got {frame:?}");
    }

    #[test]
    fn rendering_is_idempotent_apart_from_elapsed_time() {
        let mut prompter = Prompter::new(&long_text(), DEFAULT_LINE_WIDTH, config(), 0);
        prompter.tick(500);
        assert_eq!(prompter.frame(1_000), prompter.frame(1_000));
        // Only the header's time field may differ at another instant.
        let a = prompter.frame(1_000);
        let b = prompter.frame(2_000);
        assert_eq!(
            a.splitn(2, '\n').nth(1),
            b.splitn(2, '\n').nth(1)
        );
    }

    #[test]
    fn window_is_padded_to_the_visible_line_count() {
        let prompter = Prompter::new("one short line", DEFAULT_LINE_WIDTH, config(), 0);
        let frame = prompter.frame(0);
        // Header plus four window lines.
        assert_eq!(frame.split('\n').count(), 5);
    }

    #[test]
    fn end_hold_then_banner() {
        // A single-window text is at the end immediately.
        let mut prompter = Prompter::new("tiny", DEFAULT_LINE_WIDTH, config(), 0);

        let frame = prompter.tick(1_000);
        assert!(frame.contains("tiny"));
        assert!(!prompter.is_showing_banner());

        // Still inside the hold window.
        let frame = prompter.tick(1_000 + END_HOLD_MS - 1);
        assert!(frame.contains("tiny"));
        assert!(!prompter.is_showing_banner());

        // Hold expired: banner replaces the body, header stays.
        let frame = prompter.tick(1_000 + END_HOLD_MS);
        assert!(prompter.is_showing_banner());
        assert!(frame.contains("*** END OF TEXT ***"));
        assert!(frame.starts_with("[100%]"));
        assert!(!frame.contains("tiny"));
    }

    #[test]
    fn banner_stops_the_cursor_until_reset() {
        let mut prompter = Prompter::new("tiny", DEFAULT_LINE_WIDTH, config(), 0);
        prompter.tick(0);
        prompter.tick(END_HOLD_MS);
        assert!(prompter.is_showing_banner());

        let frozen = prompter.position();
        prompter.tick(END_HOLD_MS + 500);
        assert_eq!(prompter.position(), frozen);
        assert!(prompter.is_showing_banner());

        prompter.reset(END_HOLD_MS + 1_000);
        assert!(!prompter.is_showing_banner());
        assert_eq!(prompter.position(), 0);
        // Elapsed clock restarted.
        assert!(prompter.frame(END_HOLD_MS + 2_000).starts_with("[100%] | 00:01"));
    }

    #[test]
    fn refresh_cadence_speeds_up_at_the_end() {
        let mut prompter = Prompter::new(&long_text(), DEFAULT_LINE_WIDTH, config(), 0);
        assert_eq!(prompter.refresh_interval_ms(), DEFAULT_SCROLL_INTERVAL_MS);
        for _ in 0..10_000 {
            prompter.tick(0);
        }
        assert!(prompter.at_end());
        assert_eq!(prompter.refresh_interval_ms(), BANNER_REFRESH_INTERVAL_MS);
    }

    #[test]
    fn settings_changes_reprocess_in_place() {
        let text = long_text();
        let mut prompter = Prompter::new(&text, DEFAULT_LINE_WIDTH, config(), 0);
        for _ in 0..50 {
            prompter.tick(0);
        }
        let advanced = prompter.position();
        assert!(advanced > 0);

        // Speed-only change keeps the cursor.
        prompter.set_wpm(300);
        assert_eq!(prompter.position(), advanced);

        // Width change rewraps and rewinds.
        prompter.set_line_width(20);
        assert_eq!(prompter.position(), 0);

        prompter.set_visible_lines(6);
        assert_eq!(prompter.position(), 0);

        prompter.set_text("fresh content to read");
        assert!(prompter.frame(0).contains("fresh content to read"));
    }
}
