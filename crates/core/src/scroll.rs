//! Scroll positioning engine.
//!
//! Converts a words-per-minute rate into discrete line advances using a
//! fractional accumulator: each tick contributes a (usually sub-1.0)
//! number of lines, and only whole accumulated lines move the cursor.

use crate::wrap::{self, wrap_text};

/// Bounds applied to user-supplied scroll settings.
pub const MIN_WPM: u32 = 1;
pub const MAX_WPM: u32 = 500;
pub const MIN_INTERVAL_MS: u64 = 100;
pub const MAX_INTERVAL_MS: u64 = 2000;

/// Scroll rate and window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollConfig {
    wpm: u32,
    interval_ms: u64,
    visible_lines: usize,
}

impl ScrollConfig {
    pub fn new(wpm: u32, interval_ms: u64, visible_lines: usize) -> Self {
        Self {
            wpm: wpm.clamp(MIN_WPM, MAX_WPM),
            interval_ms: interval_ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS),
            visible_lines: visible_lines.max(1),
        }
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn visible_lines(&self) -> usize {
        self.visible_lines
    }
}

/// The wrapped text plus its per-line word density estimate.
///
/// Rebuilt wholesale whenever the text or the line width changes; wrapping
/// is not incremental.
#[derive(Debug, Clone)]
pub struct ScrollDocument {
    lines: Vec<String>,
    avg_words_per_line: f64,
}

impl ScrollDocument {
    pub fn new(text: &str, line_width: usize) -> Self {
        Self {
            lines: wrap_text(text, line_width),
            avg_words_per_line: wrap::words_per_line_estimate(text, line_width),
        }
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn avg_words_per_line(&self) -> f64 {
        self.avg_words_per_line
    }
}

/// Line cursor with the fractional residue carried between ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollCursor {
    position: usize,
    accumulator: f64,
    end_reached_at_ms: Option<u64>,
}

/// Document + cursor + rate: the complete scrolling state for one text.
#[derive(Debug, Clone)]
pub struct Scroller {
    doc: ScrollDocument,
    cursor: ScrollCursor,
    config: ScrollConfig,
}

impl Scroller {
    pub fn new(text: &str, line_width: usize, config: ScrollConfig) -> Self {
        Self {
            doc: ScrollDocument::new(text, line_width),
            cursor: ScrollCursor::default(),
            config,
        }
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn doc(&self) -> &ScrollDocument {
        &self.doc
    }

    pub fn position(&self) -> usize {
        self.cursor.position
    }

    pub fn accumulator(&self) -> f64 {
        self.cursor.accumulator
    }

    pub fn end_reached_at_ms(&self) -> Option<u64> {
        self.cursor.end_reached_at_ms
    }

    /// Fraction of a line contributed by one tick at the configured rate.
    pub fn lines_per_tick(&self) -> f64 {
        let words_per_tick =
            (self.config.wpm as f64 / 60.0) * (self.config.interval_ms as f64 / 1000.0);
        words_per_tick / self.doc.avg_words_per_line.max(1.0)
    }

    /// Highest position the cursor can take: the last line sits at the
    /// bottom of the visible window.
    pub fn max_position(&self) -> usize {
        self.doc
            .total_lines()
            .saturating_sub(self.config.visible_lines)
    }

    /// Advances the cursor by one tick. Whole accumulated lines are
    /// consumed into the position; the fractional remainder is kept for
    /// the next tick. The position never exceeds `max_position`.
    pub fn advance(&mut self) {
        if self.doc.total_lines() == 0 {
            return;
        }
        self.cursor.accumulator += self.lines_per_tick();
        if self.cursor.accumulator >= 1.0 {
            let whole = self.cursor.accumulator.floor();
            self.cursor.accumulator -= whole;
            self.cursor.position += whole as usize;
        }
        self.cursor.position = self.cursor.position.min(self.max_position());
    }

    /// True once the cursor has hit the clamp ceiling.
    pub fn at_end(&self) -> bool {
        self.cursor.position >= self.max_position()
    }

    /// Records when the end was first reached; later calls keep the
    /// original timestamp.
    pub fn mark_end_reached(&mut self, now_ms: u64) {
        if self.cursor.end_reached_at_ms.is_none() {
            self.cursor.end_reached_at_ms = Some(now_ms);
        }
    }

    /// The window of lines currently on screen, padded with blanks up to
    /// the configured line count.
    pub fn visible_window(&self) -> Vec<String> {
        let mut window: Vec<String> = self
            .doc
            .lines
            .iter()
            .skip(self.cursor.position)
            .take(self.config.visible_lines)
            .cloned()
            .collect();
        while window.len() < self.config.visible_lines {
            window.push(String::new());
        }
        window
    }

    /// Rewinds to the top and clears the accumulator and end timestamp.
    pub fn reset(&mut self) {
        self.cursor = ScrollCursor::default();
    }

    /// Replaces the text, rewrapping and resetting the cursor.
    pub fn set_text(&mut self, text: &str, line_width: usize) {
        self.doc = ScrollDocument::new(text, line_width);
        self.cursor = ScrollCursor::default();
    }

    /// Replaces the rate settings without disturbing the cursor, used for
    /// speed-only changes. The position is re-clamped in case the visible
    /// line count shrank.
    pub fn set_config(&mut self, config: ScrollConfig) {
        self.config = config;
        self.cursor.position = self.cursor.position.min(self.max_position());
    }

    /// Replaces the rate/geometry settings and resets the cursor. The
    /// caller passes the (possibly unchanged) text so the document can be
    /// rebuilt at the new width.
    pub fn reconfigure(&mut self, text: &str, line_width: usize, config: ScrollConfig) {
        self.config = config;
        self.set_text(text, line_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn long_text(words: usize) -> String {
        std::iter::repeat("word")
            .take(words)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn config_clamps_out_of_range_settings() {
        let config = ScrollConfig::new(0, 50, 0);
        assert_eq!(config.wpm(), MIN_WPM);
        assert_eq!(config.interval_ms(), MIN_INTERVAL_MS);
        assert_eq!(config.visible_lines(), 1);

        let config = ScrollConfig::new(9000, 60_000, 4);
        assert_eq!(config.wpm(), MAX_WPM);
        assert_eq!(config.interval_ms(), MAX_INTERVAL_MS);
    }

    #[test]
    fn words_per_tick_arithmetic() {
        // 120 WPM at a 500 ms interval is one word per tick.
        let scroller = Scroller::new(&long_text(200), 38, ScrollConfig::new(120, 500, 4));
        let words_per_tick = scroller.lines_per_tick() * scroller.doc().avg_words_per_line();
        assert_relative_eq!(words_per_tick, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn accumulator_consumes_whole_lines_and_keeps_the_remainder() {
        let text = long_text(400);
        let mut scroller = Scroller::new(&text, 38, ScrollConfig::new(120, 500, 4));
        let avg = scroller.doc().avg_words_per_line();

        // After ceil(avg) ticks at one word per tick, at least one full
        // line has accumulated.
        let ticks = avg.ceil() as usize;
        for _ in 0..ticks {
            scroller.advance();
        }
        assert_eq!(scroller.position(), 1);
        assert!(scroller.accumulator() >= 0.0 && scroller.accumulator() < 1.0);
    }

    #[test]
    fn position_is_monotone_and_clamped() {
        let mut scroller = Scroller::new(&long_text(120), 38, ScrollConfig::new(500, 2000, 4));
        let ceiling = scroller.max_position();
        let mut previous = 0;
        for _ in 0..500 {
            scroller.advance();
            assert!(scroller.position() >= previous);
            assert!(scroller.position() <= ceiling);
            assert!(scroller.accumulator() >= 0.0 && scroller.accumulator() < 1.0);
            previous = scroller.position();
        }
        assert!(scroller.at_end());
    }

    #[test]
    fn short_text_is_immediately_at_end() {
        let scroller = Scroller::new("just one line", 38, ScrollConfig::new(120, 500, 4));
        assert_eq!(scroller.max_position(), 0);
        assert!(scroller.at_end());
    }

    #[test]
    fn visible_window_pads_with_blank_lines() {
        let scroller = Scroller::new("alpha beta", 38, ScrollConfig::new(120, 500, 4));
        let window = scroller.visible_window();
        assert_eq!(window.len(), 4);
        assert_eq!(window[0], "alpha beta");
        assert!(window[1..].iter().all(String::is_empty));
    }

    #[test]
    fn end_timestamp_is_recorded_once() {
        let mut scroller = Scroller::new("short", 38, ScrollConfig::new(120, 500, 4));
        scroller.mark_end_reached(1_000);
        scroller.mark_end_reached(9_999);
        assert_eq!(scroller.end_reached_at_ms(), Some(1_000));
        scroller.reset();
        assert_eq!(scroller.end_reached_at_ms(), None);
    }

    #[test]
    fn reconfigure_rewraps_and_resets() {
        let text = long_text(300);
        let mut scroller = Scroller::new(&text, 38, ScrollConfig::new(120, 500, 4));
        for _ in 0..200 {
            scroller.advance();
        }
        assert!(scroller.position() > 0);

        scroller.reconfigure(&text, 20, ScrollConfig::new(200, 500, 6));
        assert_eq!(scroller.position(), 0);
        assert_eq!(scroller.accumulator(), 0.0);
        // Narrower width means more wrapped lines.
        assert!(scroller.doc().total_lines() > 0);
        assert_eq!(scroller.config().visible_lines(), 6);
    }
}
