//! Progress and elapsed-time display state
//!
//! Per-recording values a UI adapter renders: progress bar fraction, elapsed
//! time and title. Also the small geometry/formatting helpers around them.

use uuid::Uuid;

/// What the progress widgets of one recording show.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordingDisplay {
    /// Fraction of the recording elapsed, in `[0, 1]`.
    pub progress: f64,
    /// Elapsed seconds.
    pub elapsed: f64,
}

impl RecordingDisplay {
    pub fn update(&mut self, time: f64, duration: f64) {
        self.elapsed = time.max(0.0);
        self.progress = if duration > 0.0 {
            (self.elapsed / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// Format seconds as `MM:SS`, rounding to the nearest second.
///
/// ```rust
/// use fred::coordinator::format_elapsed;
///
/// assert_eq!(format_elapsed(0.0), "00:00");
/// assert_eq!(format_elapsed(65.4), "01:05");
/// assert_eq!(format_elapsed(3725.0), "62:05");
/// ```
pub fn format_elapsed(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Position of a click along a progress bar as a fraction in `[0, 1]`.
pub fn click_fraction(click_x: f64, bar_left: f64, bar_width: f64) -> f64 {
    if !(bar_width > 0.0) {
        return 0.0;
    }
    ((click_x - bar_left) / bar_width).clamp(0.0, 1.0)
}

/// Display title for a recording file.
///
/// Uses the file name without its `.wav` extension, with underscores shown as
/// spaces. The reference recording is stored with a trailing `sid <uuid>` session
/// tag, which is dropped.
pub fn recording_title(path: &str, is_reference: bool) -> String {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let title = file_name.replace(".wav", "").replace('_', " ");

    if is_reference {
        if let Some(stripped) = strip_session_tag(&title) {
            return stripped.trim_end().to_string();
        }
    }
    title
}

fn strip_session_tag(title: &str) -> Option<&str> {
    const UUID_LEN: usize = 36;
    const TAG: &str = "sid ";

    let split = title.len().checked_sub(UUID_LEN)?;
    let candidate = title.get(split..)?;
    Uuid::parse_str(candidate).ok()?;

    let head = title.get(..split)?;
    let tag_start = head.len().checked_sub(TAG.len())?;
    let tag = head.get(tag_start..)?;
    tag.eq_ignore_ascii_case(TAG).then(|| &head[..tag_start])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_update() {
        let mut display = RecordingDisplay::default();
        display.update(30.0, 120.0);
        assert_eq!(display.progress, 0.25);
        assert_eq!(display.elapsed, 30.0);
        assert_eq!(display.elapsed_label(), "00:30");

        display.update(150.0, 120.0);
        assert_eq!(display.progress, 1.0);

        display.update(10.0, 0.0);
        assert_eq!(display.progress, 0.0);

        display.reset();
        assert_eq!(display, RecordingDisplay::default());
    }

    #[test]
    fn test_format_elapsed_edge_cases() {
        assert_eq!(format_elapsed(59.5), "01:00");
        assert_eq!(format_elapsed(59.4), "00:59");
        assert_eq!(format_elapsed(-3.0), "00:00");
        assert_eq!(format_elapsed(f64::NAN), "00:00");
    }

    #[test]
    fn test_click_fraction() {
        assert_eq!(click_fraction(150.0, 100.0, 200.0), 0.25);
        assert_eq!(click_fraction(50.0, 100.0, 200.0), 0.0);
        assert_eq!(click_fraction(400.0, 100.0, 200.0), 1.0);
        assert_eq!(click_fraction(150.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn test_recording_title() {
        assert_eq!(
            recording_title("static/tmp/songs/Gould_1981.wav", false),
            "Gould 1981"
        );
        assert_eq!(recording_title("Gould_1981.wav", true), "Gould 1981");
    }

    #[test]
    fn test_reference_title_drops_session_tag() {
        let path = "static/tmp/songs/minuet_sid_1b4e28ba-2fa1-11d2-883f-0016d3cca427.wav";
        assert_eq!(recording_title(path, true), "minuet");
        // Only the reference recording carries the tag
        assert_eq!(
            recording_title(path, false),
            "minuet sid 1b4e28ba-2fa1-11d2-883f-0016d3cca427"
        );
    }

    #[test]
    fn test_reference_title_keeps_non_uuid_suffix() {
        assert_eq!(
            recording_title("take_sid_not-a-uuid-at-all-but-long-enough-xx.wav", true),
            "take sid not-a-uuid-at-all-but-long-enough-xx"
        );
    }
}
