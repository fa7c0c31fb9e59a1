//! Byte formatting and transfer progress shared by the upload and download gauges

/// Placeholder shown when a byte count is not known at all.
pub const UNKNOWN_BYTES: &str = "—";

/// Smallest visible fill while a transfer runs without a known total.
pub const MIN_ACTIVE_FILL: u64 = 5;

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, UNITS[unit])
}

pub fn format_opt_bytes(bytes: Option<u64>) -> String {
    bytes
        .map(format_bytes)
        .unwrap_or_else(|| UNKNOWN_BYTES.to_string())
}

/// State of one transfer gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Progress {
    #[default]
    Idle,
    Active { loaded: u64, total: Option<u64> },
}

impl Progress {
    pub fn idle() -> Self {
        Progress::Idle
    }

    // A total of zero means the server did not tell us the size
    pub fn new(loaded: u64, total: Option<u64>) -> Self {
        Progress::Active {
            loaded,
            total: total.filter(|t| *t > 0),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Progress::Idle)
    }

    pub fn percent(&self) -> u64 {
        match *self {
            Progress::Active {
                loaded,
                total: Some(total),
            } => ((loaded as f64 / total as f64) * 100.0).round() as u64,
            _ => 0,
        }
    }

    /// Width of the gauge fill in percent. Never zero while a transfer is running.
    pub fn fill_percent(&self) -> u64 {
        match self {
            Progress::Idle => 0,
            Progress::Active { .. } => match self.percent() {
                0 => MIN_ACTIVE_FILL,
                pct => pct.min(100),
            },
        }
    }

    pub fn label(&self) -> String {
        match *self {
            Progress::Idle => "0%".to_string(),
            Progress::Active {
                loaded,
                total: Some(total),
            } => format!(
                "{}%  ({} / {})",
                self.percent(),
                format_bytes(loaded),
                format_bytes(total)
            ),
            Progress::Active {
                loaded,
                total: None,
            } => format!("{} loaded…", format_bytes(loaded)),
        }
    }
}

/// Text gauge `[████ label    ]` with `text` centered over the fill.
pub fn render_progress_bar(percentage: u64, width: usize, text: &str) -> String {
    let text: Vec<char> = text.chars().take(width).collect();
    let text_len = text.len();

    // how many blocks should be “filled” (left of the bar)
    let filled = (percentage as usize * width / 100).min(width);

    let start = width.saturating_sub(text_len) / 2;
    let end = start + text_len;

    let bar: String = (0..width)
        .map(|i| {
            if i >= start && i < end {
                text[i - start]
            } else if i < filled {
                '█'
            } else {
                ' '
            }
        })
        .collect();

    format!("[{bar}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.0 B");
        assert_eq!(format_bytes(1023), "1023.0 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.0 GB");
        // Anything above TB stays in TB
        assert_eq!(format_bytes(2048 * 1024u64.pow(4)), "2048.0 TB");
    }

    #[test]
    fn test_format_bytes_picks_largest_unit() {
        const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
        for n in [1u64, 999, 1024, 4096, 1_000_000, 3_000_000_000, 1u64 << 42] {
            let text = format_bytes(n);
            let (value, unit) = text.split_once(' ').unwrap();
            let value: f64 = value.parse().unwrap();
            let idx = UNITS.iter().position(|u| *u == unit).unwrap();
            assert!(value >= 1.0, "{n} -> {text}");
            assert!(idx == UNITS.len() - 1 || value < 1024.0, "{n} -> {text}");
        }
    }

    #[test]
    fn test_format_bytes_is_monotonic() {
        let to_bytes = |text: &str| {
            let (value, unit) = text.split_once(' ').unwrap();
            let exp = ["B", "KB", "MB", "GB", "TB"]
                .iter()
                .position(|u| *u == unit)
                .unwrap();
            value.parse::<f64>().unwrap() * 1024f64.powi(exp as i32)
        };
        let mut last = 0.0;
        for n in (0..5_000_000u64).step_by(997) {
            let shown = to_bytes(&format_bytes(n));
            assert!(shown >= last, "format_bytes({n}) went backwards");
            last = shown;
        }
    }

    #[test]
    fn test_format_opt_bytes() {
        assert_eq!(format_opt_bytes(None), "—");
        assert_eq!(format_opt_bytes(Some(0)), "0.0 B");
    }

    #[test]
    fn test_percent() {
        assert_eq!(Progress::new(0, Some(200)).percent(), 0);
        assert_eq!(Progress::new(1, Some(3)).percent(), 33);
        assert_eq!(Progress::new(2, Some(3)).percent(), 67);
        assert_eq!(Progress::new(200, Some(200)).percent(), 100);
        for total in [1u64, 7, 100, 12345] {
            for loaded in 0..=total.min(200) {
                let pct = Progress::new(loaded, Some(total)).percent();
                assert!(pct <= 100);
                assert_eq!(pct, ((loaded as f64 / total as f64) * 100.0).round() as u64);
            }
        }
    }

    #[test]
    fn test_unknown_total() {
        let p = Progress::new(2048, Some(0));
        assert_eq!(p, Progress::new(2048, None));
        assert_eq!(p.percent(), 0);
        assert_eq!(p.fill_percent(), MIN_ACTIVE_FILL);
        assert_eq!(p.label(), "2.0 KB loaded…");
    }

    #[test]
    fn test_known_total_label() {
        let p = Progress::new(512, Some(1024));
        assert_eq!(p.fill_percent(), 50);
        assert_eq!(p.label(), "50%  (512.0 B / 1.0 KB)");
    }

    #[test]
    fn test_idle() {
        let p = Progress::idle();
        assert!(p.is_idle());
        assert_eq!(p.percent(), 0);
        assert_eq!(p.fill_percent(), 0);
        assert_eq!(p.label(), "0%");
    }

    #[test]
    fn test_render_progress_bar() {
        assert_eq!(render_progress_bar(50, 10, " 50%"), "[███ 50%   ]");
        assert_eq!(render_progress_bar(100, 10, "100%"), "[███100%███]");
        assert_eq!(render_progress_bar(0, 4, "0%"), "[ 0% ]");
        // Text longer than the bar is cut
        assert_eq!(render_progress_bar(5, 4, "1.0 KB loaded…"), "[1.0 ]");
    }
}
