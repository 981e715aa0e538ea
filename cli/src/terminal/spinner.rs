use indicatif::ProgressStyle;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

/// Spinner drawn under the log while a workflow phase span is open.
///
/// `span_fields` is filled in by `tracing-indicatif`.
pub fn phase_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {span_fields} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}
