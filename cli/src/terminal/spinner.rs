use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

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

/// Style of every span shown as a progress indicator.
pub fn style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {span_name} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

/// Updates the text next to a spinner span created with `indicatif.pb_show`.
pub fn report(span: &Span, message: &str) {
    span.pb_set_message(message);
}
