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

fn probe_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.blue} {msg} [{bar:32.green/bright_black}] {pos}/{len} ({elapsed})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("━╸─")
    .tick_strings(TICKS)
}

/// Turns `span` into a progress bar over `total` probes.
pub fn attach(span: &Span, total: usize) {
    span.pb_set_style(&probe_style());
    span.pb_set_length(total as u64);
    span.pb_set_message("Probing relays");
}

/// Advances the bar attached to `span` by one finished probe.
pub fn report_probe_done(span: &Span) {
    span.pb_inc(1);
}
