use std::fmt::Debug;

use colored::*;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_indicatif::IndicatifLayer;
use tracing_indicatif::filter::IndicatifFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use super::print::PRINT_TARGET;

/// Installs the global subscriber.
///
/// Log lines and report lines share the indicatif writer, so an active progress
/// bar is suspended instead of being torn by output. `RUST_LOG` overrides the
/// level picked from `verbose`, but never hides report lines.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let indicatif_layer = IndicatifLayer::new();

    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => with_report_lines(from_env)?,
        Err(_) => default_filter(verbose)?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(RelayrFormatter)
        .with_writer(indicatif_layer.get_stdout_writer());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(indicatif_layer.with_filter(IndicatifFilter::new(false)))
        .try_init()?;

    Ok(())
}

/// `relayr=debug` also covers `relayr_core` and `relayr_common`: targets match by prefix.
fn default_directives(verbose: bool) -> &'static str {
    if verbose { "info,relayr=debug" } else { "warn" }
}

fn default_filter(verbose: bool) -> anyhow::Result<EnvFilter> {
    with_report_lines(EnvFilter::new(default_directives(verbose)))
}

fn with_report_lines(filter: EnvFilter) -> anyhow::Result<EnvFilter> {
    Ok(filter.add_directive(format!("{PRINT_TARGET}=info").parse()?))
}

pub struct RelayrFormatter;

impl<S, N> FormatEvent<S, N> for RelayrFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        if meta.target() == PRINT_TARGET {
            let mut raw = RawMessage::default();
            event.record(&mut raw);
            return writeln!(writer, "{}", raw.0);
        }

        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) = match *meta.level() {
            Level::TRACE => ("[ ]", |s| s.dimmed()),
            Level::DEBUG => ("[?]", |s| s.blue()),
            Level::INFO => ("[+]", |s| s.green().bold()),
            Level::WARN => ("[*]", |s| s.yellow().bold()),
            Level::ERROR => ("[-]", |s| s.red().bold()),
        };

        write!(writer, "{} ", color_func(symbol.into()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Pulls the `raw_msg` field out of a report line event.
#[derive(Default)]
struct RawMessage(String);

impl Visit for RawMessage {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "raw_msg" {
            self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "raw_msg" {
            self.0 = format!("{value:?}");
        }
    }
}
