//! Prometheus text exposition (format 0.0.4).

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::registry::Family;
use crate::sample::Sample;
use crate::scrape::ScrapeStats;

/// Content type of the rendered output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const SELF_PREFIX: &str = "meraki_exporter";

/// Render samples for `families` followed by the exporter's own metrics.
///
/// Every listed family gets its `# HELP` and `# TYPE` lines even when it has
/// no samples. Samples of families not listed are dropped.
pub fn render(families: &[Family], samples: &[Sample], stats: &ScrapeStats) -> String {
    let mut by_family: BTreeMap<Family, Vec<&Sample>> = BTreeMap::new();
    for sample in samples {
        by_family.entry(sample.family).or_default().push(sample);
    }

    let mut output = String::with_capacity(samples.len() * 100 + 2048);

    for &family in families {
        let descriptor = family.descriptor();
        writeln!(output, "# HELP {} {}", descriptor.name, escape_help(descriptor.help)).ok();
        writeln!(output, "# TYPE {} gauge", descriptor.name).ok();

        for sample in by_family.get(&family).into_iter().flatten() {
            writeln!(
                output,
                "{}{} {}",
                descriptor.name,
                format_labels(descriptor.labels, &sample.labels),
                format_value(sample.value)
            )
            .ok();
        }
    }

    render_self_metrics(&mut output, stats);
    output
}

fn render_self_metrics(output: &mut String, stats: &ScrapeStats) {
    let mut metric = |name: &str, kind: &str, help: &str, value: f64| {
        writeln!(output, "# HELP {}_{} {}", SELF_PREFIX, name, help).ok();
        writeln!(output, "# TYPE {}_{} {}", SELF_PREFIX, name, kind).ok();
        writeln!(output, "{}_{} {}", SELF_PREFIX, name, format_value(value)).ok();
    };

    metric(
        "scrape_duration_seconds",
        "gauge",
        "Duration of the last Dashboard scrape",
        stats.last_duration_secs,
    );
    metric(
        "scrape_samples",
        "gauge",
        "Samples produced by the last scrape",
        stats.last_samples as f64,
    );
    metric(
        "scrape_skipped_entities",
        "gauge",
        "Entities skipped after a fetch failure in the last scrape",
        stats.last_skipped as f64,
    );
    if let Some(success) = stats.last_success {
        metric(
            "scrape_success",
            "gauge",
            "Whether the last scrape got past the organization listing",
            if success { 1.0 } else { 0.0 },
        );
    }
    metric(
        "scrapes_total",
        "counter",
        "Scrapes run since startup",
        stats.scrapes_total as f64,
    );
    metric(
        "scrape_failures_total",
        "counter",
        "Scrapes aborted at the organization level",
        stats.failures_total as f64,
    );
}

/// Format labels for Prometheus exposition format.
fn format_labels(names: &[&str], values: &[String]) -> String {
    if names.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = names
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
}

/// Escape a label value for Prometheus.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}
