//! Prometheus text exposition format.
//!
//! Renders a checkpoint set (or a single record) into the plain-text format
//! scraped by a Prometheus server or compatible agent. Output must be
//! bit-exact for interoperability: escaping, naming, numeric formatting,
//! and line ordering all follow the exposition grammar.
//!
//! The serializer is stateless: every call is a pure function of its inputs
//! and configuration, so the same checkpoint can be serialized concurrently
//! by duplicate scrape requests.

use tracing::warn;

use beacon_model::{
    Aggregation, CheckpointSet, LabelSet, MetricDescriptor, MetricRecord,
    labels::{coerce_value, sanitize_label_key},
};

/// Serializer options.
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Prepended to every metric name as `<prefix>_` when set.
    pub prefix: Option<String>,
    /// Append the record timestamp (integer milliseconds) to value lines.
    pub append_timestamp: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self { prefix: None, append_timestamp: true }
    }
}

/// Renders metric checkpoints to Prometheus exposition text.
#[derive(Debug, Clone, Default)]
pub struct PrometheusSerializer {
    config: SerializerConfig,
}

impl PrometheusSerializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// The name a descriptor exports under.
    ///
    /// Applies the configured prefix, then for counter-typed kinds enforces
    /// the `_total` naming convention. A counter whose original name lacks
    /// the suffix gets it appended and a diagnostic logged; the diagnostic
    /// never changes rendered output.
    pub fn export_name(&self, descriptor: &MetricDescriptor) -> String {
        let mut name = match &self.config.prefix {
            Some(prefix) => format!("{prefix}_{}", descriptor.name),
            None => descriptor.name.clone(),
        };
        if descriptor.metric_kind.exposition_type() == "counter" && !name.ends_with("_total") {
            warn!(
                metric = %descriptor.name,
                "counter name does not end in _total, appending suffix"
            );
            name.push_str("_total");
        }
        name
    }

    /// Render a full checkpoint set: per metric family one `# HELP` line,
    /// one `# TYPE` line, then the value lines of every series in checkpoint
    /// order. An empty checkpoint renders as the empty string.
    pub fn serialize(&self, checkpoint: &CheckpointSet) -> String {
        let mut out = String::new();
        for family in checkpoint.iter() {
            let name = self.export_name(&family.descriptor);

            out.push_str("# HELP ");
            out.push_str(&name);
            let description = escape_help(&family.descriptor.description);
            if !description.is_empty() {
                out.push(' ');
                out.push_str(&description);
            }
            out.push('\n');

            out.push_str("# TYPE ");
            out.push_str(&name);
            out.push(' ');
            out.push_str(family.descriptor.metric_kind.exposition_type());
            out.push('\n');

            for point in &family.series {
                self.write_point(&mut out, &name, &point.labels, &point.aggregation, point.unix_ms);
            }
        }
        out
    }

    /// Render a single record's value line(s) under the given export name,
    /// without `# HELP`/`# TYPE` headers. The name is emitted as supplied;
    /// callers pair this with [`export_name`](Self::export_name) when they
    /// want the naming rules applied.
    pub fn serialize_record(&self, export_name: &str, record: &MetricRecord) -> String {
        let mut out = String::new();
        self.write_point(
            &mut out,
            export_name,
            &record.labels,
            &record.aggregation,
            record.unix_ms,
        );
        out
    }

    fn write_point(
        &self,
        out: &mut String,
        name: &str,
        labels: &LabelSet,
        aggregation: &Aggregation,
        unix_ms: u64,
    ) {
        match aggregation {
            Aggregation::Sum { value } | Aggregation::LastValue { value, .. } => {
                self.write_line(out, name, labels, None, &format_value(*value), unix_ms);
            }
            Aggregation::Histogram { boundaries, counts, sum, count } => {
                self.write_line(
                    out,
                    &format!("{name}_count"),
                    labels,
                    None,
                    &count.to_string(),
                    unix_ms,
                );
                self.write_line(
                    out,
                    &format!("{name}_sum"),
                    labels,
                    None,
                    &format_value(*sum),
                    unix_ms,
                );

                // Cumulative bucket counts, ascending boundary order, then
                // the mandatory +Inf bucket equal to the total count.
                let bucket_name = format!("{name}_bucket");
                let mut cumulative = 0u64;
                for (boundary, bucket_count) in boundaries.iter().zip(counts) {
                    cumulative += bucket_count;
                    self.write_line(
                        out,
                        &bucket_name,
                        labels,
                        Some(&format_value(*boundary)),
                        &cumulative.to_string(),
                        unix_ms,
                    );
                }
                self.write_line(
                    out,
                    &bucket_name,
                    labels,
                    Some("+Inf"),
                    &count.to_string(),
                    unix_ms,
                );
            }
        }
    }

    /// One value line: `<name>{<labels>} <value>[ <timestamp-ms>]\n`.
    ///
    /// Braces are omitted entirely when there is nothing to put in them.
    /// `le` holds the extra bucket boundary label, appended after the
    /// stored labels.
    fn write_line(
        &self,
        out: &mut String,
        name: &str,
        labels: &LabelSet,
        le: Option<&str>,
        value: &str,
        unix_ms: u64,
    ) {
        out.push_str(name);

        if !labels.is_empty() || le.is_some() {
            out.push('{');
            let mut first = true;
            for (key, label_value) in labels.iter() {
                if !first {
                    out.push(',');
                }
                first = false;
                out.push_str(&sanitize_label_key(key));
                out.push_str("=\"");
                out.push_str(&escape_label_value(&coerce_value(label_value)));
                out.push('"');
            }
            if let Some(boundary) = le {
                if !first {
                    out.push(',');
                }
                out.push_str("le=\"");
                out.push_str(boundary);
                out.push('"');
            }
            out.push('}');
        }

        out.push(' ');
        out.push_str(value);
        if self.config.append_timestamp {
            out.push(' ');
            out.push_str(&unix_ms.to_string());
        }
        out.push('\n');
    }
}

/// Format a sample value for the exposition grammar.
///
/// Integers print without a decimal point, finite non-integers with their
/// full decimal representation; the non-finite sentinels use the literal
/// tokens `NaN`, `+Inf`, and `-Inf`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() { "+Inf" } else { "-Inf" }.to_string()
    } else {
        value.to_string()
    }
}

/// Escape a label value per the exposition grammar.
///
/// Single left-to-right pass substituting `\` with `\\`, `"` with `\"`, and
/// line feed with `\n`. A value that already contains an escape sequence is
/// escaped again (the backslash alone is rewritten, the following character
/// is untouched).
pub fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a HELP description: backslash and line feed only, quotes stay.
fn escape_help(description: &str) -> String {
    let mut out = String::with_capacity(description.len());
    for c in description.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
