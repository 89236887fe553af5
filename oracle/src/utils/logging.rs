use std::collections::HashMap;

use anyhow::{anyhow, Context as _};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::{format::Writer, FormatEvent, FormatFields};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const FIELDS_TO_SKIP: &[&str] = &["span_type"];

/// Span fields kept in the span extensions so formatters can reach them
#[derive(Debug, Clone, Default)]
pub struct CustomSpanFields {
    pub filtered_display: String,
    pub raw_fields: HashMap<String, String>,
}

impl CustomSpanFields {
    fn add_field(&mut self, name: &str, value: String) {
        self.raw_fields.insert(name.to_string(), value.clone());

        if !FIELDS_TO_SKIP.contains(&name) {
            if !self.filtered_display.is_empty() {
                self.filtered_display.push_str(", ");
            }
            self.filtered_display.push_str(&format!("{}={}", name, value));
        }
    }
}

#[derive(Default)]
struct SpanFieldCollector {
    fields: CustomSpanFields,
}

impl Visit for SpanFieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let formatted_value = format!("{:?}", value).trim_matches('"').to_string();
        self.fields.add_field(field.name(), formatted_value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.add_field(field.name(), value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.add_field(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.add_field(field.name(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.add_field(field.name(), value.to_string());
    }
}

pub struct FieldCollectorLayer;

impl<S> Layer<S> for FieldCollectorLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, id: &tracing::span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut collector = SpanFieldCollector::default();
        attrs.record(&mut collector);
        span.extensions_mut().insert(collector.fields);
    }

    fn on_record(&self, id: &tracing::span::Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        let existing = extensions.remove::<CustomSpanFields>().unwrap_or_default();

        let mut collector = SpanFieldCollector { fields: existing };
        values.record(&mut collector);
        extensions.insert(collector.fields);
    }
}

/// `run_date` and `trigger` of the enclosing run span, if any
fn run_context<S, N>(ctx: &FmtContext<'_, S, N>) -> Option<(String, String)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let scope = ctx.event_scope()?;
    for span in scope {
        let extensions = span.extensions();
        if let Some(fields) = extensions.get::<CustomSpanFields>() {
            if let Some(run_date) = fields.raw_fields.get("run_date") {
                let trigger = fields.raw_fields.get("trigger").cloned().unwrap_or_else(|| "-".to_string());
                return Some((run_date.clone(), trigger.to_uppercase()));
            }
        }
    }
    None
}

// Pretty formatter is formatted for console readability
pub struct PrettyFormatter;

impl<S, N> FormatEvent<S, N> for PrettyFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> std::fmt::Result {
        let meta = event.metadata();
        let now = Utc::now().format("%y-%m-%d %H:%M:%S").to_string();

        let ts_color = "\x1b[96m";
        let level_color = match *meta.level() {
            Level::TRACE => "\x1b[90m",
            Level::DEBUG => "\x1b[34m",
            Level::INFO => "\x1b[32m",
            Level::WARN => "\x1b[33m",
            Level::ERROR => "\x1b[31m",
        };
        let msg_color = "\x1b[97m";
        let column_color = "\x1b[92m";
        let reset = "\x1b[0m";
        let dim_color = "\x1b[90m";

        let (run_date, trigger) = run_context(ctx).unwrap_or_else(|| ("-".to_string(), "-".to_string()));

        let mut visitor = FieldExtractor::default();
        event.record(&mut visitor);

        // Timestamp | Level | Run date | Trigger | Component | Message and fields
        write!(writer, "{}{}{} ", ts_color, now, reset)?;
        write!(writer, "{}|{} ", dim_color, reset)?;
        write!(writer, "{}{:<5}{} ", level_color, *meta.level(), reset)?;
        write!(writer, "{}|{} ", dim_color, reset)?;
        write!(writer, "{}{:<10}{} ", column_color, run_date, reset)?;
        write!(writer, "{}|{} ", dim_color, reset)?;
        write!(writer, "{}{:<9}{} ", column_color, trigger, reset)?;
        write!(writer, "{}|{} ", dim_color, reset)?;
        write!(writer, "{}{:<10}{} ", column_color, extract_component_name(meta.target()), reset)?;
        write!(writer, "{}|{} ", dim_color, reset)?;

        write!(writer, "{}{}{}", msg_color, visitor.message, reset)?;

        if !visitor.meta.is_empty() || !visitor.fields.is_empty() {
            write!(writer, " (")?;
            if !visitor.meta.is_empty() {
                write!(writer, "{}{}{}", msg_color, visitor.meta, reset)?;
                if !visitor.fields.is_empty() {
                    write!(writer, ", ")?;
                }
            }
            if !visitor.fields.is_empty() {
                write!(writer, "{}{}{}", msg_color, visitor.fields, reset)?;
            }
            write!(writer, ")")?;
        }

        writeln!(writer)
    }
}

#[derive(Default)]
struct FieldExtractor {
    message: String,
    fields: String,
    meta: String,
}

impl Visit for FieldExtractor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let fixed_field_color = "\x1b[90m";
        let reset = "\x1b[0m";

        if field.name() == "message" {
            self.message = format!("{:?}", value).trim_matches('"').to_string();
            return;
        }

        let formatted_value = format!("{:?}", value).trim_matches('"').to_string();
        let formatted_field = format!("{}{}={}{}", fixed_field_color, field.name(), formatted_value, reset);

        // transaction hashes first
        let target = if field.name() == "tx_hash" { &mut self.meta } else { &mut self.fields };
        if !target.is_empty() {
            target.push_str(", ");
        }
        target.push_str(&formatted_field);
    }
}

// JSON formatter for structured logs suitable for Loki/Grafana
pub struct JsonEventFormatter;

#[derive(Default)]
struct JsonFieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl Visit for JsonFieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let v = format!("{:?}", value).trim_matches('"').to_string();
        if field.name() == "message" {
            self.message = Some(v);
        } else {
            self.fields.insert(field.name().to_string(), Value::String(v));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonEventFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> std::fmt::Result {
        let meta = event.metadata();
        let ts = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        let mut root = Map::new();
        root.insert("timestamp".to_string(), Value::String(ts));
        root.insert("level".to_string(), Value::String(meta.level().to_string()));
        root.insert("target".to_string(), Value::String(meta.target().to_string()));
        root.insert("component".to_string(), Value::String(extract_component_name(meta.target()).to_string()));
        if let Some(file) = meta.file() {
            root.insert("filename".to_string(), Value::String(file.to_string()));
        }
        if let Some(line) = meta.line() {
            root.insert("line_number".to_string(), Value::from(line));
        }
        if let Some(message) = visitor.message.take() {
            root.insert("message".to_string(), Value::String(message));
        }

        // span fields are merged below event fields
        let mut all_fields = visitor.fields;
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                if let Some(custom_fields) = span.extensions().get::<CustomSpanFields>() {
                    for (key, value) in &custom_fields.raw_fields {
                        all_fields.entry(key.clone()).or_insert_with(|| Value::String(value.clone()));
                    }
                }
            }
        }
        if let Some(span) = ctx.lookup_current() {
            all_fields.insert("span_name".to_string(), Value::String(span.metadata().name().to_string()));
        }

        if !all_fields.is_empty() {
            root.insert("fields".to_string(), Value::Object(all_fields));
        }

        let line = serde_json::to_string(&Value::Object(root)).map_err(|_| std::fmt::Error)?;
        writeln!(writer, "{}", line)
    }
}

/// Installs the global subscriber:
/// - PrettyFormatter when `LOG_FORMAT` is unset or anything but `json`
/// - JsonEventFormatter when `LOG_FORMAT=json`
///
/// Also installs color_eyre for readable panic reports.
pub fn init_logging() -> anyhow::Result<()> {
    color_eyre::install().map_err(|e| anyhow!("Unable to install color_eyre: {e}"))?;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::builder()
            .with_default_directive(Level::INFO.into())
            .parse("quality_oracle=info,oracle_resilience=info")
            .context("Invalid default log filter")?,
    };

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .event_format(JsonEventFormatter);

        let subscriber =
            Registry::default().with(env_filter).with(FieldCollectorLayer).with(fmt_layer).with(ErrorLayer::default());
        tracing::subscriber::set_global_default(subscriber).context("Failed to set global default subscriber")?;
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .event_format(PrettyFormatter);

        let subscriber =
            Registry::default().with(env_filter).with(FieldCollectorLayer).with(fmt_layer).with(ErrorLayer::default());
        tracing::subscriber::set_global_default(subscriber).context("Failed to set global default subscriber")?;
    }
    Ok(())
}

/// Short display name for the component column, from the tracing target
pub fn extract_component_name(target: &str) -> &'static str {
    const COMPONENTS: &[(&str, &str)] = &[
        ("quality_oracle::worker::failover", "FAILOVER"),
        ("quality_oracle::worker::submitter", "SUBMITTER"),
        ("quality_oracle::worker::breaker", "BREAKER"),
        ("quality_oracle::worker::scheduler", "SCHEDULER"),
        ("quality_oracle::worker::orchestrator", "RUN"),
        ("quality_oracle::core::client::alert", "ALERT"),
        ("quality_oracle::core::client::eligibility", "DATA"),
        ("quality_oracle::core::client::storage", "STORAGE"),
        ("quality_oracle::core::client::lock", "LOCK"),
        ("quality_oracle::core::client::rpc", "RPC"),
        ("oracle_resilience", "RESILIENCE"),
    ];

    match COMPONENTS.iter().find(|(prefix, _)| target.starts_with(prefix)) {
        Some((_, name)) => name,
        None if target.starts_with("quality_oracle") => "-",
        None => "EXTERNAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tracing_subscriber::layer::Layered;

    #[rstest]
    #[case("quality_oracle::worker::failover", "FAILOVER")]
    #[case("quality_oracle::worker::submitter::nonce", "SUBMITTER")]
    #[case("quality_oracle::core::client::alert::slack", "ALERT")]
    #[case("oracle_resilience::retry", "RESILIENCE")]
    #[case("quality_oracle::core::config", "-")]
    #[case("hyper::client", "EXTERNAL")]
    fn component_names(#[case] target: &str, #[case] expected: &str) {
        assert_eq!(extract_component_name(target), expected);
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    /// Logs one event inside a run span through `format` and returns the output
    fn log_in_run_span<F>(format: F) -> String
    where
        F: FormatEvent<Layered<FieldCollectorLayer, Registry>, fmt::format::DefaultFields> + Send + Sync + 'static,
    {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = Registry::default()
            .with(FieldCollectorLayer)
            .with(fmt::layer().with_writer(move || writer.clone()).event_format(format));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("run", run_date = "2025-06-15", trigger = "retry");
            let _entered = span.enter();
            tracing::info!(target: "quality_oracle::worker::submitter", batch = 2, "Batch confirmed");
        });
        buffer.contents()
    }

    #[test]
    fn pretty_output_carries_the_run_columns() {
        let output = log_in_run_span(PrettyFormatter);

        assert!(output.contains("2025-06-15"));
        assert!(output.contains("RETRY"));
        assert!(output.contains("SUBMITTER"));
        assert!(output.contains("Batch confirmed"));
    }

    #[test]
    fn json_output_merges_span_fields() {
        let output = log_in_run_span(JsonEventFormatter);
        let line: Value = serde_json::from_str(output.trim()).unwrap();

        assert_eq!(line["component"], "SUBMITTER");
        assert_eq!(line["message"], "Batch confirmed");
        assert_eq!(line["fields"]["run_date"], "2025-06-15");
        assert_eq!(line["fields"]["trigger"], "retry");
        assert_eq!(line["fields"]["span_name"], "run");
    }

    #[test]
    fn span_fields_skip_internal_names_in_display() {
        let mut fields = CustomSpanFields::default();
        fields.add_field("run_date", "2025-06-15".to_string());
        fields.add_field("span_type", "internal".to_string());
        fields.add_field("trigger", "retry".to_string());

        assert_eq!(fields.filtered_display, "run_date=2025-06-15, trigger=retry");
        assert_eq!(fields.raw_fields.len(), 3);
    }
}
