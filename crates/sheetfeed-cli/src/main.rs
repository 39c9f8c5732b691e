use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::{Map, Value as JsonValue};
use sheetfeed_parser::{FileSession, ParserConfig, RecordBatch};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sheetfeed", about = "Read spreadsheet cells as typed records")]
struct Cli {
    /// Parser configuration (`.yaml`/`.yml` or `.json`).
    #[arg(long, short)]
    config: PathBuf,

    #[arg(long, short, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Value written by `file_name` columns; defaults to the workbook's file name.
    #[arg(long)]
    file_name: Option<String>,

    /// Workbook to read (xlsx, xlsm, xls, xlsb, ods or a JSON fixture).
    workbook: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Jsonl,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let workbook = sheetfeed_io::load_workbook(&cli.workbook)
        .with_context(|| format!("failed to load {}", cli.workbook.display()))?;
    let file_name = cli.file_name.clone().or_else(|| {
        cli.workbook
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    });

    let session = FileSession::new(&config, &workbook, file_name)?;
    let mut batch = RecordBatch::new(session.schema().clone());
    let stats = session
        .run(&mut batch)
        .with_context(|| format!("failed to parse {}", cli.workbook.display()))?;
    tracing::info!(sheets = stats.sheets, records = stats.records, "done");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        Format::Csv => write_csv(&batch, &mut out)?,
        Format::Jsonl => write_jsonl(&batch, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn load_config(path: &Path) -> Result<ParserConfig> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        ParserConfig::from_json_str(&text)?
    } else {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        ParserConfig::from_yaml_reader(BufReader::new(file))?
    };
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn write_csv(batch: &RecordBatch, out: &mut impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(batch.schema().columns().iter().map(|c| c.name.as_str()))?;
    for record in batch.records() {
        writer.write_record(record.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_jsonl(batch: &RecordBatch, out: &mut impl Write) -> Result<()> {
    for record in batch.records() {
        let object: Map<String, JsonValue> = batch
            .schema()
            .columns()
            .iter()
            .zip(record)
            .map(|(column, value)| (column.name.clone(), value.to_json()))
            .collect();
        serde_json::to_writer(&mut *out, &JsonValue::Object(object))?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetfeed_parser::{Column, ColumnType, RecordSink, Schema, Value};

    fn batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Column {
                index: 0,
                name: "id".into(),
                column_type: ColumnType::Long,
            },
            Column {
                index: 1,
                name: "note".into(),
                column_type: ColumnType::String,
            },
        ]);
        let mut batch = RecordBatch::new(schema);
        batch.add_record(vec![Value::Long(1), Value::String("a, b".into())]);
        batch.add_record(vec![Value::Long(2), Value::Null]);
        batch
    }

    #[test]
    fn csv_output_quotes_and_blanks() {
        let mut buf = Vec::new();
        write_csv(&batch(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "id,note\n1,\"a, b\"\n2,\n");
    }

    #[test]
    fn jsonl_output_keeps_nulls() {
        let mut buf = Vec::new();
        write_jsonl(&batch(), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"id\":1,\"note\":\"a, b\"}\n{\"id\":2,\"note\":null}\n"
        );
    }
}
