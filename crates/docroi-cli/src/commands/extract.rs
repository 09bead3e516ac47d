//! Extract command - pull template fields out of a single document image.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use docroi_core::{
    create_recognizer, load_components, DocumentType, ExtractedRecord, Side,
    StructuredExtractor, Subtype,
};

use super::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input image (front side for ID cards)
    #[arg(required = true)]
    input: PathBuf,

    /// Document type (id-card, report)
    #[arg(short = 't', long)]
    doc_type: DocumentType,

    /// Layout subtype (TYPE_1, TYPE_2, TYPE_3)
    #[arg(short, long, default_value = "TYPE_1")]
    subtype: Subtype,

    /// Card side shown in the input image (ID cards only)
    #[arg(long)]
    side: Option<Side>,

    /// Back side image of an ID card; both sides are extracted and merged
    #[arg(long, conflicts_with = "side")]
    back: Option<PathBuf>,

    /// Read "Label: value" pairs from the whole page instead of template regions
    #[arg(long, conflicts_with = "back")]
    labeled: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for outputs in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let (registry, validator) = load_components(&config)?;

    // Fail on a bad template key before touching the image or OCR engine
    if !args.labeled {
        match (&args.back, args.doc_type) {
            (Some(_), DocumentType::IdCard) => {
                registry.lookup(DocumentType::IdCard, args.subtype, Some(Side::Front))?;
                registry.lookup(DocumentType::IdCard, args.subtype, Some(Side::Back))?;
            }
            (Some(_), doc_type) => {
                anyhow::bail!("--back is only valid for ID cards, got {}", doc_type);
            }
            (None, doc_type) => {
                registry.lookup(doc_type, args.subtype, args.side)?;
            }
        }
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());
    let image = image::open(&args.input)?;

    let recognizer = create_recognizer(&config)?;

    let extractor = StructuredExtractor::new(registry, validator, recognizer);

    let record = if args.labeled {
        extractor.extract_labeled(&image)?
    } else if let Some(back_path) = &args.back {
        let back = image::open(back_path)?;
        extractor.extract_id_card(
            args.subtype,
            &[(Side::Front, &image), (Side::Back, &back)],
        )?
    } else {
        extractor.extract(&image, args.doc_type, args.subtype, args.side)?
    };

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a record in the requested format.
pub fn format_record(record: &ExtractedRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_record_csv(record),
        OutputFormat::Text => Ok(format_record_text(record)),
    }
}

fn format_record_csv(record: &ExtractedRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(record.field_names())?;
    wtr.write_record(record.iter().map(|(_, value)| value))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_record_text(record: &ExtractedRecord) -> String {
    if record.is_empty() {
        return "No fields extracted\n".to_string();
    }

    let width = record.field_names().map(str::len).max().unwrap_or(0);
    let mut output = String::new();
    for (field, value) in record.iter() {
        output.push_str(&format!("{:width$}  {}\n", field, value, width = width));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractedRecord {
        let mut record = ExtractedRecord::new();
        record.insert("name", "Jane Roe");
        record.insert("id_number", "0123456789");
        record
    }

    #[test]
    fn test_format_csv() {
        let csv = format_record(&sample(), OutputFormat::Csv).unwrap();
        assert_eq!(csv, "id_number,name\n0123456789,Jane Roe\n");
    }

    #[test]
    fn test_format_text() {
        let text = format_record(&sample(), OutputFormat::Text).unwrap();
        assert_eq!(text, "id_number  0123456789\nname       Jane Roe\n");
    }

    #[test]
    fn test_format_json() {
        let json = format_record(&sample(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["name"], "Jane Roe");
    }
}
