use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use saliolib::{
    aggregate::{aggregate, AggregateRequest, Dimension, Metric, DEFAULT_TOP_N},
    clean::clean,
    enrich::{enrich, ProductCatalog},
    error::{Result, SalioError},
    filter::RecordFilter,
    formats::{csv::{write_kpis, Csv}, json::Json, pipe::Pipe, report::TextReport},
    traits::{ReadRows, WriteRecords},
    validate::Validator,
};
use std::fs::File;
use std::io::{self, BufReader, Write};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum InFmt {
    Csv,
    Pipe,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutFmt {
    Csv,
    Pipe,
    Json,
    Report,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Dim {
    Day,
    Month,
    Quarter,
    Year,
    Region,
    Product,
    Customer,
    Category,
}

impl From<Dim> for Dimension {
    fn from(d: Dim) -> Self {
        match d {
            Dim::Day => Dimension::Day,
            Dim::Month => Dimension::Month,
            Dim::Quarter => Dimension::Quarter,
            Dim::Year => Dimension::Year,
            Dim::Region => Dimension::Region,
            Dim::Product => Dimension::Product,
            Dim::Customer => Dimension::Customer,
            Dim::Category => Dimension::Category,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Met {
    Revenue,
    Count,
    Aov,
    GrowthRate,
    Clv,
    TopProducts,
}

impl From<Met> for Metric {
    fn from(m: Met) -> Self {
        match m {
            Met::Revenue => Metric::Revenue,
            Met::Count => Metric::Count,
            Met::Aov => Metric::Aov,
            Met::GrowthRate => Metric::GrowthRate,
            Met::Clv => Metric::Clv,
            Met::TopProducts => Metric::TopProducts,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name="salio", version, about="Очистка и агрегация данных о продажах")]
struct Cli {
    /// Входной файл (по умолчанию stdin)
    #[arg(short='i', long="input")]
    input: Option<String>,

    /// Выходной файл (по умолчанию stdout)
    #[arg(short='o', long="output")]
    output: Option<String>,

    /// Формат входа
    #[arg(long="in-format", value_enum, default_value_t = InFmt::Csv)]
    in_format: InFmt,

    /// Формат выхода
    #[arg(long="out-format", value_enum, default_value_t = OutFmt::Csv)]
    out_format: OutFmt,

    /// Измерения группировки (через запятую)
    #[arg(long="group-by", value_enum, value_delimiter=',')]
    group_by: Vec<Dim>,

    /// Метрики (через запятую); без них агрегация не выполняется
    #[arg(long="metrics", value_enum, value_delimiter=',')]
    metrics: Vec<Met>,

    /// Сколько позиций оставлять в top-products
    #[arg(long="top-n", default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Оставить только этот регион
    #[arg(long)]
    region: Option<String>,

    /// Минимальная сумма строки
    #[arg(long="min-amount")]
    min_amount: Option<Decimal>,

    /// Максимальная сумма строки
    #[arg(long="max-amount")]
    max_amount: Option<Decimal>,

    /// Справочник кодов регионов (через запятую)
    #[arg(long="known-regions", value_delimiter=',')]
    known_regions: Vec<String>,

    /// Справочник кодов товаров (через запятую)
    #[arg(long="known-products", value_delimiter=',')]
    known_products: Vec<String>,

    /// Помечать идентификаторы без префиксов T/P/C
    #[arg(long="strict-ids")]
    strict_ids: bool,

    /// Каталог товаров (JSON) для обогащения
    #[arg(long)]
    catalog: Option<String>,

    /// Отдельный CSV с плоской таблицей KPI
    #[arg(long="kpi-out")]
    kpi_out: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    // reader
    let reader: Box<dyn io::Read> = match &cli.input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    let br = BufReader::new(reader);

    let batch = match cli.in_format {
        InFmt::Csv => Csv::read(br),
        InFmt::Pipe => Pipe::read(br),
    }?;

    let mut validator = Validator::new();
    if !cli.known_regions.is_empty() {
        validator = validator.with_known_regions(cli.known_regions.clone());
    }
    if !cli.known_products.is_empty() {
        validator = validator.with_known_products(cli.known_products.clone());
    }
    if cli.strict_ids {
        validator = validator.with_id_prefixes();
    }

    let (mut records, cleaning) = clean(&validator, &batch);

    let enrichment = match &cli.catalog {
        Some(path) => {
            let catalog = ProductCatalog::from_json(BufReader::new(File::open(path)?))?;
            let (enriched, summary) = enrich(&records, &catalog);
            records = enriched;
            Some(summary)
        }
        None => None,
    };

    let filter = RecordFilter {
        region: cli.region.clone(),
        min_amount: cli.min_amount,
        max_amount: cli.max_amount,
    };
    if !filter.is_empty() {
        let (kept, summary) = filter.apply(records);
        tracing::info!(
            input = summary.input,
            kept = summary.kept,
            by_region = summary.removed_by_region,
            by_amount = summary.removed_by_amount,
            "filter applied"
        );
        records = kept;
    }

    let kpis = if cli.metrics.is_empty() {
        None
    } else {
        let req = AggregateRequest {
            group_by: cli.group_by.iter().copied().map(Into::into).collect(),
            metrics: cli.metrics.iter().copied().map(Into::into).collect(),
            top_n: cli.top_n,
        };
        Some(aggregate(&records, &req))
    };

    if let (Some(path), Some(agg)) = (&cli.kpi_out, kpis.as_ref()) {
        write_kpis(File::create(path)?, agg)?;
    }

    // writer
    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };

    match cli.out_format {
        OutFmt::Csv => Csv::write(&mut writer, &records),
        OutFmt::Pipe => Pipe::write(&mut writer, &records),
        OutFmt::Json => {
            Json::write_document(&mut writer, &records, &cleaning, enrichment.as_ref(), kpis.as_ref())
        }
        OutFmt::Report => TextReport::write(&mut writer, &records, &cleaning, enrichment.as_ref()),
    }?;

    writer.flush().map_err(SalioError::from)
}
