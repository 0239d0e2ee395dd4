use saliolib::{
    clean::clean,
    formats::{csv::Csv, report::TextReport},
    traits::ReadRows,
    validate::Validator,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Пример: CSV со stdin -> текстовый отчёт в stdout
    let batch = Csv::read(std::io::BufReader::new(std::io::stdin()))?;
    let (records, cleaning) = clean(&Validator::new(), &batch);
    TextReport::write(std::io::stdout(), &records, &cleaning, None)?;
    Ok(())
}
