//! `labtest` - CLI for the labtest library
//!
//! Runs calculations and manages the register of concrete and soil tests.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::Parser;

use labtest::calc::{
    calculate, fields_from_pairs, DerivedResult, SampleInput, SieveAnalysis, SieveRow, TestType,
    WashedSieveAnalysis,
};
use labtest::cli::{
    authorize_clear, CalcCommand, Cli, Command, ConfigCommand, OutputFormat, RecordsCommand,
    YearMonth,
};
use labtest::config::StorageBackend;
use labtest::records::{report, validate};
use labtest::{
    init_logging, Collection, Config, Error, KeyValueStore, MemoryStore, RecordSequencer,
    SqliteStore,
};

type Sequencer = RecordSequencer<Box<dyn KeyValueStore>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Calc(cmd) => handle_calc(&cmd),
        Command::Records(cmd) => {
            let sequencer = RecordSequencer::new(open_store(&config)?);
            handle_records(&config, &sequencer, cmd).await
        }
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> Result<Box<dyn KeyValueStore>> {
    Ok(match config.storage.backend {
        StorageBackend::Sqlite => {
            let path = config.database_path();
            Box::new(
                SqliteStore::open(&path)
                    .with_context(|| format!("cannot open record store {}", path.display()))?,
            )
        }
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    })
}

fn handle_calc(cmd: &CalcCommand) -> Result<()> {
    let fields = fields_from_pairs(&cmd.fields)?;
    let input = SampleInput::from_fields(cmd.test.into(), &fields)?;
    let result = calculate(&input)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match &result {
        DerivedResult::Compaction(r) => {
            println!("Used sand:              {:.2}", r.used_sand);
            println!("Bored volume:           {:.2}", r.bored_volume);
            println!("Wet volumetric weight:  {:.4}", r.wet_volumetric_weight);
            println!("Moisture factor:        {:.2}", r.moisture_factor);
            println!("Dry volumetric weight:  {:.4}", r.dry_volumetric_weight);
            println!("Compaction:             {:.2} %", r.compaction_percent);
        }
        DerivedResult::Cylinder(r) => {
            println!("Area:             {:.2}", r.area);
            println!("Simple strength:  {:.2}", r.simple_strength);
            println!("Percent of f'c:   {:.2} %", r.percent);
        }
        DerivedResult::Beam(r) => {
            println!("Factor:               {}", r.factor);
            println!("Modulus of rupture:   {:.2}", r.modulus_of_rupture);
        }
        DerivedResult::Mortar(r) => {
            println!("Area:             {:.2}", r.area);
            println!("Simple strength:  {:.2}", r.simple_strength);
            println!("Percent of f'c:   {:.2} %", r.percent);
        }
        DerivedResult::Sieve(analysis) => print_sieve_analysis(analysis),
        DerivedResult::WashedSieve(analysis) => print_washed_analysis(analysis),
    }
    Ok(())
}

fn print_sieve_analysis(analysis: &SieveAnalysis) {
    println!("Test:               {}", TestType::from(analysis.test_type));
    println!("Net weight:         {:.2}", analysis.net_weight);
    println!("Volumetric weight:  {:.2}", analysis.volumetric_weight);
    println!();
    print_sieve_rows(&analysis.rows);
}

fn print_washed_analysis(analysis: &WashedSieveAnalysis) {
    println!("Passing No.4:   {:.2} %", analysis.passing_no4);
    println!("Sample weight:  {:.0}", analysis.sample_weight);
    println!();
    print_sieve_rows(&analysis.rows);
}

fn print_sieve_rows(rows: &[SieveRow]) {
    println!(
        "{:<14} {:>10} {:>9} {:>7} {:>11} {:>9}",
        "Sieve", "Retained", "% Ret.", "Rounded", "Cumulative", "% Pass."
    );
    for row in rows {
        println!(
            "{:<14} {:>10.2} {:>9.2} {:>7.0} {:>11.2} {:>9.2}",
            row.sieve.label,
            row.retained_weight,
            row.percent_retained,
            row.percent_retained_rounded,
            row.cumulative_retained,
            row.percent_passing
        );
    }
}

async fn handle_records(config: &Config, sequencer: &Sequencer, cmd: RecordsCommand) -> Result<()> {
    match cmd {
        RecordsCommand::Register {
            collection,
            fields,
            count,
        } => {
            let collection = Collection::from(collection);
            let mut fields = fields_from_pairs(&fields)?;
            if let Some(count) = count {
                match collection {
                    Collection::Concrete => {
                        fields.insert(
                            validate::SPECIMEN_COUNT_FIELD.to_string(),
                            count.to_string(),
                        );
                    }
                    Collection::Soil if count != 1 => {
                        anyhow::bail!("soil samples are registered one at a time");
                    }
                    Collection::Soil => {}
                }
            }

            let registration = validate::registration(
                collection,
                &fields,
                &config.registration,
                Local::now().date_naive(),
            )?;

            let created = match sequencer
                .register(registration.collection, &registration.fields, registration.count)
                .await
            {
                Ok(created) => created,
                Err(Error::Storage(err)) => {
                    let message = err.user_message();
                    return Err(anyhow::Error::new(err).context(message));
                }
                Err(err) => return Err(err.into()),
            };

            match (created.first(), created.last()) {
                (Some(first), Some(last)) if first.id != last.id => {
                    println!("Saved {collection} tests {} to {}", first.id, last.id);
                }
                (Some(first), _) => println!("Saved {collection} test {}", first.id),
                _ => {}
            }
        }
        RecordsCommand::List {
            collection,
            search,
            format,
        } => {
            let collection = Collection::from(collection);
            let records = sequencer.records(collection).await?;
            let hits = report::search(&records, search.as_deref().unwrap_or(""));

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hits)?),
                OutputFormat::Plain => {
                    for record in &hits {
                        let rest: Vec<String> = record
                            .fields
                            .keys()
                            .filter(|name| name.as_str() != validate::DATE_FIELD)
                            .filter_map(|name| {
                                record.field(name).map(|value| format!("{name}={value}"))
                            })
                            .collect();
                        println!(
                            "{:>6}  {:<10}  {}",
                            record.id,
                            record.date().unwrap_or_default(),
                            rest.join("  ")
                        );
                    }
                    println!("{} of {} {collection} records", hits.len(), records.len());
                }
            }
        }
        RecordsCommand::Daily { month, json } => {
            let month = month.unwrap_or_else(|| {
                let today = Local::now().date_naive();
                YearMonth {
                    year: today.year(),
                    month: today.month(),
                }
            });

            let concrete = report::daily_counts(
                &sequencer.records(Collection::Concrete).await?,
                month.year,
                month.month,
            )?;
            let soil = report::daily_counts(
                &sequencer.records(Collection::Soil).await?,
                month.year,
                month.month,
            )?;

            if json {
                let out = serde_json::json!({
                    "month": month.to_string(),
                    "concrete": concrete,
                    "soil": soil,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{month}");
                println!("{:>4} {:>9} {:>6}", "Day", "Concrete", "Soil");
                for (c, s) in concrete.iter().zip(&soil) {
                    println!("{:>4} {:>9} {:>6}", c.day, c.count, s.count);
                }
            }
        }
        RecordsCommand::Status { json } => handle_status(config, sequencer, json).await?,
        RecordsCommand::Clear { yes, code } => {
            authorize_clear(&config.admin, yes, code.as_deref())?;
            sequencer.clear_all().await?;
            println!("All records deleted; numbering restarts at 1.");
        }
    }
    Ok(())
}

async fn handle_status(config: &Config, sequencer: &Sequencer, json: bool) -> Result<()> {
    let mut collections = Vec::new();
    for collection in Collection::ALL {
        let records = sequencer.records(collection).await?;
        let counter = sequencer.counter(collection).await?;
        collections.push((collection, counter, records));
    }
    let next_id = collections.iter().map(|(_, counter, _)| *counter).max().unwrap_or(0) + 1;

    if json {
        let by_collection: serde_json::Map<String, serde_json::Value> = collections
            .iter()
            .map(|(collection, counter, records)| {
                (
                    collection.to_string(),
                    serde_json::json!({
                        "last_id": counter,
                        "records": records.len(),
                        "by_date": report::counts_by_date(records),
                    }),
                )
            })
            .collect();
        let status = serde_json::json!({
            "backend": sequencer.store().backend_name(),
            "database_path": config.database_path(),
            "next_id": next_id,
            "collections": by_collection,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("labtest status");
    println!("--------------");
    println!("Backend:   {}", sequencer.store().backend_name());
    if config.storage.backend == StorageBackend::Sqlite {
        println!("Database:  {}", config.database_path().display());
    }
    println!("Next id:   {next_id}");
    for (collection, counter, records) in &collections {
        println!();
        println!("[{collection}]");
        println!("  Records:  {}", records.len());
        println!("  Last id:  {counter}");
        for (date, count) in report::counts_by_date(records) {
            println!("  {date}: {count}");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Backend:            {}", config.storage.backend);
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Registration]");
                println!(
                    "  Max specimens:      {}",
                    config.registration.max_specimens
                );
                println!(
                    "  Reject past dates:  {}",
                    config.registration.reject_past_dates
                );
                println!();
                println!("[Admin]");
                println!(
                    "  Clear code:         {}",
                    if config.admin.clear_code.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
