use anyhow::{bail, Context, Result};
use arrow::util::pretty::print_batches;
use csv_etl::{quality::summarize, storage::read_table};
use glob::glob;
use std::{env, path::PathBuf, process::exit};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder().with_env_filter(filter).init();

    // One argument: a .csv/.parquet file, or a glob matching several.
    let pattern = match single_argument(env::args()) {
        Ok(pattern) => pattern,
        Err(usage) => {
            eprintln!("{}", usage);
            exit(1);
        }
    };
    if let Err(e) = profile(&pattern) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// The one positional argument, or the usage line.
fn single_argument(mut args: impl Iterator<Item = String>) -> Result<String, String> {
    let program = args.next().unwrap_or_else(|| "profile".into());
    match (args.next(), args.next()) {
        (Some(pattern), None) => Ok(pattern),
        _ => Err(format!("Usage: {} <FILE|PATTERN>", program)),
    }
}

fn profile(pattern: &str) -> Result<()> {
    let mut paths: Vec<PathBuf> = glob(pattern)
        .with_context(|| format!("bad pattern {}", pattern))?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    if paths.is_empty() {
        bail!("no files match {}", pattern);
    }

    for path in paths {
        let table = read_table(&path).with_context(|| format!("reading {}", path.display()))?;
        let summary = summarize(&table)?;
        println!("=== {} ({} rows) ===", path.display(), table.num_rows());
        print_batches(&[summary.to_record_batch()?])?;
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> impl Iterator<Item = String> {
        v.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn takes_exactly_one_argument() {
        assert_eq!(single_argument(args(&["profile", "a.csv"])), Ok("a.csv".to_string()));
        assert!(single_argument(args(&["profile"])).is_err());
        assert!(single_argument(args(&["profile", "a", "b"])).is_err());
    }

    #[test]
    fn empty_argv_still_prints_usage() {
        let usage = single_argument(args(&[])).unwrap_err();
        assert_eq!(usage, "Usage: profile <FILE|PATTERN>");
    }
}
