// src/pipeline/mod.rs
//! The five stages of a run, each over every configured source file.
//!
//! Stages hand tables to each other through `temp/<file>.parquet`; a stage
//! only starts once the previous one finished for every file.

use anyhow::{Context, Result};
use chrono::Local;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

use crate::config::{Config, Snapshot};
use crate::output::{combine, persist};
use crate::process::{
    collapse_whitespace, derive_year, drop_columns, hash_columns, strip_special_characters,
    tag_source, uppercase, Salt,
};
use crate::quality::summarize;
use crate::schema::{check_count, check_names, check_types};
use crate::storage::{read_csv, read_parquet, write_parquet};

/// Format of the run stamp in output and log file names.
pub const RUN_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn run_stamp() -> String {
    Local::now().format(RUN_STAMP_FORMAT).to_string()
}

fn stage<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    info!("{} started", name);
    match f() {
        Ok(v) => {
            info!("{} completed successfully", name);
            Ok(v)
        }
        Err(e) => {
            error!("Error in {}: {:#}", name, e);
            Err(e.context(format!("stage `{}` failed", name)))
        }
    }
}

/// Run all stages in order; returns where the consolidated output went.
pub fn run(cfg: &Config) -> Result<PathBuf> {
    run_at(cfg, &run_stamp())
}

/// Same as [`run`] with an explicit output stamp.
pub fn run_at(cfg: &Config, stamp: &str) -> Result<PathBuf> {
    info!(files = cfg.csv_files.len(), "pipeline started");
    stage("Extract Data", || extract(cfg))?;
    stage("Clean Data", || clean(cfg))?;
    stage("Process Data", || process(cfg))?;
    stage("Data Metrics", || metrics(cfg))?;
    let out = stage("Output Results", || output(cfg, stamp))?;
    info!(path = %out.display(), "pipeline completed");
    Ok(out)
}

/// Read each source CSV, validate its shape, and stage it as Parquet.
#[instrument(skip(cfg))]
pub fn extract(cfg: &Config) -> Result<()> {
    cfg.csv_files.par_iter().try_for_each(|file| {
        let src = cfg.input_csv(file);
        let batch = read_csv(&src).with_context(|| format!("reading {}", src.display()))?;

        info!(file = %file, rows = batch.num_rows(), "validating");
        let names_ok = check_names(&batch, &cfg.variables);
        let types_ok = check_types(&batch, &cfg.variables);
        check_count(&batch, &cfg.variables).with_context(|| format!("validating {}", file))?;
        if !(names_ok && types_ok) {
            warn!(file = %file, names_ok, types_ok, "schema drift; continuing");
        }

        let dst = cfg.temp_parquet(file);
        write_parquet(&batch, &dst).with_context(|| format!("staging {}", dst.display()))?;
        Ok(())
    })
}

/// Case normalisation, whitespace removal and special-character stripping.
#[instrument(skip(cfg))]
pub fn clean(cfg: &Config) -> Result<()> {
    cfg.csv_files.par_iter().try_for_each(|file| {
        let path = cfg.temp_parquet(file);
        let mut batch = read_parquet(&path).with_context(|| format!("reading {}", path.display()))?;

        batch = uppercase(&batch, &cfg.uppercase).with_context(|| format!("uppercasing {}", file))?;
        batch = collapse_whitespace(&batch).with_context(|| format!("whitespace in {}", file))?;
        for col in &cfg.special_characters {
            batch = strip_special_characters(&batch, col)
                .with_context(|| format!("special characters in {}", file))?;
        }

        write_parquet(&batch, &path).with_context(|| format!("writing {}", path.display()))?;
        info!(file = %file, rows = batch.num_rows(), "cleaned");
        Ok(())
    })
}

/// Year derivation, column removal, salted hashing and provenance.
#[instrument(skip(cfg))]
pub fn process(cfg: &Config) -> Result<()> {
    let salt = Salt::load(&cfg.salt).context("loading salt")?;

    cfg.csv_files.par_iter().try_for_each(|file| {
        let path = cfg.temp_parquet(file);
        let mut batch = read_parquet(&path).with_context(|| format!("reading {}", path.display()))?;

        batch = derive_year(&batch, &cfg.date_column, &cfg.year_column)
            .with_context(|| format!("deriving year in {}", file))?;
        batch = drop_columns(&batch, &cfg.remove_columns)?;
        batch = hash_columns(&batch, &cfg.cols_to_hash, &salt)
            .with_context(|| format!("hashing {}", file))?;
        batch = tag_source(&batch, file)?;

        write_parquet(&batch, &path).with_context(|| format!("writing {}", path.display()))?;
        info!(file = %file, columns = batch.num_columns(), "processed");
        Ok(())
    })
}

/// Quality summaries of each source before and after the transform.
#[instrument(skip(cfg))]
pub fn metrics(cfg: &Config) -> Result<()> {
    cfg.csv_files.par_iter().try_for_each(|file| {
        let raw = read_csv(cfg.input_csv(file))?;
        let processed = read_parquet(cfg.temp_parquet(file))?;

        for (snapshot, table) in [(Snapshot::Raw, &raw), (Snapshot::Processed, &processed)] {
            let summary = summarize(table)
                .with_context(|| format!("{} metrics for {}", snapshot.as_str(), file))?;
            let dst = cfg.metrics_path(snapshot, file);
            write_parquet(&summary.to_record_batch()?, &dst)
                .with_context(|| format!("writing {}", dst.display()))?;
        }
        info!(file = %file, "metrics written");
        Ok(())
    })
}

/// Merge every processed table and write the partitioned artifact.
#[instrument(skip(cfg))]
pub fn output(cfg: &Config, stamp: &str) -> Result<PathBuf> {
    let tables = cfg
        .csv_files
        .par_iter()
        .map(|file| {
            let path = cfg.temp_parquet(file);
            read_parquet(&path).with_context(|| format!("reading {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let combined = combine(&tables).context("combining processed tables")?;
    let dst = cfg.output_path(stamp);
    persist(&combined, &dst, &cfg.partition_columns)
        .with_context(|| format!("saving {}", dst.display()))?;
    Ok(dst)
}
