// src/storage.rs
//! Whole-file reads and writes of tables: CSV in, Parquet in and out.

use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::{BufWriter, Seek},
    path::Path,
    sync::Arc,
};
use tracing::debug;

use crate::error::Result;
use crate::process::convert::convert_to_inferred_types;

const BATCH_SIZE: usize = 64 * 1024;

/// Read a headed CSV file into one batch with inferred column types.
///
/// Every field is read as text first; empty fields are null. Types are then
/// inferred per column over all values (see [`convert_to_inferred_types`]).
pub fn read_csv(path: impl AsRef<Path>) -> Result<RecordBatch> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    // header only; every column is parsed as text
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(0))?;
    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    file.rewind()?;

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let text = concat_batches(&schema, &batches)?;
    debug!(path = %path.display(), rows = text.num_rows(), "read csv");

    convert_to_inferred_types(&text)
}

/// Read every row group of a Parquet file into one batch.
pub fn read_parquet(path: impl AsRef<Path>) -> Result<RecordBatch> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(BATCH_SIZE);
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;
    debug!(path = %path.display(), rows = batch.num_rows(), "read parquet");
    Ok(batch)
}

/// Read a `.csv` or `.parquet` file, chosen by extension.
pub fn read_table(path: impl AsRef<Path>) -> Result<RecordBatch> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => read_csv(path),
        _ => read_parquet(path),
    }
}

/// Write `batch` to `path`, creating parent directories. The file is written
/// next to its destination and renamed into place once closed.
pub fn write_parquet(batch: &RecordBatch, path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("parquet.tmp");

    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .set_dictionary_enabled(true)
        .build();

    let file = File::create(&tmp)?;
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    fs::rename(&tmp, path)?;

    let size = fs::metadata(path)?.len();
    debug!(path = %path.display(), rows = batch.num_rows(), bytes = size, "wrote parquet");
    Ok(size)
}
