/// CSV export of `monitor_logs`.
///
/// Header is the table's column list in declared order, one row per sample
/// in insertion order. Timestamps are RFC 3339 and floats are written with
/// Rust's shortest round-tripping representation, so `parse_export` gets
/// back exactly what was written.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::{LoggedSample, StoreError, MONITOR_LOG_COLUMNS};
use crate::store::TimeSeriesStore;

/// Writes the header and one line per record.
pub fn export_csv<W: Write>(records: &[LoggedSample], mut writer: W) -> Result<(), StoreError> {
    writeln!(writer, "{}", MONITOR_LOG_COLUMNS.join(","))?;
    for r in records {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            r.id,
            r.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            r.depth,
            r.velocity,
            r.flow_rate,
            r.fr_number,
            r.flow_state,
            r.float_count
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Dumps every stored sample to `path`. Returns the number of rows written.
pub fn export_to_path(store: &dyn TimeSeriesStore, path: &Path) -> Result<usize, StoreError> {
    let records = store.all_samples()?;
    let file = File::create(path)?;
    export_csv(&records, BufWriter::new(file))?;
    Ok(records.len())
}

/// Reads an export back into records. The header must match exactly.
pub fn parse_export<R: BufRead>(reader: R) -> Result<Vec<LoggedSample>, StoreError> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(StoreError::Malformed("export is empty, expected a header row".to_string())),
    };
    let expected = MONITOR_LOG_COLUMNS.join(",");
    if header.trim() != expected {
        return Err(StoreError::Malformed(format!(
            "unexpected header '{}', expected '{}'",
            header.trim(),
            expected
        )));
    }

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        // +2: one for the header, one for 1-based line numbers.
        records.push(parse_row(&line, index + 2)?);
    }
    Ok(records)
}

fn parse_row(line: &str, line_no: usize) -> Result<LoggedSample, StoreError> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != MONITOR_LOG_COLUMNS.len() {
        return Err(StoreError::Malformed(format!(
            "line {}: expected {} fields, found {}",
            line_no,
            MONITOR_LOG_COLUMNS.len(),
            fields.len()
        )));
    }

    let bad = |column: &str, value: &str| {
        StoreError::Malformed(format!("line {}: bad {} '{}'", line_no, column, value))
    };
    let float = |i: usize| fields[i].parse::<f64>().map_err(|_| bad(MONITOR_LOG_COLUMNS[i], fields[i]));

    let timestamp = DateTime::parse_from_rfc3339(fields[1])
        .map_err(|_| bad("timestamp", fields[1]))?
        .with_timezone(&Utc);

    Ok(LoggedSample {
        id: fields[0].parse().map_err(|_| bad("id", fields[0]))?,
        timestamp,
        depth: float(2)?,
        velocity: float(3)?,
        flow_rate: float(4)?,
        fr_number: float(5)?,
        flow_state: fields[6].parse()?,
        float_count: fields[7].parse().map_err(|_| bad("float_count", fields[7]))?,
    })
}
