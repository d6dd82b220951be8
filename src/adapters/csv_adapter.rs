//! CSV bar source.
//!
//! Reads OHLCV rows with a header. Columns are located by name, so both the
//! exchange kline export (`open_time,open,high,low,close,volume,close_time,...`)
//! and a plain `timestamp,open,high,low,close,volume` layout work.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::path::Path;

use crate::domain::error::IchitraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::bar_source::BarSource;

const TIMESTAMP_COLUMNS: [&str; 4] = ["timestamp", "open_time", "datetime", "date"];

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, IchitraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| IchitraderError::Data {
                reason: format!("missing {name} column"),
            })
        };

        let timestamp = TIMESTAMP_COLUMNS
            .iter()
            .find_map(|name| find(*name))
            .ok_or_else(|| IchitraderError::Data {
                reason: "missing timestamp column".into(),
            })?;

        Ok(Columns {
            timestamp,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: require("volume")?,
        })
    }
}

/// Parse `%Y-%m-%d %H:%M:%S`, `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d`, or integer
/// epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub struct CsvBarSource<R: std::io::Read> {
    records: csv::StringRecordsIntoIter<R>,
    columns: Columns,
    row: usize,
}

impl CsvBarSource<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IchitraderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| IchitraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_reader(file)
    }
}

impl<R: std::io::Read> CsvBarSource<R> {
    pub fn from_reader(reader: R) -> Result<Self, IchitraderError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers().map_err(|e| IchitraderError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Columns::from_headers(headers)?;
        Ok(Self {
            records: rdr.into_records(),
            columns,
            row: 0,
        })
    }

    fn field(&self, record: &csv::StringRecord, col: usize, name: &str) -> Result<f64, IchitraderError> {
        let raw = record.get(col).ok_or_else(|| IchitraderError::MalformedBar {
            index: self.row,
            reason: format!("missing {name} field"),
        })?;
        raw.trim()
            .parse()
            .map_err(|e| IchitraderError::MalformedBar {
                index: self.row,
                reason: format!("invalid {name} value {raw:?}: {e}"),
            })
    }

    fn parse_record(&self, record: &csv::StringRecord) -> Result<OhlcvBar, IchitraderError> {
        let raw_ts = record
            .get(self.columns.timestamp)
            .ok_or_else(|| IchitraderError::MalformedBar {
                index: self.row,
                reason: "missing timestamp field".into(),
            })?;
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| IchitraderError::MalformedBar {
            index: self.row,
            reason: format!("invalid timestamp {raw_ts:?}"),
        })?;

        Ok(OhlcvBar {
            timestamp,
            open: self.field(record, self.columns.open, "open")?,
            high: self.field(record, self.columns.high, "high")?,
            low: self.field(record, self.columns.low, "low")?,
            close: self.field(record, self.columns.close, "close")?,
            volume: self.field(record, self.columns.volume, "volume")?,
        })
    }
}

impl<R: std::io::Read> BarSource for CsvBarSource<R> {
    fn next_bar(&mut self) -> Option<Result<OhlcvBar, IchitraderError>> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => {
                self.row += 1;
                return Some(Err(IchitraderError::Data {
                    reason: format!("CSV parse error: {}", e),
                }));
            }
        };
        let bar = self.parse_record(&record);
        self.row += 1;
        Some(bar)
    }
}

/// Replays bars already in memory.
#[derive(Debug, Clone)]
pub struct VecBarSource {
    bars: std::vec::IntoIter<OhlcvBar>,
}

impl VecBarSource {
    pub fn new(bars: Vec<OhlcvBar>) -> Self {
        Self {
            bars: bars.into_iter(),
        }
    }
}

impl BarSource for VecBarSource {
    fn next_bar(&mut self) -> Option<Result<OhlcvBar, IchitraderError>> {
        self.bars.next().map(Ok)
    }
}
