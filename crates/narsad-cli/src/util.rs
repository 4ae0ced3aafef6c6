use std::{
    ffi::OsStr,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Read, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use csv::{ReaderBuilder, Trim};
use narsad_conditions::{
    diagnostics::{Diagnostics, Severity},
    trial::RawTable,
};

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.finish()
    }

    /// Writes `records` as delimited text, header row first
    pub fn write_records<I, R>(
        &mut self,
        delimiter: u8,
        header: &[&str],
        records: I,
    ) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        let display_path = self.display_path();
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(&mut *self);
            writer
                .write_record(header)
                .with_context(|| format!("Failed to write header to {display_path}"))?;
            for record in records {
                writer
                    .write_record(record)
                    .with_context(|| format!("Failed to write record to {display_path}"))?;
            }
            writer
                .flush()
                .with_context(|| format!("Failed to flush records to {display_path}"))?;
        }
        self.finish()
    }

    pub fn finish(&mut self) -> anyhow::Result<()> {
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        if let Output::File { path, .. } = self {
            log::info!("Wrote {}", path.display());
        }
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Initializes `env_logger`; `RUST_LOG` overrides the flag-derived level
pub fn init_logger(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Warn,
        (false, 0) => log::LevelFilter::Info,
        (false, 1) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

pub fn log_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Info => log::info!("{}", diagnostic.message),
            Severity::Warning => log::warn!("{}", diagnostic.message),
        }
    }
}

/// `<dir>/<events file stem>_<suffix>`
pub fn derived_output_path(dir: &Path, events_path: &Path, suffix: &str) -> PathBuf {
    let stem = events_path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("events");
    dir.join(format!("{stem}_{suffix}"))
}

/// Reads a CSV or TSV events file into an unvalidated table
pub fn read_events_file<P>(path: P) -> anyhow::Result<RawTable>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open events file: {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let delimiter = match path.extension().and_then(OsStr::to_str) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => sniff_delimiter(
            reader
                .fill_buf()
                .with_context(|| format!("Failed to read events file: {}", path.display()))?,
        ),
    };

    read_events(reader, delimiter)
        .with_context(|| format!("Failed to parse events file: {}", path.display()))
}

/// Tab if the header line contains one, comma otherwise
fn sniff_delimiter(head: &[u8]) -> u8 {
    let header = head.split(|&b| b == b'\n').next().unwrap_or_default();
    if header.contains(&b'\t') { b'\t' } else { b',' }
}

fn read_events<R>(reader: R, delimiter: u8) -> anyhow::Result<RawTable>
where
    R: Read,
{
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(str::to_owned)
        .collect();
    let rows = reader
        .records()
        .enumerate()
        .map(|(idx, record)| -> anyhow::Result<Vec<String>> {
            let record = record.with_context(|| format!("Failed to read row {}", idx + 1))?;
            Ok(record.iter().map(str::to_owned).collect())
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(RawTable::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_events() {
        let data = "onset,duration,trial_type\n0,2,FIXATION\n5.5,4,CS-\n";
        let raw = read_events(data.as_bytes(), b',').unwrap();
        assert_eq!(raw.columns, ["onset", "duration", "trial_type"]);
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.rows[1], ["5.5", "4", "CS-"]);
    }

    #[test]
    fn test_read_tsv_events_trims_cells() {
        let data = "trial_type\tonset\n CSS \t 10 \n";
        let raw = read_events(data.as_bytes(), b'\t').unwrap();
        assert_eq!(raw.rows, [["CSS", "10"]]);
    }

    #[test]
    fn test_read_events_keeps_ragged_rows_for_validation() {
        let data = "trial_type,onset\nCS-\n";
        let raw = read_events(data.as_bytes(), b',').unwrap();
        assert_eq!(raw.rows, [vec!["CS-".to_owned()]]);
    }

    #[test]
    fn test_read_header_only() {
        let raw = read_events("trial_type,onset\n".as_bytes(), b',').unwrap();
        assert!(raw.rows.is_empty());
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"onset\tduration\ttrial_type\n0,1\t2"), b'\t');
        assert_eq!(sniff_delimiter(b"onset,duration,trial_type\n0\t1,2"), b',');
        assert_eq!(sniff_delimiter(b""), b',');
    }

    #[test]
    fn test_derived_output_path() {
        let path = derived_output_path(
            Path::new("out"),
            Path::new("behav/sub-N101_task-Narsad_phase2_events.csv"),
            "contrasts.csv",
        );
        assert_eq!(
            path,
            Path::new("out/sub-N101_task-Narsad_phase2_events_contrasts.csv")
        );
    }
}
