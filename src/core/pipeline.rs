//! CSV-to-CSV feature extraction driver.
//!
//! Reads the collector's `timestamp,x,y,z` log, pushes every sample
//! through a [`SampleWindow`], and writes one feature row per full window.
//! The output writer and the window are owned by a [`FeaturePipeline`]
//! value rather than living in process-wide state.

use crate::config::{ConfigError, WindowConfig};
use crate::core::features::{compute_features, FeatureRow};
use crate::core::sample::Sample;
use crate::core::windowing::SampleWindow;
use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};
use std::str::FromStr;

/// Errors that abort a feature extraction run.
#[derive(Debug)]
pub enum PipelineError {
    /// Reading the input or writing the output failed
    Io(std::io::Error),
    /// The CSV writer failed
    Csv(csv::Error),
    /// A data row did not have exactly four fields
    FieldCount { line: u64, found: usize },
    /// A field could not be parsed as a number
    InvalidField {
        line: u64,
        column: &'static str,
        value: String,
        reason: String,
    },
    /// Window parameters were rejected before any input was read
    InvalidConfig(ConfigError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(e) => write!(f, "IO error: {e}"),
            PipelineError::Csv(e) => write!(f, "CSV error: {e}"),
            PipelineError::FieldCount { line, found } => {
                write!(f, "line {line}: expected 4 fields, found {found}")
            }
            PipelineError::InvalidField {
                line,
                column,
                value,
                reason,
            } => write!(f, "line {line}: invalid {column} {value:?}: {reason}"),
            PipelineError::InvalidConfig(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Io(e) => Some(e),
            PipelineError::Csv(e) => Some(e),
            PipelineError::InvalidConfig(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Io(e)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self {
        PipelineError::Csv(e)
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::InvalidConfig(e)
    }
}

/// Parses samples from a header-prefixed `timestamp,x,y,z` stream.
///
/// Fields are split on the literal comma; there is no quoting.
pub struct SampleReader<R: Read> {
    input: BufReader<R>,
    buf: String,
    /// Physical line number of the line in `buf`, the header being line 1
    line: u64,
}

impl<R: Read> SampleReader<R> {
    /// Wrap `input`, consuming and discarding its first line.
    ///
    /// The first line is never validated, so a missing or garbled header
    /// is not an error.
    pub fn new(input: R) -> Result<Self, PipelineError> {
        let mut input = BufReader::new(input);
        let header = input.read_until(b'\n', &mut Vec::new())?;

        Ok(Self {
            input,
            buf: String::new(),
            line: u64::from(header > 0),
        })
    }

    /// Read the next sample, or `None` at end of input. Empty lines are skipped.
    pub fn next_sample(&mut self) -> Result<Option<Sample>, PipelineError> {
        let text = loop {
            self.buf.clear();
            if self.input.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim_end_matches(['\r', '\n']);
            if !text.is_empty() {
                break text;
            }
        };

        let line = self.line;
        let fields: Vec<&str> = text.split(',').map(str::trim).collect();
        let [timestamp, x, y, z] = fields[..] else {
            return Err(PipelineError::FieldCount {
                line,
                found: fields.len(),
            });
        };

        Ok(Some(Sample::new(
            parse_field(timestamp, line, "timestamp")?,
            parse_field(x, line, "x")?,
            parse_field(y, line, "y")?,
            parse_field(z, line, "z")?,
        )))
    }
}

fn parse_field<T>(value: &str, line: u64, column: &'static str) -> Result<T, PipelineError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| PipelineError::InvalidField {
        line,
        column,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Counts reported at the end of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub samples_read: u64,
    pub rows_written: u64,
}

/// Owns the sliding window and the feature output for one run.
pub struct FeaturePipeline<W: Write> {
    window: SampleWindow,
    writer: csv::Writer<W>,
    summary: RunSummary,
}

impl<W: Write> FeaturePipeline<W> {
    /// Create a pipeline and write the output header.
    pub fn new(output: W, config: &WindowConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(output);
        writer.write_record(FeatureRow::HEADER)?;

        Ok(Self {
            window: SampleWindow::new(config),
            writer,
            summary: RunSummary::default(),
        })
    }

    /// Feed one sample, writing a feature row if it completes a window.
    pub fn push(&mut self, sample: Sample) -> Result<Option<FeatureRow>, PipelineError> {
        self.summary.samples_read += 1;
        if !self.window.append(sample) {
            return Ok(None);
        }

        let row = compute_features(&self.window);
        if let Some(row) = row {
            self.writer.serialize(row)?;
            self.summary.rows_written += 1;
        }
        self.window.advance();
        Ok(row)
    }

    /// Samples waiting in the window that have not yet completed one.
    pub fn pending(&self) -> usize {
        self.window.len()
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Flush the output and hand back the writer. A partial window is dropped.
    pub fn finish(self) -> Result<(RunSummary, W), PipelineError> {
        let summary = self.summary;
        let output = self
            .writer
            .into_inner()
            .map_err(|e| PipelineError::Io(e.into_error()))?;
        Ok((summary, output))
    }
}

/// Run the whole extraction from `input` to `output`.
///
/// Stops at the first malformed row or I/O error. Rows already written
/// before the error stay in `output`.
pub fn run<R: Read, W: Write>(
    input: R,
    output: W,
    config: &WindowConfig,
) -> Result<RunSummary, PipelineError> {
    let mut pipeline = FeaturePipeline::new(output, config)?;
    let mut reader = SampleReader::new(input)?;

    while let Some(sample) = reader.next_sample()? {
        pipeline.push(sample)?;
    }

    let (summary, mut output) = pipeline.finish()?;
    output.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> WindowConfig {
        WindowConfig {
            size: 4,
            overlap: 2,
        }
    }

    #[test]
    fn test_reader_skips_first_line() {
        let input = "not,a,header,at,all\n1,0.5,1.5,2.5\n";
        let mut reader = SampleReader::new(input.as_bytes()).unwrap();

        let sample = reader.next_sample().unwrap().unwrap();
        assert_eq!(sample, Sample::new(1, 0.5, 1.5, 2.5));
        assert!(reader.next_sample().unwrap().is_none());
    }

    #[test]
    fn test_reader_skips_empty_lines() {
        let input = "timestamp,x,y,z\n\n1,0,0,0\n\n2,0,0,0\n";
        let mut reader = SampleReader::new(input.as_bytes()).unwrap();
        assert_eq!(reader.next_sample().unwrap().unwrap().timestamp(), 1);
        assert_eq!(reader.next_sample().unwrap().unwrap().timestamp(), 2);
        assert!(reader.next_sample().unwrap().is_none());
    }

    #[test]
    fn test_reader_accepts_crlf() {
        let input = "timestamp,x,y,z\r\n3,1.0,2.0,3.0\r\n";
        let mut reader = SampleReader::new(input.as_bytes()).unwrap();
        assert_eq!(
            reader.next_sample().unwrap().unwrap(),
            Sample::new(3, 1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_reader_field_count_error_has_line() {
        let input = "timestamp,x,y,z\n1,0,0,0\n2,0,0\n";
        let mut reader = SampleReader::new(input.as_bytes()).unwrap();
        reader.next_sample().unwrap();

        match reader.next_sample() {
            Err(PipelineError::FieldCount { line, found }) => {
                assert_eq!(line, 3);
                assert_eq!(found, 3);
            }
            other => panic!("expected field count error, got {other:?}"),
        }
    }

    #[test]
    fn test_reader_line_numbers_count_empty_lines() {
        let input = "timestamp,x,y,z\n1,0,0,0\n\n\n\n6,0\n";
        let mut reader = SampleReader::new(input.as_bytes()).unwrap();
        reader.next_sample().unwrap();
        assert!(matches!(
            reader.next_sample(),
            Err(PipelineError::FieldCount { line: 6, found: 2 })
        ));

        let input = "timestamp,x,y,z\r\n\r\n\n\n5,0,zero,0\n";
        let mut reader = SampleReader::new(input.as_bytes()).unwrap();
        assert!(matches!(
            reader.next_sample(),
            Err(PipelineError::InvalidField { line: 5, column: "y", .. })
        ));
    }

    #[test]
    fn test_reader_invalid_number() {
        let input = "timestamp,x,y,z\n1,0,abc,0\n";
        let mut reader = SampleReader::new(input.as_bytes()).unwrap();

        match reader.next_sample() {
            Err(PipelineError::InvalidField { line, column, value, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "y");
                assert_eq!(value, "abc");
            }
            other => panic!("expected invalid field error, got {other:?}"),
        }
    }

    #[test]
    fn test_reader_rejects_fractional_timestamp() {
        let input = "timestamp,x,y,z\n1.5,0,0,0\n";
        let mut reader = SampleReader::new(input.as_bytes()).unwrap();
        assert!(matches!(
            reader.next_sample(),
            Err(PipelineError::InvalidField {
                column: "timestamp",
                ..
            })
        ));
    }

    #[test]
    fn test_pipeline_emits_on_full_window() {
        let mut pipeline = FeaturePipeline::new(Vec::new(), &small_config()).unwrap();
        for t in 0..3 {
            assert!(pipeline.push(Sample::new(t, 0.0, 0.0, 0.0)).unwrap().is_none());
        }
        let row = pipeline.push(Sample::new(3, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(row.map(|r| r.timestamp), Some(0));
        assert_eq!(pipeline.pending(), 2);

        let row = pipeline.push(Sample::new(4, 0.0, 0.0, 0.0)).unwrap();
        assert!(row.is_none());
        let row = pipeline.push(Sample::new(5, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(row.map(|r| r.timestamp), Some(2));

        let (summary, _) = pipeline.finish().unwrap();
        assert_eq!(summary.samples_read, 6);
        assert_eq!(summary.rows_written, 2);
    }

    #[test]
    fn test_pipeline_rejects_invalid_config() {
        let config = WindowConfig {
            size: 4,
            overlap: 4,
        };
        assert!(matches!(
            FeaturePipeline::new(Vec::new(), &config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_run_writes_header_for_empty_input() {
        let mut output = Vec::new();
        let summary = run("timestamp,x,y,z\n".as_bytes(), &mut output, &small_config()).unwrap();

        assert_eq!(summary, RunSummary::default());
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "timestamp,min,max,mean,variance,standard_deviation\n"
        );
    }

    #[test]
    fn test_run_on_completely_empty_input() {
        let mut output = Vec::new();
        run("".as_bytes(), &mut output, &small_config()).unwrap();
        assert_eq!(output.iter().filter(|&&b| b == b'\n').count(), 1);
    }
}
