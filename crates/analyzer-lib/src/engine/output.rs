//! Step record interchange
//!
//! The recommended interchange for a run's log is JSON lines: one
//! `StepRecord` object per line, field names matching the in-memory
//! model exactly.

use crate::models::StepRecord;
use anyhow::Result;
use std::io::Write;

/// Streams step records to a writer as JSON lines
pub struct RecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one record as a single JSON line
    pub fn write(&mut self, record: &StepRecord) -> Result<()> {
        serde_json::to_writer(&mut self.inner, record)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Render a full log as a JSON-lines string
pub fn to_jsonl(records: &[StepRecord]) -> Result<String> {
    let mut writer = RecordWriter::new(Vec::new());
    for record in records {
        writer.write(record)?;
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureVector;
    use std::io::Read;

    fn record(step_index: u64) -> StepRecord {
        StepRecord {
            step_index,
            fixed_feature: Some(FeatureVector {
                mean: 150.0,
                stddev: 5.0,
            }),
            fixed_verdict: Some(true),
            fixed_processing_time: 0.000012,
            dynamic_feature: None,
            dynamic_verdict: None,
            dynamic_processing_time: 0.000034,
            dynamic_window_length_used: 20,
        }
    }

    #[test]
    fn test_one_object_per_line() {
        let records = vec![record(0), record(1), record(2)];
        let jsonl = to_jsonl(&records).unwrap();
        assert_eq!(jsonl.lines().count(), 3);
    }

    #[test]
    fn test_field_names_match_model() {
        let jsonl = to_jsonl(&[record(7)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(jsonl.lines().next().unwrap()).unwrap();

        assert_eq!(value["step_index"], 7);
        assert_eq!(value["fixed_feature"]["mean"], 150.0);
        assert_eq!(value["fixed_feature"]["stddev"], 5.0);
        assert_eq!(value["fixed_verdict"], true);
        assert!(value["fixed_processing_time"].is_f64());
        // Failed side serializes as an explicit null sentinel
        assert!(value["dynamic_feature"].is_null());
        assert!(value["dynamic_verdict"].is_null());
        assert_eq!(value["dynamic_window_length_used"], 20);
    }

    #[test]
    fn test_round_trips_through_serde() {
        let original = record(3);
        let jsonl = to_jsonl(std::slice::from_ref(&original)).unwrap();
        let parsed: StepRecord = serde_json::from_str(jsonl.trim()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_streaming_write_to_file() {
        let mut file = tempfile::tempfile().unwrap();
        {
            let mut writer = RecordWriter::new(&mut file);
            writer.write(&record(0)).unwrap();
            writer.write(&record(1)).unwrap();
            writer.flush().unwrap();
        }

        use std::io::Seek;
        file.rewind().unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
