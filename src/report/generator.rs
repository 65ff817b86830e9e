//! Result record rendering.
//!
//! Records are written as soon as a sponsor finishes, either as
//! tab-separated lines or as one JSON object per line.

use crate::cli::OutputFormat;
use crate::models::{AggregatedResult, Field, SponsorReport};
use std::io::{self, Write};

/// Streams sponsor records to an output sink.
pub struct RecordWriter<W: Write> {
    out: W,
    format: OutputFormat,
    header: bool,
    header_written: bool,
}

impl<W: Write> RecordWriter<W> {
    /// `header` only applies to TSV output.
    pub fn new(out: W, format: OutputFormat, header: bool) -> Self {
        Self {
            out,
            format,
            header,
            header_written: false,
        }
    }

    /// Write every line belonging to one sponsor and flush.
    pub fn write_record(&mut self, report: &SponsorReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Tsv => {
                if self.header && !self.header_written {
                    writeln!(self.out, "{}", tsv_header(report.field))?;
                    self.header_written = true;
                }
                for line in tsv_lines(report) {
                    writeln!(self.out, "{}", line)?;
                }
            }
            OutputFormat::Json => {
                let line = serde_json::to_string(report)?;
                writeln!(self.out, "{}", line)?;
            }
        }
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Column names matching [`tsv_lines`] for the given field.
pub fn tsv_header(field: Field) -> &'static str {
    match field {
        Field::EnrollmentCount => "sponsor\tstatus\tlocation\ttotal_enrollment",
        Field::StudyType => "sponsor\tstudy_type\tstatus\tlocation\tstudies",
    }
}

/// TSV lines for one sponsor: a single total, or one line per study type.
pub fn tsv_lines(report: &SponsorReport) -> Vec<String> {
    match &report.result {
        AggregatedResult::TotalEnrollment(total) => vec![format!(
            "{}\t{}\t{}\t{}",
            report.sponsor, report.status, report.location, total
        )],
        AggregatedResult::StudyTypes(counts) => counts
            .iter()
            .map(|c| {
                format!(
                    "{}\t{}\t{}\t{}\t{}",
                    report.sponsor, c.study_type, report.status, report.location, c.studies
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudyTypeCount;
    use chrono::Utc;

    fn create_test_report(result: AggregatedResult) -> SponsorReport {
        let field = match result {
            AggregatedResult::TotalEnrollment(_) => Field::EnrollmentCount,
            AggregatedResult::StudyTypes(_) => Field::StudyType,
        };
        SponsorReport {
            sponsor: "NHLBI".to_string(),
            field,
            status: "Completed".to_string(),
            location: "NIH Clinical Center".to_string(),
            result,
            queried_at: Utc::now(),
        }
    }

    fn study_types() -> AggregatedResult {
        AggregatedResult::StudyTypes(vec![
            StudyTypeCount {
                study_type: "Interventional".to_string(),
                studies: 7,
            },
            StudyTypeCount {
                study_type: "Observational".to_string(),
                studies: 3,
            },
        ])
    }

    fn render(format: OutputFormat, header: bool, reports: &[SponsorReport]) -> String {
        let mut writer = RecordWriter::new(Vec::new(), format, header);
        for report in reports {
            writer.write_record(report).unwrap();
        }
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_enrollment_tsv_line() {
        let report = create_test_report(AggregatedResult::TotalEnrollment(25));
        assert_eq!(
            tsv_lines(&report),
            vec!["NHLBI\tCompleted\tNIH Clinical Center\t25"]
        );
    }

    #[test]
    fn test_study_type_tsv_lines() {
        let report = create_test_report(study_types());
        assert_eq!(
            tsv_lines(&report),
            vec![
                "NHLBI\tInterventional\tCompleted\tNIH Clinical Center\t7",
                "NHLBI\tObservational\tCompleted\tNIH Clinical Center\t3",
            ]
        );
    }

    #[test]
    fn test_empty_study_types_emit_nothing() {
        let report = create_test_report(AggregatedResult::StudyTypes(Vec::new()));
        assert!(tsv_lines(&report).is_empty());
    }

    #[test]
    fn test_header_written_once() {
        let reports = vec![
            create_test_report(AggregatedResult::TotalEnrollment(1)),
            create_test_report(AggregatedResult::TotalEnrollment(2)),
        ];

        let output = render(OutputFormat::Tsv, true, &reports);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], tsv_header(Field::EnrollmentCount));
    }

    #[test]
    fn test_json_lines_output() {
        let reports = vec![create_test_report(study_types())];

        let output = render(OutputFormat::Json, true, &reports);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["sponsor"], "NHLBI");
        assert_eq!(value["field"], "StudyType");
        assert_eq!(value["result"]["study_types"][1]["study_type"], "Observational");
        assert!(value["queried_at"].is_string());
    }
}
