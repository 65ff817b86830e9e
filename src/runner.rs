//! Per-sponsor query orchestration.
//!
//! Sponsors are processed strictly one after another: expression, fetch,
//! aggregate, emit. The next request is only sent once the previous
//! sponsor's record has been written.

use crate::analysis::aggregate;
use crate::api::FieldValuesSource;
use crate::error::{QueryError, Result};
use crate::models::{QueryParams, SponsorReport};
use crate::query::build_filter_expression;
use crate::report::RecordWriter;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use tracing::{debug, error, info};

/// How a run reacts to failures and reports progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Log failed sponsors and continue instead of aborting.
    pub keep_going: bool,
    /// Draw a progress bar on stderr.
    pub show_progress: bool,
}

/// Outcome of a completed run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    /// Sponsors skipped under `keep_going`, in input order.
    pub failed: Vec<(String, QueryError)>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builds, fetches and aggregates one field-values query per sponsor.
pub struct QueryAggregator<'a, S: FieldValuesSource> {
    source: &'a S,
    params: QueryParams,
}

impl<'a, S: FieldValuesSource> QueryAggregator<'a, S> {
    pub fn new(source: &'a S, params: QueryParams) -> Self {
        Self { source, params }
    }

    /// Full round trip for a single sponsor.
    pub async fn query_sponsor(&self, sponsor: &str) -> Result<SponsorReport> {
        let expression =
            build_filter_expression(sponsor, &self.params.status, &self.params.location);
        debug!("Expression for {}: {}", sponsor, expression.as_str());

        let entries = self
            .source
            .fetch_field_values(&expression, self.params.field)
            .await?;
        debug!("{} returned {} field values", sponsor, entries.len());

        let result = aggregate(&entries, self.params.field)?;

        Ok(SponsorReport {
            sponsor: sponsor.to_string(),
            field: self.params.field,
            status: self.params.status.clone(),
            location: self.params.location.clone(),
            result,
            queried_at: Utc::now(),
        })
    }

    /// Process every sponsor in order, writing each record as it completes.
    ///
    /// Without `keep_going` the first query failure is returned and nothing
    /// is written for that sponsor. Output failures always abort.
    pub async fn run<W: Write>(
        &self,
        sponsors: &[String],
        writer: &mut RecordWriter<W>,
        options: RunOptions,
    ) -> Result<RunSummary> {
        let progress = progress_bar(sponsors.len(), options.show_progress);
        let mut summary = RunSummary::default();

        for sponsor in sponsors {
            progress.set_message(sponsor.clone());
            info!("Querying {} for {}", self.params.field, sponsor);

            match self.query_sponsor(sponsor).await {
                Ok(report) => {
                    writer.write_record(&report)?;
                    summary.succeeded += 1;
                }
                Err(e) if options.keep_going => {
                    error!("Skipping {}: {}", sponsor, e);
                    summary.failed.push((sponsor.clone(), e));
                }
                Err(e) => {
                    progress.abandon();
                    return Err(e);
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(summary)
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
