use crate::application::JobReport;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    title: &'a str,
    company: &'a str,
    worker: &'a str,
    status: String,
    agreed_price: String,
    confirmed: String,
    unconfirmed: String,
    remaining: String,
}

impl<'a> From<&'a JobReport> for ReportRow<'a> {
    fn from(report: &'a JobReport) -> Self {
        Self {
            title: &report.job.title,
            company: &report.company_email,
            worker: &report.worker_email,
            status: report.job.status.to_string(),
            agreed_price: report.summary.agreed_price.to_string(),
            confirmed: report.summary.total_confirmed.to_string(),
            unconfirmed: report.summary.total_unconfirmed.to_string(),
            remaining: report.summary.remaining.to_string(),
        }
    }
}

/// Writes the per-job ledger report as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes a header followed by one row per job, then flushes.
    pub fn write_report(&mut self, report: &[JobReport]) -> Result<()> {
        if report.is_empty() {
            self.writer.write_record([
                "title",
                "company",
                "worker",
                "status",
                "agreed_price",
                "confirmed",
                "unconfirmed",
                "remaining",
            ])?;
        }
        for job in report {
            self.writer.serialize(ReportRow::from(job))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
