// src/render/card.rs
use chrono::{DateTime, Local, Utc};
use std::fmt;

use super::fields::{
    extracted_field_count, format_deadline, format_processed_time, format_salary,
    is_deadline_urgent_at, normalize_application_url, ApplicationLink,
};
use crate::types::{Extraction, ExtractionResult, ExtractionSummary};
use crate::utils::format_megabytes;

/// Display-ready view of one extracted job notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCard {
    pub title: String,
    pub department: String,
    pub vacancies: String,
    pub salary: String,
    pub deadline: String,
    pub deadline_urgent: bool,
    pub application: ApplicationLink,
    pub eligibility: Option<String>,
    pub source_file: String,
}

impl JobCard {
    pub fn new(result: &ExtractionResult, source_file: &str, now: DateTime<Utc>) -> Self {
        let deadline = result.application_deadline.as_deref();
        Self {
            title: or_fallback(&result.job_title, "Job Title Not Available"),
            department: or_fallback(&result.department, "Department Not Specified"),
            vacancies: or_fallback(&result.vacancies, "N/A"),
            salary: format_salary(result.salary.as_deref()),
            deadline: format_deadline(deadline),
            deadline_urgent: is_deadline_urgent_at(deadline, now),
            application: normalize_application_url(result.application_url.as_deref()),
            eligibility: result
                .eligibility
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            source_file: if source_file.is_empty() {
                "Unknown".to_string()
            } else {
                source_file.to_string()
            },
        }
    }

    pub fn from_extraction(extraction: &Extraction, now: DateTime<Utc>) -> Self {
        Self::new(
            &extraction.data,
            &extraction.extraction_summary.file_name,
            now,
        )
    }
}

fn or_fallback(value: &Option<String>, fallback: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

impl fmt::Display for JobCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Government Job")?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "  {}", self.department)?;
        writeln!(f)?;
        writeln!(f, "  Vacancies : {}", self.vacancies)?;
        writeln!(f, "  Salary    : {}", self.salary)?;
        if self.deadline_urgent {
            writeln!(f, "  Deadline  : {}  ⚠️ Urgent", self.deadline)?;
        } else {
            writeln!(f, "  Deadline  : {}", self.deadline)?;
        }
        match &self.application {
            ApplicationLink::Absent => writeln!(f, "  Apply At  : {}", self.application.text())?,
            ApplicationLink::Link { text, href } => {
                writeln!(f, "  Apply At  : {} <{}>", text, href)?
            }
        }
        if let Some(eligibility) = &self.eligibility {
            writeln!(f)?;
            writeln!(f, "Eligibility Criteria")?;
            writeln!(f, "  {}", eligibility)?;
        }
        writeln!(f)?;
        write!(f, "Source: {}", self.source_file)
    }
}

/// Metadata panel shown under the job card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPanel {
    pub file_size: String,
    pub text_length: String,
    pub fields_extracted: usize,
    pub processed: String,
}

impl SummaryPanel {
    pub fn new(summary: &ExtractionSummary) -> Self {
        Self::with_processed(summary, format_processed_time(summary, &Local))
    }

    fn with_processed(summary: &ExtractionSummary, processed: String) -> Self {
        Self {
            file_size: format_megabytes(summary.file_size_bytes),
            text_length: format!("{} chars", summary.text_length),
            fields_extracted: extracted_field_count(summary),
            processed,
        }
    }
}

impl fmt::Display for SummaryPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extraction Summary")?;
        writeln!(f, "  File Size        : {}", self.file_size)?;
        writeln!(f, "  Text Length      : {}", self.text_length)?;
        writeln!(f, "  Fields Extracted : {}", self.fields_extracted)?;
        write!(f, "  Processed        : {}", self.processed)
    }
}
