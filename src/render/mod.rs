// src/render/mod.rs
pub mod card;
pub mod fields;

pub use card::{JobCard, SummaryPanel};
pub use fields::{
    deadline_instant, extracted_field_count, format_deadline, format_processed_time, format_salary,
    is_deadline_urgent, is_deadline_urgent_at, normalize_application_url, parse_deadline,
    ApplicationLink,
};
