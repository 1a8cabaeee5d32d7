use std::fmt::Write;

use crate::models::job::JobRecord;

/// Renders jobs as a markdown report, numbered in the order given.
pub fn format_job_report(jobs: &[JobRecord]) -> String {
    if jobs.is_empty() {
        return "No jobs found matching your criteria.".to_string();
    }

    let mut report = String::from("# Available Job Opportunities\n\n");
    for (i, job) in jobs.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = write!(
            report,
            "## {}. {}\n\
             **Company:** {}\n\
             **Location:** {}\n\
             **Type:** {}\n\
             **Salary:** {}\n\
             **Posted:** {}\n\
             **Description:** {}\n\
             **Apply here:** {}\n\n\
             ---\n\n",
            i + 1,
            job.title,
            job.company,
            job.location,
            job.employment_type,
            job.salary,
            job.posting_date,
            job.description,
            job.url,
        );
    }
    report
}
