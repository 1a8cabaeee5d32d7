//! Job-board search adapters.
//!
//! The three boards share one code path: parse `"<query>[, <location>]"`, run the
//! board's scraper, normalize the listings into `JobRecord`s and keep the first
//! `MAX_RESULTS` in upstream order. A failed search is an empty result, never an error.

use serde_json::Value;
use tracing::{error, info, warn};

use crate::models::job::{text_at, JobRecord, NOT_SPECIFIED};
use crate::tools::search_client::{JobSearchService, SearchRequest};

pub const DEFAULT_LOCATION: &str = "Remote";
/// Listings kept per search. No re-ranking: these are the first ones returned.
pub const MAX_RESULTS: usize = 5;
/// Maximum description length in characters before the ellipsis.
pub const DESCRIPTION_LIMIT: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobBoard {
    LinkedIn,
    Indeed,
    Dice,
}

impl JobBoard {
    /// Prompt order.
    pub const ALL: [JobBoard; 3] = [JobBoard::LinkedIn, JobBoard::Indeed, JobBoard::Dice];

    pub fn actor_id(self) -> &'static str {
        match self {
            JobBoard::LinkedIn => "krandiash/linkedin-jobs-scraper",
            JobBoard::Indeed => "krandiash/indeed-scraper",
            JobBoard::Dice => "mohamedgb00714/dicecom-job-scraper",
        }
    }

    pub fn tool_name(self) -> &'static str {
        match self {
            JobBoard::LinkedIn => "search_linkedin_jobs",
            JobBoard::Indeed => "search_indeed_jobs",
            JobBoard::Dice => "search_dice_jobs",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            JobBoard::LinkedIn => {
                "Search for jobs on LinkedIn. Input format: 'job title, location'"
            }
            JobBoard::Indeed => "Search for jobs on Indeed. Input format: 'job title, location'",
            JobBoard::Dice => "Search for jobs on Dice. Input format: 'job title, location'",
        }
    }
}

/// A parsed `"<query>[, <location>]"` tool input.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub location: String,
}

/// Splits the tool input on commas: the first segment is the query, the second
/// (if any) the location. Further segments are ignored.
pub fn parse_search_input(input: &str) -> SearchQuery {
    let mut parts = input.split(',');
    let query = parts.next().unwrap_or_default().trim().to_string();
    let location = match parts.next() {
        Some(location) => location.trim().to_string(),
        None => DEFAULT_LOCATION.to_string(),
    };
    SearchQuery { query, location }
}

/// Runs one board search end to end. Never fails: errors are logged and yield no jobs.
pub async fn search_jobs(
    service: &dyn JobSearchService,
    board: JobBoard,
    input: &str,
    limit: u32,
) -> Vec<JobRecord> {
    let SearchQuery { query, location } = parse_search_input(input);
    info!(
        "Searching {} for '{}' in '{}'",
        board.tool_name(),
        query,
        location
    );

    let request = SearchRequest {
        query,
        location,
        limit,
    };
    match service.run_search(board.actor_id(), &request).await {
        Ok(items) => normalize_listings(&items),
        Err(e) => {
            error!("Job search failed for {}: {e}", board.actor_id());
            Vec::new()
        }
    }
}

/// Normalizes raw scraper items, skipping unusable ones, and keeps the first `MAX_RESULTS`.
pub fn normalize_listings(items: &[Value]) -> Vec<JobRecord> {
    items
        .iter()
        .filter_map(|item| {
            let job = normalize_listing(item);
            if job.is_none() {
                warn!("Skipping job listing that is not an object: {item}");
            }
            job
        })
        .take(MAX_RESULTS)
        .collect()
}

pub fn normalize_listing(item: &Value) -> Option<JobRecord> {
    if !item.is_object() {
        return None;
    }

    let trimmed = |path: &[&str]| {
        text_at(item, path)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    Some(JobRecord {
        title: trimmed(&["title"]),
        company: trimmed(&["companyName"]),
        location: trimmed(&["jobLocation", "displayName"]),
        posting_date: text_at(item, &["postedDate"]).unwrap_or_default(),
        employment_type: text_at(item, &["employmentType"]).unwrap_or_default(),
        salary: text_at(item, &["salary"]).unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        description: text_at(item, &["summary"])
            .map(|s| truncate_description(&s))
            .unwrap_or_default(),
        url: text_at(item, &["detailsPageUrl"]).unwrap_or_default(),
        is_remote: item
            .get("isRemote")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

/// First `DESCRIPTION_LIMIT` characters of a present summary, always followed by "...".
fn truncate_description(summary: &str) -> String {
    let mut out: String = summary.chars().take(DESCRIPTION_LIMIT).collect();
    out.push_str("...");
    out
}
