use anyhow::{Context, Result};
use log::info;

/// Fixed results target
pub const RESULTS_TARGET: &str = "results";
/// Form field carrying the comma-separated zone codes
pub const ZONES_FIELD: &str = "zones";

/// Selected zone codes bound for the results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub target: &'static str,
    pub zones: String,
}

impl Submission {
    /// Join codes in the given order; an empty selection gives an empty token
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let zones = codes
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            target: RESULTS_TARGET,
            zones,
        }
    }

    pub fn fields(&self) -> [(&'static str, &str); 1] {
        [(ZONES_FIELD, self.zones.as_str())]
    }

    /// Printable form of the submission, `results?zones=...`
    pub fn describe(&self) -> String {
        format!("{}?{}={}", self.target, ZONES_FIELD, self.zones)
    }
}

/// Receives the submission when the user asks for results
pub trait ResultsSink {
    fn submit(&mut self, submission: Submission);
}

/// Holds the submission until the map session ends and the terminal has
/// been handed back, since delivery navigates away from the map
#[derive(Debug, Default)]
pub struct PendingNavigation {
    submission: Option<Submission>,
}

impl PendingNavigation {
    pub fn take(&mut self) -> Option<Submission> {
        self.submission.take()
    }
}

impl ResultsSink for PendingNavigation {
    fn submit(&mut self, submission: Submission) {
        self.submission = Some(submission);
    }
}

/// POST the form to `<endpoint>/results` and return the response body, or
/// just describe the submission when no endpoint is configured
pub fn deliver(submission: &Submission, endpoint: Option<&str>) -> Result<String> {
    let Some(endpoint) = endpoint else {
        return Ok(submission.describe());
    };

    let url = format!("{}/{}", endpoint.trim_end_matches('/'), submission.target);
    info!("Posting {} zone codes to {url}", submission.zones.split(',').filter(|c| !c.is_empty()).count());

    let response = reqwest::blocking::Client::new()
        .post(&url)
        .form(&submission.fields())
        .send()
        .with_context(|| format!("Failed to post results form to {url}"))?
        .error_for_status()
        .with_context(|| format!("Results page {url} rejected the submission"))?;

    response
        .text()
        .with_context(|| format!("Failed to read response from {url}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_joined_in_order() {
        let submission = Submission::from_codes(["E01004736", "E01004731", "E01004732"]);
        assert_eq!(submission.target, "results");
        assert_eq!(submission.zones, "E01004736,E01004731,E01004732");
        assert_eq!(submission.fields(), [("zones", "E01004736,E01004731,E01004732")]);
    }

    #[test]
    fn test_empty_selection_submits_empty_token() {
        let submission = Submission::from_codes(Vec::<String>::new());
        assert_eq!(submission.zones, "");
        assert_eq!(submission.describe(), "results?zones=");
    }

    #[test]
    fn test_pending_navigation() {
        let mut sink = PendingNavigation::default();
        assert!(sink.take().is_none());
        sink.submit(Submission::from_codes(["A"]));
        assert_eq!(sink.take().unwrap().zones, "A");
        assert!(sink.take().is_none());
    }

    #[test]
    fn test_deliver_without_endpoint_describes() {
        let submission = Submission::from_codes(["A", "B"]);
        assert_eq!(deliver(&submission, None).unwrap(), "results?zones=A,B");
    }
}
