//! JSON output formatter

use super::RunResult;

pub fn format_runs(results: &[RunResult], dry_run: bool) -> String {
    let runs: Vec<serde_json::Value> = results
        .iter()
        .map(|(identifier, result)| match result {
            Ok(report) => serde_json::json!({
                "identifier": report.identifier,
                "severity": report.outcome.severity,
                "headline": report.outcome.headline,
                "message": report.outcome.message,
                "log_id": report.log_id,
            }),
            Err(e) => serde_json::json!({
                "identifier": identifier,
                "error": e.to_string(),
            }),
        })
        .collect();

    let output = serde_json::json!({
        "dry_run": dry_run,
        "runs": runs,
    });
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use relclean_core::{CleanupError, Outcome, RunReport, Severity};

    #[test]
    fn test_format_runs() {
        let results = vec![
            (
                "corruptRelations".to_string(),
                Ok(RunReport {
                    identifier: "corruptRelations".into(),
                    outcome: Outcome {
                        severity: Severity::Ok,
                        headline: "Cleanup".into(),
                        message: "done".into(),
                    },
                    log_id: Some(4),
                }),
            ),
            (
                "other".to_string(),
                Err(CleanupError::NotRegistered("other".into())),
            ),
        ];

        let value: serde_json::Value =
            serde_json::from_str(&format_runs(&results, false)).unwrap();
        assert_eq!(value["dry_run"], false);
        assert_eq!(value["runs"][0]["severity"], "ok");
        assert_eq!(value["runs"][0]["log_id"], 4);
        assert_eq!(
            value["runs"][1]["error"],
            "CleanupService with identifier \"other\" is not registered"
        );
    }
}
