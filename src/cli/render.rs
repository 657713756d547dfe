use crate::error::{Effect, Error};
use crate::search::{SearchError, SearchResult, WorkerExit};

pub fn success_line(result: &SearchResult) -> String {
    format!(
        "success! the lucky short sha is {} (worker {}, {}, attempt {})",
        result.candidate,
        result.worker,
        result.location.display(),
        result.ordinal
    )
}

/// Human lines for a failed run; aggregated failures get one line each.
pub fn error_lines(err: &Error) -> Vec<String> {
    let mut lines = vec![err.to_string()];
    match err {
        Error::Search(SearchError::AllWorkersFailed { failures }) => {
            lines.extend(failures.iter().map(|failure| format!("  {failure}")));
        }
        Error::Search(SearchError::Exhausted { reports }) => {
            lines.extend(reports.iter().map(|report| {
                let detail = match &report.exit {
                    WorkerExit::Failed(failure) => failure.to_string(),
                    other => format!("{:?}", other.state()).to_lowercase(),
                };
                format!(
                    "  worker {}: {} after {} attempts",
                    report.worker, detail, report.attempts
                )
            }));
        }
        Error::Search(SearchError::Persist { result, .. }) => {
            lines.push(format!("  {}", success_line(result)));
        }
        _ => {}
    }
    if err.effect() != Effect::None {
        lines.push(format!(
            "  side effects: {} (replicas or files may have changed)",
            err.effect().as_str()
        ));
    }
    if err.transience().is_retryable() {
        lines.push("  retrying may succeed".to_string());
    }
    lines
}
