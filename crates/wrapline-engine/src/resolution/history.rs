// Human readable rendering of resolution history

use super::{ResolutionStep, UriPackageOrWrapper};

/// Flatten a step history into one line per step.
///
/// Nested sub-histories are indented by two spaces per level. `depth` limits
/// how many nested levels are rendered; `None` renders all of them.
pub fn build_clean_uri_history(history: &[ResolutionStep], depth: Option<usize>) -> Vec<String> {
    let mut lines = Vec::new();
    render(history, depth, 0, &mut lines);
    lines
}

fn render(history: &[ResolutionStep], depth: Option<usize>, level: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(level);
    for step in history {
        let outcome = match &step.result {
            Ok(UriPackageOrWrapper::Redirect(uri)) => format!("uri ({uri})"),
            Ok(UriPackageOrWrapper::Package { uri, .. }) => format!("package ({uri})"),
            Ok(UriPackageOrWrapper::Wrapper { uri, .. }) => format!("wrapper ({uri})"),
            Err(err) => format!("error ({err})"),
        };
        let line = match &step.description {
            Some(description) => format!("{indent}{} => {description} => {outcome}", step.source_uri),
            None => format!("{indent}{} => {outcome}", step.source_uri),
        };
        lines.push(line);

        let within_depth = depth.map_or(true, |max| level < max);
        if within_depth && !step.sub_history.is_empty() {
            render(&step.sub_history, depth, level + 1, lines);
        }
    }
}
