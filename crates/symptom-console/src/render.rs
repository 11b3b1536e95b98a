use symptom_engine::aggregate::AggregatedResponse;
use symptom_engine::scorer::ScoredCandidate;

const RULE_WIDTH: usize = 50;

pub const DISCLAIMER: &str = "Note: This is a preliminary assessment based on symptom matching. \
Please consult a healthcare professional for accurate diagnosis and treatment.";

/// Text report: ranked conditions, then each recommendation list numbered
/// from 1, then the disclaimer.
pub fn render_report(candidates: &[ScoredCandidate], recommendations: &AggregatedResponse) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = section("Possible Conditions (based on symptom match)");
    for (i, candidate) in candidates.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} (Symptom Match: {}%)\n",
            i + 1,
            candidate.disease,
            format_score(candidate.score)
        ));
    }
    out.push_str(&format!("\n{rule}\n"));

    out.push_str(&numbered("Recommended Precautions", &recommendations.precautions));
    out.push_str(&numbered("Recommended Medications", &recommendations.medications));
    out.push_str(&numbered("Recommended Diet", &recommendations.diets));
    out.push_str(&numbered("Recommended Workouts", &recommendations.workouts));

    out.push_str(&format!("\n{rule}\n\n{DISCLAIMER}\n"));
    out
}

/// Always shows a fractional part: `120.0`, `35.71`.
fn format_score(score: f64) -> String {
    let text = score.to_string();
    if text.contains('.') || !score.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

fn section(title: &str) -> String {
    format!("\n================={title}==================\n")
}

fn numbered(title: &str, items: &[String]) -> String {
    let mut out = section(title);
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. {item}\n", i + 1));
    }
    out
}
