use crate::config::RecommendationStrategy;
use crate::risk::{RiskFactor, RiskKind};

pub const STATIC_RECOMMENDATIONS: [&str; 3] = [
    "Focus on Enterprise deals older than 30 days",
    "Coach Rep under 20% win rate on objection handling",
    "Increase outreach to accounts with no activity in 60 days",
];

/// Advisory strings for the dashboard. Never empty.
pub fn recommendations(strategy: RecommendationStrategy, risks: &[RiskFactor]) -> Vec<String> {
    match strategy {
        RecommendationStrategy::Static => static_recommendations(),
        RecommendationStrategy::RiskDriven => {
            let derived = risk_driven(risks);
            if derived.is_empty() {
                static_recommendations()
            } else {
                derived
            }
        }
    }
}

fn static_recommendations() -> Vec<String> {
    STATIC_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect()
}

fn risk_driven(risks: &[RiskFactor]) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(stalled) = risks.iter().find(|r| r.kind == RiskKind::StalledPipeline) {
        out.push(format!(
            "Review the {} stalled deals and close out or re-qualify them",
            stalled.count.unwrap_or_default()
        ));
    }

    let reps: Vec<&str> = risks
        .iter()
        .filter(|r| r.kind == RiskKind::RepPerformance)
        .filter_map(|r| r.rep.as_deref())
        .collect();
    if !reps.is_empty() {
        out.push(format!(
            "Coach {} on objection handling to lift win rate",
            reps.join(", ")
        ));
    }

    out
}
