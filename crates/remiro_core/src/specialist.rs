//! Specialist roles and output keys.

use serde::{Deserialize, Serialize};

/// Identifier the router uses to request the enrichment step.
pub const ENRICHMENT_ID: &str = "web_searcher";

/// The closed set of specialist roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialist {
    CoreIdentityArchitect,
    PurposeMotivationNavigator,
    GrandStrategyDirector,
    CapabilityGrowthEngineer,
    WorkplaceDynamicsCoach,
    ChiefMarketingOfficer,
}

impl Specialist {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialist::CoreIdentityArchitect => "core_identity_architect",
            Specialist::PurposeMotivationNavigator => "purpose_motivation_navigator",
            Specialist::GrandStrategyDirector => "grand_strategy_director",
            Specialist::CapabilityGrowthEngineer => "capability_growth_engineer",
            Specialist::WorkplaceDynamicsCoach => "workplace_dynamics_coach",
            Specialist::ChiefMarketingOfficer => "chief_marketing_officer",
        }
    }

    /// Label used when a specialist's output is shown to other units.
    pub fn label(&self) -> &'static str {
        match self {
            Specialist::CoreIdentityArchitect => "Core Identity Architect",
            Specialist::PurposeMotivationNavigator => "Purpose Navigator",
            Specialist::GrandStrategyDirector => "Strategy Director",
            Specialist::CapabilityGrowthEngineer => "Capability Engineer",
            Specialist::WorkplaceDynamicsCoach => "Dynamics Coach",
            Specialist::ChiefMarketingOfficer => "Chief Marketing Officer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Specialist::CoreIdentityArchitect => "Personality, strengths and cognitive style",
            Specialist::PurposeMotivationNavigator => "Interests, values and meaning in work",
            Specialist::GrandStrategyDirector => "Long-term vision, constraints and roadmaps",
            Specialist::CapabilityGrowthEngineer => "Skill gaps, learning styles and study plans",
            Specialist::WorkplaceDynamicsCoach => "Culture, politics, burnout and soft skills",
            Specialist::ChiefMarketingOfficer => "Resumes, LinkedIn, pitches and interviews",
        }
    }

    /// Parse a router identifier. Returns `None` outside the vocabulary.
    pub fn parse(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|s| s.as_str() == id.trim())
    }

    pub fn all() -> Vec<Self> {
        vec![
            Specialist::CoreIdentityArchitect,
            Specialist::PurposeMotivationNavigator,
            Specialist::GrandStrategyDirector,
            Specialist::CapabilityGrowthEngineer,
            Specialist::WorkplaceDynamicsCoach,
            Specialist::ChiefMarketingOfficer,
        ]
    }
}

impl std::fmt::Display for Specialist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key under which an output is recorded in the turn state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum OutputSource {
    Enrichment,
    Specialist(Specialist),
}

impl OutputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSource::Enrichment => ENRICHMENT_ID,
            OutputSource::Specialist(s) => s.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutputSource::Enrichment => "Web Searcher",
            OutputSource::Specialist(s) => s.label(),
        }
    }
}

impl std::fmt::Display for OutputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_role() {
        for specialist in Specialist::all() {
            assert_eq!(Specialist::parse(specialist.as_str()), Some(specialist));
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_enrichment() {
        assert_eq!(Specialist::parse("astrologer"), None);
        assert_eq!(Specialist::parse(ENRICHMENT_ID), None);
        assert_eq!(Specialist::parse(""), None);
    }

    #[test]
    fn test_vocabulary_size() {
        assert_eq!(Specialist::all().len(), 6);
    }

    #[test]
    fn test_output_source_names() {
        assert_eq!(OutputSource::Enrichment.as_str(), "web_searcher");
        assert_eq!(
            OutputSource::Specialist(Specialist::GrandStrategyDirector).label(),
            "Strategy Director"
        );
    }
}
