//! Specialist registry.
//!
//! The classifier works against a fixed roster of named specialists. Each
//! roster entry is a tagged enum variant; unknown wire names resolve to a
//! descriptive "no implementation" response at dispatch time instead of an
//! error.

use crate::specialist::{LlmSpecialist, SpecialistAgent};
use agrimind_llm::LlmClient;
use std::collections::HashMap;
use std::sync::Arc;

/// The fixed roster of specialist roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    CropRecommender,
    WeatherForecast,
    LocationAssistant,
    News,
    CreditPolicyMarket,
    FertilizerRecommender,
    CropYield,
    PestPrediction,
    RiskManagement,
    CropDiseaseDetection,
    MarketPrice,
    Translation,
    ImageAnalysis,
}

impl AgentKind {
    /// All roster entries, in roster order.
    pub const ALL: [AgentKind; 13] = [
        AgentKind::CropRecommender,
        AgentKind::WeatherForecast,
        AgentKind::LocationAssistant,
        AgentKind::News,
        AgentKind::CreditPolicyMarket,
        AgentKind::FertilizerRecommender,
        AgentKind::CropYield,
        AgentKind::PestPrediction,
        AgentKind::RiskManagement,
        AgentKind::CropDiseaseDetection,
        AgentKind::MarketPrice,
        AgentKind::Translation,
        AgentKind::ImageAnalysis,
    ];

    /// Wire name used by the classifier.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CropRecommender => "CropRecommenderAgent",
            Self::WeatherForecast => "WeatherForecastAgent",
            Self::LocationAssistant => "LocationAgriAssistant",
            Self::News => "NewsAgent",
            Self::CreditPolicyMarket => "CreditPolicyMarketAgent",
            Self::FertilizerRecommender => "FertilizerRecommenderAgent",
            Self::CropYield => "CropYieldAgent",
            Self::PestPrediction => "PestPredictionAgent",
            Self::RiskManagement => "RiskManagementAgent",
            Self::CropDiseaseDetection => "CropDiseaseDetectionAgent",
            Self::MarketPrice => "MarketPriceAgent",
            Self::Translation => "TranslationAgent",
            Self::ImageAnalysis => "ImageAnalysisAgent",
        }
    }

    /// Resolve a wire name to a roster entry.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// One-line capability description for the classifier roster.
    pub fn description(&self) -> &'static str {
        match self {
            Self::CropRecommender => {
                "Recommends best crops for a location and season based on soil, climate, \
                 rainfall, and market context."
            }
            Self::WeatherForecast => {
                "Provides weather forecasts, monsoon updates, crop impact analysis, and \
                 advisories for agricultural planning."
            }
            Self::LocationAssistant => {
                "Handles location-based queries, logistics, mapping, farm contacts, \
                 agri-businesses, and transit options."
            }
            Self::News => {
                "Extracts and summarizes recent agricultural news articles, policies, and \
                 events for any location or topic."
            }
            Self::CreditPolicyMarket => {
                "Analyzes market trends, credit policies, risk assessment, and financial \
                 guidance for agricultural finance."
            }
            Self::FertilizerRecommender => {
                "Recommends optimal fertilizers for crops based on soil, climate, crop \
                 type, and nutrient levels."
            }
            Self::CropYield => {
                "Predicts crop yield for specific crops, locations, and seasons using \
                 historical and real-time data."
            }
            Self::PestPrediction => {
                "Detects pests in crop images and recommends appropriate treatments."
            }
            Self::RiskManagement => {
                "Assesses agricultural risk profiles for commodities, including market, \
                 weather, financial, and operational risks."
            }
            Self::CropDiseaseDetection => {
                "Detects diseases in crop leaf images and provides identification and \
                 management advice."
            }
            Self::MarketPrice => {
                "Fetches latest market prices for commodities in specific states, \
                 districts, or markets."
            }
            Self::Translation => {
                "Translates agricultural documents, queries, and policies between \
                 languages, including code-switched queries."
            }
            Self::ImageAnalysis => "Describes the content of an attached image.",
        }
    }

    /// Role instruction used by the generic LLM specialist.
    pub fn role_prompt(&self) -> &'static str {
        match self {
            Self::CropRecommender => {
                "You are a crop recommendation expert. Given a location, season, and soil \
                 conditions, recommend suitable crops with brief, actionable reasoning."
            }
            Self::WeatherForecast => {
                "You are an agricultural weather analyst. Provide forecasts and crop \
                 impact advisories for the asked location and timeframe."
            }
            Self::LocationAssistant => {
                "You are a location-aware agricultural assistant. Answer logistics, \
                 mapping, and local agri-business questions."
            }
            Self::News => {
                "You are an agricultural news summarizer. Summarize the most relevant \
                 recent news, policies, and events for the asked topic."
            }
            Self::CreditPolicyMarket => {
                "You are an agricultural finance analyst. Analyze market trends, credit \
                 policies, and financial risk, and give strategic recommendations."
            }
            Self::FertilizerRecommender => {
                "You are a fertilizer recommendation expert. Recommend fertilizers and \
                 application schedules for the asked crop, soil, and climate."
            }
            Self::CropYield => {
                "You are a crop yield analyst. Estimate yields for the asked crop, \
                 location, and season, stating your assumptions."
            }
            Self::PestPrediction => {
                "You are a pest management expert. Identify likely pests from the \
                 description or attached image reference and recommend treatments."
            }
            Self::RiskManagement => {
                "You are an agricultural risk analyst. Assess market, weather, financial, \
                 and operational risks for the asked commodity or operation."
            }
            Self::CropDiseaseDetection => {
                "You are a plant pathology expert. Identify likely crop diseases from the \
                 description or attached image reference and advise on management."
            }
            Self::MarketPrice => {
                "You are a commodity market reporter. Report the latest known market \
                 prices and trends for the asked commodity and region."
            }
            Self::Translation => {
                "You are a multilingual agricultural translator. Translate the query or \
                 document faithfully, preserving domain terminology."
            }
            Self::ImageAnalysis => {
                "You are an image analyst. Describe the content of the attached image \
                 reference in agricultural terms."
            }
        }
    }

    /// Whether this role consumes an attached image.
    pub fn image_capable(&self) -> bool {
        matches!(
            self,
            Self::PestPrediction | Self::CropDiseaseDetection | Self::ImageAnalysis
        )
    }
}

/// Registry mapping wire names to specialist implementations.
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn SpecialistAgent>>,
}

impl AgentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    /// Build the full default roster of LLM-backed specialists.
    pub fn with_default_specialists(client: Arc<dyn LlmClient>, model: &str) -> Self {
        let mut registry = Self::new();

        for kind in AgentKind::ALL {
            registry.register(Arc::new(LlmSpecialist::new(kind, client.clone(), model)));
        }

        registry
    }

    /// Register a specialist under its own name.
    pub fn register(&mut self, agent: Arc<dyn SpecialistAgent>) {
        self.agents.insert(agent.name().to_string(), agent);
    }

    /// Look up a specialist by wire name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SpecialistAgent>> {
        self.agents.get(name).cloned()
    }

    /// Registered wire names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered specialists.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Roster text for the classifier prompt: one "name: description" line
    /// per registered roster entry.
    pub fn roster_description(&self) -> String {
        AgentKind::ALL
            .iter()
            .filter(|kind| self.agents.contains_key(kind.name()))
            .map(|kind| format!("- {}: {}", kind.name(), kind.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
