use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Knowledge subset the inference service draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TopicFilter {
    #[default]
    Bents,
    ShopImprovement,
    ToolRecommendations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTopic(pub String);

impl fmt::Display for UnknownTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized topic filter: {}", self.0)
    }
}

impl std::error::Error for UnknownTopic {}

impl TopicFilter {
    pub const ALL: [TopicFilter; 3] = [
        TopicFilter::Bents,
        TopicFilter::ShopImprovement,
        TopicFilter::ToolRecommendations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TopicFilter::Bents => "bents",
            TopicFilter::ShopImprovement => "shop-improvement",
            TopicFilter::ToolRecommendations => "tool-recommendations",
        }
    }

    /// Menu label shown next to the filter toggle.
    pub fn label(self) -> &'static str {
        match self {
            TopicFilter::Bents => "All",
            TopicFilter::ShopImprovement => "Shop Improvement",
            TopicFilter::ToolRecommendations => "Tool Recommendations",
        }
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicFilter {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TopicFilter::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

// Stored records may carry tags from older deployments; those read back as the default.
impl From<String> for TopicFilter {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<TopicFilter> for String {
    fn from(value: TopicFilter) -> Self {
        value.as_str().to_string()
    }
}
