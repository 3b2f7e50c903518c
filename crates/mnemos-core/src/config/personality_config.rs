//! Retrieval bias and tag-update learning rate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityConfig {
    pub good_behaviour_bias: f64,
    pub allow_disagreement: bool,
    pub trust_learning_rate: f64,
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            good_behaviour_bias: 0.3,
            allow_disagreement: true,
            trust_learning_rate: 0.05,
        }
    }
}
