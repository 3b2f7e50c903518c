use serde::{Deserialize, Serialize};

/// Shape of a retrieval query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalQuery {
    pub text: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_true")]
    pub include_personal: bool,
    #[serde(default = "default_true")]
    pub include_collective: bool,
    pub limit: usize,
    pub min_score: f64,
    pub good_behaviour_bias: f64,
}

fn default_true() -> bool {
    true
}

impl RetrievalQuery {
    pub fn new(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            user_id: None,
            include_personal: true,
            include_collective: true,
            limit,
            min_score: 0.0,
            good_behaviour_bias: 0.0,
        }
    }
}
