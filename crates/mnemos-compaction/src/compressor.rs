//! Builds the LLM prompt for one cluster and parses its reply.

use mnemos_core::errors::CompactionError;
use mnemos_core::models::Memory;
use mnemos_core::traits::{ChatMessage, ChatRequest, LlmClient};

/// Result of compressing one cluster: new content and the union of concept
/// tags the model chose to keep.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedCluster {
    pub content: String,
    pub concept_tags: Vec<String>,
}

/// Sends the cluster (oldest first) to the LLM and parses a reply of the
/// form `<compressed text>\n---\ntags: a, b, c`.
pub async fn compress_cluster(
    llm: &dyn LlmClient,
    cluster: &[Memory],
) -> Result<CompressedCluster, CompactionError> {
    let request = build_request(cluster);
    let raw = llm
        .chat(request)
        .await
        .map_err(|e| CompactionError::CompressorFormatError(e.to_string()))?;
    parse_reply(&raw)
}

fn build_request(cluster: &[Memory]) -> ChatRequest {
    let mut sorted: Vec<&Memory> = cluster.iter().collect();
    sorted.sort_by_key(|m| m.created_at);

    let body = sorted
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut tags: Vec<String> = sorted.iter().flat_map(|m| m.concept_tags.clone()).collect();
    tags.sort();
    tags.dedup();

    let system = ChatMessage::system(
        "Merge the following memories into one concise record that preserves every fact worth \
         keeping. Reply with the compressed text, then a line of exactly `---`, then a line \
         `tags: a, b, c` listing the concept tags still relevant (a subset of the ones given).",
    );
    let user = ChatMessage::user(format!("{body}\n\n(existing tags: {})", tags.join(", ")));
    ChatRequest::new(vec![system, user])
}

fn parse_reply(raw: &str) -> Result<CompressedCluster, CompactionError> {
    let (content, tags_section) = raw
        .split_once("\n---\n")
        .or_else(|| raw.split_once("---"))
        .ok_or_else(|| CompactionError::CompressorFormatError("missing '---' separator".to_string()))?;

    let content = content.trim();
    if content.is_empty() {
        return Err(CompactionError::CompressorFormatError("empty compressed content".to_string()));
    }

    let tags_line = tags_section
        .lines()
        .find_map(|line| line.trim().strip_prefix("tags:"))
        .ok_or_else(|| CompactionError::CompressorFormatError("missing 'tags:' line".to_string()))?;

    let concept_tags: Vec<String> = tags_line
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    Ok(CompressedCluster {
        content: content.to_string(),
        concept_tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_reply() {
        let raw = "Merged summary of the cluster.\n---\ntags: rust, testing";
        let reply = parse_reply(raw).unwrap();
        assert_eq!(reply.content, "Merged summary of the cluster.");
        assert_eq!(reply.concept_tags, vec!["rust".to_string(), "testing".to_string()]);
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = parse_reply("just some text with no separator").unwrap_err();
        assert!(matches!(err, CompactionError::CompressorFormatError(_)));
    }

    #[test]
    fn missing_tags_line_is_rejected() {
        let err = parse_reply("summary\n---\nno tags here").unwrap_err();
        assert!(matches!(err, CompactionError::CompressorFormatError(_)));
    }
}
