use regex::Regex;

/// Deterministic instruction prompt demanding strict JSON with exactly the
/// six summary fields and nothing around it.
pub fn build_prompt(transcript: &str) -> String {
    format!(
        r#"You are an expert assistant for analyzing technical support calls.

CRITICAL INSTRUCTIONS:
- Extract 100% of the relevant information from the text
- Do NOT invent, infer or add data that is not explicitly mentioned
- Stay absolutely faithful to the original content
- If a section has no specific information, return an empty array []
- Be exhaustive with technical details, equipment names, numbers, configurations and statistics

CALL TRANSCRIPT:
{transcript}

RESPONSE FORMAT (strict JSON):
{{
    "overview": "Concise description of the call without losing technical context",
    "client_requirements": ["Exact list of what the client requests"],
    "technical_details": ["Technical specifications, configurations, parameters mentioned"],
    "equipment_models": ["Exact hardware/software names, models, versions mentioned"],
    "usage_metrics": ["Quantitative data, statistics, numbers, percentages cited"],
    "recommended_actions": ["Specific steps suggested or discussed during the call"]
}}

RESPOND ONLY WITH THE JSON, NO ADDITIONAL TEXT."#
    )
}

/// Fixed prompt for the connectivity probe.
pub const PROBE_PROMPT: &str = "Respond only: OK";

/// Pulls the JSON payload out of a raw model reply. Prefers a fenced
/// ```json block, then the first top-level `{...}` span, then the raw text
/// as-is. Models often wrap JSON in prose or markdown; this tolerates both.
pub fn extract_json_span(raw: &str) -> String {
    let raw = raw.trim();

    if let Some(fenced) = Regex::new(r"(?s)```json\s*(\{.*?\})\s*```")
        .ok()
        .and_then(|regex| regex.captures(raw))
        .and_then(|captures| captures.get(1))
    {
        return fenced.as_str().to_owned();
    }

    if let Some(span) = Regex::new(r"(?s)(\{.*\})")
        .ok()
        .and_then(|regex| regex.captures(raw))
        .and_then(|captures| captures.get(1))
    {
        return span.as_str().to_owned();
    }

    raw.to_owned()
}

#[cfg(test)]
mod tests {
    use super::{build_prompt, extract_json_span};

    #[test]
    fn prompt_embeds_transcript_and_all_six_fields() {
        let prompt = build_prompt("Router disconnects every 2 hours");
        assert!(prompt.contains("Router disconnects every 2 hours"));
        for field in [
            "overview",
            "client_requirements",
            "technical_details",
            "equipment_models",
            "usage_metrics",
            "recommended_actions",
        ] {
            assert!(prompt.contains(field), "prompt missing {field}");
        }
        assert!(prompt.contains("Do NOT invent"));
        assert!(prompt.contains("empty array"));
    }

    #[test]
    fn prefers_fenced_json_block() {
        let raw = "Here is the result:\n```json\n{\"overview\": \"a\"}\n```\nthanks";
        assert_eq!(extract_json_span(raw), "{\"overview\": \"a\"}");
    }

    #[test]
    fn falls_back_to_first_brace_span() {
        let raw = "sure thing {\"overview\": \"a\", \"nested\": {\"x\": 1}} bye";
        assert_eq!(
            extract_json_span(raw),
            "{\"overview\": \"a\", \"nested\": {\"x\": 1}}"
        );
    }

    #[test]
    fn returns_raw_text_when_no_braces_found() {
        assert_eq!(extract_json_span("  no json here  "), "no json here");
    }

    #[test]
    fn fenced_block_spanning_multiple_lines_is_captured() {
        let raw = "```json\n{\n  \"overview\": \"a\",\n  \"list\": []\n}\n```";
        let span = extract_json_span(raw);
        assert!(span.starts_with('{') && span.ends_with('}'));
        assert!(span.contains("\"list\": []"));
    }
}
