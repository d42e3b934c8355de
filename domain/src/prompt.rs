use crate::models::ScoredChunk;

pub const COACH_TEMPLATE: &str = r#"You are an expert fitness coach trained in Menno Henselmans' evidence-based methodology. Answer client questions using your training expertise.

INSTRUCTIONS:
- Speak directly as a coach: "I recommend...", "You should...", "Based on the science..."
- Provide specific, actionable advice with numbers and protocols
- Base ALL answers strictly on the CONTEXT below (your training knowledge)
- Never mention "the course", "materials", or "according to..." - this is YOUR expertise
- If info isn't in context, say: "That's outside my specific area of expertise"
- Be confident but precise

YOUR TRAINING KNOWLEDGE:
{context}

CLIENT: {question}

YOUR ANSWER (as an expert coach):"#;

/// Chunk texts joined in retrieval order.
pub fn build_context(sources: &[ScoredChunk]) -> String {
    sources
        .iter()
        .map(|s| s.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_prompt(context: &str, question: &str) -> String {
    // Single pass so a `{question}` inside the context is not substituted.
    let (head, tail) = COACH_TEMPLATE
        .split_once("{context}")
        .unwrap_or((COACH_TEMPLATE, ""));
    format!("{head}{context}{}", tail.replace("{question}", question))
}
