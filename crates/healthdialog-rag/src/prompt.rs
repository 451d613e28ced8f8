use healthdialog_core::types::{CorpusEntry, Prompt};

pub const SYSTEM_PROMPT: &str = "You are a careful clinical information assistant. \
Answer the user's question using only the clinical FAQ excerpts provided as context. \
If the context does not contain enough information to answer, say that you do not have enough information instead of guessing. \
If the question describes a possible emergency, such as chest pain, difficulty breathing, or signs of a stroke (face drooping, arm weakness, slurred speech), \
tell the user to call emergency services or seek immediate medical care. \
Use plain, concise language and do not offer a diagnosis.";

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub fn context_block(entry: &CorpusEntry) -> String { format!("Q: {}\nA: {}", entry.question, entry.answer) }

/// Grounding prompt over the retained hits, in rank order.
pub fn build_prompt(query: &str, entries: &[&CorpusEntry]) -> Prompt {
    let context = entries.iter().map(|e| context_block(e)).collect::<Vec<_>>().join(CONTEXT_SEPARATOR);
    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user: format!("Context from the clinical FAQ:\n\n{context}\n\nUser question: {query}"),
    }
}
