use async_trait::async_trait;

use crate::error::GenerateError;

/// Produces an answer to `question` grounded in `context`.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerateError>;
}

pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a study assistant. Answer the question using the course material below.\n\
         If the material does not cover the question, say so and answer from general knowledge.\n\n\
         Course material:\n{context}\n\n\
         Question: {question}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_question_and_context() {
        let p = build_prompt("What is TCP?", "TCP is reliable.");
        assert!(p.contains("Question: What is TCP?"));
        assert!(p.contains("TCP is reliable."));
    }
}
