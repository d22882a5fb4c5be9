use crate::error::GenerationError;
use crate::generation::GenerativeModel;
use crate::models::RetrievedChunk;

/// Returned verbatim when retrieval comes back empty; no model call is made.
pub const NO_DOCUMENTS_MESSAGE: &str =
    "I don't have any documents indexed yet. Please upload some PDFs.";

const SYSTEM_INSTRUCTION: &str = "You are an expert AI Research Assistant. \
Answer the user's question based strictly on the provided Context below. \
If the answer is not in the context, say you don't know (or check arXiv if relevant). \
Always cite the source and page from the context metadata for every factual claim.";

/// `[Source: X, Page: Y]` header before each chunk, blank-line separated.
/// These headers are what the model is instructed to cite from.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "[Source: {}, Page: {}]\n{}",
                chunk.metadata.source, chunk.metadata.page, chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_prompt(context: &str, query: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {query}\n\nAnswer:")
}

/// Turns a retrieval result into a grounded answer via the generative model.
pub struct AnswerSynthesizer<G> {
    model: G,
}

impl<G: GenerativeModel + Sync> AnswerSynthesizer<G> {
    pub fn new(model: G) -> Self {
        Self { model }
    }

    pub async fn synthesize(
        &self,
        query: &str,
        retrieved: &[RetrievedChunk],
    ) -> Result<String, GenerationError> {
        if retrieved.is_empty() {
            return Ok(NO_DOCUMENTS_MESSAGE.to_string());
        }

        let context = build_context(retrieved);
        let prompt = build_prompt(&context, query);
        self.model.generate(SYSTEM_INSTRUCTION, &prompt).await
    }
}
