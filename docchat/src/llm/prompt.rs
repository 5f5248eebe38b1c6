//! Grounding prompt assembly.

/// Build the prompt sent to the chat model: retrieved context first, then
/// instructions pinning the answer to that context, then the question.
pub fn build_prompt(context: &[String], question: &str) -> String {
    let context = context.join("\n\n");

    format!(
        "Act as an expert assistant that answers questions based on the information provided.\n\
         \n\
         CONTEXT:\n\
         {context}\n\
         \n\
         INSTRUCTIONS:\n\
         - Answer the question using only the information in the CONTEXT above.\n\
         - If the answer is not in the CONTEXT, say honestly that you cannot answer.\n\
         - Be concise and direct.\n\
         - Do not invent information.\n\
         \n\
         QUESTION: {question}\n\
         \n\
         ANSWER:"
    )
}
