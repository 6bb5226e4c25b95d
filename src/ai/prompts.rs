/// Instruction template for document classification.
///
/// `{context_hint}` and `{categories}` are substituted by [`build_classification_prompt`].
pub const CLASSIFICATION_PROMPT: &str = r#"You are a personal file assistant. Analyze the image or document provided.
CONTEXT: {context_hint}

Extract the following fields into a pure JSON object (no markdown formatting):
{
  "doc_date": "YYYY-MM-DD",
  "entity": "Name of Vendor/Person/Organization",
  "category": "One of {categories}",
  "summary": "Very short 3-5 word description",
  "confidence": "High/Medium/Low"
}

RULES:
1. Be as specific as possible with the category (use 'Finance/Receipts' rather than 'Finance' when it fits)
2. For a bank activity CSV, credit card statement or multi-transaction spreadsheet, "entity" MUST be the bank or institution (e.g. "Chase", "Amex"), never a merchant from one row
3. Bank activity and statements belong in "Finance/Statements"
4. If the date is ambiguous, use the creation date or null
5. Keep "entity" clean: "Home Depot", not "THE HOME DEPOT INC"
6. Keep "summary" specific: "Paint Supplies", not "Shopping"
7. Raw transcripts or logs go in "Source_Material"
8. Notes, journals or summaries go in "PKM""#;

/// Fill the classification template
pub fn build_classification_prompt(context_hint: &str, categories: &str) -> String {
    CLASSIFICATION_PROMPT
        .replace("{context_hint}", context_hint)
        .replace("{categories}", categories)
}
