//! Prompt construction for the content service.

use deck_core::GenerationConfig;

/// Upper bound on source characters forwarded to the service, to stay within
/// request size limits.
pub const MAX_SOURCE_CHARS: usize = 30_000;

/// Return at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_source(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Build the single instruction sent to the content service.
///
/// The config's template and title image are deliberately absent: they only
/// matter once the result is merged into a presentation.
pub fn build_prompt(text: &str, config: &GenerationConfig) -> String {
    let source = truncate_source(text, MAX_SOURCE_CHARS);
    if source.len() < text.len() {
        log::debug!(
            "Source text truncated to {} characters for the prompt",
            MAX_SOURCE_CHARS
        );
    }

    format!(
        "You are an expert presentation designer. Turn the document below into a slide deck.\n\
         \n\
         Requirements:\n\
         - Target audience: {audience}.\n\
         - Level of detail: {detail}.\n\
         - Create approximately {slides} content slides, not counting the title slide.\n\
         - Give the deck a clear title and, if useful, a one-line subtitle.\n\
         - Each slide needs a short title, 3 to 5 bullet points and speaker notes \
           that the presenter can read aloud.\n\
         - Only use information found in the document.\n\
         \n\
         Document:\n\
         \"\"\"\n\
         {source}\n\
         \"\"\"",
        audience = config.audience.describe(),
        detail = config.detail_level.describe(),
        slides = config.num_slides,
        source = source,
    )
}
