use thiserror::Error;

/// Prompt-injection indicator phrases. Matched as case-insensitive
/// substrings of the trimmed input; deliberately literal so rejections
/// stay explainable.
const INJECTION_PHRASES: &[&str] = &[
    "ignore previous instructions",
    "reveal system prompt",
    "developer message",
    "print the hidden",
];

/// Guard rejections are user-facing: the error display text is exactly
/// what the assistant says back.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("Please enter a question.")]
    EmptyInput,
    #[error("Input too long. Max allowed is {max} characters.")]
    TooLong { max: usize },
    #[error("I can't process that request.")]
    PolicyRefusal,
}

/// Syntactic validation in front of everything else. Deterministic and
/// total: always returns, never blocks.
pub fn validate_user_input(input: &str, max_chars: usize) -> Result<(), GuardError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(GuardError::EmptyInput);
    }

    if trimmed.chars().count() > max_chars {
        return Err(GuardError::TooLong { max: max_chars });
    }

    let lower = trimmed.to_ascii_lowercase();
    if INJECTION_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return Err(GuardError::PolicyRefusal);
    }

    Ok(())
}
