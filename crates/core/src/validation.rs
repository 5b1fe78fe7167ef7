//! Input rules shared by the API and the session shell.
//!
//! Messages on [`ValidationError`] are client facing and are returned
//! verbatim in the `error` field of a 400 response.

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const NICKNAME_MIN_CHARS: usize = 3;
pub const NICKNAME_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("File too large")]
    FileTooLarge,
    #[error("Invalid file type")]
    InvalidFileType,
    #[error("User id is required")]
    MissingUserId,
    #[error("Nickname must be between 3 and 20 characters")]
    NicknameLength,
    #[error("Nickname can only contain letters, numbers, and spaces")]
    NicknameCharacters,
}

/// Checks a display name: 3 to 20 characters of ASCII letters, digits and
/// spaces. Length is checked before the character set.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    let len = nickname.chars().count();
    if !(NICKNAME_MIN_CHARS..=NICKNAME_MAX_CHARS).contains(&len) {
        return Err(ValidationError::NicknameLength);
    }
    if !nickname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ')
    {
        return Err(ValidationError::NicknameCharacters);
    }
    Ok(())
}

/// Checks an upload against the size cap and its declared MIME type.
/// The payload itself is never inspected.
pub fn validate_upload(size: usize, declared_mime: &str) -> Result<(), ValidationError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge);
    }
    if !declared_mime.starts_with("image/") {
        return Err(ValidationError::InvalidFileType);
    }
    Ok(())
}
