use crate::constants::*;

/// A message may be sent when it has non-blank text or at least one file.
pub fn validate_outgoing_message(text: &str, file_count: usize) -> Result<(), String> {
    let trimmed = text.trim();
    if trimmed.is_empty() && file_count == 0 {
        return Err("Message content cannot be empty unless files are attached".into());
    }
    if trimmed.len() > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}

/// Extension of a file name, lowercased, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    let ext = file_name.rsplit('.').next()?;
    if ext == file_name || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}
