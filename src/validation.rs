//! Form field validation for signup and ads.
//!
//! Each validator returns the user-facing message of the first rule that fails.

const MAX_USERNAME_LEN: usize = 32;
const MIN_USERNAME_LEN: usize = 3;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_AD_TEXT_LEN: usize = 255;
const MAX_CONTACT_LEN: usize = 64;

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if len < MIN_USERNAME_LEN {
        return Err("Username must be at least 3 characters long");
    }
    if len > MAX_USERNAME_LEN {
        return Err("Username cannot be longer than 32 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username can only contain letters, numbers, and underscores");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    const INVALID: &str = "Invalid e-mail address";

    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(INVALID);
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(INVALID);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(INVALID);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(INVALID);
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(INVALID);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters long");
    }
    if len > MAX_PASSWORD_LEN {
        return Err("Password cannot be longer than 128 characters");
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err("Password must contain at least one letter and one number");
    }
    Ok(())
}

pub fn validate_ad_text(text: &str) -> Result<(), &'static str> {
    if !text.chars().any(|c| c.is_alphanumeric()) {
        return Err("The text must contain at least one alphanumeric character");
    }
    if text.chars().count() > MAX_AD_TEXT_LEN {
        return Err("The text cannot be longer than 255 characters");
    }
    Ok(())
}

pub fn validate_contact(contact: &str) -> Result<(), &'static str> {
    let len = contact.chars().count();
    if len == 0 || len > MAX_CONTACT_LEN || contact.chars().any(|c| c.is_control()) {
        return Err("The contact details are not valid");
    }
    Ok(())
}
