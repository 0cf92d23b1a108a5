#![forbid(unsafe_code)]

/// Reserved name of the main thread. View index 0, never renamed, never deleted.
pub const MAIN_THREAD: &str = "main";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThreadName(String);

impl ThreadName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, ThreadNameError> {
        let value = value.into();
        validate_thread_name(&value)?;
        Ok(Self(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ThreadNameError {
    Empty,
    TooLong,
    ContainsControl,
}

impl ThreadNameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "thread name must not be empty",
            Self::TooLong => "thread name is too long",
            Self::ContainsControl => "thread name contains control characters",
        }
    }
}

fn validate_thread_name(value: &str) -> Result<(), ThreadNameError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ThreadNameError::Empty);
    }
    if trimmed.len() > 128 {
        return Err(ThreadNameError::TooLong);
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ThreadNameError::ContainsControl);
    }
    Ok(())
}
