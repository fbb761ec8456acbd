use std::{error, fmt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Generic error type on fitting error.
///
/// We have to define a specific type because the generic dyn Error is not Sync, so it can't be used
/// with Rayon.
pub struct FitError {
    msg: String,
}

impl FitError {
    fn new(msg: String) -> FitError {
        FitError { msg }
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fitting failed: {}", self.msg)
    }
}

// This is important for other errors to wrap this one.
impl error::Error for FitError {}

impl std::convert::From<&str> for FitError {
    fn from(msg: &str) -> Self {
        FitError::new(msg.to_string())
    }
}

impl std::convert::From<String> for FitError {
    fn from(msg: String) -> Self {
        FitError::new(msg)
    }
}

pub type FitResult<T> = Result<T, FitError>;

/// Fail if any value is NaN. `what` names the offending input in the message.
pub(crate) fn check_no_nan(values: &[f64], what: &str) -> FitResult<()> {
    match values.iter().position(|x| x.is_nan()) {
        None => Ok(()),
        Some(row) => Err(format!("Found NaN in the {} at row {}", what, row).into()),
    }
}
