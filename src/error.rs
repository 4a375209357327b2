use thiserror::Error;

/// Errors surfaced while configuring a predictor. After construction the
/// predictor has no recoverable failure modes.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The memory level selects table sizes as `0x10000 << level` and
    /// only levels 0 through 9 are laid out for.
    #[error("memory level {0} is outside the accepted range (0..=9)")]
    InvalidLevel(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_bad_level() {
        let err = ModelError::InvalidLevel(12);
        assert!(err.to_string().contains("12"));
    }
}
