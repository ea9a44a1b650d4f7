/// Errors raised while building geometry or style values from raw input.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("polygon coordinate list has odd length {0}")]
    OddCoordinateCount(usize),

    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("invalid color literal {0:?}")]
    InvalidColor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::TooFewVertices(2);
        assert_eq!(err.to_string(), "polygon needs at least 3 vertices, got 2");
        assert!(CoreError::InvalidColor("#zz".into()).to_string().contains("#zz"));
    }
}
