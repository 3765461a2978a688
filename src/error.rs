pub type ScenemarkResult<T> = Result<T, ScenemarkError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenemarkError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScenemarkError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ScenemarkError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ScenemarkError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            ScenemarkError::encode("x")
                .to_string()
                .contains("encode error:")
        );
        assert!(
            ScenemarkError::store("x")
                .to_string()
                .contains("store error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ScenemarkError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
