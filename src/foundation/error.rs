/// Convenience result type used across ridgeline.
pub type RidgelineResult<T> = Result<T, RidgelineError>;

/// Error taxonomy shared by registration-time and per-frame code paths.
#[derive(thiserror::Error, Debug)]
pub enum RidgelineError {
    /// Invalid effect parameters; surfaced synchronously from registration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A marker the effect needs is absent from the page.
    #[error("missing target: {0}")]
    MissingTarget(String),

    /// A drawing surface could not be acquired.
    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),

    /// A trigger zone whose end anchor does not come after its start anchor.
    #[error("transition order error: {0}")]
    TransitionOrder(String),

    /// Failure while running a frame (detached surface, removed target).
    #[error("frame error: {0}")]
    Frame(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RidgelineError {
    /// Build a [`RidgelineError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`RidgelineError::MissingTarget`] value.
    pub fn missing_target(msg: impl Into<String>) -> Self {
        Self::MissingTarget(msg.into())
    }

    /// Build a [`RidgelineError::ResourceExhaustion`] value.
    pub fn resource_exhaustion(msg: impl Into<String>) -> Self {
        Self::ResourceExhaustion(msg.into())
    }

    /// Build a [`RidgelineError::TransitionOrder`] value.
    pub fn transition_order(msg: impl Into<String>) -> Self {
        Self::TransitionOrder(msg.into())
    }

    /// Build a [`RidgelineError::Frame`] value.
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }

    /// Build a [`RidgelineError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors that disable an effect instead of failing registration.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::MissingTarget(_) | Self::ResourceExhaustion(_))
    }
}

impl From<serde_json::Error> for RidgelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
