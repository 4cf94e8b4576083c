use crate::services::window::TimeWindow;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Query failed for window {window}")]
    Window {
        window: TimeWindow,
        #[source]
        source: anyhow::Error,
    },
}
