#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ViewerError {
    #[error("Cannot {action} while the viewer is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Viewer session has been disposed")]
    Disposed,
}
