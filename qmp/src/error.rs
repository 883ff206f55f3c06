use thiserror::Error;

#[derive(Error, Debug)]
pub enum QmpError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed before a response arrived")]
    UnexpectedEof,

    #[error("control plane did not send a protocol greeting")]
    MissingGreeting,

    #[error("command failed: {class}: {desc}")]
    Command { class: String, desc: String },
}
