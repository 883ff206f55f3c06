use thiserror::Error;

#[derive(Error, Debug)]
pub enum HelperError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mount helper returned status {0}")]
    Status(u16),
}
