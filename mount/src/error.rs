use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MountError {
    #[error("grammar error: {0}")]
    Grammar(#[from] gdmount_params::GrammarError),

    #[error("protocol error: {0}")]
    Protocol(#[from] gdmount_qmp::QmpError),

    #[error("mount helper error: {0}")]
    Helper(#[from] gdmount_helper::HelperError),

    #[error("game data registered but not present on disk: {0}")]
    DataNotPresent(PathBuf),

    #[error("identifier is not a hex-coded handle: {0:?}")]
    InvalidIdentifier(String),

    #[error("mount deadline exceeded")]
    DeadlineExceeded,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
