use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZclError {
    /* mapped errors */
    #[error(transparent)]
    FromUtf8Error(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    PackedStructError(#[from] packed_struct::PackingError),

    #[error("Unsupported zcl data type {0:#04x}")]
    UnsupportedDataType(u8),

    #[error("Truncated zcl payload: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}

pub type ZclResult<T> = Result<T, ZclError>;
