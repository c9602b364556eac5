use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn index_out_of_range(index: u64, len: u64) -> Error {
        Error(ErrorKind::IndexOutOfRange { index, len }.into())
    }

    pub fn range_out_of_bounds(start: u64, count: u64, len: u64) -> Error {
        Error(ErrorKind::RangeOutOfBounds { start, count, len }.into())
    }

    pub fn concurrent_modification() -> Error {
        Error(ErrorKind::ConcurrentModification.into())
    }

    /// Returns `true` for the range-error family (`IndexOutOfRange` or
    /// `RangeOutOfBounds`).
    pub fn is_range_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::IndexOutOfRange { .. } | ErrorKind::RangeOutOfBounds { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: u64, len: u64 },

    #[error("range [{start}, {start}+{count}) out of bounds for length {len}")]
    RangeOutOfBounds { start: u64, count: u64, len: u64 },

    #[error("collection was modified during enumeration")]
    ConcurrentModification,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let e = Error::index_out_of_range(10, 3);
        assert!(e.is_range_error());
        assert_eq!(e.to_string(), "index 10 out of range for length 3");

        let e = Error::range_out_of_bounds(5, 7, 8);
        assert!(e.is_range_error());
        assert!(matches!(
            e.into_kind(),
            ErrorKind::RangeOutOfBounds {
                start: 5,
                count: 7,
                len: 8
            }
        ));

        let e = Error::concurrent_modification();
        assert!(!e.is_range_error());
        assert_eq!(e.to_string(), "collection was modified during enumeration");
    }
}
