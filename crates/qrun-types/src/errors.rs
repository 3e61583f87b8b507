use thiserror::Error;

/// Signalling for the ends of an `EventChannel`'s lifecycle. Not a fatal
/// process error — the run loop matches on these to know when to stop.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel is closed for sending")]
    Closed,
    #[error("channel is closed and drained, no further events will arrive")]
    Exhausted,
}

/// Top-level error type for the qrun runtime.
#[derive(Error, Debug)]
pub enum QrError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("order not found: {order_id}")]
    OrderNotFound { order_id: u64 },

    #[error("insufficient data: {message}")]
    InsufficientData { message: String },

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias used throughout the runtime.
pub type QrResult<T> = Result<T, QrError>;

#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::errors::QrError::Validation(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::errors::QrError::Internal(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_not_found_display() {
        let err = QrError::OrderNotFound { order_id: 42 };
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn macros_build_expected_variants() {
        let v = validation_error!("bad symbol {}", "XYZ");
        assert!(matches!(v, QrError::Validation(_)));
        let i = internal_error!("executor already terminal");
        assert!(matches!(i, QrError::Internal(_)));
    }

    #[test]
    fn channel_error_converts_into_qr_error() {
        let err: QrError = ChannelError::Closed.into();
        assert!(matches!(err, QrError::Channel(ChannelError::Closed)));
    }
}
