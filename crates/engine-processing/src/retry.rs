use connectors::error::ClientError;
use engine_core::retry::RetryDisposition;

pub fn classify_client_error(err: &ClientError) -> RetryDisposition {
    match err {
        ClientError::Transport(_) | ClientError::Timeout(_) => RetryDisposition::Retry,
        ClientError::Status { status, .. } => classify_status(*status),
        ClientError::Protocol(_) => RetryDisposition::Stop,
        ClientError::InvalidRequest(_) => RetryDisposition::Stop,
        ClientError::Build(_) => RetryDisposition::Stop,
        ClientError::Cancelled => RetryDisposition::Stop,
    }
}

fn classify_status(status: u16) -> RetryDisposition {
    match status {
        408 | 429 | 500..=599 => RetryDisposition::Retry,
        _ => RetryDisposition::Stop,
    }
}
