use sonda_core::{FindError, ListError, PublishError, RequeueError, SessionError, TransportError};
use tokio::task::JoinError;
use tonic::Status;

pub trait IntoStatus {
    fn into_status(self) -> Status;
}

impl IntoStatus for TransportError {
    fn into_status(self) -> Status {
        match self {
            e @ TransportError::SessionLocked(_) => Status::failed_precondition(e.to_string()),
            other => Status::internal(other.to_string()),
        }
    }
}

impl IntoStatus for FindError {
    fn into_status(self) -> Status {
        match self {
            FindError::Validation(msg) => Status::invalid_argument(msg),
            FindError::Configuration(msg) => Status::unavailable(msg),
            FindError::Transport(e) => e.into_status(),
        }
    }
}

impl IntoStatus for ListError {
    fn into_status(self) -> Status {
        match self {
            ListError::Configuration(msg) => Status::unavailable(msg),
            ListError::Transport(e) => e.into_status(),
        }
    }
}

impl IntoStatus for RequeueError {
    fn into_status(self) -> Status {
        match self {
            RequeueError::Validation(msg) => Status::invalid_argument(msg),
            RequeueError::Configuration(msg) => Status::unavailable(msg),
            RequeueError::Transport(e) => e.into_status(),
        }
    }
}

impl IntoStatus for PublishError {
    fn into_status(self) -> Status {
        match self {
            PublishError::Validation(msg) => Status::invalid_argument(msg),
            PublishError::Configuration(msg) => Status::unavailable(msg),
            PublishError::Transport(e) => e.into_status(),
        }
    }
}

impl IntoStatus for SessionError {
    fn into_status(self) -> Status {
        match self {
            SessionError::Validation(msg) => Status::invalid_argument(msg),
            SessionError::Configuration(msg) => Status::unavailable(msg),
            SessionError::Transport(e) => e.into_status(),
        }
    }
}

impl IntoStatus for JoinError {
    fn into_status(self) -> Status {
        Status::internal(format!("operation task failed: {self}"))
    }
}
