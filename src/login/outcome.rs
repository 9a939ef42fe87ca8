use crate::error::LoginError;
use crate::utils::logging::LoggingHelper;

/// Terminal decision of a login operation
///
/// Every flow produces exactly one of these; the handler layer renders it
/// together with the cookies recorded in the request context.
#[derive(Debug)]
pub enum Outcome {
    /// 302 to `location`, with an optional informational body
    Redirect {
        location: String,
        notice: Option<String>,
    },
    Error(LoginError),
    /// 200 plain-text body for a flow that answers in place instead of
    /// redirecting; current flows end in a redirect or an error, and
    /// first-leg notices travel on `Redirect::notice`
    Result(String),
}

impl Outcome {
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            notice: None,
        }
    }

    #[must_use]
    pub fn redirect_with_notice(location: impl Into<String>, notice: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            notice: Some(notice.into()),
        }
    }

    /// Log the failure of `operation` and wrap it
    #[must_use]
    pub fn failure(operation: &str, err: LoginError) -> Self {
        LoggingHelper::log_flow_error(operation, &err);
        Self::Error(err)
    }

    /// Redirect target, if this is a redirect
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect { location, .. } => Some(location),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&LoginError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}
