use std::fmt;

use url::Url;

const TASK_PATH_SEGMENT: &str = "thread";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkError {
    /// No console base URL is configured.
    MissingBaseUrl,
    /// A credential is required to use the console but none is stored.
    MissingCredential,
    BadBaseUrl { reason: String },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::MissingBaseUrl => write!(f, "console base URL is not configured"),
            LinkError::MissingCredential => write!(f, "no API credential is stored"),
            LinkError::BadBaseUrl { reason } => {
                write!(f, "console base URL is invalid: {reason}")
            }
        }
    }
}

impl std::error::Error for LinkError {}

/// Build the external console URL for one task. The credential gates the
/// action but is never embedded in the link.
pub fn console_task_url(
    base: Option<&str>,
    credential: Option<&str>,
    task_id: &str,
) -> Result<Url, LinkError> {
    let base = base
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(LinkError::MissingBaseUrl)?;
    credential
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(LinkError::MissingCredential)?;

    let mut url = Url::parse(base).map_err(|err| LinkError::BadBaseUrl {
        reason: err.to_string(),
    })?;
    url.path_segments_mut()
        .map_err(|()| LinkError::BadBaseUrl {
            reason: "not a hierarchical URL".to_string(),
        })?
        .pop_if_empty()
        .extend([TASK_PATH_SEGMENT, task_id]);
    Ok(url)
}
