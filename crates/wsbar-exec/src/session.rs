use tracing::debug;
use wsbar_core::FetchError;
use wsbar_core::UserProfile;

use crate::contracts::parse_user_envelope;
use crate::ports::HttpPort;

/// One fresh `GET` of the session endpoint. Non-2xx and unparseable bodies
/// are both [`FetchError`]s.
pub async fn fetch_profile(http: &dyn HttpPort, path: &str) -> Result<UserProfile, FetchError> {
    debug!(path, "fetching user profile");
    let response = http
        .get(path)
        .await
        .map_err(|err| FetchError::Transport(err.0))?;

    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }
    parse_user_envelope(&response.body)
}
