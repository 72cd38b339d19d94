use serde::Deserialize;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use wsbar_core::FetchError;
use wsbar_core::UserProfile;

/// `GET /rest/user` body: `{ "data": { "id": .., "attributes": { "user_name": .. } } }`.
#[derive(Debug, Deserialize)]
struct UserEnvelope {
    data: UserResource,
}

#[derive(Debug, Deserialize)]
struct UserResource {
    id: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

pub fn parse_user_envelope(body: &[u8]) -> Result<UserProfile, FetchError> {
    let envelope: UserEnvelope =
        serde_json::from_slice(body).map_err(|err| FetchError::Malformed(err.to_string()))?;
    let UserResource { id, attributes } = envelope.data;

    let user_name = attributes
        .get("user_name")
        .and_then(Value::as_str)
        .ok_or_else(|| FetchError::Malformed("missing string `attributes.user_name`".to_string()))?
        .to_string();

    Ok(UserProfile::new(id, user_name, attributes))
}

/// Body posted to the command endpoint.
pub fn command_request_body(command_text: &str) -> Value {
    json!({ "command": command_text })
}
