use super::types::{RoomName, SignalingError};

/// Path every signaling connection must upgrade on
pub const SESSION_PATH_TEMPLATE: &str = "/api/v1/session/{name}";

const SESSION_PATH_PREFIX: &str = "/api/v1/session/";

/// Extract the session name from a request path such as `/api/v1/session/abc`.
///
/// The name is a single non-empty path segment, percent-decoded. Segments
/// that decode to invalid UTF-8 or to something containing `/` are rejected.
pub fn extract_room_name(path: &str) -> Result<RoomName, SignalingError> {
    let invalid = || SignalingError::InvalidRoute(path.to_string());

    let segment = match path.strip_prefix(SESSION_PATH_PREFIX) {
        Some(segment) if !segment.is_empty() && !segment.contains('/') => segment,
        _ => return Err(invalid()),
    };

    let name = urlencoding::decode(segment).map_err(|_| invalid())?;
    if name.is_empty() || name.contains('/') {
        return Err(invalid());
    }
    Ok(RoomName::from(name.into_owned()))
}
