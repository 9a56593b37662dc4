/// Signed invitation tokens
///
/// An invitation token is the capability a recipient uses to look up,
/// accept or decline an invitation. It carries the invitation ID and an
/// HMAC-SHA256 tag over it:
///
/// ```text
/// base64url(id bytes) "." base64url(HMAC-SHA256(key, id bytes))
/// ```
///
/// Both parts are unpadded URL-safe base64, so the token drops straight into
/// a link. A guessed or edited ID fails verification before any lookup.
///
/// The signing key is derived from the server secret with [`signing_key`],
/// so a JWT signature can never pass as an invitation tag or the reverse.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const SIGNING_KEY_LABEL: &[u8] = b"taskhub-invitation-token";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvitationTokenError {
    #[error("Invalid invitation token")]
    Malformed,

    #[error("Invalid invitation token")]
    BadSignature,
}

fn mac(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size")
}

/// Key for invitation tags: HMAC-SHA256(root secret, fixed label)
pub fn signing_key(root_secret: &[u8]) -> Vec<u8> {
    let mut mac = mac(root_secret);
    mac.update(SIGNING_KEY_LABEL);
    mac.finalize().into_bytes().to_vec()
}

/// Encodes and signs an invitation ID
pub fn encode(invitation_id: Uuid, secret: &[u8]) -> String {
    let id = invitation_id.as_bytes();

    let mut mac = mac(secret);
    mac.update(id);
    let tag = mac.finalize().into_bytes();

    format!("{}.{}", URL_SAFE_NO_PAD.encode(id), URL_SAFE_NO_PAD.encode(tag))
}

/// Verifies a token and returns the invitation ID it carries
pub fn decode(token: &str, secret: &[u8]) -> Result<Uuid, InvitationTokenError> {
    let (id_part, tag_part) = token
        .trim()
        .split_once('.')
        .ok_or(InvitationTokenError::Malformed)?;

    let id_bytes = URL_SAFE_NO_PAD
        .decode(id_part)
        .map_err(|_| InvitationTokenError::Malformed)?;
    let tag = URL_SAFE_NO_PAD
        .decode(tag_part)
        .map_err(|_| InvitationTokenError::Malformed)?;

    let id = Uuid::from_slice(&id_bytes).map_err(|_| InvitationTokenError::Malformed)?;

    let mut mac = mac(secret);
    mac.update(&id_bytes);
    mac.verify_slice(&tag)
        .map_err(|_| InvitationTokenError::BadSignature)?;

    Ok(id)
}
