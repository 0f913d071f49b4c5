use crate::error::AuthError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims embedded in the access token
///
/// Only the fields the client needs are decoded. `sub` carries the
/// account identifier (email); `permissions` and `roles` drive the
/// page-level access checks without a network round trip.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub permissions: Vec<String>,
    pub roles: Vec<String>,
}

/// Decode claims from an access token without verifying the signature.
///
/// The server owns the signing secret; the client only reads the payload,
/// the way a browser decodes a JWT for display. Expiry is deliberately not
/// validated here - guards must be able to read claims from an expired
/// token, since expiry is handled by the refresh protocol.
///
/// Returns [`AuthError::MalformedToken`] when the token is not a JWT or a
/// required field is absent.
pub fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::MalformedToken(e.to_string()))
}
