//! # jw-auth-simple
//!
//! HMAC-SHA256 implementation of `AuthProvider`.
//! Tokens look like `<base64url("uuid:role")>.<hex signature>`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use jw_core::models::Requester;
use jw_core::traits::AuthProvider;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const ROLE_ADMIN: &str = "admin";
const ROLE_CUSTOMER: &str = "customer";

pub struct SimpleAuthProvider {
    /// Keyed with the signing secret; cloned for every token
    mac: HmacSha256,
}

impl SimpleAuthProvider {
    /// Accepts the signing secret (e.g., from configuration)
    pub fn new(secret: &SecretString) -> Result<Self, InvalidLength> {
        let mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())?;
        Ok(Self { mac })
    }

    fn sign(&self, payload: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac
    }
}

impl AuthProvider for SimpleAuthProvider {
    fn issue_token(&self, user_id: Uuid, is_admin: bool) -> String {
        let role = if is_admin { ROLE_ADMIN } else { ROLE_CUSTOMER };
        let payload = URL_SAFE_NO_PAD.encode(format!("{}:{}", user_id, role));
        let signature = hex::encode(self.sign(&payload).finalize().into_bytes());
        format!("{}.{}", payload, signature)
    }

    /// Signature check is constant-time; anything malformed is simply rejected.
    fn verify_token(&self, token: &str) -> Option<Requester> {
        let (payload, signature) = token.split_once('.')?;
        let signature = hex::decode(signature).ok()?;
        self.sign(payload).verify_slice(&signature).ok()?;

        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(payload).ok()?).ok()?;
        let (user_id, role) = decoded.split_once(':')?;
        let is_admin = match role {
            ROLE_ADMIN => true,
            ROLE_CUSTOMER => false,
            _ => return None,
        };

        Some(Requester {
            user_id: Uuid::parse_str(user_id).ok()?,
            is_admin,
        })
    }
}
