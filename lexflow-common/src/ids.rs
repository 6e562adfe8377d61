//! Identifier and access-token generation

use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

/// Access tokens carry 256 bits of entropy
pub const ACCESS_TOKEN_BYTES: usize = 32;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Generate an unguessable hex access token from the OS CSPRNG
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; ACCESS_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Source of record identifiers and client access tokens
pub trait IdSource: Send + Sync {
    fn intake_id(&self) -> String;
    fn access_token(&self) -> String;
}

/// UUIDv4 ids and CSPRNG tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn intake_id(&self) -> String {
        generate().to_string()
    }

    fn access_token(&self) -> String {
        generate_access_token()
    }
}
