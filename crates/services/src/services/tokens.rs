use rand::RngCore;

const TOKEN_BYTES: usize = 32;

/// Fresh bearer token for an invitation link: 32 random bytes, hex encoded.
pub fn generate_invitation_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
