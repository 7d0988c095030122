use rand::Rng;

/// Alphabet the join-code characters are drawn from.
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a join code.
pub const CODE_LEN: usize = 6;

/// Generate a random join code: `CODE_LEN` characters drawn uniformly from
/// `[A-Z0-9]`. Collision checking against live sessions is the caller's job.
pub fn generate_join_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Normalize a user-supplied join code for lookup. Codes are case-insensitive
/// on input and stored uppercase.
pub fn normalize_join_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
