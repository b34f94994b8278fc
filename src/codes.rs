use crate::models::AppData;

/// Join-code alphabet without look-alike characters (0/O, 1/I).
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub fn generate_code(length: usize) -> String {
    (0..length)
        .map(|_| {
            let byte: u8 = rand::random();
            char::from(ALPHABET[usize::from(byte) % ALPHABET.len()])
        })
        .collect()
}

/// Picks a join code that no existing challenge uses.
pub fn generate_unique_code(data: &AppData) -> String {
    for length in [6, 8] {
        for _ in 0..8 {
            let candidate = generate_code(length);
            if data.challenge_by_code(&candidate).is_none() {
                return candidate;
            }
        }
    }
    format!("{}{}", generate_code(6), generate_code(6))
}
