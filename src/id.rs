use rand::Rng;

/// URL-safe alphabet shared by every generated identifier.
const URL_SAFE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| URL_SAFE_ALPHABET[rng.gen_range(0..URL_SAFE_ALPHABET.len())] as char)
        .collect()
}

/// Persona identifiers: `persona_` + 12 URL-safe characters.
pub fn new_persona_id() -> String {
    format!("persona_{}", random_suffix(12))
}

pub fn new_conversation_id() -> String {
    format!("conv_{}", random_suffix(12))
}

pub fn new_message_id() -> String {
    format!(
        "msg_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        random_suffix(8)
    )
}

/// Correlation id tying together the log lines of one request.
pub fn new_request_id(label: &str) -> String {
    format!(
        "{}-{}-{}",
        label,
        chrono::Utc::now().timestamp_millis(),
        random_suffix(9)
    )
}
