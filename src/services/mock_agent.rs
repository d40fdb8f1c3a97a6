use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static GREETING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(hi|hello|hey|good morning|good evening)").expect("greeting pattern"));

const QUESTION_RESPONSES: [&str; 3] = [
    "That's a great question! Based on my background and experience, I think...",
    "Interesting question. Let me share my perspective on that...",
    "I've thought about this quite a bit. Here's what I believe...",
];

const ELABORATIONS: [&str; 5] = [
    " Based on my values and experiences, this matters a lot to me.",
    " It's something I'm passionate about.",
    " This is part of what drives my interest in this field.",
    " I've had to think carefully about this in my career.",
    " This connects to one of my core interests.",
];

/// Stand-in for the real conversational backend: picks a templated reply by
/// simple pattern match on the message and appends a randomized elaboration.
pub fn generate_reply(message: &str, persona_name: Option<&str>) -> String {
    let mut rng = rand::thread_rng();

    let base = if GREETING_RE.is_match(message.trim()) {
        match rng.gen_range(0..3) {
            0 => format!(
                "Hi! I'm {} to help. What would you like to know about me?",
                persona_name.unwrap_or("here")
            ),
            1 => format!(
                "Hello! I'm {}. What's on your mind?",
                persona_name.unwrap_or("your persona")
            ),
            _ => "Hey! Great to connect with you. What can I tell you about myself?".to_string(),
        }
    } else if message.contains('?') {
        QUESTION_RESPONSES[rng.gen_range(0..QUESTION_RESPONSES.len())].to_string()
    } else {
        match rng.gen_range(0..3) {
            0 => format!(
                "Thanks for sharing that. As {} with my background, I see it differently...",
                persona_name.unwrap_or("someone")
            ),
            1 => "That resonates with me. From my experience, I'd say...".to_string(),
            _ => "I appreciate your point of view. Here's how I tend to approach similar situations..."
                .to_string(),
        }
    };

    let elaboration = ELABORATIONS[rng.gen_range(0..ELABORATIONS.len())];
    format!("{}{}", base, elaboration)
}

/// Rough token estimate used in chat response metadata.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}
