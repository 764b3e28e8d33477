use std::panic;

const MASK: &str = "[REDACTED]";

/// Keys whose values are never shown: credential fields and what the local
/// account file stores next to them.
const SECRET_KEYS: [&str; 5] = ["password", "secret", "token", "salt", "sha256"];

/// Masks credential values in text headed for the terminal or the log.
/// `password=hunter2` keeps its key; bare digests and salts are masked whole.
pub fn redact_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (index, word) in input.split_whitespace().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        out.push_str(&redact_word(word));
    }
    out
}

fn redact_word(word: &str) -> String {
    if let Some((key, _)) = word.split_once(['=', ':']) {
        if is_secret_key(key) {
            let separator = &word[key.len()..key.len() + 1];
            return format!("{key}{separator}{MASK}");
        }
    }

    if is_digest_like(word) {
        return MASK.to_owned();
    }
    word.to_owned()
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECRET_KEYS.iter().any(|secret| key.contains(secret))
}

/// Long runs of hex or mixed letters and digits, as produced by uuid salts
/// and SHA-256 digests.
fn is_digest_like(word: &str) -> bool {
    let core = word.trim_matches(|ch: char| !ch.is_ascii_alphanumeric());
    if core.len() < 16 || !core.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return false;
    }

    let digits = core.chars().filter(char::is_ascii_digit).count();
    digits == core.len() || (digits > 0 && digits < core.len())
}

pub fn install_panic_redaction_hook() {
    panic::set_hook(Box::new(|info| {
        let payload = info.payload();
        let raw = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic payload omitted".to_owned());
        let message = redact_text(&raw);
        match info.location() {
            Some(at) => eprintln!(
                "pairchat panic: {message} at {}:{}:{}",
                at.file(),
                at.line(),
                at.column()
            ),
            None => eprintln!("pairchat panic: {message}"),
        }
    }));
}
