//! Generated identifiers.
//!
//! Both id families are `<prefix>-<unixMillis>-<random lowercase-alnum>`.

use chrono::Utc;
use rand::Rng;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// Unique preset id: `cfg-<unixMillis>-<6 chars>`.
pub fn preset_id() -> String {
    format!("cfg-{}-{}", Utc::now().timestamp_millis(), random_suffix(6))
}

/// Unique completion id: `chatcmpl-<unixMillis>-<7 chars>`.
pub fn completion_id() -> String {
    format!(
        "chatcmpl-{}-{}",
        Utc::now().timestamp_millis(),
        random_suffix(7)
    )
}
