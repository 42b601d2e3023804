//! Memorable `adjective_noun` suffixes for per-worktree database names.
//!
//! Suffixes make parallel worktree databases collision-resistant while
//! staying readable in a database list. Both word lists are lowercase
//! and workplace-safe.

use rand::RngCore;

pub const ADJECTIVES: &[&str] = &[
    "agile", "amber", "ample", "azure", "bold", "brave", "bright", "brisk",
    "calm", "candid", "cheery", "chief", "civil", "clear", "clever", "cosmic",
    "cozy", "crisp", "daring", "deft", "eager", "early", "earnest", "easy",
    "fair", "famous", "fancy", "fast", "fine", "firm", "fleet", "fluent",
    "fond", "frank", "fresh", "gentle", "glad", "golden", "grand", "great",
    "happy", "hardy", "hearty", "humble", "ideal", "jolly", "keen", "kind",
    "lively", "loyal", "lucid", "lucky", "mellow", "merry", "mighty", "modern",
    "neat", "nimble", "noble", "novel", "patient", "placid", "plucky", "polite",
    "prime", "proud", "quick", "quiet", "rapid", "ready", "robust", "rosy",
    "serene", "sharp", "shiny", "smart", "snappy", "solid", "stable", "steady",
    "sturdy", "sunny", "swift", "tidy", "trusty", "vivid", "warm", "wise",
];

pub const NOUNS: &[&str] = &[
    "anchor", "apple", "arrow", "aspen", "badger", "beacon", "birch", "breeze",
    "brook", "canyon", "cedar", "cloud", "comet", "coral", "crane", "creek",
    "dahlia", "dawn", "delta", "drift", "eagle", "ember", "falcon", "fern",
    "field", "flint", "forest", "garden", "glade", "grove", "harbor", "hawk",
    "hazel", "heron", "hill", "island", "juniper", "lagoon", "lake", "lark",
    "laurel", "lily", "lotus", "maple", "meadow", "mesa", "moss", "oak",
    "orchid", "otter", "pebble", "pine", "plume", "pond", "poppy", "prairie",
    "quartz", "raven", "reef", "ridge", "river", "robin", "runner", "sage",
    "sparrow", "spring", "stone", "summit", "thicket", "tulip", "valley",
    "willow",
];

/// Generate an `adjective_noun` suffix from the operating system's
/// random source. If that source is unavailable, fall back to a
/// time-and-pid token: never a constant.
pub fn generate() -> String {
    let mut buf = [0u8; 8];
    match rand::rngs::OsRng.try_fill_bytes(&mut buf) {
        Ok(()) => {
            let a = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
            let n = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
            format!(
                "{}_{}",
                ADJECTIVES[a % ADJECTIVES.len()],
                NOUNS[n % NOUNS.len()]
            )
        }
        Err(_) => fallback_suffix(),
    }
}

fn fallback_suffix() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{}_{}", nanos % 100_000, std::process::id() % 1_000)
}

/// Extract the trailing `adjective_noun` suffix from a database name.
///
/// Returns the suffix only when the final two underscore-separated
/// tokens are members of the word lists; otherwise an empty string.
pub fn extract_suffix(db_name: &str) -> String {
    let tokens: Vec<&str> = db_name.split('_').collect();
    if tokens.len() < 2 {
        return String::new();
    }

    let adj = tokens[tokens.len() - 2];
    let noun = tokens[tokens.len() - 1];

    if ADJECTIVES.contains(&adj) && NOUNS.contains(&noun) {
        format!("{adj}_{noun}")
    } else {
        String::new()
    }
}
