use std::collections::BTreeSet;

/// Emitted for digit runs of [`PHONE_MIN_DIGITS`] or more.
pub const PHONE_FEATURE: &str = "<phone>";
/// Emitted for shorter digit runs.
pub const NUMBER_FEATURE: &str = "<num>";
/// Emitted for all-caps words of [`SHOUT_MIN_LEN`] letters or more.
pub const SHOUT_FEATURE: &str = "<shout>";
/// Emitted when the text contains a currency symbol.
pub const CURRENCY_FEATURE: &str = "<currency>";
/// Emitted for a run of two or more exclamation marks.
pub const EXCLAIM_FEATURE: &str = "<exclaim>";

/// Every shape token [`extract_features`] can emit.
pub const SHAPE_FEATURES: [&str; 5] = [
    PHONE_FEATURE,
    NUMBER_FEATURE,
    SHOUT_FEATURE,
    CURRENCY_FEATURE,
    EXCLAIM_FEATURE,
];

const PHONE_MIN_DIGITS: usize = 7;
const SHOUT_MIN_LEN: usize = 4;
const CURRENCY_SYMBOLS: [char; 3] = ['£', '$', '€'];

/// Converts a message into the set of sparse binary features the logistic model scores.
///
/// The process is:
/// 1. Split on every character that is not alphanumeric
/// 2. Lowercase each word and emit it
/// 3. Replace digit runs with a shape token (`<phone>` or `<num>`)
/// 4. Add `<shout>` for long all-caps words
/// 5. Add `<currency>` and `<exclaim>` from punctuation, which step 1 discards
///
/// Features are a set: repeating a word does not change the score.
pub fn extract_features(text: &str) -> BTreeSet<String> {
    let mut features = BTreeSet::new();

    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        if word.chars().all(|c| c.is_ascii_digit()) {
            let shape = if word.len() >= PHONE_MIN_DIGITS {
                PHONE_FEATURE
            } else {
                NUMBER_FEATURE
            };
            features.insert(shape.to_string());
            continue;
        }

        if is_shouted(word) {
            features.insert(SHOUT_FEATURE.to_string());
        }
        features.insert(word.to_lowercase());
    }

    if text.contains(&CURRENCY_SYMBOLS[..]) {
        features.insert(CURRENCY_FEATURE.to_string());
    }
    if text.contains("!!") {
        features.insert(EXCLAIM_FEATURE.to_string());
    }

    features
}

/// Whether [`extract_features`] can ever emit `name`.
///
/// That is either a shape token or a single lowercase run of letters and digits that
/// is not all ASCII digits (those become `<num>`/`<phone>`). Uppercase names, spaces
/// and punctuation can never match.
pub fn is_extractable(name: &str) -> bool {
    if SHAPE_FEATURES.contains(&name) {
        return true;
    }
    !name.is_empty()
        && name.chars().all(char::is_alphanumeric)
        && !name.chars().all(|c| c.is_ascii_digit())
        && name.to_lowercase() == name
}

fn is_shouted(word: &str) -> bool {
    let mut letters = 0;
    for c in word.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_alphabetic() {
            letters += 1;
        }
    }
    letters >= SHOUT_MIN_LEN
}
