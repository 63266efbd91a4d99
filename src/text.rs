//! String helpers shared by the settings layer

/// Decode UTF-8 text into 32-bit code points
pub fn utf8_to_code_points(text: &str) -> Vec<u32> {
    text.chars().map(u32::from).collect()
}

/// Encode code points back into UTF-8
///
/// Returns `None` if any value is not a Unicode scalar value (surrogates or
/// anything above U+10FFFF).
pub fn code_points_to_utf8(code_points: &[u32]) -> Option<String> {
    code_points.iter().map(|&cp| char::from_u32(cp)).collect()
}

/// Split `text` on any of the `delimiters` characters
///
/// With `trim_empty` set, empty pieces between adjacent delimiters (and at
/// either end) are dropped.
pub fn tokenize<'a>(text: &'a str, delimiters: &str, trim_empty: bool) -> Vec<&'a str> {
    text.split(|c: char| delimiters.contains(c))
        .filter(|piece| !trim_empty || !piece.is_empty())
        .collect()
}

/// Conventional setter name for a property: `fontSize` -> `setFontSize:`
pub fn property_setter_name(property_name: &str) -> String {
    format!("set{}:", capitalize_first(property_name))
}

/// Display name for a camelCase property: `showGridLines` -> `Show Grid Lines`
///
/// Runs of capitals stay together (`defaultURLScheme` -> `Default URL Scheme`)
/// and a leading underscore is dropped.
pub fn human_readable_name(property_name: &str) -> String {
    let chars: Vec<char> = property_name.trim_start_matches('_').chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        let starts_word = c.is_uppercase()
            && !current.is_empty()
            && (prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
                || next.is_some_and(|n| n.is_lowercase()));

        if starts_word {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| capitalize_first(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
