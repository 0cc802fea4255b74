//! Chart-entry normalization
//!
//! Raw chart strings carry decorations the catalog does not index:
//! titles get trailing annotations ("Song (Prod. by ...)"), artists get
//! bilingual credits ("아이유 (IU)"). These helpers strip the noise
//! before the first search, and their output doubles as the key for
//! missed rows and the alias cache. Pure functions, no I/O.

/// Truncate a title at its first parenthesized annotation.
///
/// A title without parentheses is returned unchanged.
pub fn normalize_title(title: &str) -> String {
    match title.find('(') {
        Some(idx) => title[..idx].trim_end().to_string(),
        None => title.to_string(),
    }
}

/// Pick the catalog-facing artist name from a possibly bilingual credit.
///
/// Splits at the first parenthesis and keeps whichever segment is more
/// likely indexed: the parenthesized one when it alone contains Latin
/// characters, otherwise the leading one. A leading parenthesis is part
/// of the name itself ("(여자)아이들") and the credit stays whole.
pub fn normalize_artist(artist: &str) -> String {
    let Some(idx) = artist.find('(') else {
        return artist.to_string();
    };
    if idx == 0 {
        return artist.to_string();
    }

    let leading = artist[..idx].trim();
    let parenthesized = artist[idx + 1..].trim_end().trim_end_matches(')').trim();

    if !contains_latin(leading) && contains_latin(parenthesized) {
        parenthesized.to_string()
    } else {
        leading.to_string()
    }
}

/// True if any character is Latin script (ASCII letters plus the
/// accented Latin-1/Extended ranges)
pub fn contains_latin(s: &str) -> bool {
    s.chars()
        .any(|c| c.is_ascii_alphabetic() || ('\u{00C0}'..='\u{024F}').contains(&c))
}

/// True if any character is Hangul (syllables or jamo)
pub fn contains_hangul(s: &str) -> bool {
    s.chars().any(|c| {
        ('\u{AC00}'..='\u{D7A3}').contains(&c)
            || ('\u{1100}'..='\u{11FF}').contains(&c)
            || ('\u{3130}'..='\u{318F}').contains(&c)
    })
}
