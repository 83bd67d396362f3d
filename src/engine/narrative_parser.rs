use serde_json::{Deserializer, Map, Value};

use crate::error::ParseError;
use crate::model::character::Character;

/// Reads a suggested protagonist out of a model reply.
///
/// Model output is not guaranteed to follow the requested shape, so this
/// degrades in steps instead of rejecting: a JSON object anywhere in the text,
/// then `Name:` / `Personality:` lines, then the whole reply as the personality
/// of a placeholder-named hero. Only a blank reply is an error.
pub fn parse_character(raw: &str) -> Result<Character, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some(character) = json_objects(raw).find_map(|object| character_from_json(&object)) {
        return Ok(character);
    }

    let mut name = None;
    let mut personality = None;

    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let value = clean_value(value);
        if value.is_empty() {
            continue;
        }

        match clean_key(key).as_str() {
            "personality" => personality = Some(value),
            key if key.ends_with("name") => name = Some(value),
            _ => {}
        }
    }

    Ok(match (name, personality) {
        (Some(name), Some(personality)) => Character::new(name, personality),
        (None, Some(personality)) => Character::placeholder(personality),
        (Some(name), None) => Character::new(name, raw),
        (None, None) => Character::placeholder(raw),
    })
}

/// Narrative text is taken as-is apart from surrounding whitespace.
pub fn parse_narrative(raw: &str) -> Result<String, ParseError> {
    let text = raw.trim();
    if text.is_empty() {
        Err(ParseError::Empty)
    } else {
        Ok(text.to_string())
    }
}

fn character_from_json(object: &Map<String, Value>) -> Option<Character> {
    let field = |wanted: &str| {
        object
            .iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(wanted))
            .and_then(|(_, value)| value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    Some(Character::new(field("name")?, field("personality")?))
}

// The whole reply first, then an object starting at each `{`, so objects
// wrapped in prose, code fences or an outer object are still found.
fn json_objects(raw: &str) -> impl Iterator<Item = Map<String, Value>> + '_ {
    let whole = serde_json::from_str::<Map<String, Value>>(raw).ok();

    let embedded = raw.match_indices('{').filter_map(move |(start, _)| {
        Deserializer::from_str(&raw[start..])
            .into_iter::<Map<String, Value>>()
            .next()?
            .ok()
    });

    whole.into_iter().chain(embedded)
}

fn clean_key(key: &str) -> String {
    key.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '-' | '#' | '`' | '_') || c.is_whitespace())
        .to_lowercase()
}

fn clean_value(value: &str) -> String {
    value
        .trim()
        .trim_end_matches(',')
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`' | '_') || c.is_whitespace())
        .to_string()
}
