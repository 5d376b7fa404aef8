//! Identifier sanitizing for template names.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WX_RE: Regex = Regex::new(r"(?i)wx").unwrap();
}

/// Letters standing in for digits, indexed by digit value.
const NUMBER_WORDS: [char; 11] = ['z', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k'];

const TARO_PREFIX: &str = "taro-";
const TMPL_SUFFIX: &str = "-tmpl";

/// Turn a `<template name>` / `<template is>` value into a component identifier.
///
/// A name containing `wx` (any case) loses its first two characters and gets a
/// `taro-` prefix instead; the rewritten name is always PascalCased. The
/// rewrite stops once the name carries the prefix. Digits are swapped for
/// letters so the result never reads as a number.
pub fn build_template_name(name: &str, pascal: bool) -> String {
    if WX_RE.is_match(name) && !name.starts_with(TARO_PREFIX) {
        let rest: String = name.chars().skip(2).collect();
        return build_template_name(&format!("{}{}", TARO_PREFIX, rest), true);
    }

    let words = format!("{}{}", name, TMPL_SUFFIX);
    let words = if pascal { pascal_case(&words) } else { words };

    words
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(digit) => NUMBER_WORDS[digit as usize],
            None => c,
        })
        .collect()
}

/// `scroll-view` -> `ScrollView`. Every non-alphanumeric character separates words.
pub fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
