// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numeric token extraction from OCR output
//!
//! Dimension figures are standalone numbers: `600`, `1164`, `18.5`.
//! Digits glued to letters (`A600`, `600mm`, `M8`) are part numbers or
//! annotated values and are not reported.

use nom::{
    character::complete::{char, digit1},
    combinator::{opt, recognize},
    sequence::pair,
    IResult,
};

use crate::types::{NumericToken, OcrOutput, Point2D};

/// Parse a number literal: 600, 18.5
fn number_literal(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)
}

/// Parse the integer part only
fn integer_literal(input: &str) -> IResult<&str, &str> {
    digit1(input)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn ends_at_boundary(rest: &str) -> bool {
    !rest.chars().next().is_some_and(is_word_char)
}

/// Scan free text for standalone numbers, in order of appearance.
///
/// Returns `(value, literal)` pairs.
pub fn scan_numbers(text: &str) -> Vec<(f64, &str)> {
    let mut found = Vec::new();
    let mut rest = text;
    let mut prev: Option<char> = None;

    while let Some(c) = rest.chars().next() {
        if c.is_ascii_digit() && !prev.is_some_and(is_word_char) {
            let literal = match number_literal(rest) {
                Ok((after, lit)) if ends_at_boundary(after) => Some((after, lit)),
                // `12.5mm` still yields `12`, the fraction is glued to a word
                Ok((_, lit)) if lit.contains('.') => match integer_literal(rest) {
                    Ok((after, int)) => Some((after, int)),
                    Err(_) => None,
                },
                _ => None,
            };

            if let Some((after, lit)) = literal {
                if let Ok(value) = lit.parse::<f64>() {
                    found.push((value, lit));
                }
                prev = lit.chars().last();
                rest = after;
                continue;
            }

            // Not a standalone number: skip the whole digit run
            if let Ok((after, run)) = integer_literal(rest) {
                prev = run.chars().last();
                rest = after;
                continue;
            }
        }

        prev = Some(c);
        rest = &rest[c.len_utf8()..];
    }

    found
}

/// Extract every numeric token the OCR collaborator saw.
///
/// Per-region text is preferred because it gives each token a position;
/// the full text is scanned only when no regions were returned.
pub fn extract_numeric_tokens(ocr: &OcrOutput) -> Vec<NumericToken> {
    if ocr.regions.is_empty() {
        return scan_numbers(&ocr.full_text)
            .into_iter()
            .map(|(value, lit)| NumericToken::with_source(value, lit, None))
            .collect();
    }

    let mut tokens = Vec::new();
    for region in &ocr.regions {
        let position = Point2D::centroid(&region.bounding_box);
        for (value, lit) in scan_numbers(&region.text) {
            tokens.push(NumericToken::with_source(value, lit, position));
        }
    }
    tokens
}
