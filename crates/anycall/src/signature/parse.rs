// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Forward-only token scanner over signature text.
//!
//! The scanner never reads past the buffer: every bracket search is bounded
//! by the text length and reports an error instead of running off the end.

use super::{Signature, SignatureKind, MAX_SIGNATURE_DEPTH};
use crate::error::{Error, ErrorKind, Result};

/// One top-level token of a signature.
///
/// `as_str()` is the full sub-signature text, annotation and pointer marker
/// included. Composite tokens expose their children through
/// [`Token::children`], which re-runs the scanner on the interior text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    text: &'a str,
    kind: SignatureKind,
    /// End of the type body (before `<annotation>` and `*`).
    body_end: usize,
    annotation: Option<(usize, usize)>,
    pointer: bool,
}

impl<'a> Token<'a> {
    #[inline]
    pub fn kind(&self) -> SignatureKind {
        self.kind
    }

    /// Full token text.
    #[inline]
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Token text without annotation or pointer marker.
    #[inline]
    pub fn body(&self) -> &'a str {
        &self.text[..self.body_end]
    }

    /// Trailing `*` pointer marker present.
    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.pointer
    }

    /// Annotation text between `<` and `>`, if any.
    pub fn annotation(&self) -> Option<&'a str> {
        self.annotation.map(|(start, end)| &self.text[start..end])
    }

    /// Interior text of a composite token (brackets or modifier stripped).
    pub fn interior(&self) -> &'a str {
        match self.kind {
            SignatureKind::List | SignatureKind::Map | SignatureKind::Tuple => {
                &self.text[1..self.body_end - 1]
            }
            SignatureKind::VarArgs | SignatureKind::KwArgs | SignatureKind::Optional => {
                &self.text[1..self.body_end]
            }
            _ => "",
        }
    }

    /// Lazy iterator over the children of a composite token.
    pub fn child_tokens(&self) -> Tokens<'a> {
        Tokens::new(self.interior())
    }

    /// Children as an owned signature (empty for atomic tokens).
    pub fn children(&self) -> Signature {
        Signature::from_validated(self.interior())
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.child_tokens().count()
    }

    /// Owned single-token signature for this token.
    pub fn to_signature(&self) -> Signature {
        Signature::from_validated(self.text)
    }
}

/// Lazy scanner yielding top-level tokens.
///
/// Each item is validated recursively before it is yielded, down to
/// [`MAX_SIGNATURE_DEPTH`] levels below the scanned text. After the first
/// error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
    done: bool,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::nested(text, 0)
    }

    fn nested(text: &'a str, depth: usize) -> Self {
        Self {
            text,
            pos: 0,
            depth,
            done: false,
        }
    }

    /// Byte offset of the next token.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.text.len() {
            return None;
        }
        match scan_token(self.text, self.pos, self.depth) {
            Ok(token) => {
                self.pos += token.text.len();
                Some(Ok(token))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}

const EXCERPT_LEN: usize = 48;

fn invalid(text: &str, pos: usize, reason: &str) -> Error {
    let excerpt = match text.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    };
    Error::new(
        ErrorKind::InvalidSignature,
        format!("'{}' at {}: {}", excerpt, pos, reason),
    )
}

#[inline]
fn is_modifier(c: u8) -> bool {
    matches!(c, b'#' | b'~' | b'+')
}

/// Index of the bracket closing the one at `index`.
fn find_end(bytes: &[u8], index: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(index) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// End of a non-modifier type body starting at `index`; brackets are only
/// matched, not validated.
fn atom_or_bracket_end(text: &str, index: usize) -> Result<usize> {
    let bytes = text.as_bytes();
    let Some(&c) = bytes.get(index) else {
        return Err(invalid(text, index, "unexpected end of signature"));
    };
    let (open, close) = match c {
        b'[' => (b'[', b']'),
        b'{' => (b'{', b'}'),
        b'(' => (b'(', b')'),
        _ if SignatureKind::from_char(c).is_some() => return Ok(index + 1),
        _ => return Err(invalid(text, index, "unknown type character")),
    };
    find_end(bytes, index, open, close)
        .map(|end| end + 1)
        .ok_or_else(|| invalid(text, index, "unbalanced bracket"))
}

/// Optional `<annotation>` then optional `*` after `end`.
fn suffix_end(text: &str, mut end: usize) -> Result<usize> {
    let bytes = text.as_bytes();
    if bytes.get(end) == Some(&b'<') {
        end = find_end(bytes, end, b'<', b'>')
            .ok_or_else(|| invalid(text, end, "unbalanced '<'"))?
            + 1;
    }
    if bytes.get(end) == Some(&b'*') {
        end += 1;
    }
    Ok(end)
}

/// End of the complete token at `index`, suffixes included, without
/// validating its interior. Modifier chains are walked iteratively: every
/// modifier level may carry its own suffix.
fn skip_token(text: &str, index: usize) -> Result<usize> {
    let bytes = text.as_bytes();
    let mut base = index;
    while bytes.get(base).copied().is_some_and(is_modifier) {
        base += 1;
    }
    let mut end = atom_or_bracket_end(text, base)?;
    for _ in index..=base {
        end = suffix_end(text, end)?;
    }
    Ok(end)
}

/// End offset (exclusive) of the type body starting at `index`.
fn find_body_end(text: &str, index: usize) -> Result<usize> {
    match text.as_bytes().get(index) {
        // modifier applies to the complete next token
        Some(&c) if is_modifier(c) => skip_token(text, index + 1)
            .map_err(|_| invalid(text, index, "modifier without a valid operand")),
        _ => atom_or_bracket_end(text, index),
    }
}

fn scan_token(text: &str, index: usize, depth: usize) -> Result<Token<'_>> {
    if depth > MAX_SIGNATURE_DEPTH {
        return Err(invalid(text, index, "nesting too deep"));
    }
    let bytes = text.as_bytes();
    let kind = bytes
        .get(index)
        .and_then(|&c| SignatureKind::from_char(c))
        .ok_or_else(|| invalid(text, index, "unknown type character"))?;
    let body_end = find_body_end(text, index)?;

    let mut end = body_end;
    let mut annotation = None;
    if bytes.get(end) == Some(&b'<') {
        let close =
            find_end(bytes, end, b'<', b'>').ok_or_else(|| invalid(text, end, "unbalanced '<'"))?;
        annotation = Some((end + 1 - index, close - index));
        end = close + 1;
    }
    let mut pointer = false;
    if bytes.get(end) == Some(&b'*') {
        pointer = true;
        end += 1;
    }

    let token = Token {
        text: &text[index..end],
        kind,
        body_end: body_end - index,
        annotation,
        pointer,
    };
    validate_children(&token, depth)?;
    Ok(token)
}

/// Validate the interior of `token` once; each child is scanned one level
/// deeper.
fn validate_children(token: &Token<'_>, depth: usize) -> Result<()> {
    let expected = match token.kind {
        SignatureKind::List
        | SignatureKind::VarArgs
        | SignatureKind::KwArgs
        | SignatureKind::Optional => Some(1),
        SignatureKind::Map => Some(2),
        SignatureKind::Tuple => None,
        _ => return Ok(()),
    };
    let mut count = 0usize;
    for child in Tokens::nested(token.interior(), depth + 1) {
        child?;
        count += 1;
    }
    match expected {
        Some(n) if n != count => Err(invalid(
            token.text,
            0,
            &format!("expected {} element(s), found {}", n, count),
        )),
        _ => Ok(()),
    }
}

/// Remove every `<...>` annotation, at any depth.
pub(crate) fn strip_annotations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '<' => depth += 1,
            '>' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<SignatureKind> {
        Tokens::new(text)
            .map(|t| t.expect("valid token").kind())
            .collect()
    }

    #[test]
    fn test_scans_top_level_tokens_lazily() {
        let mut tokens = Tokens::new("i[s]{sm}(if)");
        let first = tokens.next().expect("first").expect("valid");
        assert_eq!(first.as_str(), "i");
        assert_eq!(tokens.offset(), 1);

        let rest: Vec<&str> = tokens.map(|t| t.expect("valid").as_str()).collect();
        assert_eq!(rest, vec!["[s]", "{sm}", "(if)"]);
    }

    #[test]
    fn test_nested_children() {
        let token = Tokens::new("{s[(id)]}")
            .next()
            .expect("token")
            .expect("valid");
        assert_eq!(token.kind(), SignatureKind::Map);
        let children: Vec<Token<'_>> = token
            .child_tokens()
            .map(|t| t.expect("valid child"))
            .collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].kind(), SignatureKind::List);
        assert_eq!(children[1].interior(), "(id)");
        assert_eq!(
            kinds(children[1].interior()),
            vec![SignatureKind::Tuple]
        );
    }

    #[test]
    fn test_annotation_and_pointer_suffix() {
        let token = Tokens::new("(is)<Point,x,label>*")
            .next()
            .expect("token")
            .expect("valid");
        assert_eq!(token.kind(), SignatureKind::Tuple);
        assert_eq!(token.annotation(), Some("Point,x,label"));
        assert!(token.is_pointer());
        assert_eq!(token.body(), "(is)");
        assert_eq!(token.as_str(), "(is)<Point,x,label>*");
    }

    #[test]
    fn test_modifiers_take_one_operand() {
        assert_eq!(
            kinds("#m+i~[s]"),
            vec![
                SignatureKind::VarArgs,
                SignatureKind::Optional,
                SignatureKind::KwArgs
            ]
        );
    }

    #[test]
    fn test_rejects_malformed_text() {
        for bad in ["[i", "{i}", "{iii}", "[]", "(i", "i]", "q", "(i<x)", "+", "[ix]"] {
            let result: Result<Vec<Token<'_>>> = Tokens::new(bad).collect();
            assert!(result.is_err(), "'{}' should be rejected", bad);
        }
    }

    #[test]
    fn test_error_stops_iteration() {
        let mut tokens = Tokens::new("iqs");
        assert!(tokens.next().expect("first").is_ok());
        assert!(tokens.next().expect("second").is_err());
        assert!(tokens.next().is_none());
    }

    #[test]
    fn test_modifier_chains_scan_in_linear_time() {
        let deepest = format!("{}i", "+".repeat(MAX_SIGNATURE_DEPTH));
        let token = Tokens::new(&deepest)
            .next()
            .expect("token")
            .expect("chain at the depth limit is valid");
        assert_eq!(token.as_str(), deepest);

        let started = std::time::Instant::now();
        for modifier in ["#", "~", "+"] {
            let chain = format!("({}i)", modifier.repeat(10_000));
            let err = Tokens::new(&chain)
                .next()
                .expect("token")
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidSignature);
            assert!(err.message().contains("too deep"), "{}", err);
        }
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_deep_nesting_rejected_without_recursing() {
        let text = format!("({}i{})", "[".repeat(200_000), "]".repeat(200_000));
        let err = Tokens::new(&text)
            .next()
            .expect("token")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
        assert!(err.message().len() < 256, "error text stays short");

        let at_limit = format!(
            "{}i{}",
            "[".repeat(MAX_SIGNATURE_DEPTH),
            "]".repeat(MAX_SIGNATURE_DEPTH)
        );
        assert!(Tokens::new(&at_limit).all(|t| t.is_ok()));
    }

    #[test]
    fn test_modifier_suffixes_belong_to_their_level() {
        let token = Tokens::new("++i<a>*<b>s")
            .next()
            .expect("token")
            .expect("valid");
        assert_eq!(token.as_str(), "++i<a>*<b>");
        let inner = token
            .child_tokens()
            .next()
            .expect("operand")
            .expect("valid");
        assert_eq!(inner.as_str(), "+i<a>*<b>");
        assert_eq!(inner.annotation(), Some("b"));
    }

    #[test]
    fn test_strips_nested_annotations() {
        assert_eq!(strip_annotations("(i[(s)<In,a>])<Out,x,y>"), "(i[(s)])");
    }
}
