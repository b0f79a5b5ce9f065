// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Convertibility heuristic between signatures.
//!
//! Used to pick the best overload for a call whose argument signature does
//! not match any registered method exactly. Scores are not a conversion
//! guarantee; the value conversion has the last word.

use super::{Signature, SignatureKind, Token};
use crate::config::RuntimeConfig;

pub(super) fn score_sequence(source: &Signature, target: &Signature) -> f32 {
    let strict = RuntimeConfig::global().struct_names_strict();
    let mut src = source.iter();
    let mut dst = target.iter();
    let mut total = 1.0f32;
    loop {
        match (src.next(), dst.next()) {
            (None, None) => return total,
            (Some(s), Some(d)) => {
                let score = score(&s, &d, strict);
                if score == 0.0 {
                    return 0.0;
                }
                total *= score;
            }
            _ => return 0.0,
        }
    }
}

fn struct_name(annotation: Option<&str>) -> Option<&str> {
    annotation.map(|a| a.split(',').next().unwrap_or(a))
}

fn score(src: &Token<'_>, dst: &Token<'_>, strict: bool) -> f32 {
    let mut error = 0.0f32;
    let mut child_err = 1.0f32;

    let mut s = src.kind();
    let mut d = dst.kind();
    if s == SignatureKind::VarArgs {
        s = SignatureKind::List;
    }
    if d == SignatureKind::VarArgs {
        d = SignatureKind::List;
    }

    let factor = |child_err: f32, error: f32| child_err * (1.0 - error / 100.0);

    if d == SignatureKind::Void {
        return factor(child_err, error);
    }
    if d == SignatureKind::Unknown {
        if s != SignatureKind::Unknown {
            error += 10.0;
        }
        return factor(child_err, error);
    }
    if d == SignatureKind::Dynamic || s == SignatureKind::None {
        error += 5.0;
        return factor(child_err, error);
    }

    if d == SignatureKind::Optional {
        let dst_inner = dst.child_tokens().filter_map(|t| t.ok()).next();
        let Some(dst_inner) = dst_inner else {
            return 0.0;
        };
        if s == SignatureKind::Optional {
            return match src.child_tokens().filter_map(|t| t.ok()).next() {
                Some(src_inner) => score(&src_inner, &dst_inner, strict),
                None => 0.0,
            };
        }
        if s == SignatureKind::Void {
            return factor(child_err, error);
        }
        return score(src, &dst_inner, strict);
    } else if s == SignatureKind::Optional {
        return 0.0;
    }

    if s.is_numeric() {
        if !d.is_numeric() {
            return 0.0;
        }
        if s.is_integral() && d.is_floating() {
            error += 2.0;
        }
        if s.is_floating() && d.is_integral() {
            error += 3.0;
        }
        if s != SignatureKind::Bool && d == SignatureKind::Bool {
            error += 4.0;
        }
    } else if matches!(
        s,
        SignatureKind::List | SignatureKind::Map | SignatureKind::Tuple
    ) {
        if d != s {
            return 0.0;
        }
        let src_children: Vec<Token<'_>> = src.child_tokens().filter_map(|t| t.ok()).collect();
        let dst_children: Vec<Token<'_>> = dst.child_tokens().filter_map(|t| t.ok()).collect();
        if src_children.len() != dst_children.len() {
            if s != SignatureKind::Tuple {
                return 0.0;
            }
            // differently shaped structs may still be versions of one another
            let (a, b) = (src.annotation(), dst.annotation());
            if !strict {
                return if a.is_none() || b.is_none() { 0.0 } else { 0.1 };
            }
            return match (struct_name(a), struct_name(b)) {
                (Some(x), Some(y))
                    if x == y
                        && a.is_some_and(|a| a.contains(','))
                        && b.is_some_and(|b| b.contains(',')) =>
                {
                    0.1
                }
                _ => 0.0,
            };
        }
        for (sc, dc) in src_children.iter().zip(dst_children.iter()) {
            let child = score(sc, dc, strict);
            if child == 0.0 {
                return 0.0;
            }
            child_err *= 1.0 - (1.0 - child) * 0.95;
        }
    } else if d != s {
        return 0.0;
    }
    factor(child_err, error)
}
