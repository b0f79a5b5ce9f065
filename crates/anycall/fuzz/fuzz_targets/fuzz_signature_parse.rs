// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fuzz target for the signature grammar
//!
//! Arbitrary text goes through the parser, descriptor construction and
//! convertibility scoring. None of these operations should panic.

#![no_main]

use anycall::{Signature, TypeDescriptor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(signature) = Signature::parse(text) else {
        return;
    };

    // Valid signatures must re-parse to themselves
    let again = Signature::parse(signature.as_str());
    assert_eq!(again.as_ref().ok(), Some(&signature));

    let _ = signature.children();
    let _ = signature.split();
    let _ = signature.without_annotations();
    let _ = signature.is_convertible_to(&signature);

    if let Ok(desc) = TypeDescriptor::from_signature(&signature) {
        let _ = desc.signature().is_convertible_to(&signature);
    }
});
