// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_precision_loss)] // Stats/metrics need this
#![allow(clippy::cast_sign_loss)] // Test data conversions
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::unreadable_literal)] // Large test constants
#![allow(clippy::doc_markdown)] // Test documentation
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::missing_errors_doc)] // Test documentation
#![allow(clippy::items_after_statements)] // Test helpers
#![allow(clippy::module_name_repetitions)] // Test modules
#![allow(clippy::too_many_lines)] // Example/test code
#![allow(clippy::match_same_arms)] // Test pattern matching
#![allow(clippy::no_effect_underscore_binding)] // Test variables
#![allow(clippy::semicolon_if_nothing_returned)] // Benchmark code formatting
#![allow(clippy::wildcard_imports)] // Test utility imports
#![allow(clippy::redundant_closure_for_method_calls)] // Test code clarity
#![allow(clippy::similar_names)] // Test variable naming
#![allow(clippy::shadow_unrelated)] // Test scoping
#![allow(clippy::needless_pass_by_value)] // Test functions
#![allow(clippy::cast_possible_wrap)] // Test conversions
#![allow(clippy::single_match_else)] // Test clarity
#![allow(clippy::needless_continue)] // Test logic
#![allow(clippy::cast_lossless)] // Test simplicity
#![allow(clippy::match_wild_err_arm)] // Test error handling
#![allow(clippy::explicit_iter_loop)] // Test iteration
#![allow(clippy::must_use_candidate)] // Test functions
#![allow(clippy::if_not_else)] // Test conditionals
#![allow(clippy::map_unwrap_or)] // Test options
#![allow(clippy::match_wildcard_for_single_variants)] // Test patterns
#![allow(clippy::ignored_unit_patterns)] // Test closures

use anycall::{Signature, TypeDescriptor};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const SIMPLE: &str = "(is)";
const NESTED: &str = "({s[(ii)<Point,x,y>]}m[r]I)";

// ============================================================================
// Parsing
// ============================================================================

fn bench_parse_simple(c: &mut Criterion) {
    c.bench_function("signature_parse_simple", |b| {
        b.iter(|| Signature::parse(black_box(SIMPLE)).unwrap())
    });
}

fn bench_parse_nested(c: &mut Criterion) {
    c.bench_function("signature_parse_nested", |b| {
        b.iter(|| Signature::parse(black_box(NESTED)).unwrap())
    });
}

fn bench_descriptor_from_signature(c: &mut Criterion) {
    let sig = Signature::parse(NESTED).unwrap();
    c.bench_function("descriptor_from_signature", |b| {
        b.iter(|| TypeDescriptor::from_signature(black_box(&sig)).unwrap())
    });
}

// ============================================================================
// Convertibility scoring (overload resolution hot path)
// ============================================================================

fn bench_convertibility(c: &mut Criterion) {
    let from = Signature::parse("(bw[c])").unwrap();
    let to = Signature::parse("(il[d])").unwrap();
    c.bench_function("signature_is_convertible_to", |b| {
        b.iter(|| black_box(&from).is_convertible_to(black_box(&to)))
    });
}

criterion_group!(
    benches,
    bench_parse_simple,
    bench_parse_nested,
    bench_descriptor_from_signature,
    bench_convertibility
);
criterion_main!(benches);
