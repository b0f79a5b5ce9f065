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

use anycall::codec::{self, to_json};
use anycall::remote::{CallReply, CallRequest};
use anycall::{TypeDescriptor, Value};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::collections::BTreeMap;

fn sample() -> Value {
    let mut map = BTreeMap::new();
    for i in 0..32i32 {
        map.insert(format!("key-{i}"), vec![i; 16]);
    }
    Value::new(map)
}

// ============================================================================
// Binary codec
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let value = sample();
    let size = codec::encode(&value).unwrap().len();
    let mut group = c.benchmark_group("binary");
    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("encode_map_of_lists", |b| {
        b.iter(|| codec::encode(black_box(&value)).unwrap())
    });
    let bytes = codec::encode(&value).unwrap();
    let desc = value.descriptor().clone();
    group.bench_function("decode_map_of_lists", |b| {
        b.iter(|| codec::decode(black_box(&desc), black_box(&bytes)).unwrap())
    });
    group.finish();
}

fn bench_dynamic(c: &mut Criterion) {
    let wrapped = Value::dynamic(sample());
    let bytes = codec::encode(&wrapped).unwrap();
    let desc = TypeDescriptor::dynamic();
    c.bench_function("decode_dynamic", |b| {
        b.iter(|| codec::decode(black_box(&desc), black_box(&bytes)).unwrap())
    });
}

fn bench_json(c: &mut Criterion) {
    let value = sample();
    c.bench_function("to_json_map_of_lists", |b| {
        b.iter(|| to_json(black_box(&value)))
    });
}

// ============================================================================
// Call frames
// ============================================================================

fn bench_call_frames(c: &mut Criterion) {
    let args = vec![Value::from(7i32), Value::from("payload"), sample()];
    c.bench_function("call_request_round_trip", |b| {
        b.iter_batched(
            || args.clone(),
            |args| {
                let bytes = CallRequest::new(3, &args).unwrap().to_bytes().unwrap();
                CallRequest::from_bytes(&bytes).unwrap().arguments().unwrap()
            },
            BatchSize::SmallInput,
        )
    });
    let reply = CallReply::success(&sample()).unwrap().to_bytes().unwrap();
    c.bench_function("call_reply_decode", |b| {
        b.iter(|| {
            CallReply::from_bytes(black_box(&reply))
                .unwrap()
                .into_result()
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_encode, bench_dynamic, bench_json, bench_call_frames);
criterion_main!(benches);
