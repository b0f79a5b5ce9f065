// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fuzz target for the binary codec and call frames
//!
//! Feeds arbitrary bytes to the dynamic decoder and the request/reply
//! framing. Decoding must fail cleanly and never panic; anything that
//! decodes must encode again.

#![no_main]

use anycall::codec;
use anycall::remote::{CallReply, CallRequest};
use anycall::TypeDescriptor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // ----------------------------------------------------------------
    // 1. Self-describing values
    // ----------------------------------------------------------------
    if let Ok(value) = codec::decode(&TypeDescriptor::dynamic(), data) {
        assert!(codec::encode(&value).is_ok(), "decoded value must re-encode");
    }

    // ----------------------------------------------------------------
    // 2. Call frames
    // ----------------------------------------------------------------
    if let Ok(request) = CallRequest::from_bytes(data) {
        let _ = request.arguments();
    }
    if let Ok(reply) = CallReply::from_bytes(data) {
        let _ = reply.into_result();
    }
});
