//! Shared helpers for integration tests

#![allow(dead_code)]

/// Builds an SSE body from raw `data:` payloads, one event per payload
pub fn sse_body(payloads: &[&str]) -> String {
    payloads
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect()
}

/// A paged record-list response body for the documents collection
pub fn record_page(
    page: u32,
    total_pages: u32,
    total_items: u64,
    items: serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "page": page,
        "perPage": 200,
        "totalPages": total_pages,
        "totalItems": total_items,
        "items": items,
    })
}
