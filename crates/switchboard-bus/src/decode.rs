// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frame decoding for the push event stream.

use tracing::warn;

use switchboard_core::BusEvent;

/// Decodes a text frame into a typed event.
///
/// Malformed frames are dropped and logged, never propagated: one bad
/// frame must not tear down the subscription or reach consumers.
pub fn decode_frame(raw: &str) -> Option<BusEvent> {
    match serde_json::from_str::<BusEvent>(raw) {
        Ok(event) => Some(event),
        Err(error) => {
            warn!(
                error = %error,
                payload = %snippet(raw),
                "dropping malformed event frame"
            );
            None
        }
    }
}

/// First characters of a payload for log context.
fn snippet(raw: &str) -> String {
    const LIMIT: usize = 120;
    if raw.chars().count() <= LIMIT {
        raw.to_string()
    } else {
        let head: String = raw.chars().take(LIMIT).collect();
        format!("{head}…")
    }
}
