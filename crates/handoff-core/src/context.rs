// ABOUTME: Context variables: the out-of-band key/value bag threaded through a run.
// ABOUTME: Updates are shallow-merged, last writer wins per key.

use serde_json::{Map, Value};

/// Key/value state passed between tools and agents, never shown to the model
/// directly.
pub type ContextVariables = Map<String, Value>;

/// Shallow-merge `updates` into `target`. Keys present in both take the value
/// from `updates`; nested objects are replaced, not merged.
pub fn merge_context(target: &mut ContextVariables, updates: ContextVariables) {
    for (key, value) in updates {
        target.insert(key, value);
    }
}
