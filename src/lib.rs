// ABOUTME: Library half of the handoff binary: the demo agent graph and run transcript rendering.
// ABOUTME: Shared by the command-line driver and the end-to-end smoke tests.

pub mod demo;
pub mod transcript;
