//! Cross-module scenarios: generated worlds, train traffic over hand-built
//! networks, switch commands through the Bevy plugin, and determinism.

mod plugin_tests;
mod state_sync_tests;
mod switch_flow_tests;
