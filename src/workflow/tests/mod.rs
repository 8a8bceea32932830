//! Unit tests for workflow resolution and the round-trip engine.
