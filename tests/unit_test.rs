//! Entry point for the grouped unit tests under `tests/unit/`.

mod unit;
