//! Test suites for hook dispatch.

mod unit;
