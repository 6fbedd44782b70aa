//! Test suites for the bus server and client.

mod support;
