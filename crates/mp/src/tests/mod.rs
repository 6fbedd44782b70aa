//! Test suites for the daemon supervisor and client-mode actions.

mod support;
