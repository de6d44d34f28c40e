//! End-to-end tests live in `tests/`; they spawn the `sonda-server` and `sonda` binaries.
