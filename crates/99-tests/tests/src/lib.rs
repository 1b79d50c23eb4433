//! End-to-end tests driving the full engine.

#[cfg(test)]
mod lifecycle;

#[cfg(test)]
mod audit_ndjson;

#[cfg(test)]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
