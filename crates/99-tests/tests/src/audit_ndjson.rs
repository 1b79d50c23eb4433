//! NDJSON audit stream produced by a running engine.

use crate::init_logger;
use parking_lot::Mutex;
use sigil_engine::{Engine, EngineConfig, NdjsonAudit, NullRouter, Priority, SigilCategory};
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn lines(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().clone();
        String::from_utf8(bytes)
            .expect("utf8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("one JSON object per line"))
            .collect()
    }
}

/// Executions, rejections, and reinforcement reports share one tagged stream.
#[test]
fn engine_writes_tagged_lines() {
    init_logger();
    let buf = SharedBuf::default();
    let config = EngineConfig {
        reinforce_every: 1,
        ..EngineConfig::default()
    };
    let mut engine = Engine::builder()
        .config(config)
        .router(NullRouter)
        .audit(NdjsonAudit::new(buf.clone()))
        .build()
        .expect("valid engine");

    engine.register("sigil_trust_001", 0.5, SigilCategory::Unbound, Priority::Core);
    engine.update_pressure(0.5, 0.0, 0.3, 0.4);
    engine.dispatch("sigil_trust_001").expect("admitted");
    assert!(engine.dispatch("ghost").is_err());
    engine.tick();

    let lines = buf.lines();
    let types: Vec<&str> = lines
        .iter()
        .map(|line| line["type"].as_str().expect("tagged"))
        .collect();
    assert_eq!(types, ["execution", "rejection", "reinforcement"]);

    assert_eq!(lines[0]["sigil_id"], "sigil_trust_001");
    assert_eq!(lines[0]["category"], "unbound");
    assert_eq!(lines[1]["kind"], "unknown_sigil");
    assert_eq!(lines[1]["retry"], false);
    assert_eq!(lines[2]["tick"], 1);
    assert_eq!(lines[2]["skipped"], serde_json::json!(["sigil_trust_001"]));
}
