use std::sync::Mutex;
use std::time::Instant;

/// Structured test logger with step tracking. Output goes to stderr and is
/// visible with `cargo test -- --nocapture`.
pub struct TestLogger {
    test_name: String,
    start: Instant,
    step: Mutex<usize>,
}

impl TestLogger {
    pub fn new(test_name: &str) -> Self {
        let logger = Self {
            test_name: test_name.to_string(),
            start: Instant::now(),
            step: Mutex::new(0),
        };
        logger.log(&format!("=== START: {} ===", test_name));
        logger
    }

    /// Log a numbered step.
    pub fn step(&self, description: &str) {
        let mut step = self.step.lock().unwrap();
        *step += 1;
        let elapsed = self.start.elapsed();
        eprintln!(
            "[{:.3}s] [{}] STEP {}: {}",
            elapsed.as_secs_f64(),
            self.test_name,
            *step,
            description
        );
    }

    /// Log a step result (PASS/FAIL).
    pub fn step_result(&self, passed: bool, detail: &str) {
        let step = *self.step.lock().unwrap();
        let elapsed = self.start.elapsed();
        let status = if passed { "PASS" } else { "FAIL" };
        eprintln!(
            "[{:.3}s] [{}] STEP {}: {} - {}",
            elapsed.as_secs_f64(),
            self.test_name,
            step,
            status,
            detail
        );
    }

    /// Log an arbitrary message.
    pub fn log(&self, msg: &str) {
        let elapsed = self.start.elapsed();
        eprintln!(
            "[{:.3}s] [{}] {}",
            elapsed.as_secs_f64(),
            self.test_name,
            msg
        );
    }

    /// Print final result and total duration.
    pub fn finish(&self, passed: bool) {
        let elapsed = self.start.elapsed();
        let status = if passed { "PASS" } else { "FAIL" };
        eprintln!(
            "[{:.3}s] [{}] RESULT: {} ({:.3}s)",
            elapsed.as_secs_f64(),
            self.test_name,
            status,
            elapsed.as_secs_f64()
        );
    }
}

impl Drop for TestLogger {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        eprintln!(
            "[{:.3}s] [{}] === END ({:.3}s) ===",
            elapsed.as_secs_f64(),
            self.test_name,
            elapsed.as_secs_f64()
        );
    }
}
