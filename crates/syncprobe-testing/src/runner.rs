//! Named test registry
//!
//! Each registered procedure receives one argument, the device handle, and
//! runs against a fresh device built by the caller's factory.

use crate::error::HarnessResult;
use futures::future::BoxFuture;
use std::future::Future;
use syncprobe_sim::Dut;
use tracing::{info, warn};

type TestFn = Box<dyn Fn(Dut) -> BoxFuture<'static, HarnessResult<()>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
    /// Simulation time reached when the test returned
    pub sim_time_ps: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<TestOutcome>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== syncprobe Report ===\n\n");
        report.push_str(&format!("Total Tests: {}\n", self.outcomes.len()));
        report.push_str(&format!("Passed: {}\n", self.passed()));
        report.push_str(&format!("Failed: {}\n", self.failed()));

        if self.failed() > 0 {
            report.push_str("\nFailed Tests:\n");
            report.push_str("--------------\n");

            for outcome in self.outcomes.iter().filter(|o| !o.passed) {
                report.push_str(&format!(
                    "\n{} (at {} ps):\n",
                    outcome.name, outcome.sim_time_ps
                ));
                if let Some(error) = &outcome.error {
                    report.push_str(&format!("  Error: {}\n", error));
                }
            }
        }

        report
    }
}

#[derive(Default)]
pub struct TestRunner {
    tests: Vec<(String, TestFn)>,
}

impl std::fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRunner")
            .field("tests", &self.names())
            .finish()
    }
}

impl TestRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named test procedure
    pub fn register<F, Fut>(&mut self, name: &str, test: F) -> &mut Self
    where
        F: Fn(Dut) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HarnessResult<()>> + Send + 'static,
    {
        self.tests.push((
            name.to_string(),
            Box::new(move |dut| -> BoxFuture<'static, HarnessResult<()>> { Box::pin(test(dut)) }),
        ));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.tests.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Run every registered test, each on a device from `factory`
    pub async fn run_all<F>(&self, factory: F) -> RunSummary
    where
        F: Fn(&str) -> Dut,
    {
        self.run_filtered(factory, None).await
    }

    /// Run the tests whose name contains `filter`
    pub async fn run_filtered<F>(&self, factory: F, filter: Option<&str>) -> RunSummary
    where
        F: Fn(&str) -> Dut,
    {
        let mut summary = RunSummary::default();

        for (name, test) in &self.tests {
            if let Some(pattern) = filter {
                if !name.contains(pattern) {
                    continue;
                }
            }

            info!("Running {}", name);
            let dut = factory(name);
            let result = test(dut.clone()).await;
            let sim_time_ps = dut.time_ps().await;

            let outcome = match result {
                Ok(()) => {
                    info!("{} passed", name);
                    TestOutcome {
                        name: name.clone(),
                        passed: true,
                        error: None,
                        sim_time_ps,
                    }
                }
                Err(e) => {
                    warn!("{} failed: {}", name, e);
                    TestOutcome {
                        name: name.clone(),
                        passed: false,
                        error: Some(e.to_string()),
                        sim_time_ps,
                    }
                }
            };
            summary.outcomes.push(outcome);
        }

        summary
    }
}
