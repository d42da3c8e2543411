//! Whole-period recalculation.
//!
//! Slips of one period are independent, so a batch fans them out onto
//! blocking worker tasks. Cancellation is checked between slips; a slip that
//! has started always finishes. The first configuration error halts the
//! batch, other per-slip failures are counted and logged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::{CalculationOutcome, CalculationReport, PayrollService};

/// Summary of a period recalculation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// The period recalculated.
    pub period_id: Uuid,
    /// Slips recalculated and stored.
    pub calculated: u32,
    /// Slips skipped because they are frozen.
    pub frozen: u32,
    /// Slips whose calculation failed.
    pub failed: u32,
    /// Whether the batch stopped early on request.
    pub cancelled: bool,
}

impl BatchReport {
    fn new(period_id: Uuid) -> Self {
        Self {
            period_id,
            ..Self::default()
        }
    }

    /// Counts one slip's result; a configuration error is handed back.
    fn record(
        &mut self,
        slip_id: Uuid,
        result: EngineResult<CalculationReport>,
    ) -> EngineResult<()> {
        match result {
            Ok(report) => match report.outcome {
                CalculationOutcome::Calculated => self.calculated += 1,
                CalculationOutcome::Frozen => self.frozen += 1,
            },
            Err(err) if err.is_configuration_error() => {
                warn!(
                    period_id = %self.period_id,
                    slip_id = %slip_id,
                    error = %err,
                    "Configuration error; halting batch"
                );
                return Err(err);
            }
            Err(err) => {
                warn!(
                    period_id = %self.period_id,
                    slip_id = %slip_id,
                    error = %err,
                    "Slip calculation failed"
                );
                self.failed += 1;
            }
        }
        Ok(())
    }
}

fn slip_ids(service: &PayrollService, period_id: Uuid) -> EngineResult<Vec<Uuid>> {
    service.store().read(|data| {
        data.period(period_id)?;
        Ok(data.slips_in_period(period_id).map(|s| s.id).collect())
    })
}

impl PayrollService {
    /// Recalculates every slip of a period, one after another.
    pub fn recalculate_period(&self, period_id: Uuid) -> EngineResult<BatchReport> {
        let mut report = BatchReport::new(period_id);
        for slip_id in slip_ids(self, period_id)? {
            report.record(slip_id, self.calculate(slip_id))?;
        }
        info!(
            period_id = %period_id,
            calculated = report.calculated,
            frozen = report.frozen,
            failed = report.failed,
            "Recalculated salary period"
        );
        Ok(report)
    }
}

/// A background recalculation of one period.
///
/// ```no_run
/// # async fn run(service: payroll_engine::service::PayrollService, period_id: uuid::Uuid) {
/// use payroll_engine::service::BatchRecalculation;
///
/// let job = BatchRecalculation::spawn(service, period_id);
/// let report = job.join().await.unwrap();
/// println!("{} slips recalculated", report.calculated);
/// # }
/// ```
#[derive(Debug)]
pub struct BatchRecalculation {
    period_id: Uuid,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<EngineResult<BatchReport>>,
}

impl BatchRecalculation {
    /// Slips calculated at the same time by [`BatchRecalculation::spawn`].
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Starts recalculating a period on the current tokio runtime.
    pub fn spawn(service: PayrollService, period_id: Uuid) -> Self {
        Self::spawn_with_concurrency(service, period_id, Self::DEFAULT_CONCURRENCY)
    }

    /// Starts recalculating a period with at most `concurrency` slips in
    /// flight.
    pub fn spawn_with_concurrency(
        service: PayrollService,
        period_id: Uuid,
        concurrency: usize,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(run(
            service,
            period_id,
            concurrency.max(1),
            Arc::clone(&cancel),
        ));
        Self {
            period_id,
            cancel,
            handle,
        }
    }

    /// Asks the job to stop before its next slip.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Waits for the job to finish.
    pub async fn join(self) -> EngineResult<BatchReport> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(EngineError::BatchCancelled {
                period_id: self.period_id,
            }),
            Err(err) => Err(EngineError::CalculationError {
                message: format!("batch recalculation task failed: {}", err),
            }),
        }
    }
}

async fn run(
    service: PayrollService,
    period_id: Uuid,
    concurrency: usize,
    cancel: Arc<AtomicBool>,
) -> EngineResult<BatchReport> {
    let mut pending = slip_ids(&service, period_id)?.into_iter();
    let mut in_flight = JoinSet::new();
    let mut report = BatchReport::new(period_id);
    let mut halted: Option<EngineError> = None;

    loop {
        while halted.is_none() && !report.cancelled && in_flight.len() < concurrency {
            if cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                break;
            }
            let Some(slip_id) = pending.next() else {
                break;
            };
            let worker = service.clone();
            in_flight.spawn_blocking(move || (slip_id, worker.calculate(slip_id)));
        }

        let Some(joined) = in_flight.join_next().await else {
            break;
        };
        match joined {
            Ok((slip_id, result)) => {
                if let Err(err) = report.record(slip_id, result) {
                    halted.get_or_insert(err);
                }
            }
            Err(err) => {
                warn!(period_id = %period_id, error = %err, "Slip worker failed");
                report.failed += 1;
            }
        }
    }

    if let Some(err) = halted {
        return Err(err);
    }
    info!(
        period_id = %period_id,
        calculated = report.calculated,
        frozen = report.frozen,
        failed = report.failed,
        cancelled = report.cancelled,
        "Batch recalculation finished"
    );
    Ok(report)
}
