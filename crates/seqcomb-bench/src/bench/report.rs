use core::fmt;
use std::time::Duration;

use crate::bench::runner::Measurement;

/// Operations per second. A zero duration yields infinity.
pub fn throughput(operations: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return f64::INFINITY;
    }
    operations as f64 / secs
}

fn seconds(elapsed: Duration) -> String {
    format!("{}.{:03}", elapsed.as_secs(), elapsed.subsec_millis())
}

/// The block printed after each run.
pub struct Summary<'a>(pub &'a Measurement);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0;
        let ops = m.throughput();

        writeln!(f, "=== Results {} ===", m.strategy)?;
        writeln!(f, "Total sum:        {}", m.checksum)?;
        writeln!(f, "Duration:         {} s", seconds(m.elapsed))?;
        writeln!(f, "Throughput:       {ops:.0} ops/sec")?;
        writeln!(f, "Throughput:       {:.2} M ops/sec", ops / 1e6)?;
        writeln!(f, "Final counter:    {}", m.final_counter)?;
        writeln!(f, "Threads:          {}", m.threads)?;
        if let Some(stats) = &m.combiner {
            writeln!(
                f,
                "Combiner rounds:  {} (mean batch {:.2}, served {}, empty {}, stalls {})",
                stats.rounds,
                stats.mean_batch_size(),
                stats.served,
                stats.empty_batches,
                stats.stalls,
            )?;
        }
        Ok(())
    }
}

/// Markdown comparison of all runs, relative to the fastest.
pub struct Table<'a>(pub &'a [Measurement]);

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let best = self
            .0
            .iter()
            .map(Measurement::throughput)
            .fold(0.0_f64, f64::max);

        writeln!(
            f,
            "| Implementation | Duration | Throughput (ops/sec) | Throughput (M ops/sec) | Relative Performance |"
        )?;
        writeln!(
            f,
            "|----------------|----------|----------------------|------------------------|----------------------|"
        )?;

        for m in self.0 {
            let ops = m.throughput();
            let relative = if best > 0.0 { ops / best } else { 0.0 };
            writeln!(
                f,
                "| {} | {} s | {:.0} | {:.2} | {:.2}x |",
                m.strategy,
                seconds(m.elapsed),
                ops,
                ops / 1e6,
                relative,
            )?;
        }
        Ok(())
    }
}
